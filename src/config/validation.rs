use crate::config::types::{Config, CrawlerConfig, DirectoryConfig, HttpConfig, MirrorConfig};
use crate::ConfigError;
use chrono::{FixedOffset, Local, Offset, Utc};
use regex::Regex;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_mirror_config(&config.mirror)?;
    validate_directories(&config.directories)?;
    validate_http_config(&config.http)?;
    validate_crawler_config(&config.crawler)?;
    validate_blacklist(&config.filter.blacklist)?;
    Ok(())
}

/// Validates output locations and the report timezone
fn validate_mirror_config(config: &MirrorConfig) -> Result<(), ConfigError> {
    if config.output_path.is_empty() {
        return Err(ConfigError::Validation(
            "output-path cannot be empty".to_string(),
        ));
    }

    if config.report_path.is_empty() {
        return Err(ConfigError::Validation(
            "report-path cannot be empty".to_string(),
        ));
    }

    parse_timezone(&config.timezone)?;

    Ok(())
}

/// Validates the per-kind subdirectory names
fn validate_directories(config: &DirectoryConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("pages", &config.pages),
        ("documents", &config.documents),
        ("images", &config.images),
        ("css", &config.css),
        ("js", &config.js),
        ("external", &config.external),
    ] {
        validate_directory(name, value)?;
    }
    Ok(())
}

/// A directory must start with '/', have a name, and stay inside the mirror
fn validate_directory(name: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "directory '{}' must start with '/', got '{}'",
            name, value
        )));
    }

    let segments: Vec<&str> = value.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(ConfigError::Validation(format!(
            "directory '{}' cannot be the mirror root",
            name
        )));
    }

    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(ConfigError::Validation(format!(
            "directory '{}' cannot contain '.' or '..' segments, got '{}'",
            name, value
        )));
    }

    Ok(())
}

/// Validates HTTP transport settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.default_scheme != "http" && config.default_scheme != "https" {
        return Err(ConfigError::Validation(format!(
            "default-scheme must be 'http' or 'https', got '{}'",
            config.default_scheme
        )));
    }

    if config.default_host.is_empty() || config.default_host.contains('/') {
        return Err(ConfigError::Validation(format!(
            "default-host must be a bare host, got '{}'",
            config.default_host
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    Ok(())
}

/// The blacklist must compile as a regular expression
fn validate_blacklist(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Ok(());
    }

    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}

/// Parses a timezone setting into a fixed offset
///
/// Accepts "UTC", "local" (the offset of the machine right now) and offsets in
/// the form "+HH:MM" / "-HH:MM" / "+HH".
pub fn parse_timezone(value: &str) -> Result<FixedOffset, ConfigError> {
    let trimmed = value.trim();

    if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Ok(Utc.fix());
    }

    if trimmed.eq_ignore_ascii_case("local") {
        return Ok(Local::now().offset().fix());
    }

    let invalid = || ConfigError::InvalidTimezone(value.to_string());

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None => (rest, "0"),
    };

    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

use crate::config::FilterConfig;
use crate::{ConfigError, UrlError, UrlResult};
use regex::Regex;

/// Blacklist applied to every raw link before it is canonicalized
///
/// Matching is a regular-expression search anywhere in the raw text, so
/// `(instagram|whatsapp)` rejects `https://www.instagram.com/p/1` as well as
/// `/share?to=whatsapp`.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    blacklist: Option<Regex>,
}

impl LinkFilter {
    /// Compiles the blacklist pattern; an empty pattern disables filtering
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        if pattern.is_empty() {
            return Ok(Self { blacklist: None });
        }

        let regex = Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;

        Ok(Self {
            blacklist: Some(regex),
        })
    }

    pub fn from_config(config: &FilterConfig) -> Result<Self, ConfigError> {
        Self::new(&config.blacklist)
    }

    pub fn is_blacklisted(&self, link: &str) -> bool {
        self.blacklist
            .as_ref()
            .map(|regex| regex.is_match(link))
            .unwrap_or(false)
    }

    /// Screens a raw link and normalizes its path separators
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The link with every backslash replaced by a forward slash
    /// * `Err(UrlError::BlacklistedLink)` - The link matched the blacklist
    pub fn apply(&self, link: &str) -> UrlResult<String> {
        if self.is_blacklisted(link) {
            return Err(UrlError::BlacklistedLink(link.to_string()));
        }
        Ok(link.replace('\\', "/"))
    }
}

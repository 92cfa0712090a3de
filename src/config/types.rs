use serde::Deserialize;

/// Main configuration structure for Sumi-Mirror
///
/// Every section is optional; missing values fall back to built-in defaults
/// so the binary runs without any config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mirror: MirrorConfig,
    #[serde(default)]
    pub directories: DirectoryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Where the mirror and its run reports are written
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorConfig {
    /// Root directory of the mirror
    #[serde(rename = "output-path", default = "default_output_path")]
    pub output_path: String,

    /// Directory for per-run reports
    #[serde(rename = "report-path", default = "default_report_path")]
    pub report_path: String,

    /// Timezone for report timestamps: "UTC", "local" or a fixed offset like "+10:00"
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Per-kind subdirectories inside the mirror root
///
/// Each value starts with a slash and is appended to the mirror root (or to the
/// external-site prefix for content from other hosts).
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_pages_dir")]
    pub pages: String,

    #[serde(default = "default_documents_dir")]
    pub documents: String,

    #[serde(default = "default_images_dir")]
    pub images: String,

    #[serde(default = "default_css_dir")]
    pub css: String,

    #[serde(default = "default_js_dir")]
    pub js: String,

    /// Prefix for content mirrored from hosts other than the target
    #[serde(default = "default_external_dir")]
    pub external: String,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum redirect hops followed per request
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Scheme used when the starting link carries none
    #[serde(rename = "default-scheme", default = "default_scheme")]
    pub default_scheme: String,

    /// Host used when the starting link carries none
    #[serde(rename = "default-host", default = "default_host")]
    pub default_host: String,
}

/// Crawl behavior; every value can be overridden from the command line
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// How many link levels to follow from the starting page
    #[serde(default)]
    pub depth: u32,

    /// Number of fetched bodies held in memory before a flush
    #[serde(default)]
    pub buffer: usize,

    /// Maximum number of concurrent fetches within one depth level
    #[serde(rename = "max-concurrent-fetches", default = "default_concurrency")]
    pub max_concurrent_fetches: usize,

    /// Overwrite files that already exist in the mirror
    #[serde(default)]
    pub force: bool,

    /// Follow links to hosts other than the target
    #[serde(rename = "allow-external", default)]
    pub allow_external: bool,
}

/// Link filtering
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Regular expression; matching links are never fetched. Empty disables the filter.
    #[serde(default = "default_blacklist")]
    pub blacklist: String,
}

fn default_output_path() -> String {
    "./dump".to_string()
}

fn default_report_path() -> String {
    "./runtime/logs".to_string()
}

fn default_timezone() -> String {
    "+10:00".to_string()
}

fn default_pages_dir() -> String {
    "/pages".to_string()
}

fn default_documents_dir() -> String {
    "/data".to_string()
}

fn default_images_dir() -> String {
    "/img".to_string()
}

fn default_css_dir() -> String {
    "/css".to_string()
}

fn default_js_dir() -> String {
    "/js".to_string()
}

fn default_external_dir() -> String {
    "/sites".to_string()
}

fn default_user_agent() -> String {
    "Dumper".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    10
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_blacklist() -> String {
    "(instagram|whatsapp|appdv)".to_string()
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            report_path: default_report_path(),
            timezone: default_timezone(),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            pages: default_pages_dir(),
            documents: default_documents_dir(),
            images: default_images_dir(),
            css: default_css_dir(),
            js: default_js_dir(),
            external: default_external_dir(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_redirects: default_max_redirects(),
            default_scheme: default_scheme(),
            default_host: default_host(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            depth: 0,
            buffer: 0,
            max_concurrent_fetches: default_concurrency(),
            force: false,
            allow_external: false,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blacklist: default_blacklist(),
        }
    }
}

/// Resolved options for a single run
///
/// Built from `[crawler]` and then overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    pub depth: u32,
    pub buffer: usize,
    pub concurrency: usize,
    pub force: bool,
    pub allow_external: bool,
}

impl From<&CrawlerConfig> for CrawlOptions {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            depth: config.depth,
            buffer: config.buffer,
            concurrency: config.max_concurrent_fetches.max(1),
            force: config.force,
            allow_external: config.allow_external,
        }
    }
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

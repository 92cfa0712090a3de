use crate::config::HttpConfig;
use crate::url::classify::is_known_extension;
use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

/// Characters that cannot appear in file or directory names on common filesystems
const ILLEGAL_PATH_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replacement for every illegal character. Lossy: distinct segments may collide.
const FOLD_CHAR: char = '@';

/// Document extensions that mark `name.ext` as a file name rather than a bare
/// domain, on top of every extension the classifier assigns a kind to
const FILE_EXTENSIONS: &[&str] = &[
    "pdf", "txt", "md", "xml", "json", "csv", "rss", "atom", "yml", "yaml", "toml", "ini", "log",
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "epub", "zip", "gz",
    "tgz", "bz2", "xz", "7z", "rar", "tar", "exe", "dmg", "apk", "iso", "bin", "wasm", "woff",
    "woff2", "ttf", "otf", "eot", "avif", "bmp", "tif", "tiff", "heic", "mjs", "map", "asp",
    "aspx", "jsp", "cgi", "shtml", "xhtml", "webmanifest",
];

/// Scheme and host every relative reference is resolved against
///
/// Established once per run from the starting link and never changed while
/// the run is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    pub scheme: String,
    pub host: String,
}

impl ConnectionContext {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Derives the context from the starting link
    ///
    /// The scheme and host are taken from the link when it carries them; the
    /// configured defaults fill whatever is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_mirror::config::HttpConfig;
    /// use sumi_mirror::url::ConnectionContext;
    ///
    /// let http = HttpConfig::default();
    /// let ctx = ConnectionContext::from_start("https://Example.com/docs", &http);
    /// assert_eq!(ctx, ConnectionContext::new("https", "example.com"));
    ///
    /// let ctx = ConnectionContext::from_start("example.com/docs", &http);
    /// assert_eq!(ctx, ConnectionContext::new("http", "example.com"));
    /// ```
    pub fn from_start(link: &str, http: &HttpConfig) -> Self {
        let link = link.trim();

        if let Ok(url) = Url::parse(link) {
            if matches!(url.scheme(), "http" | "https") {
                if let Some(host) = url.host_str() {
                    let host = match url.port() {
                        Some(port) => format!("{}:{}", host, port),
                        None => host.to_string(),
                    };
                    return Self::new(url.scheme(), host.to_lowercase());
                }
            }
        }

        let host = if let Some(rest) = link.strip_prefix("//") {
            Some(authority_of(rest))
        } else if is_bare_domain(link) {
            Some(authority_of(link))
        } else {
            None
        };

        let scheme = http.default_scheme.as_str();
        match host.and_then(|h| build(scheme, scheme, h, h).ok()) {
            Some(url) => Self::new(scheme, url.host()),
            None => Self::new(scheme, http.default_host.clone()),
        }
    }
}

/// An absolute `scheme://host/path[?query]` reference
///
/// The host is lowercased and carries a port only when it is not the default
/// one. The path always starts with '/', is percent-encoded, has dot segments
/// resolved, and carries no trailing slash except for the root path.
/// Fragments are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalUrl {
    scheme: String,
    host: String,
    path: String,
    query: Option<String>,
    serialized: String,
}

impl CanonicalUrl {
    fn new(scheme: &str, host: &str, path: &str, query: Option<&str>) -> Self {
        let scheme = scheme.to_ascii_lowercase();
        let host = host.to_lowercase();
        let path = trim_trailing_slash(path);
        let query = query.filter(|q| !q.is_empty()).map(str::to_string);

        let serialized = match &query {
            Some(q) => format!("{}://{}{}?{}", scheme, host, path, q),
            None => format!("{}://{}{}", scheme, host, path),
        };

        Self {
            scheme,
            host,
            path,
            query,
            serialized,
        }
    }

    /// The request URL, also used as the unique key of a link
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host including a non-default port
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Raw path segments, empty for the root path
    pub fn segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Final path segment, if the path is not the root
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last().copied()
    }

    /// Lowercased extension of the final path segment
    ///
    /// The query string is ignored; only alphanumeric extensions count.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name()?;
        let (_, ext) = name.rsplit_once('.')?;
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Path segments safe to use as local file and directory names
    ///
    /// The query string is folded into the last segment so distinct queries
    /// map to distinct local names.
    pub fn local_segments(&self) -> Vec<String> {
        let mut segments: Vec<String> = self
            .segments()
            .into_iter()
            .map(sanitize_segment)
            .collect();

        if let Some(query) = &self.query {
            let folded = format!("{}{}", FOLD_CHAR, sanitize_segment(query));
            match segments.last_mut() {
                Some(last) => last.push_str(&folded),
                None => segments.push(folded),
            }
        }

        segments
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized)
    }
}

/// Resolves a raw reference against the connection context
///
/// Rules are checked in priority order and the first match wins:
///
/// 1. Bare domain (`example.com`, `example.com/a/b`) → `scheme://` + reference
/// 2. Fully qualified or scheme-relative (`https://h/a`, `//h/a`) → `scheme://h/a`
/// 3. Root-relative (`/a/b`) → `scheme://host` + reference
/// 4. Path-relative (`a/b`, `./a`) → `scheme://host/` + reference
/// 5. Anything else is rejected as malformed
///
/// The connection scheme is used even when the reference names another one.
/// Host, port, path and query are normalized by [`url::Url`], so
/// `http://example.com:80/a` and `/a` name the same link, as do `/café` and
/// `/caf%C3%A9`.
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::{canonicalize, ConnectionContext};
///
/// let ctx = ConnectionContext::new("https", "example.com");
/// assert_eq!(canonicalize("/css/site.css", &ctx).unwrap().as_str(), "https://example.com/css/site.css");
/// assert_eq!(canonicalize("//cdn.example.org/x.js", &ctx).unwrap().as_str(), "https://cdn.example.org/x.js");
/// assert!(canonicalize("mailto:admin@example.com", &ctx).is_err());
/// ```
pub fn canonicalize(raw: &str, context: &ConnectionContext) -> UrlResult<CanonicalUrl> {
    let reference = strip_fragment(raw.trim());

    if reference.is_empty() || reference.chars().any(char::is_whitespace) {
        return Err(UrlError::MalformedReference(raw.to_string()));
    }

    if has_foreign_scheme(reference) {
        return Err(UrlError::UnsupportedScheme(raw.to_string()));
    }

    let scheme = context.scheme.as_str();

    if is_bare_domain(reference) {
        return build(scheme, scheme, reference, raw);
    }

    if let Some((named, rest)) = strip_network_prefix(reference) {
        return build(scheme, named.unwrap_or(scheme), rest, raw);
    }

    if is_root_relative(reference) {
        return build(scheme, scheme, &format!("{}{}", context.host, reference), raw);
    }

    if is_path_relative(reference) {
        return build(scheme, scheme, &format!("{}/{}", context.host, reference), raw);
    }

    Err(UrlError::MalformedReference(raw.to_string()))
}

/// Replaces every filesystem-illegal character with the fold character
pub fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if ILLEGAL_PATH_CHARS.contains(&c) {
                FOLD_CHAR
            } else {
                c
            }
        })
        .collect()
}

/// `example.com` or `sub.example.com:8080/a/b`: no scheme, no leading slash, a
/// dotted name before any slash whose last label is not a known file extension
fn is_bare_domain(reference: &str) -> bool {
    if reference.starts_with('/') || reference.starts_with('.') {
        return false;
    }

    let authority = authority_of(reference);
    let name = authority.split(':').next().unwrap_or("");
    if !name.contains('.') {
        return false;
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels
        .iter()
        .any(|l| l.is_empty() || !l.chars().all(|c| c.is_alphanumeric() || c == '-'))
    {
        return false;
    }

    match labels.last() {
        Some(last) => {
            let last = last.to_ascii_lowercase();
            !FILE_EXTENSIONS.contains(&last.as_str()) && !is_known_extension(&last)
        }
        None => false,
    }
}

/// Strips `http://`, `https://` or `//`, returning the named scheme and `host/path`
fn strip_network_prefix(reference: &str) -> Option<(Option<&'static str>, &str)> {
    let lower = reference.to_ascii_lowercase();
    for (scheme, prefix) in [("http", "http://"), ("https", "https://")] {
        if lower.starts_with(prefix) {
            return Some((Some(scheme), &reference[prefix.len()..]));
        }
    }
    reference.strip_prefix("//").map(|rest| (None, rest))
}

fn is_root_relative(reference: &str) -> bool {
    reference.starts_with('/') && !reference.starts_with("//")
}

/// `a/b`, `./a`, `../a`; a bare query string has nothing to attach to
fn is_path_relative(reference: &str) -> bool {
    !reference.starts_with('/') && !reference.starts_with('?')
}

/// `mailto:`, `javascript:`, `data:`... anything with a scheme other than HTTP(S)
///
/// `host:8080/path` is a port, not a scheme.
fn has_foreign_scheme(reference: &str) -> bool {
    let Some((scheme, rest)) = reference.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    let looks_like_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !looks_like_scheme || scheme.contains('/') {
        return false;
    }

    if matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https") {
        return false;
    }

    let port: &str = rest
        .split(|c| c == '/' || c == '?')
        .next()
        .unwrap_or_default();
    port.is_empty() || !port.chars().all(|c| c.is_ascii_digit())
}

/// Host (with port) part of `host/path?query`
fn authority_of(reference: &str) -> &str {
    reference
        .split(|c| c == '/' || c == '?')
        .next()
        .unwrap_or_default()
}

fn strip_fragment(reference: &str) -> &str {
    match reference.split_once('#') {
        Some((before, _)) => before,
        None => reference,
    }
}

/// Builds the canonical URL from `host/path?query`
///
/// The remainder is parsed under `parse_scheme` (the scheme the reference
/// named, if any) so its default port is dropped, and serialized under
/// `scheme`. References carrying credentials are rejected.
fn build(scheme: &str, parse_scheme: &str, remainder: &str, raw: &str) -> UrlResult<CanonicalUrl> {
    let malformed = || UrlError::MalformedReference(raw.to_string());

    let url = Url::parse(&format!("{}://{}", parse_scheme, remainder)).map_err(|_| malformed())?;
    if !url.username().is_empty() || url.password().is_some() {
        return Err(malformed());
    }

    let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(malformed)?;
    let host = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Ok(CanonicalUrl::new(scheme, &host, url.path(), url.query()))
}

/// Removes the trailing slash except for the root path
fn trim_trailing_slash(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

//! HTML parser for extracting link candidates
//!
//! This module scans a fetched page for:
//! - Every `href` and `src` attribute value, in document order
//! - The page title, for logging

use scraper::{Html, Selector};

/// Extracted information from an HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Raw attribute values; not yet filtered or resolved
    pub links: Vec<String>,
}

/// Parses HTML content and extracts link candidates
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `href` on any element (`<a>`, `<link>`, `<area>`, ...)
/// - `src` on any element (`<img>`, `<script>`, `<iframe>`, ...)
///
/// **Exclude:**
/// - Empty values
/// - `tel:` and `mailto:` links
///
/// Values are returned as written, with HTML entities decoded. Resolving them
/// is left to the canonicalizer, which rejects the remaining non-HTTP schemes.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
///
/// # Returns
///
/// The parsed page. Malformed markup never fails; the parser recovers the way
/// browsers do.
///
/// # Example
///
/// ```
/// use sumi_mirror::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title><link href="/s.css"></head>
///     <body><a href="/page">Link</a><a href="mailto:me@example.com">Mail</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["/s.css", "/page"]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts every `href` / `src` value worth resolving
fn extract_links(document: &Html) -> Vec<String> {
    let mut links = Vec::new();

    let Ok(selector) = Selector::parse("[href], [src]") else {
        return links;
    };

    for element in document.select(&selector) {
        for attribute in ["href", "src"] {
            if let Some(value) = element.value().attr(attribute) {
                if is_candidate(value) {
                    links.push(value.trim().to_string());
                }
            }
        }
    }

    links
}

fn is_candidate(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    let lower = value.to_ascii_lowercase();
    !(lower.starts_with("tel:") || lower.starts_with("mailto:"))
}

//! Content rewriting module for Sumi-Mirror
//!
//! Saved pages are rewritten so the mirror can be opened straight from disk:
//! - `href` / `src` values of saved links point at their local files
//! - A `<base>` tag after `<head>` makes those references resolve from the
//!   mirror root, whatever directory the page itself is stored in

mod base;
mod links;

pub use base::{base_href, inject_base};
pub use links::{substitute_links, LinkResolution, Substitution};

/// Rewrites one saved page
///
/// # Arguments
///
/// * `content` - Page markup as saved
/// * `directory` - Mirror-relative directory the page is stored in
/// * `resolve` - Maps an attribute value to what the mirror knows about it
///
/// # Returns
///
/// The rewritten markup with substitution counts. Rewriting an already
/// rewritten page is safe: the base tag is not injected twice.
///
/// # Examples
///
/// ```
/// use sumi_mirror::rewrite::{rewrite_page, LinkResolution};
///
/// let html = r#"<html><head></head><body><a href="/about">About</a></body></html>"#;
/// let out = rewrite_page(html, "/pages/blog", |value| match value {
///     "/about" => LinkResolution::Local("/pages/about/index.html".to_string()),
///     _ => LinkResolution::Unknown,
/// });
///
/// assert_eq!(
///     out.content,
///     r#"<html><head><base href="../../"></head><body><a href="./pages/about/index.html">About</a></body></html>"#
/// );
/// ```
pub fn rewrite_page<F>(content: &str, directory: &str, resolve: F) -> Substitution
where
    F: FnMut(&str) -> LinkResolution,
{
    let substituted = substitute_links(content, resolve);
    Substitution {
        content: inject_base(&substituted.content, &base_href(directory)),
        ..substituted
    }
}

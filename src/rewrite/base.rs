use regex::Regex;
use std::sync::LazyLock;

static HEAD_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("hardcoded regex pattern is valid")
});

/// Base href that leads from a page's directory back to the mirror root
///
/// One `../` per directory segment; `./` for a page stored at the root.
///
/// # Examples
///
/// ```
/// use sumi_mirror::rewrite::base_href;
///
/// assert_eq!(base_href(""), "./");
/// assert_eq!(base_href("/pages/about"), "../../");
/// ```
pub fn base_href(directory: &str) -> String {
    let depth = directory.split('/').filter(|s| !s.is_empty()).count();
    if depth == 0 {
        "./".to_string()
    } else {
        "../".repeat(depth)
    }
}

/// Inserts `<base href="...">` right after the first `<head>` tag
///
/// Returns the content unchanged when it has no `<head>` or already carries
/// the same base tag, so a page can go through several rewrite passes.
pub fn inject_base(content: &str, href: &str) -> String {
    let tag = format!("<base href=\"{}\">", href);
    if content.contains(&tag) {
        return content.to_string();
    }

    match HEAD_TAG.find(content) {
        Some(head) => {
            let mut out = String::with_capacity(content.len() + tag.len());
            out.push_str(&content[..head.end()]);
            out.push_str(&tag);
            out.push_str(&content[head.end()..]);
            out
        }
        None => content.to_string(),
    }
}

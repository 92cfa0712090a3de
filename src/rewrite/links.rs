use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Quoted `href` / `src` attribute inside a tag
static LINK_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\s)(href|src)(\s*=\s*)(?:"([^"]*)"|'([^']*)')"#)
        .expect("hardcoded regex pattern is valid")
});

/// What the mirror knows about an attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkResolution {
    /// Saved at this mirror-relative reference
    Local(String),

    /// Known but not saved yet
    Pending,

    /// Not a link of this run, or one that will never be saved
    Unknown,
}

/// Result of a substitution pass over one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub content: String,

    /// Values replaced by local references
    pub replaced: usize,

    /// Values left alone because their target is still pending
    pub unresolved: usize,
}

/// Replaces every resolvable `href` / `src` value with its local reference
///
/// Values are resolved after decoding `&amp;`. A local reference is written as
/// `./` followed by the mirror-relative path, so it resolves against the
/// page's base tag.
///
/// # Arguments
///
/// * `content` - Page markup
/// * `resolve` - Maps an attribute value to what the mirror knows about it
pub fn substitute_links<F>(content: &str, mut resolve: F) -> Substitution
where
    F: FnMut(&str) -> LinkResolution,
{
    let mut replaced = 0;
    let mut unresolved = 0;

    let rewritten = LINK_ATTRIBUTE.replace_all(content, |caps: &Captures| {
        let value = caps
            .get(4)
            .or_else(|| caps.get(5))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let decoded = value.replace("&amp;", "&");

        match resolve(&decoded) {
            LinkResolution::Local(reference) => {
                replaced += 1;
                format!(
                    "{}{}{}\"./{}\"",
                    &caps[1],
                    &caps[2],
                    &caps[3],
                    reference.trim_start_matches('/')
                )
            }
            LinkResolution::Pending => {
                unresolved += 1;
                caps[0].to_string()
            }
            LinkResolution::Unknown => caps[0].to_string(),
        }
    });

    Substitution {
        content: rewritten.into_owned(),
        replaced,
        unresolved,
    }
}

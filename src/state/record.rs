use crate::config::DirectoryConfig;
use crate::state::LinkState;
use crate::url::CanonicalUrl;
use std::fmt;

/// What a link points to, decided from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Page,
    Css,
    Js,
    Image,
    Video,
    Audio,
    Unidentified,
}

impl AssetKind {
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page)
    }

    /// Anything that is not a page counts as a document in the statistics
    pub fn is_document(&self) -> bool {
        !self.is_page()
    }

    /// Subdirectory of the mirror (or external site prefix) this kind is stored in
    pub fn directory<'a>(&self, directories: &'a DirectoryConfig) -> &'a str {
        match self {
            Self::Page => &directories.pages,
            Self::Css => &directories.css,
            Self::Js => &directories.js,
            Self::Image => &directories.images,
            Self::Video | Self::Audio | Self::Unidentified => &directories.documents,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Css => "css",
            Self::Js => "js",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Unidentified => "unidentified",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything known about one unique link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// The reference as it was first seen
    pub raw: String,

    /// Canonical form; its string is the registry key
    pub url: CanonicalUrl,

    pub kind: AssetKind,

    /// Directory relative to the mirror root, empty or starting with '/'
    pub directory: String,

    /// File name starting with '/'
    pub filename: String,

    /// True when the link points to a host other than the target
    pub external: bool,

    pub state: LinkState,
}

impl LinkRecord {
    pub fn key(&self) -> &str {
        self.url.as_str()
    }

    /// Mirror-relative path of the stored file, e.g. `/css/site.css`
    pub fn local_reference(&self) -> String {
        format!("{}{}", self.directory, self.filename)
    }

    /// Number of directory levels between the mirror root and this record's file
    pub fn depth_below_root(&self) -> usize {
        self.directory.split('/').filter(|s| !s.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::{canonicalize, ConnectionContext};

    fn record(directory: &str, filename: &str) -> LinkRecord {
        let ctx = ConnectionContext::new("http", "example.com");
        LinkRecord {
            raw: "/x".to_string(),
            url: canonicalize("/x", &ctx).unwrap(),
            kind: AssetKind::Page,
            directory: directory.to_string(),
            filename: filename.to_string(),
            external: false,
            state: LinkState::Discovered,
        }
    }

    #[test]
    fn test_local_reference() {
        assert_eq!(record("", "/index.html").local_reference(), "/index.html");
        assert_eq!(
            record("/pages/about", "/index.html").local_reference(),
            "/pages/about/index.html"
        );
    }

    #[test]
    fn test_depth_below_root() {
        assert_eq!(record("", "/index.html").depth_below_root(), 0);
        assert_eq!(record("/pages/a/b", "/index.html").depth_below_root(), 3);
    }

    #[test]
    fn test_kind_directory() {
        let dirs = DirectoryConfig::default();
        assert_eq!(AssetKind::Page.directory(&dirs), "/pages");
        assert_eq!(AssetKind::Image.directory(&dirs), "/img");
        assert_eq!(AssetKind::Video.directory(&dirs), "/data");
        assert_eq!(AssetKind::Unidentified.directory(&dirs), "/data");
    }

    #[test]
    fn test_is_document() {
        assert!(!AssetKind::Page.is_document());
        assert!(AssetKind::Css.is_document());
        assert!(AssetKind::Audio.is_document());
    }
}

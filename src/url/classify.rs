use crate::config::DirectoryConfig;
use crate::state::{AssetKind, LinkRecord, LinkState};
use crate::url::canonicalize::{sanitize_segment, CanonicalUrl};

/// Default document written for a page whose path does not name a file
pub const INDEX_FILE: &str = "/index.html";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpeg", "jpg", "webp", "gif", "svg", "ico"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogv", "avi", "mov", "mkv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "oga", "flac", "m4a", "aac"];
const PAGE_SUFFIXES: &[&str] = &[".html", ".htm", ".php"];

/// Determines the kind of a link and where it lives inside the mirror
///
/// Classification is a pure function of its inputs, so the same link always
/// maps to the same local path.
///
/// # Arguments
///
/// * `raw` - The reference as it appeared in the page
/// * `url` - Its canonical form
/// * `target` - Canonical form of the starting link
/// * `directories` - Per-kind subdirectories
///
/// # Returns
///
/// A record in the `Discovered` state. Its directory is relative to the mirror
/// root and its filename starts with '/'.
///
/// # Examples
///
/// ```
/// use sumi_mirror::config::DirectoryConfig;
/// use sumi_mirror::url::{canonicalize, classify, ConnectionContext};
/// use sumi_mirror::AssetKind;
///
/// let ctx = ConnectionContext::new("https", "example.com");
/// let target = canonicalize("/", &ctx).unwrap();
/// let url = canonicalize("/css/site.css", &ctx).unwrap();
///
/// let record = classify("/css/site.css", &url, &target, &DirectoryConfig::default());
/// assert_eq!(record.kind, AssetKind::Css);
/// assert_eq!(record.local_reference(), "/css/site.css");
/// ```
pub fn classify(
    raw: &str,
    url: &CanonicalUrl,
    target: &CanonicalUrl,
    directories: &DirectoryConfig,
) -> LinkRecord {
    let external = url.host() != target.host();
    let site_prefix = if external {
        format!("{}/{}", directories.external, sanitize_segment(url.host()))
    } else {
        String::new()
    };

    let (kind, directory, filename) = if url == target {
        (AssetKind::Page, String::new(), INDEX_FILE.to_string())
    } else {
        let kind = kind_for_extension(url.extension().as_deref());
        let (directory, filename) = match kind {
            AssetKind::Page => page_location(url, &site_prefix, directories),
            _ => asset_location(url, kind, &site_prefix, directories),
        };
        (kind, directory, filename)
    };

    LinkRecord {
        raw: raw.to_string(),
        url: url.clone(),
        kind,
        directory,
        filename,
        external,
        state: LinkState::Discovered,
    }
}

/// Maps a lowercase extension to an asset kind
///
/// No extension, or one starting with `htm` or `php`, means a page. Any other
/// extension that is not recognised is an unidentified document.
pub fn kind_for_extension(extension: Option<&str>) -> AssetKind {
    let Some(ext) = extension else {
        return AssetKind::Page;
    };

    match ext {
        "css" => AssetKind::Css,
        "js" => AssetKind::Js,
        e if IMAGE_EXTENSIONS.contains(&e) => AssetKind::Image,
        e if VIDEO_EXTENSIONS.contains(&e) => AssetKind::Video,
        e if AUDIO_EXTENSIONS.contains(&e) => AssetKind::Audio,
        e if e.starts_with("htm") || e.starts_with("php") => AssetKind::Page,
        _ => AssetKind::Unidentified,
    }
}

/// Whether the extension maps to a kind other than an unidentified document
pub(crate) fn is_known_extension(extension: &str) -> bool {
    kind_for_extension(Some(extension)) != AssetKind::Unidentified
}

/// Pages keep their whole path as directories
///
/// A final segment that already names an HTML or PHP document becomes the
/// filename; otherwise the page is stored as `index.html` in its own directory.
fn page_location(
    url: &CanonicalUrl,
    site_prefix: &str,
    directories: &DirectoryConfig,
) -> (String, String) {
    let mut segments = url.local_segments();

    let names_document = segments.last().is_some_and(|last| {
        let lower = last.to_ascii_lowercase();
        PAGE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
    });

    let filename = match segments.pop() {
        Some(last) if names_document => format!("/{}", last),
        Some(last) => {
            segments.push(last);
            INDEX_FILE.to_string()
        }
        None => INDEX_FILE.to_string(),
    };

    let mut directory = format!("{}{}", site_prefix, directories.pages);
    for segment in &segments {
        directory.push('/');
        directory.push_str(segment);
    }

    (directory, filename)
}

/// Every other kind is flattened into its kind directory under its file name
fn asset_location(
    url: &CanonicalUrl,
    kind: AssetKind,
    site_prefix: &str,
    directories: &DirectoryConfig,
) -> (String, String) {
    let name = url.local_segments().pop().unwrap_or_default();
    let directory = format!("{}{}", site_prefix, kind.directory(directories));
    (directory, format!("/{}", name))
}

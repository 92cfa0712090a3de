use crate::config::CrawlOptions;
use crate::state::LinkRecord;
use crate::url::{CanonicalUrl, ConnectionContext};
use std::path::PathBuf;

/// Fixed facts of one mirror run
///
/// Built once the starting link has been resolved and read by every stage.
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// Canonical form of the starting link
    pub target: CanonicalUrl,

    /// Scheme and host relative references resolve against
    pub connection: ConnectionContext,

    pub options: CrawlOptions,

    /// Root directory of the mirror on disk
    pub mirror_root: PathBuf,
}

impl CrawlState {
    pub fn new(
        target: CanonicalUrl,
        connection: ConnectionContext,
        options: CrawlOptions,
        mirror_root: PathBuf,
    ) -> Self {
        Self {
            target,
            connection,
            options,
            mirror_root,
        }
    }

    /// Whether a registered link should be fetched at all
    pub fn follows(&self, record: &LinkRecord) -> bool {
        !record.external || self.options.allow_external
    }

    /// Absolute path of a mirror-relative reference such as `/css/site.css`
    pub fn local_path(&self, reference: &str) -> PathBuf {
        self.mirror_root.join(reference.trim_start_matches('/'))
    }
}

/// Link state definitions for tracking mirror progress
///
/// Every registered link moves forward through these states; none moves back.
use std::fmt;

/// Represents the current state of a link in the mirror process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    // ===== Active States =====
    /// Link has been registered but not yet queued
    Discovered,

    /// Link is waiting in the pending queue
    Queued,

    /// Link is currently being fetched
    Fetching,

    /// Body is held in the write buffer
    Fetched,

    // ===== Terminal States =====
    /// Body was written to (or already present in) the mirror
    Saved,

    /// Fetch or persistence failed
    Failed,

    /// Link points to another host and external crawling is off
    NotFollowed,
}

impl LinkState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Saved | Self::Failed | Self::NotFollowed)
    }

    /// Returns true while the link's body may still land in the mirror
    ///
    /// A page linking to such a link is kept for another rewrite pass.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Discovered | Self::Queued | Self::Fetching | Self::Fetched
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Saved => "saved",
            Self::Failed => "failed",
            Self::NotFollowed => "not_followed",
        }
    }

    /// Returns all possible link states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Discovered,
            Self::Queued,
            Self::Fetching,
            Self::Fetched,
            Self::Saved,
            Self::Failed,
            Self::NotFollowed,
        ]
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Link handling module for Sumi-Mirror
//!
//! This module turns raw references found in pages into canonical URLs and
//! local mirror paths:
//! - Blacklist screening and separator cleanup (`filter`)
//! - Resolution against the connection context (`canonicalize`)
//! - Asset kind and local path assignment (`classify`)

mod canonicalize;
mod classify;
mod filter;

// Re-export main types and functions
pub use canonicalize::{canonicalize, sanitize_segment, CanonicalUrl, ConnectionContext};
pub use classify::{classify, kind_for_extension, INDEX_FILE};
pub use filter::LinkFilter;

//! State module for tracking mirror progress
//!
//! This module provides the bookkeeping shared by every stage of a run.
//!
//! # Components
//!
//! - `LinkState`: Lifecycle of a single link (discovered, queued, fetching, saved, etc.)
//! - `LinkRecord` / `AssetKind`: What a link is and where it lives in the mirror
//! - `LinkRegistry`: Every unique link of the run, with raw-spelling aliases
//! - `PendingQueue`: Links waiting to be fetched
//! - `CrawlState`: Target, connection context and options of the run

mod crawl_state;
mod link_state;
mod record;
mod registry;

// Re-export main types
pub use crawl_state::CrawlState;
pub use link_state::LinkState;
pub use record::{AssetKind, LinkRecord};
pub use registry::{LinkRegistry, PendingQueue};

//! Crawler module for fetching and mirroring a site
//!
//! This module contains the core mirroring logic, including:
//! - HTTP fetching behind a swappable `Fetcher` trait
//! - HTML parsing and link candidate extraction
//! - Overall run coordination across depth levels

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{run_mirror, CancelHandle, Coordinator};
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher, HttpFetcher};
pub use parser::{parse_html, ParsedPage};

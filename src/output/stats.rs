//! Run statistics
//!
//! Counters are owned by the coordinator and updated as links move through
//! the run; classification counters change exactly once per unique link.

use crate::state::AssetKind;

/// Counters of one mirror run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    // ===== Links =====
    /// Every href/src candidate extracted from fetched pages
    pub links_found: u64,

    /// Candidates that passed the blacklist and were not seen verbatim before
    pub links_processed: u64,

    /// Distinct canonical URLs registered
    pub links_unique: u64,

    /// Candidates that resolved to an already registered link
    pub links_deduplicated: u64,

    /// Candidates rejected as malformed or non-HTTP
    pub links_rejected: u64,

    /// Candidates rejected by the blacklist
    pub links_blacklisted: u64,

    // ===== Pages =====
    pub pages_found: u64,

    /// Saved pages rewritten for offline browsing
    pub pages_converted: u64,

    // ===== Documents =====
    /// Every non-page link; the sum of the per-kind counters below
    pub documents_found: u64,
    pub images: u64,
    pub videos: u64,
    pub audio: u64,
    pub css: u64,
    pub js: u64,
    pub unidentified: u64,

    // ===== Outcomes =====
    pub fetch_errors: u64,

    /// Files written to the mirror
    pub files_written: u64,

    /// Existing files left untouched because overwriting is off
    pub files_kept: u64,

    pub persist_errors: u64,
    pub rewrite_errors: u64,

    /// Largest number of bodies held in memory at once
    pub peak_buffered: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a newly registered link under its kind
    pub fn record_classified(&mut self, kind: AssetKind) {
        self.links_unique += 1;

        match kind {
            AssetKind::Page => {
                self.pages_found += 1;
                return;
            }
            AssetKind::Css => self.css += 1,
            AssetKind::Js => self.js += 1,
            AssetKind::Image => self.images += 1,
            AssetKind::Video => self.videos += 1,
            AssetKind::Audio => self.audio += 1,
            AssetKind::Unidentified => self.unidentified += 1,
        }
        self.documents_found += 1;
    }

    pub fn total_errors(&self) -> u64 {
        self.fetch_errors + self.persist_errors + self.rewrite_errors
    }

    /// Counter names and values in report order
    pub fn entries(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("Links found", self.links_found),
            ("Links processed", self.links_processed),
            ("Links unique", self.links_unique),
            ("Links deduplicated", self.links_deduplicated),
            ("Links rejected", self.links_rejected),
            ("Links blacklisted", self.links_blacklisted),
            ("Pages found", self.pages_found),
            ("Pages converted", self.pages_converted),
            ("Documents found", self.documents_found),
            ("Images", self.images),
            ("Videos", self.videos),
            ("Audio", self.audio),
            ("CSS", self.css),
            ("JS", self.js),
            ("Unidentified", self.unidentified),
            ("Fetch errors", self.fetch_errors),
            ("Files written", self.files_written),
            ("Files kept", self.files_kept),
            ("Persist errors", self.persist_errors),
            ("Rewrite errors", self.rewrite_errors),
            ("Peak buffered", self.peak_buffered),
        ]
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &Statistics) {
    println!("=== Mirror Statistics ===\n");

    println!("Links:");
    println!("  Found: {}", stats.links_found);
    println!("  Processed: {}", stats.links_processed);
    println!("  Unique: {}", stats.links_unique);
    println!(
        "  Skipped: {} duplicate, {} rejected, {} blacklisted",
        stats.links_deduplicated, stats.links_rejected, stats.links_blacklisted
    );
    println!();

    println!("Pages:");
    println!("  Found: {}", stats.pages_found);
    println!("  Converted: {}", stats.pages_converted);
    println!();

    println!("Documents: {}", stats.documents_found);
    for (label, count) in [
        ("Images", stats.images),
        ("Videos", stats.videos),
        ("Audio", stats.audio),
        ("CSS", stats.css),
        ("JS", stats.js),
        ("Unidentified", stats.unidentified),
    ] {
        if count > 0 {
            println!("  {}: {}", label, count);
        }
    }
    println!();

    println!(
        "Files: {} written, {} kept",
        stats.files_written, stats.files_kept
    );

    if stats.total_errors() > 0 {
        println!(
            "Errors: {} fetch, {} persist, {} rewrite",
            stats.fetch_errors, stats.persist_errors, stats.rewrite_errors
        );
    }
}

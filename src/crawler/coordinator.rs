//! Crawler coordinator - main mirror orchestration logic
//!
//! This module contains the depth loop that coordinates every stage of a run:
//! - Resolving the starting link and preparing the mirror root
//! - Fetching pending links through a bounded pool of concurrent requests
//! - Extracting, filtering, canonicalizing and classifying new links
//! - Flushing the write buffer and rewriting saved pages after every level
//! - Stopping early on cancellation without losing buffered content

use crate::config::{parse_timezone, Config, CrawlOptions};
use crate::crawler::fetcher::{FetchResult, Fetcher, HttpFetcher};
use crate::crawler::parser::parse_html;
use crate::output::{RunReport, RunStatus, Statistics};
use crate::rewrite::{rewrite_page, LinkResolution};
use crate::state::{CrawlState, LinkRegistry, LinkState, PendingQueue};
use crate::storage::{
    self, BufferedStore, ContentKind, FetchedBody, FileSystem, FlushReport, LocalFileSystem,
};
use crate::url::{canonicalize, classify, ConnectionContext, LinkFilter};
use crate::{MirrorError, Result};
use chrono::{FixedOffset, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared flag that stops a run from issuing new fetches
///
/// Buffered content is still flushed and rewritten after cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Rewrite bookkeeping for one saved page
#[derive(Debug, Default)]
struct PageRewrite {
    /// Written back at least once
    converted: bool,

    /// Attribute values this rewriter produced; never resolved again
    emitted: HashSet<String>,
}

/// Mutable state of a single run
struct MirrorRun {
    state: CrawlState,
    registry: LinkRegistry,
    pending: PendingQueue,
    store: BufferedStore,
    rewrites: BTreeMap<String, PageRewrite>,
    stats: Statistics,
    flushed_ok: bool,
}

/// Main mirror coordinator structure
///
/// Holds configuration and collaborators; every call to [`Coordinator::run`]
/// starts from an empty registry, so one coordinator can mirror several sites
/// one after another.
pub struct Coordinator {
    config: Arc<Config>,
    options: CrawlOptions,
    fetcher: Arc<dyn Fetcher>,
    fs: Arc<dyn FileSystem>,
    filter: LinkFilter,
    timezone: FixedOffset,
    config_hash: Option<String>,
    cancel: CancelHandle,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP and writes to the local disk
    ///
    /// # Arguments
    ///
    /// * `config` - The mirror configuration
    /// * `options` - Resolved run options (config overridden by the command line)
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(MirrorError)` - Invalid configuration or HTTP client failure
    pub fn new(config: Config, options: CrawlOptions) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.http)?);
        Self::with_components(config, options, fetcher, Arc::new(LocalFileSystem::new()))
    }

    /// Creates a coordinator over the given collaborators
    pub fn with_components(
        config: Config,
        options: CrawlOptions,
        fetcher: Arc<dyn Fetcher>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let timezone = parse_timezone(&config.mirror.timezone)?;
        let filter = LinkFilter::from_config(&config.filter)?;

        Ok(Self {
            config: Arc::new(config),
            options,
            fetcher,
            fs,
            filter,
            timezone,
            config_hash: None,
            cancel: CancelHandle::default(),
        })
    }

    /// Records the configuration file hash in every report
    pub fn with_config_hash(mut self, hash: Option<String>) -> Self {
        self.config_hash = hash;
        self
    }

    /// Handle that cancels runs of this coordinator from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Mirrors the site behind `link`
    ///
    /// Per-link failures are counted, never returned. A blacklisted or
    /// malformed starting link yields a failed report.
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run finished (successfully or not)
    /// * `Err(MirrorError::OutputRoot)` - The mirror root cannot be created
    pub async fn run(&self, link: &str) -> Result<RunReport> {
        let started_at = Utc::now().with_timezone(&self.timezone);
        let clock = Instant::now();
        let output_path = self.config.mirror.output_path.clone();
        let mirror_root = PathBuf::from(&output_path);

        storage::prepare_root(self.fs.as_ref(), &mirror_root).map_err(|source| {
            MirrorError::OutputRoot {
                path: output_path.clone(),
                source,
            }
        })?;

        let start = match self.filter.apply(link.trim()) {
            Ok(start) => start,
            Err(e) => {
                tracing::warn!("Refusing to mirror {}: {}", link, e);
                return Ok(self.failed_report(link, started_at, &output_path, e.to_string()));
            }
        };

        let connection = ConnectionContext::from_start(&start, &self.config.http);
        let target = match canonicalize(&start, &connection) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!("Refusing to mirror {}: {}", link, e);
                return Ok(self.failed_report(link, started_at, &output_path, e.to_string()));
            }
        };

        tracing::info!(
            "Mirroring {} into {} (depth {}, buffer {}, concurrency {})",
            target,
            mirror_root.display(),
            self.options.depth,
            self.options.buffer,
            self.options.concurrency
        );

        let store = BufferedStore::new(
            Arc::clone(&self.fs),
            mirror_root.clone(),
            self.options.buffer,
            self.options.force,
        );
        let mut run = MirrorRun {
            state: CrawlState::new(target.clone(), connection, self.options.clone(), mirror_root),
            registry: LinkRegistry::new(),
            pending: PendingQueue::new(),
            store,
            rewrites: BTreeMap::new(),
            stats: Statistics::new(),
            flushed_ok: false,
        };

        let mut root = classify(&start, &target, &target, &self.config.directories);
        root.state = LinkState::Queued;
        run.stats.record_classified(root.kind);
        run.pending.push_front(root.key());
        run.registry.insert(root);

        self.download(&mut run).await;
        log_link_states(&run.registry);

        let status = if run.flushed_ok {
            RunStatus::Success
        } else {
            RunStatus::Failed
        };
        run.stats.peak_buffered = run.store.peak() as u64;

        tracing::info!(
            "Mirror of {} finished with status {}: {} pages, {} documents, {} errors",
            target,
            status,
            run.stats.pages_found,
            run.stats.documents_found,
            run.stats.total_errors()
        );

        Ok(RunReport {
            request: link.to_string(),
            started_at,
            elapsed: clock.elapsed(),
            status,
            cancelled: self.cancel.is_cancelled(),
            mirror_root: output_path,
            config_hash: self.config_hash.clone(),
            error: None,
            statistics: run.stats,
        })
    }

    /// Failed report for a run that ended with `error` instead of a report
    ///
    /// Lets the caller record runs that never got past the output root.
    pub fn error_report(&self, link: &str, error: &MirrorError) -> RunReport {
        let started_at = Utc::now().with_timezone(&self.timezone);
        self.failed_report(link, started_at, &self.config.mirror.output_path, error.to_string())
    }

    fn failed_report(
        &self,
        link: &str,
        started_at: chrono::DateTime<FixedOffset>,
        output_path: &str,
        error: String,
    ) -> RunReport {
        RunReport::failed(link, started_at, output_path, error)
            .with_config_hash(self.config_hash.clone())
    }

    /// Top-level depth loop
    ///
    /// Fetches the seeded root, then runs one nested fetch pass per depth
    /// level, each followed by a flush and a rewrite pass. Nested passes never
    /// start a depth loop of their own.
    async fn download(&self, run: &mut MirrorRun) {
        let depth = run.state.options.depth;

        self.fetch_level(run, depth).await;

        for level in 1..=depth {
            if self.cancel.is_cancelled() {
                tracing::warn!("Run cancelled at depth level {}/{}", level, depth);
                break;
            }
            if run.pending.is_empty() {
                tracing::debug!("Nothing pending at depth level {}/{}", level, depth);
                break;
            }

            tracing::info!(
                "Depth level {}/{}: {} links pending",
                level,
                depth,
                run.pending.len()
            );

            self.fetch_level(run, depth - level).await;

            let flushed = run.store.flush();
            self.absorb_flush(run, flushed);
            self.rewrite_pages(run, false);
        }

        let flushed = run.store.flush();
        self.absorb_flush(run, flushed);
        self.rewrite_pages(run, true);
    }

    /// Fetches every pending link concurrently and processes the results
    ///
    /// Results are consumed one at a time, so registry updates and buffer puts
    /// are serialized.
    ///
    /// # Arguments
    ///
    /// * `run` - The run in progress
    /// * `remaining` - Depth left below the pages fetched in this pass
    async fn fetch_level(&self, run: &mut MirrorRun, remaining: u32) {
        let mut jobs = Vec::new();
        for key in run.pending.drain() {
            let Some(record) = run.registry.get(&key) else {
                continue;
            };
            let url = record.url.as_str().to_string();
            run.registry.set_state(&key, LinkState::Fetching);
            jobs.push((key, url));
        }

        if jobs.is_empty() {
            return;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let cancel = self.cancel.clone();
        let mut results = stream::iter(jobs.into_iter().map(|(key, url)| {
            let fetcher = Arc::clone(&fetcher);
            let cancel = cancel.clone();
            async move {
                if cancel.is_cancelled() {
                    return (key, None);
                }
                tracing::debug!("Fetching {}", url);
                let result = fetcher.fetch(&url).await;
                (key, Some(result))
            }
        }))
        .buffer_unordered(run.state.options.concurrency.max(1));

        while let Some((key, result)) = results.next().await {
            match result {
                Some(result) => self.handle_fetched(run, &key, result, remaining),
                None => {
                    run.registry.set_state(&key, LinkState::Queued);
                }
            }
        }
    }

    /// Extracts links from a fetched page and buffers its body
    fn handle_fetched(&self, run: &mut MirrorRun, key: &str, result: FetchResult, remaining: u32) {
        let Some(record) = run.registry.get(key).cloned() else {
            return;
        };

        let body = match result {
            FetchResult::Success {
                body, status_code, ..
            } => {
                tracing::debug!("Fetched {} ({}, {} bytes)", key, status_code, body.len());
                body
            }
            failure => {
                let error = MirrorError::FetchFailed {
                    url: key.to_string(),
                    reason: failure.failure_reason().unwrap_or_default(),
                };
                tracing::warn!("{}", error);
                run.stats.fetch_errors += 1;
                run.registry.set_state(key, LinkState::Failed);
                return;
            }
        };

        if record.kind.is_page() && remaining > 0 && run.state.follows(&record) {
            let html = String::from_utf8_lossy(&body);
            let parsed = parse_html(&html);
            tracing::debug!(
                "Extracted {} link candidates from {} ({})",
                parsed.links.len(),
                key,
                parsed.title.as_deref().unwrap_or("untitled")
            );
            for raw in &parsed.links {
                self.discover(run, raw);
            }
        }

        run.registry.set_state(key, LinkState::Fetched);

        let content = if record.kind.is_page() {
            ContentKind::Html
        } else {
            ContentKind::Binary
        };
        let flushed = run.store.put(FetchedBody {
            key: key.to_string(),
            directory: record.directory,
            filename: record.filename,
            body,
            content,
        });
        if let Some(flushed) = flushed {
            self.absorb_flush(run, flushed);
        }
    }

    /// Registers one raw link candidate
    ///
    /// Blacklisted, malformed and already known links are counted and dropped.
    /// A new link is classified exactly once and queued if it is followed.
    fn discover(&self, run: &mut MirrorRun, raw: &str) {
        run.stats.links_found += 1;

        let link = match self.filter.apply(raw) {
            Ok(link) => link,
            Err(e) => {
                tracing::debug!("{}", e);
                run.stats.links_blacklisted += 1;
                return;
            }
        };

        if run.registry.contains_raw(&link) {
            run.stats.links_deduplicated += 1;
            return;
        }
        run.stats.links_processed += 1;

        let url = match canonicalize(&link, &run.state.connection) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("{}", e);
                run.stats.links_rejected += 1;
                return;
            }
        };

        if run.registry.contains(url.as_str()) {
            run.registry.alias(&link, url.as_str());
            run.stats.links_deduplicated += 1;
            return;
        }

        let mut record = classify(&link, &url, &run.state.target, &self.config.directories);
        run.stats.record_classified(record.kind);

        let key = record.key().to_string();
        if run.state.follows(&record) {
            record.state = LinkState::Queued;
            run.registry.insert(record);
            run.pending.push_front(&key);
        } else {
            tracing::debug!("Not following external link {}", key);
            record.state = LinkState::NotFollowed;
            run.registry.insert(record);
        }
    }

    /// Applies the outcome of a flush to the registry and statistics
    fn absorb_flush(&self, run: &mut MirrorRun, flushed: FlushReport) {
        if flushed.is_empty() {
            return;
        }

        run.stats.files_written += flushed.written_count() as u64;
        run.stats.files_kept += flushed.kept_count() as u64;
        if flushed.is_clean() {
            run.flushed_ok = true;
        }

        tracing::debug!(
            "Flushed {} entries ({} written, {} failed)",
            flushed.saved.len() + flushed.failed.len(),
            flushed.written_count(),
            flushed.failed.len()
        );

        for entry in flushed.saved {
            run.registry.set_state(&entry.key, LinkState::Saved);
            if entry.content == ContentKind::Html && entry.written {
                run.rewrites.entry(entry.key).or_default();
            }
        }

        for failed in flushed.failed {
            let error = MirrorError::PersistenceFailed {
                path: failed.path.display().to_string(),
                source: failed.error,
            };
            tracing::warn!("{}", error);
            run.stats.persist_errors += 1;
            run.registry.set_state(&failed.key, LinkState::Failed);
        }
    }

    /// Rewrites saved pages so their links point into the mirror
    ///
    /// A page stays in the rewrite set while some of its links are still on
    /// their way to the mirror, or when writing it back failed. The final pass
    /// empties the set.
    fn rewrite_pages(&self, run: &mut MirrorRun, final_pass: bool) {
        let keys: Vec<String> = run.rewrites.keys().cloned().collect();

        for key in keys {
            let keep = self.rewrite_one(run, &key, final_pass);
            if !keep || final_pass {
                run.rewrites.remove(&key);
            }
        }
    }

    /// Rewrites one page; returns true if it needs another pass
    fn rewrite_one(&self, run: &mut MirrorRun, key: &str, final_pass: bool) -> bool {
        let Some(record) = run.registry.get(key).cloned() else {
            return false;
        };
        let path = run.state.local_path(&record.local_reference());

        let bytes = match self.fs.read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let error = MirrorError::RewriteFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                };
                tracing::warn!("{}", error);
                run.stats.rewrite_errors += 1;
                return false;
            }
        };

        let Ok(html) = String::from_utf8(bytes) else {
            tracing::debug!("Leaving non UTF-8 page {} untouched", path.display());
            return false;
        };

        let Some(page) = run.rewrites.get(key) else {
            return false;
        };
        let mut emitted = Vec::new();
        let registry = &run.registry;
        let connection = &run.state.connection;
        let result = rewrite_page(&html, &record.directory, |value| {
            if page.emitted.contains(value) {
                return LinkResolution::Unknown;
            }
            let resolution = resolve_link(registry, connection, value);
            if let LinkResolution::Local(reference) = &resolution {
                emitted.push(format!("./{}", reference.trim_start_matches('/')));
            }
            resolution
        });

        let unresolved = result.unresolved;
        if let Err(e) = self.fs.write(&path, result.content.as_bytes()) {
            let error = MirrorError::RewriteFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            };
            tracing::warn!("{}", error);
            run.stats.rewrite_errors += 1;
            return true;
        }

        let Some(page) = run.rewrites.get_mut(key) else {
            return false;
        };
        page.emitted.extend(emitted);
        if !page.converted {
            page.converted = true;
            run.stats.pages_converted += 1;
        }

        tracing::debug!(
            "Rewrote {} ({} links replaced, {} pending)",
            path.display(),
            result.replaced,
            unresolved
        );

        unresolved > 0 && !final_pass
    }
}

/// Logs how many registered links ended in each state
fn log_link_states(registry: &LinkRegistry) {
    for state in LinkState::all_states() {
        let count = registry.count_in_state(state);
        if count > 0 {
            tracing::debug!("{} of {} links {}", count, registry.len(), state);
        }
    }

    let unfinished = registry.iter().filter(|r| !r.state.is_terminal()).count();
    if unfinished > 0 {
        tracing::warn!("{} links were left unfetched", unfinished);
    }
}

/// Maps an attribute value from a saved page to what the mirror holds for it
fn resolve_link(
    registry: &LinkRegistry,
    connection: &ConnectionContext,
    value: &str,
) -> LinkResolution {
    let value = value.trim().replace('\\', "/");

    let record = registry.get_by_raw(&value).or_else(|| {
        canonicalize(&value, connection)
            .ok()
            .and_then(|url| registry.get(url.as_str()))
    });

    match record {
        Some(record) if record.state == LinkState::Saved => {
            LinkResolution::Local(record.local_reference())
        }
        Some(record) if record.state.is_in_flight() => LinkResolution::Pending,
        _ => LinkResolution::Unknown,
    }
}

/// Mirrors a site with a freshly built coordinator
///
/// # Arguments
///
/// * `config` - The mirror configuration
/// * `options` - Resolved run options
/// * `link` - The starting link
///
/// # Returns
///
/// * `Ok(RunReport)` - The run finished
/// * `Err(MirrorError)` - Invalid configuration or unusable output root
///
/// # Example
///
/// ```no_run
/// use sumi_mirror::config::{Config, CrawlOptions};
/// use sumi_mirror::crawler::run_mirror;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_mirror(Config::default(), CrawlOptions::default(), "example.com").await?;
/// println!("{}", report.status);
/// # Ok(())
/// # }
/// ```
pub async fn run_mirror(config: Config, options: CrawlOptions, link: &str) -> Result<RunReport> {
    Coordinator::new(config, options)?.run(link).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serves canned responses and records every requested URL
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, FetchResult>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                FetchResult::Success {
                    final_url: url.to_string(),
                    status_code: 200,
                    content_type: "text/html".to_string(),
                    body: body.as_bytes().to_vec(),
                },
            );
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> FetchResult {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .unwrap_or(FetchResult::HttpError { status_code: 404 })
        }
    }

    fn create_test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.mirror.output_path = dir.path().join("mirror").display().to_string();
        config.mirror.timezone = "UTC".to_string();
        config
    }

    fn coordinator(config: Config, options: CrawlOptions, fetcher: Arc<FakeFetcher>) -> Coordinator {
        Coordinator::with_components(config, options, fetcher, Arc::new(LocalFileSystem::new()))
            .unwrap()
    }

    fn options(depth: u32) -> CrawlOptions {
        CrawlOptions {
            depth,
            buffer: 10,
            ..CrawlOptions::default()
        }
    }

    #[tokio::test]
    async fn test_depth_zero_fetches_only_root() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            FakeFetcher::default().with("http://site.test/", r#"<head></head><a href="/about">a</a>"#),
        );
        let coord = coordinator(create_test_config(&dir), options(0), fetcher.clone());

        let report = coord.run("http://site.test/").await.unwrap();

        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(fetcher.requested(), vec!["http://site.test/"]);
        assert_eq!(report.statistics.pages_found, 1);
        assert_eq!(report.statistics.pages_converted, 1);
        assert_eq!(report.statistics.links_found, 0);
        assert!(dir.path().join("mirror/index.html").exists());
    }

    #[tokio::test]
    async fn test_links_are_fetched_once() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with(
                    "http://site.test/",
                    r#"<a href="/a">1</a><a href="/a/">2</a><a href="http://site.test/a">3</a><a href="/">home</a>"#,
                )
                .with("http://site.test/a", r#"<a href="/">home</a><a href="/a">self</a>"#),
        );
        let coord = coordinator(create_test_config(&dir), options(3), fetcher.clone());

        let report = coord.run("site.test").await.unwrap();

        let mut requested = fetcher.requested();
        requested.sort();
        assert_eq!(requested, vec!["http://site.test/", "http://site.test/a"]);
        assert_eq!(report.statistics.links_found, 6);
        assert_eq!(report.statistics.links_unique, 2);
        assert_eq!(report.statistics.links_deduplicated, 5);
    }

    #[tokio::test]
    async fn test_counts_rejected_and_blacklisted_links() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(FakeFetcher::default().with(
            "http://site.test/",
            r##"<a href="javascript:void(0)">js</a>
               <a href="https://instagram.com/site">ig</a>
               <a href="tel:+1555">call</a>
               <a href="#top">top</a>"##,
        ));
        let coord = coordinator(create_test_config(&dir), options(1), fetcher);

        let report = coord.run("http://site.test/").await.unwrap();

        assert_eq!(report.statistics.links_found, 3);
        assert_eq!(report.statistics.links_blacklisted, 1);
        assert_eq!(report.statistics.links_rejected, 2);
        assert_eq!(report.statistics.links_unique, 1);
    }

    #[tokio::test]
    async fn test_blacklisted_start_link_fails_run() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(FakeFetcher::default());
        let coord = coordinator(create_test_config(&dir), options(1), fetcher.clone());

        let report = coord.run("https://www.instagram.com/").await.unwrap();

        assert_eq!(report.status, RunStatus::Failed);
        assert!(report.error.is_some());
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_failed_root_fetch_fails_run() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(FakeFetcher::default());
        let coord = coordinator(create_test_config(&dir), options(1), fetcher);

        let report = coord.run("http://site.test/").await.unwrap();

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.statistics.fetch_errors, 1);
        assert!(!dir.path().join("mirror/index.html").exists());
    }

    #[tokio::test]
    async fn test_unusable_output_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let mut config = create_test_config(&dir);
        config.mirror.output_path = blocker.join("mirror").display().to_string();
        let coord = coordinator(config, options(0), Arc::new(FakeFetcher::default()));

        let result = coord.run("http://site.test/").await;
        let Err(error) = result else {
            panic!("expected the run to fail");
        };
        assert!(matches!(error, MirrorError::OutputRoot { .. }));

        let report = coord.error_report("http://site.test/", &error);
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.request, "http://site.test/");
        assert!(report.error.unwrap().contains("unusable"));
    }

    #[tokio::test]
    async fn test_cancelled_run_issues_no_fetches() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(FakeFetcher::default().with("http://site.test/", "<p>hi</p>"));
        let coord = coordinator(create_test_config(&dir), options(2), fetcher.clone());

        coord.cancel_handle().cancel();
        let report = coord.run("http://site.test/").await.unwrap();

        assert!(report.cancelled);
        assert!(fetcher.requested().is_empty());
        assert_eq!(report.status, RunStatus::Failed);
    }

    /// Cancels its run once the first response has been served
    struct CancellingFetcher {
        inner: FakeFetcher,
        cancel: CancelHandle,
    }

    #[async_trait]
    impl Fetcher for CancellingFetcher {
        async fn fetch(&self, url: &str) -> FetchResult {
            let result = self.inner.fetch(url).await;
            self.cancel.cancel();
            result
        }
    }

    #[tokio::test]
    async fn test_cancel_mid_run_still_flushes_and_rewrites() {
        let dir = TempDir::new().unwrap();
        let pages = FakeFetcher::default()
            .with("http://site.test/", r#"<head></head><a href="/a">a</a><a href="/b">b</a>"#)
            .with("http://site.test/a", "<head></head>")
            .with("http://site.test/b", "<head></head>");

        let mut coord = Coordinator::with_components(
            create_test_config(&dir),
            CrawlOptions {
                depth: 2,
                buffer: 100,
                ..CrawlOptions::default()
            },
            Arc::new(FakeFetcher::default()),
            Arc::new(LocalFileSystem::new()),
        )
        .unwrap();
        let fetcher = Arc::new(CancellingFetcher {
            inner: pages,
            cancel: coord.cancel_handle(),
        });
        coord.fetcher = fetcher.clone() as Arc<dyn Fetcher>;

        let report = coord.run("http://site.test/").await.unwrap();

        assert!(report.cancelled);
        assert_eq!(fetcher.inner.requested(), vec!["http://site.test/"]);
        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(report.statistics.files_written, 1);
        assert_eq!(report.statistics.pages_converted, 1);

        let index = std::fs::read_to_string(dir.path().join("mirror/index.html")).unwrap();
        assert!(index.contains(r#"<base href="./">"#));
        assert!(index.contains(r#"href="/a""#));
        assert!(!dir.path().join("mirror/pages/a/index.html").exists());
    }

    #[tokio::test]
    async fn test_encoded_and_unencoded_paths_fetched_once() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with(
                    "http://site.test/",
                    r#"<a href="/café">1</a><a href="/caf%C3%A9">2</a><a href="http://site.test:80/caf%C3%A9/">3</a>"#,
                )
                .with("http://site.test/caf%C3%A9", "<head></head>"),
        );
        let coord = coordinator(create_test_config(&dir), options(1), fetcher.clone());

        let report = coord.run("http://site.test/").await.unwrap();

        let mut requested = fetcher.requested();
        requested.sort();
        assert_eq!(requested, vec!["http://site.test/", "http://site.test/caf%C3%A9"]);
        assert_eq!(report.statistics.pages_found, 2);
        assert_eq!(report.statistics.links_deduplicated, 2);
        assert!(dir.path().join("mirror/pages/caf%C3%A9/index.html").exists());
    }

    #[tokio::test]
    async fn test_page_rewritten_after_late_dependency() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with("http://site.test/", r#"<head></head><a href="/b">b</a>"#)
                .with("http://site.test/b", r#"<head></head><img src="/c.png">"#)
                .with("http://site.test/c.png", "PNG"),
        );
        let coord = coordinator(create_test_config(&dir), options(2), fetcher);

        let report = coord.run("http://site.test/").await.unwrap();

        let page_b = std::fs::read_to_string(dir.path().join("mirror/pages/b/index.html")).unwrap();
        assert!(page_b.contains(r#"<base href="../../">"#));
        assert!(page_b.contains(r#"src="./img/c.png""#));
        assert!(dir.path().join("mirror/img/c.png").exists());
        assert_eq!(report.statistics.pages_converted, 2);
        assert_eq!(report.statistics.images, 1);
    }

    #[test]
    fn test_resolve_link() {
        let ctx = ConnectionContext::new("http", "site.test");
        let target = canonicalize("/", &ctx).unwrap();
        let mut registry = LinkRegistry::new();

        let url = canonicalize("/s.css", &ctx).unwrap();
        let mut saved = classify("/s.css", &url, &target, &Default::default());
        saved.state = LinkState::Saved;
        registry.insert(saved);

        let url = canonicalize("/later", &ctx).unwrap();
        let mut queued = classify("/later", &url, &target, &Default::default());
        queued.state = LinkState::Queued;
        registry.insert(queued);

        assert_eq!(
            resolve_link(&registry, &ctx, "/s.css"),
            LinkResolution::Local("/css/s.css".to_string())
        );
        assert_eq!(
            resolve_link(&registry, &ctx, "http://site.test/s.css"),
            LinkResolution::Local("/css/s.css".to_string())
        );
        assert_eq!(resolve_link(&registry, &ctx, "/later"), LinkResolution::Pending);
        assert_eq!(resolve_link(&registry, &ctx, "/other"), LinkResolution::Unknown);
    }
}

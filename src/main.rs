//! Sumi-Mirror main entry point
//!
//! This is the command-line interface for the Sumi-Mirror offline site mirror.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_mirror::config::{load_config_with_hash, Config, CrawlOptions};
use sumi_mirror::output::{print_statistics, write_report, RunReport};
use sumi_mirror::url::{canonicalize, classify, ConnectionContext, LinkFilter};
use sumi_mirror::Coordinator;
use tracing_subscriber::EnvFilter;

/// Sumi-Mirror: an offline web site mirror
///
/// Sumi-Mirror downloads a page together with the stylesheets, scripts,
/// images and pages it links to, up to a given depth, and rewrites the saved
/// pages so the mirror can be browsed from disk.
#[derive(Parser, Debug)]
#[command(name = "sumi-mirror")]
#[command(version = "1.0.0")]
#[command(about = "An offline web site mirror", long_about = None)]
struct Cli {
    /// Starting link: a domain, a path or a full URL
    #[arg(value_name = "LINK")]
    link: String,

    /// How many link levels to follow from the starting page
    #[arg(short, long)]
    depth: Option<u32>,

    /// Number of fetched bodies held in memory before they are written
    #[arg(short, long)]
    buffer: Option<usize>,

    /// Overwrite files that already exist in the mirror
    #[arg(short, long)]
    force: bool,

    /// Follow links to other hosts
    #[arg(short = 'e', long)]
    allow_external: bool,

    /// Mirror root directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of concurrent fetches
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be mirrored without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Do not write a run report
    #[arg(long)]
    no_report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(output) = &cli.output {
        config.mirror.output_path = output.display().to_string();
    }
    let options = resolve_options(&cli, &config);

    if cli.dry_run {
        handle_dry_run(&cli.link, &config, &options);
        return Ok(());
    }

    handle_mirror(&cli, config, options, config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_mirror=info,warn"),
            1 => EnvFilter::new("sumi_mirror=debug,info"),
            2 => EnvFilter::new("sumi_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides on top of the `[crawler]` section
fn resolve_options(cli: &Cli, config: &Config) -> CrawlOptions {
    let mut options = CrawlOptions::from(&config.crawler);

    if let Some(depth) = cli.depth {
        options.depth = depth;
    }
    if let Some(buffer) = cli.buffer {
        options.buffer = buffer;
    }
    if let Some(concurrency) = cli.concurrency {
        options.concurrency = concurrency.max(1);
    }
    options.force |= cli.force;
    options.allow_external |= cli.allow_external;

    options
}

/// Handles the --dry-run mode: shows the resolved settings
fn handle_dry_run(link: &str, config: &Config, options: &CrawlOptions) {
    println!("=== Sumi-Mirror Dry Run ===\n");

    println!("Request: {}", link);
    print_root_mapping(link, config);

    println!("\nRun Options:");
    println!("  Depth: {}", options.depth);
    println!("  Buffer: {}", options.buffer);
    println!("  Concurrency: {}", options.concurrency);
    println!("  Force overwrite: {}", options.force);
    println!("  Allow external: {}", options.allow_external);

    println!("\nMirror:");
    println!("  Root: {}", config.mirror.output_path);
    println!("  Reports: {}", config.mirror.report_path);
    println!("  Timezone: {}", config.mirror.timezone);

    println!("\nDirectories:");
    println!("  Pages: {}", config.directories.pages);
    println!("  Documents: {}", config.directories.documents);
    println!("  Images: {}", config.directories.images);
    println!("  CSS: {}", config.directories.css);
    println!("  JS: {}", config.directories.js);
    println!("  External sites: {}", config.directories.external);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Max redirects: {}", config.http.max_redirects);

    if config.filter.blacklist.is_empty() {
        println!("\nBlacklist: (none)");
    } else {
        println!("\nBlacklist: {}", config.filter.blacklist);
    }

    println!("\n✓ Configuration is valid");
}

/// Shows where the starting link would be fetched from and saved to
fn print_root_mapping(link: &str, config: &Config) {
    let filter = match LinkFilter::from_config(&config.filter) {
        Ok(filter) => filter,
        Err(e) => {
            println!("  Invalid blacklist: {}", e);
            return;
        }
    };
    let start = match filter.apply(link.trim()) {
        Ok(start) => start,
        Err(e) => {
            println!("  Rejected: {}", e);
            return;
        }
    };

    let connection = ConnectionContext::from_start(&start, &config.http);
    println!("  Connection: {}://{}", connection.scheme, connection.host);

    match canonicalize(&start, &connection) {
        Ok(target) => {
            let root = classify(&start, &target, &target, &config.directories);
            println!("  Target: {}", target);
            println!("  Saved as: {}{}", config.mirror.output_path, root.local_reference());
        }
        Err(e) => println!("  Rejected: {}", e),
    }
}

/// Handles the main mirror operation
///
/// The process exits successfully whenever the run completes, whatever its
/// per-link errors; only configuration and output-root problems fail it.
async fn handle_mirror(
    cli: &Cli,
    config: Config,
    options: CrawlOptions,
    config_hash: Option<String>,
) -> Result<()> {
    let report_dir = PathBuf::from(&config.mirror.report_path);

    let coordinator = Coordinator::new(config, options)
        .context("Failed to initialize mirror")?
        .with_config_hash(config_hash);

    // Stop issuing fetches on Ctrl-C; buffered content is still written
    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing buffered work");
            cancel.cancel();
        }
    });

    let report = match coordinator.run(&cli.link).await {
        Ok(report) => report,
        Err(e) => {
            if !cli.no_report {
                save_report(&coordinator.error_report(&cli.link, &e), &report_dir);
            }
            return Err(e).with_context(|| format!("Failed to mirror {}", cli.link));
        }
    };

    if !cli.no_report {
        save_report(&report, &report_dir);
    }

    if !cli.quiet {
        println!();
        print_statistics(&report.statistics);
        println!("\nStatus: {} ({:.1}s)", report.status, report.elapsed.as_secs_f64());
    }

    Ok(())
}

/// Writes the run report; a failure here is logged, not fatal
fn save_report(report: &RunReport, directory: &Path) {
    match write_report(report, directory) {
        Ok(path) => tracing::info!("Run report written to {}", path.display()),
        Err(e) => tracing::error!("Failed to write run report: {}", e),
    }
}

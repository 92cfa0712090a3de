//! Integration tests for the mirror
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full fetch, save and rewrite cycle end-to-end on a temporary directory.

use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use sumi_mirror::config::{Config, CrawlOptions};
use sumi_mirror::crawler::Coordinator;
use sumi_mirror::output::RunStatus;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `mirror`
fn create_test_config(mirror: &Path) -> Config {
    let mut config = Config::default();
    config.mirror.output_path = mirror.display().to_string();
    config.mirror.timezone = "UTC".to_string();
    config.http.user_agent = "TestMirror".to_string();
    config
}

fn options(depth: u32, buffer: usize, force: bool) -> CrawlOptions {
    CrawlOptions {
        depth,
        buffer,
        concurrency: 4,
        force,
        allow_external: false,
    }
}

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_asset(server: &MockServer, route: &str, content_type: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", content_type),
        )
        .mount(server)
        .await;
}

/// Every HTML file below `root`
fn html_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().map(|e| e == "html").unwrap_or(false) {
                found.push(path);
            }
        }
    }
    found
}

/// Resolves every rewritten `./` reference of a saved page through its base tag
fn rewritten_targets(page: &Path) -> Vec<PathBuf> {
    let html = std::fs::read_to_string(page).unwrap();
    let document = Html::parse_document(&html);

    let base_selector = Selector::parse("base[href]").unwrap();
    let base = document
        .select(&base_selector)
        .next()
        .and_then(|b| b.value().attr("href"))
        .expect("rewritten page has a base tag")
        .to_string();

    let link_selector = Selector::parse("[href], [src]").unwrap();
    let page_dir = page.parent().unwrap();

    document
        .select(&link_selector)
        .filter(|element| element.value().name() != "base")
        .flat_map(|element| {
            ["href", "src"]
                .into_iter()
                .filter_map(|attr| element.value().attr(attr))
                .filter(|value| value.starts_with("./"))
                .map(|value| page_dir.join(&base).join(value.trim_start_matches("./")))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[tokio::test]
async fn test_depth_zero_saves_single_page() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body><a href="/about">About</a></body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("mirror");
    let coordinator =
        Coordinator::new(create_test_config(&mirror), options(0, 10, false)).unwrap();

    let report = coordinator.run(&server.uri()).await.unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(html_files(&mirror), vec![mirror.join("index.html")]);
    assert_eq!(report.statistics.pages_found, 1);
    assert_eq!(report.statistics.files_written, 1);
}

#[tokio::test]
async fn test_depth_one_mirrors_css_and_nested_page() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><head><link rel="stylesheet" href="/css/site.css"></head>
           <body><a href="/about">About</a></body></html>"#,
    )
    .await;
    mount_asset(&server, "/css/site.css", "text/css", "body { color: black; }").await;
    mount_html(
        &server,
        "/about",
        r#"<html><head></head><body><a href="/">Home</a></body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("mirror");
    let coordinator =
        Coordinator::new(create_test_config(&mirror), options(1, 10, false)).unwrap();

    let report = coordinator.run(&server.uri()).await.unwrap();
    let stats = &report.statistics;

    assert_eq!(report.status, RunStatus::Success);
    assert!(mirror.join("index.html").is_file());
    assert!(mirror.join("css/site.css").is_file());
    assert!(mirror.join("pages/about/index.html").is_file());
    assert_eq!(stats.pages_found, 2);
    assert_eq!(stats.pages_converted, 2);
    assert_eq!(stats.css, 1);
    assert_eq!(stats.documents_found, 1);
    assert_eq!(stats.fetch_errors, 0);

    let root = std::fs::read_to_string(mirror.join("index.html")).unwrap();
    assert!(root.contains(r#"<base href="./">"#));
    assert!(root.contains(r#"href="./css/site.css""#));
    assert!(root.contains(r#"href="./pages/about/index.html""#));

    let about = std::fs::read_to_string(mirror.join("pages/about/index.html")).unwrap();
    assert!(about.contains(r#"<base href="../../">"#));
    assert!(about.contains(r#"href="./index.html""#));
}

#[tokio::test]
async fn test_rewritten_links_resolve_to_saved_files() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><head><link href="/assets/site.css" rel="stylesheet">
           <script src="/assets/app.js"></script></head>
           <body><a href="/blog/post.html">Post</a><a href="/docs/guide">Guide</a>
           <img src="/images/logo.png"></body></html>"#,
    )
    .await;
    mount_asset(&server, "/assets/site.css", "text/css", "h1{}").await;
    mount_asset(&server, "/assets/app.js", "application/javascript", "void 0;").await;
    mount_asset(&server, "/images/logo.png", "image/png", "PNG").await;
    mount_html(
        &server,
        "/blog/post.html",
        r#"<html><head></head><body><img src="../images/logo.png"><a href="/docs/guide">g</a></body></html>"#,
    )
    .await;
    mount_html(
        &server,
        "/docs/guide",
        r#"<html><head></head><body><a href="/blog/post.html">p</a></body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("mirror");
    let coordinator =
        Coordinator::new(create_test_config(&mirror), options(2, 10, false)).unwrap();

    let report = coordinator.run(&server.uri()).await.unwrap();
    assert_eq!(report.status, RunStatus::Success);

    let pages = html_files(&mirror);
    assert_eq!(pages.len(), 3);

    for page in pages {
        let targets = rewritten_targets(&page);
        assert!(!targets.is_empty(), "{} has no rewritten links", page.display());
        for target in targets {
            assert!(
                target.is_file(),
                "{} links to missing {}",
                page.display(),
                target.display()
            );
        }
    }
}

#[tokio::test]
async fn test_external_links_are_recorded_not_fetched() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><head><link href="/css/site.css" rel="stylesheet"></head>
           <body><img src="https://other.example/x.png"></body></html>"#,
    )
    .await;
    mount_asset(&server, "/css/site.css", "text/css", "p{}").await;

    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("mirror");
    let coordinator =
        Coordinator::new(create_test_config(&mirror), options(1, 10, false)).unwrap();

    let report = coordinator.run(&server.uri()).await.unwrap();
    let stats = &report.statistics;

    assert_eq!(stats.images, 1);
    assert_eq!(stats.css, 1);
    assert_eq!(stats.fetch_errors, 0);
    assert!(mirror.join("css/site.css").is_file());
    assert!(!mirror.join("sites").exists());

    let root = std::fs::read_to_string(mirror.join("index.html")).unwrap();
    assert!(root.contains(r#"src="https://other.example/x.png""#));
}

#[tokio::test]
async fn test_existing_files_kept_unless_forced() {
    let server = MockServer::start().await;
    mount_html(&server, "/", "<html><head></head><body>NEW</body></html>").await;

    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("mirror");
    std::fs::create_dir_all(&mirror).unwrap();
    std::fs::write(mirror.join("index.html"), "OLD").unwrap();

    let coordinator =
        Coordinator::new(create_test_config(&mirror), options(0, 10, false)).unwrap();
    let report = coordinator.run(&server.uri()).await.unwrap();

    assert_eq!(std::fs::read_to_string(mirror.join("index.html")).unwrap(), "OLD");
    assert_eq!(report.statistics.files_kept, 1);
    assert_eq!(report.statistics.pages_converted, 0);

    let coordinator =
        Coordinator::new(create_test_config(&mirror), options(0, 10, true)).unwrap();
    let report = coordinator.run(&server.uri()).await.unwrap();

    let content = std::fs::read_to_string(mirror.join("index.html")).unwrap();
    assert!(content.contains("NEW"));
    assert!(content.contains(r#"<base href="./">"#));
    assert_eq!(report.statistics.files_written, 1);
}

#[tokio::test]
async fn test_fetch_failure_is_counted_and_not_saved() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><head><link href="/css/missing.css" rel="stylesheet"></head></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/css/missing.css"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("mirror");
    let coordinator =
        Coordinator::new(create_test_config(&mirror), options(1, 10, false)).unwrap();

    let report = coordinator.run(&server.uri()).await.unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.statistics.fetch_errors, 1);
    assert!(!mirror.join("css/missing.css").exists());

    let root = std::fs::read_to_string(mirror.join("index.html")).unwrap();
    assert!(root.contains(r#"href="/css/missing.css""#));
}

#[tokio::test]
async fn test_buffer_bounds_memory() {
    let server = MockServer::start().await;
    let mut body = String::from("<html><head></head><body>");
    for i in 0..6 {
        body.push_str(&format!(r#"<img src="/img/{}.png">"#, i));
        mount_asset(&server, &format!("/img/{}.png", i), "image/png", "PNG").await;
    }
    body.push_str("</body></html>");
    mount_html(&server, "/", &body).await;

    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("mirror");
    let coordinator =
        Coordinator::new(create_test_config(&mirror), options(1, 1, false)).unwrap();

    let report = coordinator.run(&server.uri()).await.unwrap();

    assert_eq!(report.statistics.peak_buffered, 1);
    assert_eq!(report.statistics.files_written, 7);
    assert_eq!(report.statistics.images, 6);
    for i in 0..6 {
        assert!(mirror.join(format!("img/{}.png", i)).is_file());
    }
}

#[tokio::test]
async fn test_blacklisted_links_are_skipped() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><head></head><body>
           <a href="https://www.instagram.com/site">ig</a>
           <a href="/share/whatsapp">wa</a>
           <a href="mailto:admin@example.com">mail</a>
           </body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("mirror");
    let coordinator =
        Coordinator::new(create_test_config(&mirror), options(1, 10, false)).unwrap();

    let report = coordinator.run(&server.uri()).await.unwrap();

    assert_eq!(report.statistics.links_found, 2);
    assert_eq!(report.statistics.links_blacklisted, 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

//! Integration tests for the page analyzer
//!
//! These tests use wiremock to serve pages and link targets, and run the
//! real reqwest/scraper analyzer against them, directly and through the pool.

mod common;

use common::{html_page, http_analyzer, pool_config, wait_for_terminal};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use url_insight::analyzer::{AnalyzeError, PageAnalyzer};
use url_insight::model::{UrlStatus, UNKNOWN_HTML_VERSION, UNREACHABLE_STATUS};
use url_insight::{RecordStore, SqliteStorage, WorkerPool};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Swaps the loopback IP for `localhost` so the host compares as different
fn as_localhost(server: &MockServer) -> String {
    server.uri().replace("127.0.0.1", "localhost")
}

#[tokio::test]
async fn test_internal_and_external_links_with_statuses() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let other_base = as_localhost(&other);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&format!(
            r#"<!DOCTYPE html>
            <html><head><title>Home</title></head><body>
              <h1>Welcome</h1>
              <a href="/about">About</a>
              <a href="{}/gone">Gone</a>
            </body></html>"#,
            other_base
        )))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&other)
        .await;

    let address = Url::parse(&format!("{}/", site.uri())).unwrap();
    let (result, links) = http_analyzer().analyze(&address).await.unwrap();

    assert_eq!(result.html_version, "HTML 5");
    assert_eq!(result.title, "Home");
    assert_eq!(result.headings.h1, 1);
    assert!(!result.has_login_form);

    assert_eq!(links.len(), 2);
    assert_eq!(links[0].href, format!("{}/about", site.uri()));
    assert!(!links[0].is_external);
    assert_eq!(links[0].status_code, 200);

    assert_eq!(links[1].href, format!("{}/gone", other_base));
    assert!(links[1].is_external);
    assert_eq!(links[1].status_code, 404);
}

#[tokio::test]
async fn test_page_structure_is_extracted() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(html_page(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN"
                "http://www.w3.org/TR/html4/loose.dtd">
            <html><head><title>  Sign in  </title></head><body>
              <h1>A</h1><h2>B</h2><h2>C</h2><h3>D</h3><h6>E</h6>
              <form action="/session" method="post">
                <input type="text" name="user">
                <input type="PASSWORD" name="pass">
              </form>
            </body></html>"#,
        ))
        .mount(&site)
        .await;

    let address = Url::parse(&format!("{}/login", site.uri())).unwrap();
    let (result, links) = http_analyzer().analyze(&address).await.unwrap();

    assert_eq!(result.html_version, "HTML 4.01 Transitional");
    assert_eq!(result.title, "Sign in");
    assert_eq!(result.headings.as_array(), [1, 2, 1, 0, 0, 1]);
    assert!(result.has_login_form);
    assert!(links.is_empty());
}

#[tokio::test]
async fn test_missing_doctype_and_title() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bare"))
        .respond_with(html_page("<html><body><p>No head here</p></body></html>"))
        .mount(&site)
        .await;

    let address = Url::parse(&format!("{}/bare", site.uri())).unwrap();
    let (result, _) = http_analyzer().analyze(&address).await.unwrap();

    assert_eq!(result.html_version, UNKNOWN_HTML_VERSION);
    assert_eq!(result.title, "");
    assert_eq!(result.headings.total(), 0);
}

#[tokio::test]
async fn test_links_keep_document_order_and_duplicates() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(html_page(
            r##"<html><body>
              <a href="/c">C</a>
              <a href="mailto:someone@example.com">Mail</a>
              <a href="/a">A</a>
              <a href="#top">Top</a>
              <a href="javascript:void(0)">JS</a>
              <a href="/c">C again</a>
              <a href="b">B</a>
            </body></html>"##,
        ))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;

    let address = Url::parse(&format!("{}/list", site.uri())).unwrap();
    let (_, links) = http_analyzer().analyze(&address).await.unwrap();

    let hrefs: Vec<String> = links.iter().map(|l| l.href.clone()).collect();
    assert_eq!(
        hrefs,
        vec![
            format!("{}/c", site.uri()),
            format!("{}/a", site.uri()),
            format!("{}/c", site.uri()),
            format!("{}/b", site.uri()),
        ]
    );
    assert!(links.iter().all(|l| l.status_code == 200 && !l.is_external));
}

#[tokio::test]
async fn test_unreachable_link_gets_sentinel_status() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<html><body><a href="http://127.0.0.1:9/nowhere">Dead</a></body></html>"#,
        ))
        .mount(&site)
        .await;

    let address = Url::parse(&format!("{}/", site.uri())).unwrap();
    let (_, links) = http_analyzer().analyze(&address).await.unwrap();

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].status_code, UNREACHABLE_STATUS);
    assert!(!links[0].is_reachable());
}

#[tokio::test]
async fn test_relative_links_resolve_after_redirect() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/docs/index.html"),
        )
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/index.html"))
        .respond_with(html_page(r#"<html><body><a href="guide.html">Guide</a></body></html>"#))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/docs/guide.html"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;

    let address = Url::parse(&format!("{}/old", site.uri())).unwrap();
    let (_, links) = http_analyzer().analyze(&address).await.unwrap();

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].href, format!("{}/docs/guide.html", site.uri()));
    assert_eq!(links[0].status_code, 200);
}

#[tokio::test]
async fn test_error_status_fails_analysis() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site)
        .await;

    let address = Url::parse(&format!("{}/broken", site.uri())).unwrap();
    let err = http_analyzer().analyze(&address).await.unwrap_err();
    assert!(matches!(err, AnalyzeError::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_non_html_content_fails_analysis() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"{}".to_vec(), "application/json"))
        .mount(&site)
        .await;

    let address = Url::parse(&format!("{}/data.json", site.uri())).unwrap();
    let err = http_analyzer().analyze(&address).await.unwrap_err();
    assert!(matches!(err, AnalyzeError::Parse { .. }));
}

#[tokio::test]
async fn test_page_fetch_beyond_task_timeout_marks_error() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("<html><title>Late</title></html>").set_delay(Duration::from_secs(5)))
        .mount(&site)
        .await;

    let store: Arc<dyn RecordStore> = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let pool = WorkerPool::new(
        Arc::clone(&store),
        Arc::new(http_analyzer()),
        pool_config(1, 4, Duration::from_millis(300)),
    );
    pool.start().unwrap();

    let id = store.create_url(&format!("{}/slow", site.uri())).unwrap();
    pool.enqueue(id).await.unwrap();

    assert_eq!(wait_for_terminal(&store, id).await, UrlStatus::Error);
    pool.shutdown().await.unwrap();

    assert!(store.analysis_results(id).unwrap().is_empty());
    assert!(store.links(id).unwrap().is_empty());
}

#[tokio::test]
async fn test_pool_persists_links_in_order() {
    let site = MockServer::start().await;

    let body: String = (0..12)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&format!("<html><body>{}</body></html>", body)))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_millis(20)))
        .mount(&site)
        .await;

    let store: Arc<dyn RecordStore> = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let pool = WorkerPool::new(
        Arc::clone(&store),
        Arc::new(http_analyzer()),
        pool_config(2, 4, Duration::from_secs(10)),
    );
    pool.start().unwrap();

    let id = store.create_url(&format!("{}/", site.uri())).unwrap();
    pool.enqueue(id).await.unwrap();
    pool.shutdown().await.unwrap();

    assert_eq!(store.load(id).unwrap().status, UrlStatus::Done);
    let links = store.links(id).unwrap();
    assert_eq!(links.len(), 12);
    for (i, stored) in links.iter().enumerate() {
        assert_eq!(stored.link.href, format!("{}/p{}", site.uri(), i));
        assert_eq!(stored.link.status_code, 204);
    }
}

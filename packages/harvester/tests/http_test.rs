//! HTTP fetcher tests against a local mock portal.
//!
//! The fetcher uses a blocking client, so every call runs on a blocking
//! thread next to the async mock server.

use std::time::Duration;

use dados_abertos_harvester::{
    DatasetWriter, Fetcher, Harvester, HarvesterError, HttpFetcher, TitleMatch,
};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_html(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(html.as_bytes().to_vec(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_text() {
    let server = MockServer::start().await;
    mount_html(&server, "/page", "<p>Olá</p>").await;
    let url = format!("{}/page", server.uri());

    let body = tokio::task::spawn_blocking(move || HttpFetcher::new().unwrap().fetch_text(&url))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(body, "<p>Olá</p>");
}

#[tokio::test]
async fn test_fetch_text_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let url = format!("{}/missing", server.uri());

    let result = tokio::task::spawn_blocking(move || HttpFetcher::new().unwrap().fetch_text(&url))
        .await
        .unwrap();

    match result {
        Err(HarvesterError::Fetch { url, source }) => {
            assert!(url.ends_with("/missing"));
            assert_eq!(source.status().map(|s| s.as_u16()), Some(404));
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"a": 1}])))
        .mount(&server)
        .await;
    let url = format!("{}/data.json", server.uri());

    let value = tokio::task::spawn_blocking(move || HttpFetcher::new().unwrap().fetch_json(&url))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(value, serde_json::json!([{"a": 1}]));
}

#[tokio::test]
async fn test_fetch_json_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[{\"a\": 1,"))
        .mount(&server)
        .await;
    let url = format!("{}/broken.json", server.uri());

    let result = tokio::task::spawn_blocking(move || HttpFetcher::new().unwrap().fetch_json(&url))
        .await
        .unwrap();

    assert!(matches!(result, Err(HarvesterError::Parse { .. })));
}

#[tokio::test]
async fn test_fetch_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;
    let url = format!("{}/slow", server.uri());

    let result = tokio::task::spawn_blocking(move || {
        HttpFetcher::new()
            .unwrap()
            .with_timeouts(Duration::from_millis(200), Duration::from_millis(200))
            .fetch_text(&url)
    })
    .await
    .unwrap();

    match result {
        Err(HarvesterError::Fetch { source, .. }) => assert!(source.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_run_against_mock_portal() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/Paginas/DAIniciativas.aspx",
        r#"<div class="archive-item"><a href="/Paginas/XV.aspx">XV</a></div>
           <div class="archive-item"><a href="/Paginas/XIV.aspx">XIV</a></div>"#,
    )
    .await;
    mount_html(
        &server,
        "/Paginas/XV.aspx",
        r#"<div class="archive-item"><a href="/Dados/XV.json" title="IniciativasXV_json.txt">JSON</a></div>"#,
    )
    .await;
    mount_html(&server, "/Paginas/XIV.aspx", "<p>sem dados</p>").await;
    Mock::given(method("GET"))
        .and(path("/Dados/XV.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 1, "titulo": "A"},
            {"id": 2, "titulo": "B"}
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let theme = format!("{}/Paginas/DAIniciativas.aspx", server.uri());
    let dir = tempdir().unwrap();
    let output = dir.path().to_path_buf();

    let (first, second) = tokio::task::spawn_blocking(move || {
        let harvester = Harvester::new(
            HttpFetcher::new().unwrap(),
            DatasetWriter::new(output),
            TitleMatch::CaseSensitive,
        );
        let first = harvester.run(&[theme.as_str()]).unwrap();
        let second = harvester.run(&[theme.as_str()]).unwrap();
        (first, second)
    })
    .await
    .unwrap();

    assert_eq!(first.total_changed, 1);
    assert_eq!(second.total_changed, 0);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("IniciativasXV_json_txt.csv")).unwrap(),
        "id,titulo\n1,A\n2,B\n"
    );
}

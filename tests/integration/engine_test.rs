// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::quotes_page;
use frontier::config::settings::FetchSettings;
use frontier::domain::models::request::Request;
use frontier::engines::reqwest_engine::ReqwestEngine;
use frontier::spiders::QuotesSpider;
use frontier::utils::errors::RuntimeError;
use frontier::workers::spider_runtime::SpiderRuntime;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn runtime() -> SpiderRuntime {
    let engine = ReqwestEngine::new(&FetchSettings {
        timeout_secs: 5,
        user_agent: "frontier-test/0.1".to_string(),
    })
    .unwrap();
    SpiderRuntime::new(Arc::new(engine), Arc::new(QuotesSpider::new()))
}

#[tokio::test]
async fn test_runtime_parses_live_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(quotes_page(3, Some("/page/2/"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::get(&format!("{}/", server.uri())).unwrap();
    let output = runtime().execute(&request).await.unwrap();

    assert_eq!(output.items.len(), 3);
    assert_eq!(
        output.items[0].get("text").and_then(|v| v.as_str()),
        Some("Quote number 0")
    );
    assert_eq!(output.requests.len(), 1);
    assert_eq!(
        output.requests[0].url().as_str(),
        format!("{}/page/2/", server.uri())
    );
}

#[tokio::test]
async fn test_runtime_reports_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let request = Request::get(&format!("{}/missing", server.uri())).unwrap();
    let result = runtime().execute(&request).await;

    match result {
        Err(RuntimeError::Fetch { url, reason }) => {
            assert!(url.ends_with("/missing"));
            assert!(reason.contains("404"));
        }
        other => panic!("expected fetch error, got {:?}", other.map(|o| o.items.len())),
    }
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{flaky_frontier, job, memory_frontier};
use axum::http::StatusCode;
use axum_test::TestServer;
use frontier::infrastructure::repositories::memory_frontier::MemoryFrontier;
use frontier::presentation::routes;
use frontier::queue::frontier::Frontier;
use serde_json::{json, Value};
use std::sync::Arc;

fn test_server() -> (TestServer, Arc<MemoryFrontier>, Frontier) {
    let (store, frontier) = memory_frontier();
    let server = TestServer::new(routes::app(Arc::new(frontier.clone()))).unwrap();
    (server, store, frontier)
}

/// 健康检查测试
#[tokio::test]
async fn health_check_works() {
    let (server, _, _) = test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

/// 纯文本推送走去重路径：首次201，重复200
#[tokio::test]
async fn push_url_deduplicates() {
    let (server, _, frontier) = test_server();

    let response = server
        .post("/v1/jobs/quotes/urls")
        .text("http://quotes.toscrape.com/page/2/")
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "queued");
    assert_eq!(body["url"], "http://quotes.toscrape.com/page/2/");

    // 传输层重发是安全的
    let response = server
        .post("/v1/jobs/quotes/urls")
        .text("HTTP://quotes.toscrape.com:80/page/2/")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "duplicate");

    assert_eq!(frontier.length(&job("quotes")).await.unwrap(), 1);

    let response = server.get("/v1/jobs/quotes/length").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "job": "quotes", "length": 1 }));
}

/// 非法URL与任务名返回400
#[tokio::test]
async fn invalid_input_is_rejected() {
    let (server, _, _) = test_server();

    let response = server.post("/v1/jobs/quotes/urls").text("not a url").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/v1/jobs/quotes/urls")
        .text("ftp://example.com/file")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/v1/jobs/bad$job/urls")
        .text("http://example.com/")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.get("/v1/jobs/quotes/seen/not-hex").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/v1/jobs/quotes/requests")
        .json(&json!({
            "url": "http://example.com/",
            "headers": { "bad name": "x" }
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

/// JSON推送携带完整请求字段，返回的指纹可查询
#[tokio::test]
async fn push_request_and_query_fingerprint() {
    let (server, _, frontier) = test_server();

    let response = server
        .post("/v1/jobs/quotes/requests")
        .json(&json!({
            "url": "http://quotes.toscrape.com/login",
            "method": "POST",
            "body": "user=a",
            "headers": { "Content-Type": "application/x-www-form-urlencoded" },
            "priority": 7,
            "meta": { "depth": 1 }
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let fingerprint = body["fingerprint"].as_str().unwrap().to_string();
    assert_eq!(fingerprint.len(), 64);

    let response = server
        .get(&format!("/v1/jobs/quotes/seen/{}", fingerprint))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["seen"], true);

    let entry = frontier
        .pop(&job("quotes"), std::time::Duration::from_millis(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.request.priority(), 7);
    assert_eq!(entry.request.body(), Some("user=a"));
    assert_eq!(entry.request.meta()["depth"], 1);
}

/// 存储不可用时返回503，客户端可以重发
#[tokio::test]
async fn store_outage_returns_service_unavailable() {
    let (server, store, frontier) = test_server();
    store.set_available(false);

    let response = server
        .post("/v1/jobs/quotes/urls")
        .text("http://quotes.toscrape.com/")
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let response = server.get("/v1/jobs/quotes/length").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    store.set_available(true);
    let response = server
        .post("/v1/jobs/quotes/urls")
        .text("http://quotes.toscrape.com/")
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(frontier.length(&job("quotes")).await.unwrap(), 1);
}

/// 入队失败返回503后，客户端重发的请求会被接收而不是判为重复
#[tokio::test]
async fn resend_after_failed_push_is_queued() {
    let (_store, frontier) = flaky_frontier(1);
    let server = TestServer::new(routes::app(Arc::new(frontier.clone()))).unwrap();

    let response = server
        .post("/v1/jobs/quotes/urls")
        .text("http://quotes.toscrape.com/page/3/")
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(frontier.length(&job("quotes")).await.unwrap(), 0);

    let response = server
        .post("/v1/jobs/quotes/urls")
        .text("http://quotes.toscrape.com/page/3/")
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], "queued");
    assert_eq!(frontier.length(&job("quotes")).await.unwrap(), 1);
}

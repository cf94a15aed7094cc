// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{job, memory_frontier, quotes_page};
use frontier::config::settings::Settings;
use frontier::utils::errors::WorkerError;
use frontier::workers::crawl_worker::{CrawlOptions, CrawlWorker};
use frontier::workers::manager::WorkerManager;
use serde_json::Value;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(body)
}

#[tokio::test]
async fn test_unknown_spider_is_rejected() {
    let (_, frontier) = memory_frontier();
    let settings = Settings::defaults().unwrap();

    let result = CrawlWorker::from_settings(
        &settings,
        job("quotes"),
        frontier,
        CrawlOptions {
            spider: "nope".to_string(),
            ..CrawlOptions::default()
        },
    )
    .await;
    assert!(matches!(result, Err(WorkerError::UnknownSpider(name)) if name == "nope"));
}

/// 从种子开始跟随分页，条目写入 jsonl 文件后因队列耗尽而退出
#[tokio::test]
async fn test_crawl_worker_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(quotes_page(3, Some("/page/2/"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(html(quotes_page(2, None)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let output = dir.path().join("items.jsonl");

    let mut settings = Settings::defaults().unwrap();
    settings.scheduler.pop_timeout_secs = 1;
    settings.pipeline.kind = "jsonl".to_string();
    settings.pipeline.path = Some(output.to_string_lossy().into_owned());

    let (_store, frontier) = memory_frontier();
    let mut worker = CrawlWorker::from_settings(
        &settings,
        job("quotes"),
        frontier.clone(),
        CrawlOptions {
            spider: "quotes".to_string(),
            seeds: vec![format!("{}/", server.uri())],
            concurrency: Some(2),
            exit_after_empty: Some(1),
        },
    )
    .await
    .unwrap();

    let mut manager = WorkerManager::new();
    manager.run(&mut worker).await.unwrap();

    let stats = worker.stats();
    assert_eq!(stats.popped, 2);
    assert_eq!(stats.items, 5);
    assert_eq!(stats.failed, 0);

    let content = tokio::fs::read_to_string(&output).await.unwrap();
    let lines: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 5);
    assert!(lines.iter().all(|item| item["spider"] == "quotes"));

    assert_eq!(frontier.length(&job("quotes")).await.unwrap(), 0);
    assert_eq!(frontier.seen_count(&job("quotes")).await.unwrap(), 2);
}

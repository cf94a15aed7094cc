// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    flaky_frontier, job, memory_frontier, quotes_page, quotes_scheduler, test_config,
    CollectingPipeline, StubFetcher,
};
use frontier::domain::models::request::Request;
use frontier::domain::repositories::duplicate_filter::DuplicateFilter;
use frontier::domain::repositories::request_queue::RequestQueue;
use frontier::queue::frontier::EnqueueOutcome;
use frontier::queue::scheduler::{IdlePolicy, SchedulerState, StopReason};
use frontier::utils::errors::SchedulerError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// 种子页产出10个条目和一个下一页请求，队列长度恰好加1
#[tokio::test]
async fn seed_page_yields_items_and_one_follow_up() {
    let (_store, frontier) = memory_frontier();
    let job = job("quotes");
    let fetcher = Arc::new(
        StubFetcher::new().page("http://quotes.toscrape.com", quotes_page(10, Some("/page/2/"))),
    );
    let pipeline = Arc::new(CollectingPipeline::new());
    let scheduler = quotes_scheduler(
        job.clone(),
        frontier.clone(),
        fetcher.clone(),
        pipeline.clone(),
        test_config(),
    );

    let seed = Request::get("http://quotes.toscrape.com").unwrap();
    assert_eq!(
        frontier.enqueue(&job, seed).await.unwrap(),
        EnqueueOutcome::Enqueued
    );

    let entry = scheduler.next_request().await.unwrap().unwrap();
    let before = frontier.length(&job).await.unwrap();
    scheduler.process(entry).await.unwrap();
    let after = frontier.length(&job).await.unwrap();

    assert_eq!(after, before + 1);
    assert_eq!(pipeline.items().len(), 10);

    let next = scheduler.next_request().await.unwrap().unwrap();
    assert_eq!(
        next.request.url().as_str(),
        "http://quotes.toscrape.com/page/2/"
    );
}

/// 同一指纹的并发 mark_seen 只有一个返回 true
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mark_seen_admits_exactly_one() {
    let (store, _frontier) = memory_frontier();
    let job = job("race");
    let fingerprint = Request::get("http://example.com/page")
        .unwrap()
        .fingerprint();

    let mut handles = Vec::new();
    for _ in 0..64 {
        let store = store.clone();
        let job = job.clone();
        handles.push(tokio::spawn(async move {
            store.mark_seen(&job, &fingerprint).await.unwrap()
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 1);
}

/// N 个消费者、M 个条目：每个条目恰好交付一次
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn competing_consumers_receive_each_entry_once() {
    let (store, _frontier) = memory_frontier();
    let job = job("competing");
    const ENTRIES: usize = 200;
    const CONSUMERS: usize = 8;

    for i in 0..ENTRIES {
        let request = Request::get(&format!("http://example.com/{}", i)).unwrap();
        store.push(&job, &request).await.unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..CONSUMERS {
        let store = store.clone();
        let job = job.clone();
        handles.push(tokio::spawn(async move {
            let mut received = Vec::new();
            while let Some(entry) = store
                .pop_blocking(&job, Duration::from_millis(50))
                .await
                .unwrap()
            {
                received.push(entry.request.url().to_string());
            }
            received
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }
    let unique: HashSet<_> = all.iter().cloned().collect();
    assert_eq!(all.len(), ENTRIES);
    assert_eq!(unique.len(), ENTRIES);
}

/// 优先级 [1, 5, 1, 5] 按高优先级先出，同级先进先出
#[tokio::test]
async fn pops_follow_priority_then_insertion_order() {
    let (_store, frontier) = memory_frontier();
    let job = job("priority");
    let pipeline = Arc::new(CollectingPipeline::new());
    let scheduler = quotes_scheduler(
        job.clone(),
        frontier.clone(),
        Arc::new(StubFetcher::new()),
        pipeline,
        test_config(),
    );

    for (name, priority) in [("first-low", 1), ("first-high", 5), ("second-low", 1), ("second-high", 5)] {
        let request = Request::builder(&format!("http://example.com/{}", name))
            .priority(priority)
            .build()
            .unwrap();
        frontier.enqueue(&job, request).await.unwrap();
    }

    let mut order = Vec::new();
    while let Some(entry) = scheduler.next_request().await.unwrap() {
        order.push(entry.request.url().path().trim_start_matches('/').to_string());
    }
    assert_eq!(
        order,
        vec!["first-high", "second-high", "first-low", "second-low"]
    );
}

/// 空队列的阻塞出队在超时附近返回空，而不是立即或永久
#[tokio::test(start_paused = true)]
async fn empty_pop_waits_for_the_timeout() {
    let (_store, frontier) = memory_frontier();
    let mut config = test_config();
    config.pop_timeout = Duration::from_secs(2);
    let scheduler = quotes_scheduler(
        job("empty"),
        frontier,
        Arc::new(StubFetcher::new()),
        Arc::new(CollectingPipeline::new()),
        config,
    );

    let started = Instant::now();
    assert!(scheduler.next_request().await.unwrap().is_none());
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(3));
}

/// 无法解码的条目被记录并跳过
#[tokio::test]
async fn malformed_entries_are_skipped() {
    let (store, frontier) = memory_frontier();
    let job = job("malformed");
    let scheduler = quotes_scheduler(
        job.clone(),
        frontier.clone(),
        Arc::new(StubFetcher::new()),
        Arc::new(CollectingPipeline::new()),
        test_config(),
    );

    store.push_raw(&job, 10, "{not json");
    store.push_raw(&job, 10, r#"{"v":7,"request":{}}"#);
    frontier
        .enqueue(&job, Request::get("http://example.com/ok").unwrap())
        .await
        .unwrap();

    let entry = scheduler.next_request().await.unwrap().unwrap();
    assert_eq!(entry.request.url().path(), "/ok");
    assert_eq!(scheduler.stats().malformed, 2);
}

/// 瞬时错误在重试上限内自动恢复
#[tokio::test(start_paused = true)]
async fn transient_errors_are_retried() {
    let (store, frontier) = memory_frontier();
    let job = job("flaky");
    let scheduler = quotes_scheduler(
        job.clone(),
        frontier.clone(),
        Arc::new(StubFetcher::new()),
        Arc::new(CollectingPipeline::new()),
        test_config(),
    );

    frontier
        .enqueue(&job, Request::get("http://example.com/").unwrap())
        .await
        .unwrap();
    store.fail_next(2);

    let entry = scheduler.next_request().await.unwrap();
    assert!(entry.is_some());
}

/// 存储持续不可用时调度器停止并报告致命错误
#[tokio::test(start_paused = true)]
async fn exhausted_retries_stop_the_scheduler() {
    let (store, frontier) = memory_frontier();
    let mut scheduler = quotes_scheduler(
        job("outage"),
        frontier,
        Arc::new(StubFetcher::new()),
        Arc::new(CollectingPipeline::new()),
        test_config(),
    );
    store.set_available(false);

    let (_tx, rx) = watch::channel(false);
    let result = scheduler.run(rx).await;

    match result {
        Err(SchedulerError::StoreExhausted { attempts, .. }) => assert_eq!(attempts, 4),
        other => panic!("expected StoreExhausted, got {:?}", other),
    }
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

/// 过滤器不可用时不会把请求当作新请求写入队列
#[tokio::test(start_paused = true)]
async fn unavailable_filter_never_pushes() {
    let (store, frontier) = memory_frontier();
    let job = job("filter-down");
    let scheduler = quotes_scheduler(
        job.clone(),
        frontier.clone(),
        Arc::new(StubFetcher::new()),
        Arc::new(CollectingPipeline::new()),
        test_config(),
    );

    store.set_available(false);
    let result = scheduler
        .ingest(vec![Request::get("http://example.com/new").unwrap()])
        .await;
    assert!(matches!(result, Err(SchedulerError::StoreExhausted { .. })));

    store.set_available(true);
    assert_eq!(frontier.length(&job).await.unwrap(), 0);
    assert_eq!(frontier.seen_count(&job).await.unwrap(), 0);
}

/// 入队调用失败后重试，请求仍然进入队列而不是被当作重复丢弃
#[tokio::test(start_paused = true)]
async fn failed_push_is_retried_into_the_queue() {
    let (_store, frontier) = flaky_frontier(1);
    let job = job("flaky-push");
    let scheduler = quotes_scheduler(
        job.clone(),
        frontier.clone(),
        Arc::new(StubFetcher::new()),
        Arc::new(CollectingPipeline::new()),
        test_config(),
    );

    let request = Request::get("http://example.com/discovered").unwrap();
    scheduler.ingest(vec![request.clone()]).await.unwrap();

    let stats = scheduler.stats();
    assert_eq!(stats.enqueued, 1);
    assert_eq!(stats.duplicates, 0);
    assert_eq!(frontier.length(&job).await.unwrap(), 1);
    assert!(frontier.seen(&job, &request.fingerprint()).await.unwrap());

    let entry = frontier
        .pop(&job, Duration::from_millis(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.request.url().path(), "/discovered");
}

/// 关闭信号到达后不再出队，在途请求照常完成
#[tokio::test(start_paused = true)]
async fn shutdown_drains_in_flight_requests() {
    let (_store, frontier) = memory_frontier();
    let job = job("shutdown");
    let fetcher = Arc::new(
        StubFetcher::with_delay(Duration::from_millis(500))
            .page("http://example.com/1", quotes_page(1, None))
            .page("http://example.com/2", quotes_page(1, None))
            .page("http://example.com/3", quotes_page(1, None)),
    );
    let pipeline = Arc::new(CollectingPipeline::new());
    let mut config = test_config();
    config.concurrency = 2;
    config.idle_policy = IdlePolicy::BlockForever;
    let mut scheduler = quotes_scheduler(
        job.clone(),
        frontier.clone(),
        fetcher.clone(),
        pipeline.clone(),
        config,
    );

    for i in 1..=3 {
        frontier
            .enqueue(&job, Request::get(&format!("http://example.com/{}", i)).unwrap())
            .await
            .unwrap();
    }

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        let result = scheduler.run(rx).await;
        (result, scheduler)
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(true).unwrap();

    let (result, scheduler) = handle.await.unwrap();
    assert_eq!(result.unwrap(), StopReason::Shutdown);
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(scheduler.stats().popped, 2);
    assert_eq!(pipeline.items().len(), 2);
    assert_eq!(frontier.length(&job).await.unwrap(), 1);
}

/// 两个Worker从不同页面同时发现同一链接，只入队一次
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_workers_discovering_same_link_push_once() {
    let (_store, frontier) = memory_frontier();
    let job = job("shared");
    let fetcher = Arc::new(
        StubFetcher::new()
            .page("http://example.com/a", quotes_page(1, Some("/next")))
            .page("http://example.com/b", quotes_page(1, Some("http://example.com/next"))),
    );
    let first = quotes_scheduler(
        job.clone(),
        frontier.clone(),
        fetcher.clone(),
        Arc::new(CollectingPipeline::new()),
        test_config(),
    );
    let second = quotes_scheduler(
        job.clone(),
        frontier.clone(),
        fetcher.clone(),
        Arc::new(CollectingPipeline::new()),
        test_config(),
    );

    frontier
        .enqueue(&job, Request::get("http://example.com/a").unwrap())
        .await
        .unwrap();
    frontier
        .enqueue(&job, Request::get("http://example.com/b").unwrap())
        .await
        .unwrap();

    let a = first.next_request().await.unwrap().unwrap();
    let b = second.next_request().await.unwrap().unwrap();
    let (ra, rb) = tokio::join!(first.process(a), second.process(b));
    ra.unwrap();
    rb.unwrap();

    assert_eq!(frontier.length(&job).await.unwrap(), 1);
    assert_eq!(first.stats().enqueued + second.stats().enqueued, 1);
    assert_eq!(first.stats().duplicates + second.stats().duplicates, 1);
}

/// 完整运行：跟随分页直到队列耗尽；抓取失败只影响单个请求
#[tokio::test(start_paused = true)]
async fn run_follows_pages_until_queue_is_exhausted() {
    let (_store, frontier) = memory_frontier();
    let job = job("full");
    let fetcher = Arc::new(
        StubFetcher::new()
            .page("http://quotes.toscrape.com/", quotes_page(3, Some("/page/2/")))
            .page("http://quotes.toscrape.com/page/2/", quotes_page(3, Some("/page/3/")))
            .page("http://quotes.toscrape.com/page/3/", quotes_page(3, Some("/page/4/"))),
    );
    let pipeline = Arc::new(CollectingPipeline::new());
    let mut scheduler = quotes_scheduler(
        job.clone(),
        frontier.clone(),
        fetcher.clone(),
        pipeline.clone(),
        test_config(),
    );

    scheduler
        .ingest(vec![Request::get("http://quotes.toscrape.com/").unwrap()])
        .await
        .unwrap();

    let (_tx, rx) = watch::channel(false);
    let reason = scheduler.run(rx).await.unwrap();

    assert_eq!(reason, StopReason::QueueExhausted);
    assert_eq!(pipeline.items().len(), 9);
    // 第4页不存在
    assert_eq!(fetcher.fetched().len(), 4);
    let stats = scheduler.stats();
    assert_eq!(stats.popped, 4);
    assert_eq!(stats.failed, 1);
    assert_eq!(frontier.length(&job).await.unwrap(), 0);

    // 重新以同一种子启动，种子已见过，不会重复抓取
    let mut restarted = quotes_scheduler(
        job.clone(),
        frontier.clone(),
        fetcher.clone(),
        Arc::new(CollectingPipeline::new()),
        test_config(),
    );
    restarted
        .ingest(vec![Request::get("http://quotes.toscrape.com/").unwrap()])
        .await
        .unwrap();
    let (_tx, rx) = watch::channel(false);
    restarted.run(rx).await.unwrap();
    assert_eq!(restarted.stats().duplicates, 1);
    assert_eq!(restarted.stats().popped, 0);
    assert_eq!(fetcher.fetched().len(), 4);
}

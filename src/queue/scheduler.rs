// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::settings::SchedulerSettings;
use crate::domain::models::job::JobId;
use crate::domain::models::queue_entry::QueueEntry;
use crate::domain::models::request::Request;
use crate::domain::repositories::item_pipeline::ItemPipeline;
use crate::infrastructure::metrics::{
    IN_FLIGHT, ITEMS_TOTAL, MALFORMED_TOTAL, PIPELINE_ERRORS_TOTAL, REQUESTS_POPPED_TOTAL,
    REQUEST_FAILURES_TOTAL,
};
use crate::queue::frontier::{EnqueueOutcome, Frontier};
use crate::utils::errors::{SchedulerError, StoreError};
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::spider_runtime::SpiderRuntime;

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// 等待下一次出队
    Idle,
    /// 阻塞出队中
    Fetching,
    /// 把请求交给运行时
    Dispatching,
    /// 不再出队，等待在途请求完成
    Draining,
    /// 已停止
    Stopped,
}

/// 队列持续为空时的行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePolicy {
    /// 一直等待新请求，直到收到关闭信号
    BlockForever,
    /// 连续 N 次空轮询后退出
    ExitAfter(u32),
}

impl IdlePolicy {
    /// `0` 表示一直等待
    pub fn from_max_empty_polls(max_empty_polls: u32) -> Self {
        if max_empty_polls == 0 {
            IdlePolicy::BlockForever
        } else {
            IdlePolicy::ExitAfter(max_empty_polls)
        }
    }
}

/// 调度器配置
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// 单次阻塞出队的超时
    pub pop_timeout: Duration,
    pub idle_policy: IdlePolicy,
    /// 同时在途的请求上限
    pub concurrency: usize,
    /// 存储瞬时错误的重试策略
    pub retry: RetryPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pop_timeout: Duration::from_secs(5),
            idle_policy: IdlePolicy::BlockForever,
            concurrency: 8,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&SchedulerSettings> for SchedulerConfig {
    fn from(settings: &SchedulerSettings) -> Self {
        Self {
            pop_timeout: Duration::from_secs(settings.pop_timeout_secs),
            idle_policy: IdlePolicy::from_max_empty_polls(settings.max_empty_polls),
            concurrency: settings.concurrency.max(1),
            retry: RetryPolicy::from(&settings.retry),
        }
    }
}

/// 调度器停止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 收到关闭信号
    Shutdown,
    /// 达到空轮询上限
    QueueExhausted,
}

/// 调度器计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub popped: u64,
    pub enqueued: u64,
    pub duplicates: u64,
    pub malformed: u64,
    pub failed: u64,
    pub items: u64,
    pub pipeline_errors: u64,
    pub empty_polls: u64,
}

#[derive(Default)]
struct StatsRecorder {
    popped: AtomicU64,
    enqueued: AtomicU64,
    duplicates: AtomicU64,
    malformed: AtomicU64,
    failed: AtomicU64,
    items: AtomicU64,
    pipeline_errors: AtomicU64,
    empty_polls: AtomicU64,
}

impl StatsRecorder {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            popped: self.popped.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            items: self.items.load(Ordering::Relaxed),
            pipeline_errors: self.pipeline_errors.load(Ordering::Relaxed),
            empty_polls: self.empty_polls.load(Ordering::Relaxed),
        }
    }
}

/// 在途任务共享的上下文
struct Dispatch {
    job: JobId,
    frontier: Frontier,
    runtime: SpiderRuntime,
    pipeline: Arc<dyn ItemPipeline>,
    retry: RetryPolicy,
    stats: StatsRecorder,
}

impl Dispatch {
    async fn ingest(&self, requests: Vec<Request>) -> Result<(), SchedulerError> {
        for request in requests {
            let outcome = self
                .retry
                .run("enqueue", || self.frontier.enqueue(&self.job, request.clone()))
                .await?;
            match outcome {
                EnqueueOutcome::Enqueued => StatsRecorder::bump(&self.stats.enqueued),
                EnqueueOutcome::Duplicate => StatsRecorder::bump(&self.stats.duplicates),
            }
        }
        Ok(())
    }

    /// 处理一个出队的请求；只有存储不可用才返回错误
    async fn process(&self, entry: QueueEntry) -> Result<(), SchedulerError> {
        let request = entry.request;
        let output = match self.runtime.execute(&request).await {
            Ok(output) => output,
            Err(e) => {
                warn!(job = %self.job, error = %e, "request failed");
                StatsRecorder::bump(&self.stats.failed);
                metrics::counter!(REQUEST_FAILURES_TOTAL).increment(1);
                return Ok(());
            }
        };

        for item in output.items {
            StatsRecorder::bump(&self.stats.items);
            metrics::counter!(ITEMS_TOTAL).increment(1);
            if let Err(e) = self.pipeline.process_item(item).await {
                warn!(
                    job = %self.job,
                    pipeline = self.pipeline.name(),
                    error = %e,
                    "pipeline rejected item"
                );
                StatsRecorder::bump(&self.stats.pipeline_errors);
                metrics::counter!(PIPELINE_ERRORS_TOTAL).increment(1);
            }
        }

        self.ingest(output.requests).await
    }
}

/// 单个Worker的调度器
///
/// 循环执行阻塞出队，把请求交给爬虫运行时，并把新发现的请求经
/// 去重后写回共享队列。在途请求数受 `concurrency` 限制
pub struct Scheduler {
    dispatch: Arc<Dispatch>,
    config: SchedulerConfig,
    state: SchedulerState,
}

impl Scheduler {
    /// 创建调度器
    ///
    /// # 参数
    ///
    /// * `job` - 任务名
    /// * `frontier` - 共享的入队/出队路径
    /// * `runtime` - 爬虫运行时
    /// * `pipeline` - 条目管道
    /// * `config` - 调度器配置
    pub fn new(
        job: JobId,
        frontier: Frontier,
        runtime: SpiderRuntime,
        pipeline: Arc<dyn ItemPipeline>,
        config: SchedulerConfig,
    ) -> Self {
        let dispatch = Dispatch {
            job,
            frontier,
            runtime,
            pipeline,
            retry: config.retry.clone(),
            stats: StatsRecorder::default(),
        };
        Self {
            dispatch: Arc::new(dispatch),
            config,
            state: SchedulerState::Idle,
        }
    }

    pub fn job(&self) -> &JobId {
        &self.dispatch.job
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> SchedulerStats {
        self.dispatch.stats.snapshot()
    }

    /// 阻塞出队一个请求
    ///
    /// 瞬时错误按策略重试；无法解码的条目记录后跳过，继续出队
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(entry))` - 出队的条目
    /// * `Ok(None)` - 超时时队列为空
    /// * `Err(SchedulerError)` - 重试耗尽或不可恢复的存储错误
    pub async fn next_request(&self) -> Result<Option<QueueEntry>, SchedulerError> {
        let dispatch: &Dispatch = &self.dispatch;
        let timeout = self.config.pop_timeout;
        loop {
            let popped = dispatch
                .retry
                .run("pop", || dispatch.frontier.pop(&dispatch.job, timeout))
                .await;

            match popped {
                Ok(Some(entry)) => {
                    StatsRecorder::bump(&dispatch.stats.popped);
                    metrics::counter!(REQUESTS_POPPED_TOTAL).increment(1);
                    return Ok(Some(entry));
                }
                Ok(None) => return Ok(None),
                Err(SchedulerError::Store(StoreError::MalformedEntry(reason))) => {
                    // 重新入队只会反复失败
                    warn!(job = %dispatch.job, %reason, "skipping malformed queue entry");
                    StatsRecorder::bump(&dispatch.stats.malformed);
                    metrics::counter!(MALFORMED_TOTAL).increment(1);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 去重后写入新发现的请求，重复请求静默丢弃
    pub async fn ingest(&self, requests: Vec<Request>) -> Result<(), SchedulerError> {
        self.dispatch.ingest(requests).await
    }

    /// 在当前任务中处理一个已出队的请求
    ///
    /// 抓取或解析失败只记入统计；条目交给管道，新请求经去重写回队列
    pub async fn process(&self, entry: QueueEntry) -> Result<(), SchedulerError> {
        self.dispatch.process(entry).await
    }

    fn settle(
        &self,
        joined: Result<Result<(), SchedulerError>, JoinError>,
    ) -> Result<(), SchedulerError> {
        match joined {
            Ok(result) => result,
            Err(e) => {
                error!(job = %self.dispatch.job, error = %e, "request task panicked");
                StatsRecorder::bump(&self.dispatch.stats.failed);
                Ok(())
            }
        }
    }

    /// 运行调度循环
    ///
    /// 每次出队前检查关闭信号；正在进行的出队不会被取消，
    /// 因此关闭延迟最多为一次出队超时。停止前等待所有在途请求完成
    ///
    /// # 返回值
    ///
    /// * `Ok(StopReason)` - 正常停止
    /// * `Err(SchedulerError)` - 存储不可用，Worker应以非零状态退出
    pub async fn run(
        &mut self,
        shutdown: watch::Receiver<bool>,
    ) -> Result<StopReason, SchedulerError> {
        let concurrency = self.config.concurrency.max(1);
        let mut in_flight: JoinSet<Result<(), SchedulerError>> = JoinSet::new();
        let mut empty_polls: u32 = 0;

        info!(job = %self.dispatch.job, concurrency, "scheduler started");

        let mut outcome = loop {
            let mut failure = None;
            while let Some(joined) = in_flight.try_join_next() {
                if let Err(e) = self.settle(joined) {
                    failure = Some(e);
                    break;
                }
            }
            if let Some(e) = failure {
                break Err(e);
            }
            metrics::gauge!(IN_FLIGHT).set(in_flight.len() as f64);

            if *shutdown.borrow() {
                info!(job = %self.dispatch.job, "shutdown requested");
                break Ok(StopReason::Shutdown);
            }

            if in_flight.len() >= concurrency {
                if let Some(joined) = in_flight.join_next().await {
                    if let Err(e) = self.settle(joined) {
                        break Err(e);
                    }
                }
                continue;
            }

            self.state = SchedulerState::Fetching;
            match self.next_request().await {
                Ok(Some(entry)) => {
                    empty_polls = 0;
                    self.state = SchedulerState::Dispatching;
                    debug!(job = %self.dispatch.job, url = %entry.request.url(), "dispatching");
                    let dispatch = self.dispatch.clone();
                    in_flight.spawn(async move { dispatch.process(entry).await });
                    self.state = SchedulerState::Idle;
                }
                Ok(None) => {
                    self.state = SchedulerState::Idle;
                    // 在途请求可能还会产出新请求
                    if in_flight.is_empty() {
                        empty_polls += 1;
                        StatsRecorder::bump(&self.dispatch.stats.empty_polls);
                        if let IdlePolicy::ExitAfter(limit) = self.config.idle_policy {
                            if empty_polls >= limit {
                                info!(
                                    job = %self.dispatch.job,
                                    empty_polls, "queue stayed empty, stopping"
                                );
                                break Ok(StopReason::QueueExhausted);
                            }
                        }
                    }
                }
                Err(e) => break Err(e),
            }
        };

        self.state = SchedulerState::Draining;
        if !in_flight.is_empty() {
            info!(
                job = %self.dispatch.job,
                in_flight = in_flight.len(),
                "draining in-flight requests"
            );
        }
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = self.settle(joined) {
                error!(job = %self.dispatch.job, error = %e, "in-flight request hit a store failure");
                if outcome.is_ok() {
                    outcome = Err(e);
                }
            }
        }
        metrics::gauge!(IN_FLIGHT).set(0.0);

        self.state = SchedulerState::Stopped;
        match &outcome {
            Ok(reason) => info!(job = %self.dispatch.job, ?reason, stats = ?self.stats(), "scheduler stopped"),
            Err(e) => error!(job = %self.dispatch.job, error = %e, stats = ?self.stats(), "scheduler stopped on fatal error"),
        }
        outcome
    }
}

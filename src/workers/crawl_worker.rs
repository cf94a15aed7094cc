// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::config::settings::Settings;
use crate::domain::models::job::JobId;
use crate::domain::models::request::Request;
use crate::domain::repositories::item_pipeline::ItemPipeline;
use crate::engines::reqwest_engine::ReqwestEngine;
use crate::infrastructure::pipelines::build_pipeline;
use crate::queue::frontier::Frontier;
use crate::queue::scheduler::{IdlePolicy, Scheduler, SchedulerConfig, SchedulerStats};
use crate::spiders::SpiderRegistry;
use crate::utils::errors::WorkerError;
use crate::workers::spider_runtime::SpiderRuntime;
use crate::workers::worker::Worker;

/// 命令行对单个Worker的覆盖项
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// 爬虫名称
    pub spider: String,
    /// 种子URL；为空时使用爬虫自带的起始URL
    pub seeds: Vec<String>,
    pub concurrency: Option<usize>,
    /// 连续空轮询多少次后退出，`0` 表示一直等待
    pub exit_after_empty: Option<u32>,
}

/// 爬取工作器
///
/// 一个进程对应一个任务。种子请求与运行中发现的请求走同一条去重路径，
/// 因此重复启动同一任务不会重复抓取
pub struct CrawlWorker {
    name: String,
    scheduler: Scheduler,
    seeds: Vec<Request>,
}

impl CrawlWorker {
    pub fn new(scheduler: Scheduler, seeds: Vec<Request>) -> Self {
        Self {
            name: format!("crawl:{}", scheduler.job()),
            scheduler,
            seeds,
        }
    }

    /// 根据配置组装工作器
    ///
    /// # 参数
    ///
    /// * `settings` - 应用配置
    /// * `job` - 任务名
    /// * `frontier` - 共享存储
    /// * `options` - 命令行覆盖项
    pub async fn from_settings(
        settings: &Settings,
        job: JobId,
        frontier: Frontier,
        options: CrawlOptions,
    ) -> Result<Self, WorkerError> {
        let spider = SpiderRegistry::with_builtin()
            .get(&options.spider)
            .ok_or_else(|| WorkerError::UnknownSpider(options.spider.clone()))?;

        let seed_urls: Vec<String> = if options.seeds.is_empty() {
            spider.start_urls().into_iter().map(String::from).collect()
        } else {
            options.seeds
        };
        let seeds = seed_urls
            .iter()
            .map(|url| Request::get(url))
            .collect::<Result<Vec<_>, _>>()?;

        let fetcher = ReqwestEngine::new(&settings.fetch)
            .map_err(|e| WorkerError::Config(format!("failed to build fetch engine: {}", e)))?;
        let pipeline: Arc<dyn ItemPipeline> = build_pipeline(&settings.pipeline).await?;

        let mut config = SchedulerConfig::from(&settings.scheduler);
        if let Some(concurrency) = options.concurrency {
            config.concurrency = concurrency.max(1);
        }
        if let Some(limit) = options.exit_after_empty {
            config.idle_policy = IdlePolicy::from_max_empty_polls(limit);
        }

        let runtime = SpiderRuntime::new(Arc::new(fetcher), spider);
        let scheduler = Scheduler::new(job, frontier, runtime, pipeline, config);
        Ok(Self::new(scheduler, seeds))
    }

    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }
}

#[async_trait]
impl Worker for CrawlWorker {
    async fn run(&mut self, shutdown: watch::Receiver<bool>) -> Result<(), WorkerError> {
        info!(
            worker = %self.name,
            seeds = self.seeds.len(),
            "crawl worker started"
        );

        let seeds = std::mem::take(&mut self.seeds);
        self.scheduler.ingest(seeds).await?;

        let reason = self.scheduler.run(shutdown).await?;
        info!(worker = %self.name, ?reason, "crawl worker finished");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod cli;

use clap::Parser;
use frontier::config::settings::Settings;
use frontier::domain::models::job::JobId;
use frontier::domain::models::request::Request;
use frontier::domain::services::fingerprint::FingerprintOptions;
use frontier::infrastructure::cache::redis_client::{classify_error, KeySpace, RedisClient};
use frontier::infrastructure::repositories::redis_duplicate_filter::RedisDuplicateFilter;
use frontier::infrastructure::repositories::redis_request_queue::RedisRequestQueue;
use frontier::presentation::routes;
use frontier::queue::frontier::Frontier;
use frontier::workers::crawl_worker::{CrawlOptions, CrawlWorker};
use frontier::workers::manager::WorkerManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use cli::{Cli, Commands};
use frontier::utils::telemetry;

/// 连接共享存储
async fn connect_frontier(settings: &Settings) -> anyhow::Result<Frontier> {
    let client = RedisClient::new(&settings.redis.url)?;
    // 启动时不可达只告警，调度器会按退避重试
    if let Err(e) = client.ping().await {
        warn!("Redis not reachable yet: {}", classify_error(&e));
    } else {
        info!("Redis connection established");
    }

    let keys = KeySpace::new(settings.redis.key_prefix.clone());
    let queue = Arc::new(RedisRequestQueue::new(client.clone(), keys.clone()));
    let filter = Arc::new(RedisDuplicateFilter::new(client, keys));
    let options = FingerprintOptions {
        ignore_query_order: settings.fingerprint.ignore_query_order,
    };
    Ok(Frontier::new(queue, filter, options))
}

/// 主函数
///
/// 致命错误（存储持续不可用、配置错误）以非零状态退出
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(&settings.logging);
    frontier::infrastructure::metrics::init_metrics(&settings.metrics)?;
    info!("Starting frontier {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Worker {
            job,
            spider,
            seeds,
            concurrency,
            exit_after_empty,
        } => {
            let job = JobId::parse(job)?;
            let frontier = connect_frontier(&settings).await?;
            let options = CrawlOptions {
                spider,
                seeds,
                concurrency,
                exit_after_empty,
            };
            let mut worker = CrawlWorker::from_settings(&settings, job, frontier, options).await?;

            let mut manager = WorkerManager::new();
            manager.listen_for_signals();
            manager.run(&mut worker).await?;
            info!("Final stats: {:?}", worker.stats());
        }
        Commands::Gateway { host, port } => {
            let frontier = Arc::new(connect_frontier(&settings).await?);
            let app = routes::app(frontier);

            let addr = format!(
                "{}:{}",
                host.unwrap_or_else(|| settings.gateway.host.clone()),
                port.unwrap_or(settings.gateway.port)
            );
            let listener = TcpListener::bind(&addr).await?;
            info!("Gateway listening on {}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Shutdown signal received");
                })
                .await?;
        }
        Commands::Push {
            job,
            urls,
            priority,
        } => {
            let job = JobId::parse(job)?;
            let frontier = connect_frontier(&settings).await?;
            for url in urls {
                let request = Request::builder(&url).priority(priority).build()?;
                let outcome = frontier.enqueue(&job, request).await?;
                println!("{}\t{}", outcome.as_str(), url);
            }
        }
        Commands::Length { job } => {
            let job = JobId::parse(job)?;
            let frontier = connect_frontier(&settings).await?;
            let length = frontier.length(&job).await?;
            let seen = frontier.seen_count(&job).await?;
            println!("{}\tqueued={}\tseen={}", job, length, seen);
        }
    }

    Ok(())
}

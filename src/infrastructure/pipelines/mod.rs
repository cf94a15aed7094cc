// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod jsonl_pipeline;
pub mod log_pipeline;

use std::sync::Arc;

use crate::config::settings::PipelineSettings;
use crate::domain::repositories::item_pipeline::ItemPipeline;
use crate::utils::errors::WorkerError;

pub use jsonl_pipeline::JsonLinesPipeline;
pub use log_pipeline::LoggingPipeline;

/// 根据配置创建管道
///
/// # 参数
///
/// * `settings` - 管道配置，`kind` 为 `log` 或 `jsonl`
pub async fn build_pipeline(
    settings: &PipelineSettings,
) -> Result<Arc<dyn ItemPipeline>, WorkerError> {
    match settings.kind.as_str() {
        "log" => Ok(Arc::new(LoggingPipeline)),
        "jsonl" => {
            let path = settings
                .path
                .as_deref()
                .ok_or_else(|| WorkerError::Config("pipeline.path is required for jsonl".into()))?;
            Ok(Arc::new(JsonLinesPipeline::open(path).await?))
        }
        other => Err(WorkerError::Config(format!("unknown pipeline kind: {}", other))),
    }
}

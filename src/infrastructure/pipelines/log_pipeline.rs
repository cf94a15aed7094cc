// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use tracing::info;

use crate::domain::models::item::Item;
use crate::domain::repositories::item_pipeline::ItemPipeline;
use crate::utils::errors::PipelineError;

/// 将条目写入日志的管道
#[derive(Debug, Default, Clone)]
pub struct LoggingPipeline;

#[async_trait]
impl ItemPipeline for LoggingPipeline {
    async fn process_item(&self, item: Item) -> Result<(), PipelineError> {
        let fields = serde_json::to_string(&item.fields)?;
        info!(spider = %item.spider, url = %item.url, %fields, "scraped item");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

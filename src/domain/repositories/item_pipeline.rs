// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use crate::domain::models::item::Item;
use crate::utils::errors::PipelineError;

/// 数据管道特质
///
/// 接收爬虫产出的条目并负责持久化
#[async_trait]
pub trait ItemPipeline: Send + Sync {
    /// 处理单个条目
    async fn process_item(&self, item: Item) -> Result<(), PipelineError>;

    /// 管道名称
    fn name(&self) -> &'static str;
}

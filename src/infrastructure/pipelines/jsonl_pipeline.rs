// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::models::item::Item;
use crate::domain::repositories::item_pipeline::ItemPipeline;
use crate::utils::errors::PipelineError;

/// JSON Lines 文件管道
///
/// 每个条目一行，以追加方式写入。多个并发任务共享同一文件句柄，
/// 写入在锁内完成，行与行之间不会交错
pub struct JsonLinesPipeline {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesPipeline {
    /// 打开（必要时创建）输出文件
    ///
    /// # 参数
    ///
    /// * `path` - 输出文件路径
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ItemPipeline for JsonLinesPipeline {
    async fn process_item(&self, item: Item) -> Result<(), PipelineError> {
        let mut line = serde_json::to_vec(&item)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

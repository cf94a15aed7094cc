// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::domain::models::job::JobId;
use crate::domain::models::queue_entry::QueueEntry;
use crate::domain::models::request::Request;
use crate::domain::repositories::duplicate_filter::DuplicateFilter;
use crate::domain::repositories::request_queue::RequestQueue;
use crate::domain::services::fingerprint::{Fingerprint, FingerprintOptions};
use crate::infrastructure::metrics::{DUPLICATES_TOTAL, REQUESTS_ENQUEUED_TOTAL};
use crate::utils::errors::StoreError;

/// 入队结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// 首次出现，已写入队列
    Enqueued,
    /// 已见过，丢弃
    Duplicate,
}

impl EnqueueOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnqueueOutcome::Enqueued => "queued",
            EnqueueOutcome::Duplicate => "duplicate",
        }
    }
}

/// 爬取边界
///
/// 调度器与接入网关共用的唯一入队路径：指纹去重与入队合为一次存储调用。
/// `queue` 与 `filter` 须来自同一存储，`filter` 用于查询与清理。
/// 外部注入与内部发现的请求一旦入队便无法区分
#[derive(Clone)]
pub struct Frontier {
    queue: Arc<dyn RequestQueue>,
    filter: Arc<dyn DuplicateFilter>,
    options: FingerprintOptions,
}

impl Frontier {
    /// 创建新的爬取边界
    ///
    /// # 参数
    ///
    /// * `queue` - 请求队列
    /// * `filter` - 去重过滤器
    /// * `options` - 指纹选项，入队前按此重新计算指纹
    pub fn new(
        queue: Arc<dyn RequestQueue>,
        filter: Arc<dyn DuplicateFilter>,
        options: FingerprintOptions,
    ) -> Self {
        Self {
            queue,
            filter,
            options,
        }
    }

    pub fn fingerprint_options(&self) -> &FingerprintOptions {
        &self.options
    }

    /// 去重后入队
    ///
    /// 记录指纹与写入队列在存储端一次完成，失败后重试是安全的：
    /// 不会出现指纹已记录而请求未入队的情况。
    /// 过滤器不可用时返回错误且不写入队列，绝不当作"未见过"处理
    ///
    /// # 返回值
    ///
    /// * `Ok(EnqueueOutcome::Enqueued)` - 首次出现并已入队
    /// * `Ok(EnqueueOutcome::Duplicate)` - 重复请求，已丢弃
    /// * `Err(StoreError)` - 存储错误
    pub async fn enqueue(
        &self,
        job: &JobId,
        request: Request,
    ) -> Result<EnqueueOutcome, StoreError> {
        let request = request.with_fingerprint_options(&self.options);

        if request.dont_filter() {
            self.queue.push(job, &request).await?;
        } else if !self.queue.push_unseen(job, &request).await? {
            debug!(job = %job, url = %request.url(), "dropping duplicate request");
            metrics::counter!(DUPLICATES_TOTAL).increment(1);
            return Ok(EnqueueOutcome::Duplicate);
        }

        metrics::counter!(REQUESTS_ENQUEUED_TOTAL).increment(1);
        Ok(EnqueueOutcome::Enqueued)
    }

    /// 阻塞出队
    pub async fn pop(&self, job: &JobId, timeout: Duration) -> Result<Option<QueueEntry>, StoreError> {
        self.queue.pop_blocking(job, timeout).await
    }

    /// 队列长度，仅用于观测
    pub async fn length(&self, job: &JobId) -> Result<u64, StoreError> {
        self.queue.length(job).await
    }

    /// 指纹是否已记录
    pub async fn seen(&self, job: &JobId, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        self.filter.seen(job, fingerprint).await
    }

    /// 已记录的指纹数量
    pub async fn seen_count(&self, job: &JobId) -> Result<u64, StoreError> {
        self.filter.count(job).await
    }

    /// 清空任务的队列与指纹
    pub async fn reset(&self, job: &JobId) -> Result<(), StoreError> {
        self.queue.clear(job).await?;
        self.filter.clear(job).await
    }
}

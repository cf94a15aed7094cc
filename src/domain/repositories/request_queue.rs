// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::job::JobId;
use crate::domain::models::queue_entry::QueueEntry;
use crate::domain::models::request::Request;
use crate::utils::errors::StoreError;

/// 请求队列特质
///
/// 多生产者/多消费者共享的队列。优先级高的先出，同优先级先进先出；
/// 每个条目只会被一个消费者取走
#[async_trait]
pub trait RequestQueue: Send + Sync {
    /// 入队。同一请求推两次会产生两个条目，去重由调度层负责
    async fn push(&self, job: &JobId, request: &Request) -> Result<(), StoreError>;

    /// 把请求指纹写入同一存储中该任务的去重集合，首次出现时入队
    ///
    /// 两步在存储端一次完成：要么都生效，要么都不生效。
    /// 调用失败后重试不会把请求误判为重复而丢失
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 首次出现，已入队
    /// * `Ok(false)` - 指纹已存在，未入队
    /// * `Err(StoreError)` - 存储错误，去重集合与队列均未改变
    async fn push_unseen(&self, job: &JobId, request: &Request) -> Result<bool, StoreError>;

    /// 阻塞出队，最多等待 `timeout`；超时返回 `Ok(None)`
    async fn pop_blocking(
        &self,
        job: &JobId,
        timeout: Duration,
    ) -> Result<Option<QueueEntry>, StoreError>;

    /// 当前长度，仅用于观测
    async fn length(&self, job: &JobId) -> Result<u64, StoreError>;

    /// 清空队列
    async fn clear(&self, job: &JobId) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: RequestQueue + ?Sized> RequestQueue for Arc<T> {
    async fn push(&self, job: &JobId, request: &Request) -> Result<(), StoreError> {
        (**self).push(job, request).await
    }

    async fn push_unseen(&self, job: &JobId, request: &Request) -> Result<bool, StoreError> {
        (**self).push_unseen(job, request).await
    }

    async fn pop_blocking(
        &self,
        job: &JobId,
        timeout: Duration,
    ) -> Result<Option<QueueEntry>, StoreError> {
        (**self).pop_blocking(job, timeout).await
    }

    async fn length(&self, job: &JobId) -> Result<u64, StoreError> {
        (**self).length(job).await
    }

    async fn clear(&self, job: &JobId) -> Result<(), StoreError> {
        (**self).clear(job).await
    }
}

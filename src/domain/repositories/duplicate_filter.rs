// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::models::job::JobId;
use crate::domain::services::fingerprint::Fingerprint;
use crate::utils::errors::StoreError;

/// 去重过滤器特质
///
/// 存储不可达时返回 [`StoreError::FilterUnavailable`]，调用方不得当作"未见过"
#[async_trait]
pub trait DuplicateFilter: Send + Sync {
    /// 指纹是否已记录
    async fn seen(&self, job: &JobId, fingerprint: &Fingerprint) -> Result<bool, StoreError>;

    /// 原子地记录指纹：首次记录返回 true，已存在返回 false。
    /// 并发调用同一指纹时只有一个调用者得到 true
    async fn mark_seen(&self, job: &JobId, fingerprint: &Fingerprint) -> Result<bool, StoreError>;

    /// 已记录的指纹数量
    async fn count(&self, job: &JobId) -> Result<u64, StoreError>;

    /// 清空指纹集合
    async fn clear(&self, job: &JobId) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: DuplicateFilter + ?Sized> DuplicateFilter for Arc<T> {
    async fn seen(&self, job: &JobId, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        (**self).seen(job, fingerprint).await
    }

    async fn mark_seen(&self, job: &JobId, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        (**self).mark_seen(job, fingerprint).await
    }

    async fn count(&self, job: &JobId) -> Result<u64, StoreError> {
        (**self).count(job).await
    }

    async fn clear(&self, job: &JobId) -> Result<(), StoreError> {
        (**self).clear(job).await
    }
}

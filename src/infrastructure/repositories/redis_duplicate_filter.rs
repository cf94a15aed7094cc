// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use redis::RedisError;

use crate::domain::models::job::JobId;
use crate::domain::repositories::duplicate_filter::DuplicateFilter;
use crate::domain::services::fingerprint::Fingerprint;
use crate::infrastructure::cache::redis_client::{classify_error, KeySpace, RedisClient};
use crate::utils::errors::StoreError;

/// Redis去重过滤器实现
///
/// 指纹以十六进制写入集合，`SADD` 的返回值保证同一指纹只有一个调用者得到 true
#[derive(Clone)]
pub struct RedisDuplicateFilter {
    client: RedisClient,
    keys: KeySpace,
}

impl RedisDuplicateFilter {
    pub fn new(client: RedisClient, keys: KeySpace) -> Self {
        Self { client, keys }
    }
}

fn filter_error(err: RedisError) -> StoreError {
    match classify_error(&err) {
        StoreError::Transient(msg) => StoreError::FilterUnavailable(msg),
        other => other,
    }
}

#[async_trait]
impl DuplicateFilter for RedisDuplicateFilter {
    async fn seen(&self, job: &JobId, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        self.client
            .sismember(&self.keys.dupefilter(job), &fingerprint.to_hex())
            .await
            .map_err(filter_error)
    }

    async fn mark_seen(&self, job: &JobId, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        self.client
            .sadd(&self.keys.dupefilter(job), &fingerprint.to_hex())
            .await
            .map_err(filter_error)
    }

    async fn count(&self, job: &JobId) -> Result<u64, StoreError> {
        self.client
            .scard(&self.keys.dupefilter(job))
            .await
            .map_err(filter_error)
    }

    async fn clear(&self, job: &JobId) -> Result<(), StoreError> {
        self.client
            .del(&[self.keys.dupefilter(job)])
            .await
            .map_err(filter_error)
    }
}

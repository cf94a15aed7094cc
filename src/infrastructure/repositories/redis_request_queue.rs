// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::domain::models::job::JobId;
use crate::domain::models::queue_entry::QueueEntry;
use crate::domain::models::request::Request;
use crate::domain::repositories::request_queue::RequestQueue;
use crate::infrastructure::cache::redis_client::{classify_error, KeySpace, RedisClient};
use crate::infrastructure::codec::{decode_entry, encode_entry};
use crate::utils::errors::StoreError;

/// Redis请求队列实现
///
/// 有序集合，分值为优先级取反，成员为 `序号|编码条目`
#[derive(Clone)]
pub struct RedisRequestQueue {
    client: RedisClient,
    keys: KeySpace,
}

impl RedisRequestQueue {
    pub fn new(client: RedisClient, keys: KeySpace) -> Self {
        Self { client, keys }
    }
}

/// 从有序集合成员中拆出编码条目
fn split_member(member: &str) -> Result<&str, StoreError> {
    match member.split_once('|') {
        Some((seq, payload)) if !seq.is_empty() && seq.bytes().all(|b| b.is_ascii_digit()) => {
            Ok(payload)
        }
        _ => Err(StoreError::MalformedEntry(format!(
            "member without sequence prefix: {:.64}",
            member
        ))),
    }
}

#[async_trait]
impl RequestQueue for RedisRequestQueue {
    async fn push(&self, job: &JobId, request: &Request) -> Result<(), StoreError> {
        let payload = encode_entry(&QueueEntry::new(request.clone()))?;
        let score = -f64::from(request.priority());

        let seq = self
            .client
            .push_entry(
                &self.keys.requests(job),
                &self.keys.sequence(job),
                score,
                &payload,
            )
            .await
            .map_err(|e| classify_error(&e))?;

        debug!(job = %job, seq, url = %request.url(), "pushed request");
        Ok(())
    }

    async fn push_unseen(&self, job: &JobId, request: &Request) -> Result<bool, StoreError> {
        let payload = encode_entry(&QueueEntry::new(request.clone()))?;
        let score = -f64::from(request.priority());

        let seq = self
            .client
            .push_entry_unseen(
                &self.keys.requests(job),
                &self.keys.sequence(job),
                &self.keys.dupefilter(job),
                score,
                &payload,
                &request.fingerprint().to_hex(),
            )
            .await
            .map_err(|e| match classify_error(&e) {
                StoreError::Transient(msg) => StoreError::FilterUnavailable(msg),
                other => other,
            })?;

        match seq {
            Some(seq) => {
                debug!(job = %job, seq, url = %request.url(), "pushed unseen request");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pop_blocking(
        &self,
        job: &JobId,
        timeout: Duration,
    ) -> Result<Option<QueueEntry>, StoreError> {
        let member = self
            .client
            .pop_min_blocking(&self.keys.requests(job), timeout)
            .await
            .map_err(|e| classify_error(&e))?;

        match member {
            Some(member) => decode_entry(split_member(&member)?).map(Some),
            None => Ok(None),
        }
    }

    async fn length(&self, job: &JobId) -> Result<u64, StoreError> {
        self.client
            .zcard(&self.keys.requests(job))
            .await
            .map_err(|e| classify_error(&e))
    }

    async fn clear(&self, job: &JobId) -> Result<(), StoreError> {
        self.client
            .del(&[self.keys.requests(job), self.keys.sequence(job)])
            .await
            .map_err(|e| classify_error(&e))
    }
}

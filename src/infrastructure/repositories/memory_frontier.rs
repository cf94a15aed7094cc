// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::domain::models::job::JobId;
use crate::domain::models::queue_entry::QueueEntry;
use crate::domain::models::request::Request;
use crate::domain::repositories::duplicate_filter::DuplicateFilter;
use crate::domain::repositories::request_queue::RequestQueue;
use crate::domain::services::fingerprint::Fingerprint;
use crate::infrastructure::codec::{decode_entry, encode_entry};
use crate::utils::errors::StoreError;

#[derive(Default)]
struct JobState {
    /// (优先级取反, 序号) -> 编码条目
    entries: BTreeMap<(i64, u64), String>,
    seen: HashSet<Fingerprint>,
    notify: Arc<Notify>,
}

/// 进程内的请求队列与去重过滤器
///
/// 与Redis实现遵循同样的排序与去重语义，用于单进程运行和测试。
/// 提供故障注入接口以模拟存储不可用
#[derive(Default)]
pub struct MemoryFrontier {
    jobs: Mutex<HashMap<JobId, JobState>>,
    sequence: AtomicU64,
    unavailable: AtomicBool,
    injected_failures: AtomicU32,
}

impl MemoryFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 切换存储可用状态，不可用时所有操作返回瞬时错误
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
        if available {
            // 唤醒阻塞中的消费者重新检查
            for state in self.lock().values() {
                state.notify.notify_waiters();
            }
        }
    }

    /// 接下来的 `count` 次操作返回瞬时错误
    pub fn fail_next(&self, count: u32) {
        self.injected_failures.store(count, Ordering::SeqCst);
    }

    /// 直接写入原始条目，绕过编码
    pub fn push_raw(&self, job: &JobId, priority: i32, raw: impl Into<String>) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let mut jobs = self.lock();
        let state = jobs.entry(job.clone()).or_default();
        state.entries.insert((-i64::from(priority), seq), raw.into());
        state.notify.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, JobState>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Transient("memory store unavailable".into()));
        }
        let injected = self
            .injected_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if injected.is_ok() {
            return Err(StoreError::Transient("injected failure".into()));
        }
        Ok(())
    }

    fn check_filter_available(&self) -> Result<(), StoreError> {
        self.check_available().map_err(|e| match e {
            StoreError::Transient(msg) => StoreError::FilterUnavailable(msg),
            other => other,
        })
    }

    fn notifier(&self, job: &JobId) -> Arc<Notify> {
        self.lock().entry(job.clone()).or_default().notify.clone()
    }

    /// 取出队首条目；若还有剩余则把唤醒传给下一个等待者
    fn try_pop(&self, job: &JobId) -> Option<String> {
        let mut jobs = self.lock();
        let state = jobs.get_mut(job)?;
        let (_, raw) = state.entries.pop_first()?;
        if !state.entries.is_empty() {
            state.notify.notify_one();
        }
        Some(raw)
    }
}

#[async_trait]
impl RequestQueue for MemoryFrontier {
    async fn push(&self, job: &JobId, request: &Request) -> Result<(), StoreError> {
        self.check_available()?;
        let raw = encode_entry(&QueueEntry::new(request.clone()))?;
        self.push_raw(job, request.priority(), raw);
        Ok(())
    }

    async fn push_unseen(&self, job: &JobId, request: &Request) -> Result<bool, StoreError> {
        self.check_filter_available()?;
        let raw = encode_entry(&QueueEntry::new(request.clone()))?;

        // 去重与入队持有同一把锁
        let mut jobs = self.lock();
        let state = jobs.entry(job.clone()).or_default();
        if !state.seen.insert(request.fingerprint()) {
            return Ok(false);
        }
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        state
            .entries
            .insert((-i64::from(request.priority()), seq), raw);
        state.notify.notify_one();
        Ok(true)
    }

    async fn pop_blocking(
        &self,
        job: &JobId,
        timeout: Duration,
    ) -> Result<Option<QueueEntry>, StoreError> {
        self.check_available()?;
        let deadline = Instant::now() + timeout;
        let notify = self.notifier(job);

        loop {
            if let Some(raw) = self.try_pop(job) {
                return decode_entry(&raw).map(Some);
            }
            if tokio::time::timeout_at(deadline, notify.notified())
                .await
                .is_err()
            {
                break;
            }
            self.check_available()?;
        }

        // 超时与入队同时发生时不丢掉条目
        match self.try_pop(job) {
            Some(raw) => decode_entry(&raw).map(Some),
            None => Ok(None),
        }
    }

    async fn length(&self, job: &JobId) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self
            .lock()
            .get(job)
            .map(|state| state.entries.len() as u64)
            .unwrap_or(0))
    }

    async fn clear(&self, job: &JobId) -> Result<(), StoreError> {
        self.check_available()?;
        if let Some(state) = self.lock().get_mut(job) {
            state.entries.clear();
        }
        Ok(())
    }
}

#[async_trait]
impl DuplicateFilter for MemoryFrontier {
    async fn seen(&self, job: &JobId, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        self.check_filter_available()?;
        Ok(self
            .lock()
            .get(job)
            .is_some_and(|state| state.seen.contains(fingerprint)))
    }

    async fn mark_seen(&self, job: &JobId, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        self.check_filter_available()?;
        Ok(self
            .lock()
            .entry(job.clone())
            .or_default()
            .seen
            .insert(*fingerprint))
    }

    async fn count(&self, job: &JobId) -> Result<u64, StoreError> {
        self.check_filter_available()?;
        Ok(self
            .lock()
            .get(job)
            .map(|state| state.seen.len() as u64)
            .unwrap_or(0))
    }

    async fn clear(&self, job: &JobId) -> Result<(), StoreError> {
        self.check_filter_available()?;
        if let Some(state) = self.lock().get_mut(job) {
            state.seen.clear();
        }
        Ok(())
    }
}

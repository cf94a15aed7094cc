// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::settings::RetrySettings;
use crate::utils::errors::{SchedulerError, StoreError};

/// 重试策略配置
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数
    pub max_retries: u32,
    /// 初始退避时间
    pub initial_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            enable_jitter: true,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            ..Self::default()
        }
    }
}

impl RetryPolicy {
    /// 创建快速重试策略（更短的退避时间）
    pub fn fast() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            enable_jitter: true,
        }
    }

    /// 计算第 `attempt` 次重试前的退避时间（从1开始）
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let backoff_secs = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);

        // 限制最大退避时间
        let capped_backoff = backoff_secs.min(self.max_backoff.as_secs_f64());

        let final_backoff = if self.enable_jitter && capped_backoff > 0.0 {
            let jitter_range = capped_backoff * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..=jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_secs_f64(final_backoff)
    }

    /// 已经重试 `attempt` 次后是否还应继续
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// 执行存储操作，瞬时错误按退避重试，非瞬时错误直接返回
    ///
    /// 重试耗尽时返回 [`SchedulerError::StoreExhausted`]
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, SchedulerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    if !self.should_retry(attempt) {
                        return Err(SchedulerError::StoreExhausted {
                            attempts: attempt + 1,
                            source: e,
                        });
                    }
                    attempt += 1;
                    let backoff = self.calculate_backoff(attempt);
                    metrics::counter!(crate::infrastructure::metrics::STORE_RETRIES_TOTAL)
                        .increment(1);
                    warn!(
                        "{} failed ({}), retry {}/{} in {:?}",
                        operation, e, attempt, self.max_retries, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(SchedulerError::Store(e)),
            }
        }
    }
}

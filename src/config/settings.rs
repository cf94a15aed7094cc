// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含Redis、网关、调度器、抓取、去重、数据管道、指标与日志等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Redis配置
    pub redis: RedisSettings,
    /// 网关服务配置
    pub gateway: GatewaySettings,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// 抓取配置
    pub fetch: FetchSettings,
    /// 指纹配置
    pub fingerprint: FingerprintSettings,
    /// 数据管道配置
    pub pipeline: PipelineSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
    /// 日志配置
    pub logging: LoggingSettings,
}

/// Redis配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: String,
    /// 键前缀，多个部署共用一个Redis时用于隔离
    pub key_prefix: String,
}

/// 网关配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// 监听主机地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 调度器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// 单次阻塞出队的超时时间（秒）
    pub pop_timeout_secs: u64,
    /// 连续空轮询多少次后退出，0 表示一直等待
    pub max_empty_polls: u32,
    /// 每个Worker同时在途的请求数
    pub concurrency: usize,
    /// 存储访问重试配置
    pub retry: RetrySettings,
}

/// 重试配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// 最大重试次数
    pub max_retries: u32,
    /// 初始退避（毫秒）
    pub initial_backoff_ms: u64,
    /// 最大退避（毫秒）
    pub max_backoff_ms: u64,
}

/// 抓取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    /// 单次抓取超时（秒），与队列超时无关
    pub timeout_secs: u64,
    /// User-Agent
    pub user_agent: String,
}

/// 指纹配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct FingerprintSettings {
    /// 计算指纹时是否忽略查询参数顺序
    pub ignore_query_order: bool,
}

/// 数据管道配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    /// 管道类型 (log, jsonl)
    pub kind: String,
    /// jsonl 输出路径
    pub path: Option<String>,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用Prometheus导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen: String,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 输出格式 (pretty, json)
    pub format: String,
    /// 默认过滤规则
    pub filter: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}` 与
    /// `FRONTIER__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("FRONTIER").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅使用内置默认值
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("redis.key_prefix", "")?
            .set_default("gateway.host", "0.0.0.0")?
            .set_default("gateway.port", 3000)?
            // Default Scheduler settings
            .set_default("scheduler.pop_timeout_secs", 5)?
            .set_default("scheduler.max_empty_polls", 0)?
            .set_default("scheduler.concurrency", 8)?
            .set_default("scheduler.retry.max_retries", 5)?
            .set_default("scheduler.retry.initial_backoff_ms", 200)?
            .set_default("scheduler.retry.max_backoff_ms", 10_000)?
            // Default Fetch settings
            .set_default("fetch.timeout_secs", 30)?
            .set_default(
                "fetch.user_agent",
                "Mozilla/5.0 (compatible; frontier/0.1; +https://github.com/Kirky-X)",
            )?
            .set_default("fingerprint.ignore_query_order", false)?
            .set_default("pipeline.kind", "log")?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen", "0.0.0.0:9000")?
            .set_default("logging.format", "pretty")?
            .set_default("logging.filter", "info,frontier=debug")
    }
}

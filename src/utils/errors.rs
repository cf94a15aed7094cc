// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 共享存储错误类型
///
/// 请求队列与去重过滤器共用的错误分类，调度器据此决定重试、跳过还是停止
#[derive(Error, Debug)]
pub enum StoreError {
    /// 瞬时错误（超时、连接重置），可退避重试
    #[error("存储暂时不可用: {0}")]
    Transient(String),

    /// 去重过滤器不可用，按瞬时错误处理，绝不能当作"未见过"
    #[error("去重过滤器不可用: {0}")]
    FilterUnavailable(String),

    /// 队列条目无法解码，记录后跳过，不重试
    #[error("队列条目格式错误: {0}")]
    MalformedEntry(String),

    /// 不可恢复的存储错误
    #[error("存储致命错误: {0}")]
    Fatal(String),
}

impl StoreError {
    /// 是否可以退避重试
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Transient(_) | StoreError::FilterUnavailable(_)
        )
    }
}

/// 请求构造错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("无效URL: {0}")]
    InvalidUrl(String),

    #[error("不支持的协议: {0}")]
    UnsupportedScheme(String),

    #[error("无效任务名: {0}")]
    InvalidJob(String),

    #[error("无效请求方法: {0}")]
    InvalidMethod(String),

    #[error("无效指纹: {0}")]
    InvalidFingerprint(String),

    #[error("无效请求头 {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// 爬虫运行时错误，仅作用于单个请求
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// 抓取失败
    #[error("抓取失败 {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// 解析失败
    #[error("解析失败 {url}: {reason}")]
    Parse { url: String, reason: String },
}

/// 数据管道错误
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 调度器错误类型
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// 重试耗尽后存储依旧不可用
    #[error("存储在 {attempts} 次尝试后仍不可用: {source}")]
    StoreExhausted {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// 其他不可恢复的存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("调度器错误: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("未知爬虫: {0}")]
    UnknownSpider(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("请求错误: {0}")]
    Request(#[from] RequestError),

    #[error("管道错误: {0}")]
    Pipeline(#[from] PipelineError),
}

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

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::domain::models::request::Request;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 服务端返回错误状态码
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => e.is_timeout() || e.is_connect(),
            EngineError::HttpStatus(status) => *status >= 500 || *status == 429,
            EngineError::Timeout => true,
            EngineError::Other(_) => false,
        }
    }
}

/// 抓取响应
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// 跟随重定向后的最终URL
    pub url: Url,
    /// HTTP状态码
    pub status_code: u16,
    /// 响应内容
    pub content: String,
    /// 内容类型
    pub content_type: String,
    /// 响应头
    pub headers: HashMap<String, String>,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

impl FetchResponse {
    /// 以HTML内容构造成功响应
    pub fn html(url: Url, content: impl Into<String>) -> Self {
        Self {
            url,
            status_code: 200,
            content: content.into(),
            content_type: "text/html".to_string(),
            headers: HashMap::new(),
            response_time_ms: 0,
        }
    }
}

/// 抓取引擎特质
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// 执行抓取
    async fn fetch(&self, request: &Request) -> Result<FetchResponse, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(&self, request: &Request) -> Result<FetchResponse, EngineError> {
        (**self).fetch(request).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

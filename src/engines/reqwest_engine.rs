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

use crate::config::settings::FetchSettings;
use crate::domain::models::request::{Method, Request};
use crate::engines::traits::{EngineError, FetchResponse, Fetcher};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::warn;

/// 抓取引擎
///
/// 基于reqwest实现的基本HTTP抓取引擎。客户端只构建一次，
/// 所有请求共享连接池
#[derive(Clone)]
pub struct ReqwestEngine {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestEngine {
    /// 创建抓取引擎
    ///
    /// # 参数
    ///
    /// * `settings` - 抓取配置（超时、User-Agent）
    pub fn new(settings: &FetchSettings) -> Result<Self, EngineError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self { client, timeout })
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Patch => reqwest::Method::PATCH,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

#[async_trait]
impl Fetcher for ReqwestEngine {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `request` - 爬取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 抓取响应
    /// * `Err(EngineError)` - 网络错误、超时或状态码 >= 400
    async fn fetch(&self, request: &Request) -> Result<FetchResponse, EngineError> {
        // Build headers
        let mut headers = HeaderMap::new();
        for (k, v) in request.headers() {
            match (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                // 构建器已校验，只有绕过构建器的条目会走到这里
                _ => warn!(url = %request.url(), header = %k, "dropping invalid request header"),
            }
        }

        let mut builder = self
            .client
            .request(Self::method(request.method()), request.url().clone())
            .headers(headers)
            .timeout(self.timeout);
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }

        let start = Instant::now();
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                EngineError::Timeout
            } else {
                EngineError::RequestFailed(e)
            }
        })?;

        let status_code = response.status().as_u16();
        if status_code >= 400 {
            return Err(EngineError::HttpStatus(status_code));
        }

        let url = response.url().clone();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or("text/html")
            .to_string();

        let mut response_headers = HashMap::new();
        for (k, v) in response.headers() {
            if let Ok(v_str) = v.to_str() {
                response_headers.insert(k.as_str().to_string(), v_str.to_string());
            }
        }

        let content = response.text().await?;

        Ok(FetchResponse {
            url,
            status_code,
            content,
            content_type,
            headers: response_headers,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// 获取引擎名称
    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;

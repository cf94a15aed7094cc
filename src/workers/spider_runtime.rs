// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

use crate::domain::models::request::Request;
use crate::engines::traits::Fetcher;
use crate::infrastructure::metrics::FETCH_DURATION_SECONDS;
use crate::spiders::{ParseOutput, Spider};
use crate::utils::errors::RuntimeError;

/// 爬虫运行时
///
/// 抓取加解析。每次调用只处理一个请求，错误只影响该请求
#[derive(Clone)]
pub struct SpiderRuntime {
    fetcher: Arc<dyn Fetcher>,
    spider: Arc<dyn Spider>,
}

impl SpiderRuntime {
    pub fn new(fetcher: Arc<dyn Fetcher>, spider: Arc<dyn Spider>) -> Self {
        Self { fetcher, spider }
    }

    pub fn spider(&self) -> &Arc<dyn Spider> {
        &self.spider
    }

    /// 执行单个请求
    ///
    /// # 返回值
    ///
    /// * `Ok(ParseOutput)` - 解析出的条目与后续请求
    /// * `Err(RuntimeError)` - 抓取或解析失败
    #[instrument(skip(self, request), fields(url = %request.url(), spider = self.spider.name()))]
    pub async fn execute(&self, request: &Request) -> Result<ParseOutput, RuntimeError> {
        let start = Instant::now();
        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|e| RuntimeError::Fetch {
                url: request.url().to_string(),
                reason: e.to_string(),
            })?;
        metrics::histogram!(FETCH_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        let output = self.spider.parse(request, &response)?;
        debug!(
            status = response.status_code,
            items = output.items.len(),
            requests = output.requests.len(),
            "parsed response"
        );
        Ok(output)
    }
}

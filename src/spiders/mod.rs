// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 爬虫模块
///
/// 爬虫负责把一个响应解析为条目与后续请求，不持有跨请求的状态；
/// 断点续爬完全依赖共享队列
pub mod quotes;

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::models::item::Item;
use crate::domain::models::request::Request;
use crate::engines::traits::FetchResponse;
use crate::utils::errors::RuntimeError;

pub use quotes::QuotesSpider;

/// 单次解析的产出
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub requests: Vec<Request>,
    pub items: Vec<Item>,
}

impl ParseOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request(&mut self, request: Request) {
        self.requests.push(request);
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }
}

/// 爬虫特质
pub trait Spider: Send + Sync {
    /// 爬虫名称
    fn name(&self) -> &'static str;

    /// 任务的种子URL
    fn start_urls(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// 解析响应
    ///
    /// # 参数
    ///
    /// * `request` - 产生该响应的请求
    /// * `response` - 抓取响应
    fn parse(&self, request: &Request, response: &FetchResponse)
        -> Result<ParseOutput, RuntimeError>;
}

/// 按名称查找爬虫
#[derive(Default, Clone)]
pub struct SpiderRegistry {
    spiders: HashMap<&'static str, Arc<dyn Spider>>,
}

impl SpiderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置爬虫
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(QuotesSpider::new()));
        registry
    }

    pub fn register(&mut self, spider: Arc<dyn Spider>) {
        self.spiders.insert(spider.name(), spider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Spider>> {
        self.spiders.get(name).cloned()
    }

    /// 已注册的爬虫名称（排序后）
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.spiders.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

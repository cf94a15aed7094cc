// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 抓取结果条目
///
/// 固定字段加一个扩展字段表，具体内容由爬虫决定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// 产生该条目的爬虫
    pub spider: String,
    /// 来源页面
    pub url: String,
    /// 抓取时间
    pub scraped_at: DateTime<Utc>,
    /// 爬虫自定义字段
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Item {
    pub fn new(spider: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            spider: spider.into(),
            url: url.into(),
            scraped_at: Utc::now(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}

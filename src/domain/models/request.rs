// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

use crate::domain::services::fingerprint::{fingerprint, Fingerprint, FingerprintOptions};
use crate::utils::errors::RequestError;
use crate::utils::url_utils::{normalize_url, resolve_url};

/// HTTP请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "PATCH" => Ok(Method::Patch),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(RequestError::InvalidMethod(s.to_string())),
        }
    }
}

/// 爬取请求
///
/// 构造后不可变。指纹只由方法、规范化URL和请求体决定，
/// 与请求头顺序、扩展字段无关
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    url: Url,
    method: Method,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    dont_filter: bool,
    /// 爬虫自定义字段
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    meta: BTreeMap<String, serde_json::Value>,
    fingerprint: Fingerprint,
}

impl Request {
    /// 以默认参数构造 GET 请求
    pub fn get(url: &str) -> Result<Self, RequestError> {
        Self::builder(url).build()
    }

    /// 创建请求构建器
    pub fn builder(url: &str) -> RequestBuilder {
        RequestBuilder::new(url)
    }

    /// 基于当前请求的URL解析相对链接，生成新的 GET 请求
    pub fn follow(&self, href: &str) -> Result<Self, RequestError> {
        let absolute =
            resolve_url(&self.url, href).map_err(|e| RequestError::InvalidUrl(e.to_string()))?;
        Self::get(absolute.as_str())
    }

    /// 按指定选项重新计算指纹
    ///
    /// 构建器总以默认选项计算指纹；入队时 `Frontier` 会按任务的选项重新计算
    pub fn with_fingerprint_options(mut self, options: &FingerprintOptions) -> Self {
        self.fingerprint = fingerprint(self.method, &self.url, self.body.as_deref(), options);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// 为 true 时跳过去重过滤器
    pub fn dont_filter(&self) -> bool {
        self.dont_filter
    }

    pub fn meta(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.meta
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

/// 请求构建器
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    url: String,
    method: Method,
    headers: BTreeMap<String, String>,
    body: Option<String>,
    priority: i32,
    dont_filter: bool,
    meta: BTreeMap<String, serde_json::Value>,
}

impl RequestBuilder {
    fn new(url: &str) -> Self {
        Self {
            url: url.trim().to_string(),
            method: Method::Get,
            headers: BTreeMap::new(),
            body: None,
            priority: 0,
            dont_filter: false,
            meta: BTreeMap::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn dont_filter(mut self, dont_filter: bool) -> Self {
        self.dont_filter = dont_filter;
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// 校验URL并计算指纹
    pub fn build(self) -> Result<Request, RequestError> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| RequestError::InvalidUrl(format!("{}: {}", self.url, e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(RequestError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        for (name, value) in &self.headers {
            validate_header(name, value)?;
        }

        let url = normalize_url(&parsed, false);
        let fingerprint = fingerprint(
            self.method,
            &url,
            self.body.as_deref(),
            &FingerprintOptions::default(),
        );

        Ok(Request {
            url,
            method: self.method,
            headers: self.headers,
            body: self.body,
            priority: self.priority,
            dont_filter: self.dont_filter,
            meta: self.meta,
            fingerprint,
        })
    }
}

/// 请求头必须能被HTTP客户端原样发出
fn validate_header(name: &str, value: &str) -> Result<(), RequestError> {
    let invalid = |reason: String| RequestError::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
    HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
    Ok(())
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 规范化URL，使同一资源的不同写法得到相同结果
///
/// 解析阶段已经完成协议和主机名小写化、默认端口移除以及空路径补全为 `/`，
/// 这里再去掉片段和空查询串，并按需对查询参数排序
pub fn normalize_url(url: &Url, sort_query: bool) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);

    match normalized.query() {
        Some("") => normalized.set_query(None),
        Some(_) if sort_query => {
            let mut pairs: Vec<(String, String)> = normalized
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            pairs.sort();
            normalized.query_pairs_mut().clear().extend_pairs(pairs);
        }
        _ => {}
    }

    normalized
}

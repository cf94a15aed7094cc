// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::domain::models::request::Method;
use crate::utils::errors::RequestError;
use crate::utils::url_utils::normalize_url;

/// 请求指纹
///
/// 对 (方法, 规范化URL, 请求体) 的规范序列化做 SHA-256，固定 32 字节
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// 原始字节
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// 小写十六进制表示，也是写入去重集合的形式
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| RequestError::InvalidFingerprint(e.to_string()))?;
        let array: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            RequestError::InvalidFingerprint(format!("expected 32 bytes, got {}", b.len()))
        })?;
        Ok(Self(array))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 指纹计算选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerprintOptions {
    /// 忽略查询参数顺序
    pub ignore_query_order: bool,
}

/// 计算请求指纹
///
/// 请求头和扩展字段不参与计算，各段之间用 NUL 分隔避免拼接歧义
pub fn fingerprint(
    method: Method,
    url: &Url,
    body: Option<&str>,
    options: &FingerprintOptions,
) -> Fingerprint {
    let normalized = normalize_url(url, options.ignore_query_order);

    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(normalized.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(body.unwrap_or_default().as_bytes());

    Fingerprint(hasher.finalize().into())
}

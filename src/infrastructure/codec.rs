// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 队列条目编码
//!
//! 条目以带版本号的 JSON 存储，不同版本的 Worker 可以互相消费彼此写入的条目。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::queue_entry::QueueEntry;
use crate::domain::models::request::Request;
use crate::utils::errors::StoreError;

/// 当前编码版本
pub const ENTRY_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    v: u32,
    enqueued_at: DateTime<Utc>,
    request: &'a Request,
}

#[derive(Deserialize)]
struct VersionProbe {
    v: u32,
}

#[derive(Deserialize)]
struct Envelope {
    enqueued_at: DateTime<Utc>,
    request: Request,
}

/// 编码队列条目
pub fn encode_entry(entry: &QueueEntry) -> Result<String, StoreError> {
    let envelope = EnvelopeRef {
        v: ENTRY_VERSION,
        enqueued_at: entry.enqueued_at,
        request: &entry.request,
    };
    serde_json::to_string(&envelope)
        .map_err(|e| StoreError::Fatal(format!("failed to encode queue entry: {}", e)))
}

/// 解码队列条目，无法识别的内容返回 [`StoreError::MalformedEntry`]
pub fn decode_entry(raw: &str) -> Result<QueueEntry, StoreError> {
    let probe: VersionProbe = serde_json::from_str(raw)
        .map_err(|e| StoreError::MalformedEntry(format!("unreadable envelope: {}", e)))?;

    if probe.v != ENTRY_VERSION {
        return Err(StoreError::MalformedEntry(format!(
            "unsupported entry version {}",
            probe.v
        )));
    }

    let envelope: Envelope = serde_json::from_str(raw)
        .map_err(|e| StoreError::MalformedEntry(format!("invalid v{} entry: {}", probe.v, e)))?;

    Ok(QueueEntry {
        request: envelope.request,
        enqueued_at: envelope.enqueued_at,
    })
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};

use crate::domain::models::request::Request;

/// 队列条目：请求加入队时间
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub request: Request,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            enqueued_at: Utc::now(),
        }
    }
}

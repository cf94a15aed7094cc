// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供请求队列与去重过滤器的Redis实现和进程内实现
pub mod memory_frontier;
pub mod redis_duplicate_filter;
pub mod redis_request_queue;

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 缓存（cache）：Redis客户端与键空间
/// - 编码（codec）：队列条目的版本化编码
/// - 指标（metrics）：Prometheus导出与指标名
/// - 管道（pipelines）：条目输出实现
/// - 仓库实现（repositories）：请求队列与去重过滤器的具体实现
pub mod cache;
pub mod codec;
pub mod metrics;
pub mod pipelines;
pub mod repositories;

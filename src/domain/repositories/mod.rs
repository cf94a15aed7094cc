// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 共享存储的抽象契约，具体实现由基础设施层提供：
/// - 请求队列（request_queue）：按优先级与入队顺序出队的共享队列
/// - 去重过滤器（duplicate_filter）：按任务划分的指纹集合
/// - 数据管道（item_pipeline）：接收爬虫产出的条目
pub mod duplicate_filter;
pub mod item_pipeline;
pub mod request_queue;

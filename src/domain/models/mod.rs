// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心实体，包括：
/// - 请求（request）：待抓取的不可变请求及其指纹
/// - 条目（item）：爬虫产出的结果
/// - 任务（job）：一次命名的爬取运行
/// - 队列条目（queue_entry）：请求加入队时间
pub mod item;
pub mod job;
pub mod queue_entry;
pub mod request;

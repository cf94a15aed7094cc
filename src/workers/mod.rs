// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 爬虫运行时、爬取工作器与进程级的关闭信号管理
pub mod crawl_worker;
pub mod manager;
pub mod spider_runtime;
pub mod worker;

pub use worker::Worker;

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 请求、条目、任务等核心模型，指纹函数与存储接口
pub mod domain;

/// 引擎模块
///
/// 网页抓取引擎
pub mod engines;

/// 基础设施模块
///
/// Redis存储、条目编码、管道与指标
pub mod infrastructure;

/// 表示层模块
///
/// 接入网关的路由与处理器
pub mod presentation;

/// 队列模块
///
/// 去重入队路径与调度循环
pub mod queue;

/// 爬虫模块
pub mod spiders;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 爬虫运行时与工作器生命周期
pub mod workers;

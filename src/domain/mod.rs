// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心逻辑，包括：
/// - 领域模型（models）：请求、条目、任务等实体
/// - 仓库接口（repositories）：请求队列、去重过滤器与数据管道的抽象契约
/// - 服务（services）：请求指纹计算
///
/// 领域层不依赖于任何外部实现，Redis 与内存实现都在基础设施层。
pub mod models;
pub mod repositories;
pub mod services;

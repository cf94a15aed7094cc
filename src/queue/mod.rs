// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 去重入队路径与每个Worker的调度循环
pub mod frontier;
pub mod scheduler;

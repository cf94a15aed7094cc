// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::handlers::gateway_handler;
use crate::queue::frontier::Frontier;
use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let gateway_routes = Router::new()
        .route("/v1/jobs/{job}/urls", post(gateway_handler::push_url))
        .route("/v1/jobs/{job}/requests", post(gateway_handler::push_request))
        .route("/v1/jobs/{job}/length", get(gateway_handler::queue_length))
        .route(
            "/v1/jobs/{job}/seen/{fingerprint}",
            get(gateway_handler::fingerprint_seen),
        );

    Router::new().merge(public_routes).merge(gateway_routes)
}

/// 组装网关应用：路由、共享存储与请求日志
pub fn app(frontier: Arc<Frontier>) -> Router {
    routes()
        .layer(Extension(frontier))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

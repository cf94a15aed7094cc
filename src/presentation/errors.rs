// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::utils::errors::{RequestError, StoreError};

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<RequestError>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        match self.0.downcast_ref::<StoreError>() {
            // 客户端可以安全重发，去重保证不会重复入队
            Some(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.0.to_string();

        if status.is_server_error() {
            if status == StatusCode::SERVICE_UNAVAILABLE {
                warn!("Store unavailable: {}", error_message);
            } else {
                error!("Request failed: {}", error_message);
            }
        }

        let body = Json(json!({ "success": false, "error": error_message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

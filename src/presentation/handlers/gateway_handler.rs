// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::models::job::JobId;
use crate::domain::models::request::{Method, Request};
use crate::domain::services::fingerprint::Fingerprint;
use crate::presentation::errors::AppError;
use crate::queue::frontier::{EnqueueOutcome, Frontier};

/// 结构化入队请求体
#[derive(Debug, Deserialize)]
pub struct PushRequestDto {
    pub url: String,
    #[serde(default)]
    pub method: Option<Method>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub dont_filter: bool,
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
}

impl PushRequestDto {
    fn into_request(self) -> Result<Request, AppError> {
        let mut builder = Request::builder(&self.url)
            .method(self.method.unwrap_or_default())
            .priority(self.priority)
            .dont_filter(self.dont_filter);
        if let Some(body) = self.body {
            builder = builder.body(body);
        }
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        for (key, value) in self.meta {
            builder = builder.meta(key, value);
        }
        Ok(builder.build()?)
    }
}

async fn enqueue(
    frontier: &Frontier,
    job: &JobId,
    request: Request,
) -> Result<(StatusCode, Json<Value>), AppError> {
    // 响应中的指纹与去重使用的一致
    let request = request.with_fingerprint_options(frontier.fingerprint_options());
    let url = request.url().to_string();
    let fingerprint = request.fingerprint();

    let outcome = frontier.enqueue(job, request).await?;
    info!(job = %job, %url, outcome = outcome.as_str(), "gateway push");

    let status = match outcome {
        EnqueueOutcome::Enqueued => StatusCode::CREATED,
        EnqueueOutcome::Duplicate => StatusCode::OK,
    };
    Ok((
        status,
        Json(json!({
            "success": true,
            "status": outcome.as_str(),
            "job": job,
            "url": url,
            "fingerprint": fingerprint,
        })),
    ))
}

/// 以纯文本形式推送一个URL
///
/// 请求体为原始URL，构造 GET 请求后走与内部发现相同的去重入队路径
pub async fn push_url(
    Extension(frontier): Extension<Arc<Frontier>>,
    Path(job): Path<String>,
    body: String,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let job = JobId::parse(job)?;
    let request = Request::get(&body)?;
    enqueue(&frontier, &job, request).await
}

/// 以JSON形式推送完整请求
pub async fn push_request(
    Extension(frontier): Extension<Arc<Frontier>>,
    Path(job): Path<String>,
    Json(payload): Json<PushRequestDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let job = JobId::parse(job)?;
    let request = payload.into_request()?;
    enqueue(&frontier, &job, request).await
}

/// 队列长度
pub async fn queue_length(
    Extension(frontier): Extension<Arc<Frontier>>,
    Path(job): Path<String>,
) -> Result<Json<Value>, AppError> {
    let job = JobId::parse(job)?;
    let length = frontier.length(&job).await?;
    Ok(Json(json!({ "job": job, "length": length })))
}

/// 指纹是否已记录
pub async fn fingerprint_seen(
    Extension(frontier): Extension<Arc<Frontier>>,
    Path((job, fingerprint)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let job = JobId::parse(job)?;
    let fingerprint: Fingerprint = fingerprint.parse()?;
    let seen = frontier.seen(&job, &fingerprint).await?;
    Ok(Json(json!({
        "job": job,
        "fingerprint": fingerprint,
        "seen": seen,
    })))
}

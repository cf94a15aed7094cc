// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Context;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;

pub const REQUESTS_ENQUEUED_TOTAL: &str = "frontier_requests_enqueued_total";
pub const DUPLICATES_TOTAL: &str = "frontier_duplicates_total";
pub const REQUESTS_POPPED_TOTAL: &str = "frontier_requests_popped_total";
pub const MALFORMED_TOTAL: &str = "frontier_malformed_entries_total";
pub const STORE_RETRIES_TOTAL: &str = "frontier_store_retries_total";
pub const REQUEST_FAILURES_TOTAL: &str = "frontier_request_failures_total";
pub const ITEMS_TOTAL: &str = "frontier_items_total";
pub const PIPELINE_ERRORS_TOTAL: &str = "frontier_pipeline_errors_total";
pub const IN_FLIGHT: &str = "frontier_in_flight_requests";
pub const FETCH_DURATION_SECONDS: &str = "frontier_fetch_duration_seconds";

/// 初始化指标导出
///
/// 未启用时不安装记录器，指标宏调用成为空操作
pub fn init_metrics(settings: &MetricsSettings) -> anyhow::Result<()> {
    if !settings.enabled {
        return Ok(());
    }

    let addr: SocketAddr = settings
        .listen
        .parse()
        .with_context(|| format!("invalid metrics listen address: {}", settings.listen))?;

    // 端口被占用时只告警，不影响爬取
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return Ok(());
    }

    describe_counter!(
        REQUESTS_ENQUEUED_TOTAL,
        "Requests accepted by the duplicate filter and pushed"
    );
    describe_counter!(DUPLICATES_TOTAL, "Requests dropped as already seen");
    describe_counter!(REQUESTS_POPPED_TOTAL, "Requests taken from the queue");
    describe_counter!(MALFORMED_TOTAL, "Queue entries that could not be decoded");
    describe_counter!(STORE_RETRIES_TOTAL, "Retries after transient store errors");
    describe_counter!(REQUEST_FAILURES_TOTAL, "Requests whose fetch or parse failed");
    describe_counter!(ITEMS_TOTAL, "Items handed to the pipeline");
    describe_counter!(PIPELINE_ERRORS_TOTAL, "Items the pipeline failed to store");
    describe_gauge!(IN_FLIGHT, "Requests currently being fetched or parsed");
    describe_histogram!(FETCH_DURATION_SECONDS, "Duration of page fetches in seconds");

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

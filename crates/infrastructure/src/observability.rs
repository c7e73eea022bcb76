//! 上游调用指标

use std::time::Instant;

use dashboard_core::DashboardResult;
use metrics::{counter, histogram};

pub const UPSTREAM_REQUESTS_TOTAL: &str = "dashboard_upstream_requests_total";
pub const UPSTREAM_REQUEST_DURATION_SECONDS: &str = "dashboard_upstream_request_duration_seconds";

/// 记录一次上游调用的结果和耗时
pub fn record_upstream_call<T>(service: &'static str, started: Instant, result: &DashboardResult<T>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) if e.is_unavailable() => "unavailable",
        Err(_) => "error",
    };
    counter!(UPSTREAM_REQUESTS_TOTAL, "service" => service, "outcome" => outcome).increment(1);
    histogram!(UPSTREAM_REQUEST_DURATION_SECONDS, "service" => service).record(started.elapsed().as_secs_f64());
}

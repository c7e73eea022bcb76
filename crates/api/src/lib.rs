//! # Dashboard API
//!
//! 运维看板的 JSON 接口，所有响应使用统一的 `ApiResponse` 包装，
//! 错误使用 `{"error": {...}}` 结构。
//!
//! ## API 端点
//!
//! - `GET /health` - 健康检查
//! - `GET /api/overview` - Broker 概览图表和最近24小时执行统计
//! - `GET /api/tasks?q=&ignore_case=` - 任务目录
//! - `GET /api/tasks/{name}?vhost=&after=` - 任务详情与执行历史分页
//! - `POST /api/tasks/{name}/dispatch` - 以请求体为参数派发任务
//! - `GET /api/executions/{task_id}` - 执行参数与日志
//! - `POST /api/executions/{task_id}/redispatch` - 以原参数重新派发
//! - `GET /metrics` - Prometheus 指标（启用时）
//!
//! ## 状态码
//!
//! | 错误 | 状态码 |
//! |------|--------|
//! | 上游不可用 | 503 |
//! | 上游响应格式错误 | 502 |
//! | 任务或执行不存在 | 404，附带 `redirect_to` |
//! | 参数错误 | 400 |

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::{extract::DefaultBodyLimit, Router};
use dashboard_core::config::{ApiConfig, ObservabilityConfig};
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, timeout_layer, trace_layer};
pub use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(state: AppState, api_config: &ApiConfig, observability: &ObservabilityConfig) -> Router {
    let router = create_routes(state, &observability.metrics_endpoint)
        .layer(DefaultBodyLimit::max(api_config.max_request_size_mb * 1024 * 1024));

    let router = if api_config.cors_enabled {
        router.layer(cors_layer(api_config))
    } else {
        router
    };

    router.layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(timeout_layer(api_config))
            .layer(axum::middleware::from_fn(request_logging)),
    )
}

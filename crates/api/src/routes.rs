use axum::{
    routing::{get, post},
    Router,
};
use dashboard_domain::DashboardService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::error::ApiError;
use crate::handlers::{
    executions::{get_execution, redispatch_execution},
    health::health_check,
    metrics::prometheus_metrics,
    overview::get_overview,
    tasks::{dispatch_task, get_task, list_tasks},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<DashboardService>,
    /// 未启用指标导出时为空
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(dashboard: Arc<DashboardService>) -> Self {
        Self {
            dashboard,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// 创建API路由
pub fn create_routes(state: AppState, metrics_endpoint: &str) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        // 首页概览
        .route("/api/overview", get(get_overview))
        // 任务
        .route("/api/tasks", get(list_tasks))
        .route("/api/tasks/{name}", get(get_task))
        .route("/api/tasks/{name}/dispatch", post(dispatch_task))
        // 执行记录
        .route("/api/executions/{task_id}", get(get_execution))
        .route("/api/executions/{task_id}/redispatch", post(redispatch_execution));

    if state.metrics.is_some() {
        router = router.route(metrics_endpoint, get(prometheus_metrics));
    }

    router
        .fallback(|| async { ApiError::NotFound })
        .with_state(state)
}

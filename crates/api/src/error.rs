use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dashboard_core::DashboardError;
use serde_json::json;

/// 任务不存在时引导回任务列表
pub const TASK_LIST_PATH: &str = "/tasks";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("看板错误: {0}")]
    Dashboard(#[from] DashboardError),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("未找到资源")]
    NotFound,

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut redirect_to = None;
        let (status, error_message, error_type, suggestions) = match &self {
            ApiError::Dashboard(DashboardError::UpstreamUnavailable { service, message }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("上游服务 {service} 不可用: {message}"),
                "UPSTREAM_UNAVAILABLE",
                vec![
                    format!("请检查 {service} 是否正在运行"),
                    "稍后刷新页面重试".to_string(),
                ],
            ),
            ApiError::Dashboard(DashboardError::MalformedResponse { service, message }) => (
                StatusCode::BAD_GATEWAY,
                format!("上游服务 {service} 返回了无法识别的数据: {message}"),
                "MALFORMED_UPSTREAM_RESPONSE",
                vec![format!("请确认 {service} 的版本与看板兼容")],
            ),
            ApiError::Dashboard(DashboardError::NotFound { resource }) => {
                redirect_to = Some(TASK_LIST_PATH);
                (
                    StatusCode::NOT_FOUND,
                    format!("{resource} 不存在"),
                    "NOT_FOUND",
                    vec!["使用 GET /api/tasks 查看所有任务".to_string()],
                )
            }
            ApiError::Dashboard(DashboardError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("参数验证失败: {msg}"),
                "VALIDATION_ERROR",
                vec!["请检查请求参数是否符合要求".to_string()],
            ),
            ApiError::Serialization(err) => (
                StatusCode::BAD_REQUEST,
                "请求数据格式错误".to_string(),
                "SERIALIZATION_ERROR",
                vec![
                    "请检查JSON格式是否正确".to_string(),
                    format!("详细错误: {err}"),
                ],
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数错误: {msg}"),
                "BAD_REQUEST",
                vec!["请检查请求格式和参数".to_string()],
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "请求的资源不存在".to_string(),
                "NOT_FOUND",
                vec!["请检查请求URL是否正确".to_string()],
            ),
            ApiError::Dashboard(DashboardError::Configuration(msg) | DashboardError::Internal(msg))
            | ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "系统内部错误".to_string(),
                "INTERNAL_ERROR",
                vec![
                    "系统遇到内部错误，请稍后重试".to_string(),
                    format!("错误详情: {msg}"),
                ],
            ),
        };

        let mut error = json!({
            "message": error_message,
            "type": error_type,
            "code": status.as_u16(),
            "suggestions": suggestions,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let Some(path) = redirect_to {
            error["redirect_to"] = json!(path);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

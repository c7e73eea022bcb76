//! 上游客户端错误到看板错误类型的转换

use dashboard_core::DashboardError;
use reqwest::StatusCode;
use sqlx::Error as SqlxError;
use tracing::warn;

pub const EXECUTION_STORE_SERVICE: &str = "execution-store";

/// 网络层失败视为上游不可用，响应体解码失败视为格式错误
pub fn http_error(service: &str, error: reqwest::Error) -> DashboardError {
    warn!(service, error = %error, "上游HTTP请求失败");
    if error.is_decode() {
        DashboardError::malformed(service, error.to_string())
    } else {
        DashboardError::upstream_unavailable(service, error.to_string())
    }
}

/// 非预期的HTTP状态码
///
/// 5xx 和认证失败说明上游当前无法提供服务，其余状态码说明响应不符合约定。
pub fn status_error(service: &str, status: StatusCode, body: &str) -> DashboardError {
    warn!(service, %status, "上游返回非预期状态码");
    let message = format!("HTTP {status} - {body}");
    if status.is_server_error() || status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        DashboardError::upstream_unavailable(service, message)
    } else {
        DashboardError::malformed(service, message)
    }
}

pub fn database_error(error: SqlxError) -> DashboardError {
    match error {
        SqlxError::Io(_)
        | SqlxError::Tls(_)
        | SqlxError::Protocol(_)
        | SqlxError::PoolTimedOut
        | SqlxError::PoolClosed
        | SqlxError::WorkerCrashed => {
            warn!(error = %error, "执行历史存储不可用");
            DashboardError::upstream_unavailable(EXECUTION_STORE_SERVICE, error.to_string())
        }
        SqlxError::ColumnDecode { .. }
        | SqlxError::Decode(_)
        | SqlxError::ColumnNotFound(_)
        | SqlxError::TypeNotFound { .. }
        | SqlxError::ColumnIndexOutOfBounds { .. } => {
            DashboardError::malformed(EXECUTION_STORE_SERVICE, error.to_string())
        }
        other => DashboardError::Internal(format!("数据库查询失败: {other}")),
    }
}

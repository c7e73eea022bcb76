use thiserror::Error;

/// 看板错误类型定义
///
/// 聚合层内部不吞掉任何错误，所有失败都以此类型向展示层传播。
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DashboardError {
    #[error("上游服务不可用: {service} - {message}")]
    UpstreamUnavailable { service: String, message: String },

    #[error("上游响应格式错误: {service} - {message}")]
    MalformedResponse { service: String, message: String },

    #[error("资源未找到: {resource}")]
    NotFound { resource: String },

    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type DashboardResult<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    pub fn upstream_unavailable<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::UpstreamUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }
    pub fn malformed<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::MalformedResponse {
            service: service.into(),
            message: message.into(),
        }
    }
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
    pub fn task_not_found(name: &str) -> Self {
        Self::not_found(format!("任务 {name}"))
    }
    pub fn execution_not_found(task_id: &uuid::Uuid) -> Self {
        Self::not_found(format!("任务执行记录 {task_id}"))
    }
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// 上游不可达时，视图按区块降级为"不可用"而不是整体失败
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DashboardError::upstream_unavailable("broker", "connection refused");
        assert_eq!(
            error.to_string(),
            "上游服务不可用: broker - connection refused"
        );

        let error = DashboardError::task_not_found("send-email");
        assert_eq!(error.to_string(), "资源未找到: 任务 send-email");
    }

    #[test]
    fn test_error_classification() {
        assert!(DashboardError::upstream_unavailable("scheduler", "timeout").is_unavailable());
        assert!(!DashboardError::malformed("scheduler", "bad json").is_unavailable());
        assert!(!DashboardError::validation("bad cursor").is_unavailable());
        assert!(DashboardError::not_found("x").is_not_found());
    }
}

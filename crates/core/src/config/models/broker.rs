use serde::{Deserialize, Serialize};

use crate::models::SAMPLE_INTERVAL_MS;

/// Broker 管理 API 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    /// 管理 API 根地址，例如 `http://localhost:15672/api`
    pub api_url: String,
    pub username: String,
    pub password: String,
    /// 未指定 vhost 时使用的默认值
    pub default_vhost: String,
    pub sample_interval_ms: i64,
    pub request_timeout_seconds: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:15672/api".to_string(),
            username: "guest".to_string(),
            password: "guest".to_string(),
            default_vhost: "/".to_string(),
            sample_interval_ms: SAMPLE_INTERVAL_MS,
            request_timeout_seconds: 10,
        }
    }
}

impl BrokerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_url.is_empty() {
            return Err(anyhow::anyhow!("Broker管理API地址不能为空"));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(anyhow::anyhow!("Broker管理API地址必须是HTTP(S)格式"));
        }
        if self.default_vhost.is_empty() {
            return Err(anyhow::anyhow!("默认vhost不能为空"));
        }
        if self.sample_interval_ms <= 0 {
            return Err(anyhow::anyhow!("采样间隔必须大于0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("请求超时时间必须大于0"));
        }

        Ok(())
    }
}

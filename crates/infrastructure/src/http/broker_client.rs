use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashboard_core::{
    config::BrokerConfig,
    models::{BrokerOverview, QueueSnapshot},
    traits::BrokerClient,
    DashboardError, DashboardResult,
};
use reqwest::{StatusCode, Url};
use tracing::{debug, instrument};

use super::wire::{decode, decode_list, RawOverview, RawQueue, BROKER_SERVICE};
use crate::error_handling::{http_error, status_error};
use crate::observability::record_upstream_call;

/// LavinMQ / RabbitMQ 管理 API 客户端
pub struct LavinMqClient {
    base_url: Url,
    username: String,
    password: String,
    http_client: reqwest::Client,
}

impl LavinMqClient {
    pub fn new(config: &BrokerConfig) -> DashboardResult<Self> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| DashboardError::config_error(format!("Broker管理API地址无效: {e}")))?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| DashboardError::config_error(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
            http_client,
        })
    }

    /// 在根地址后追加路径段，vhost 中的 `/` 会被编码为 `%2F`
    fn endpoint(&self, segments: &[&str]) -> DashboardResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DashboardError::config_error("Broker管理API地址不能作为路径前缀"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// 发送GET请求，404 返回 `None`
    async fn fetch(&self, segments: &[&str]) -> DashboardResult<Option<Vec<u8>>> {
        let url = self.endpoint(segments)?;
        debug!(%url, "请求Broker管理API");

        let response = self
            .http_client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| http_error(BROKER_SERVICE, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(BROKER_SERVICE, status, &body));
        }

        let body = response.bytes().await.map_err(|e| http_error(BROKER_SERVICE, e))?;
        Ok(Some(body.to_vec()))
    }

    async fn fetch_required(&self, segments: &[&str]) -> DashboardResult<Vec<u8>> {
        self.fetch(segments).await?.ok_or_else(|| {
            DashboardError::malformed(BROKER_SERVICE, format!("端点不存在: /{}", segments.join("/")))
        })
    }
}

#[async_trait]
impl BrokerClient for LavinMqClient {
    #[instrument(skip(self))]
    async fn overview(&self) -> DashboardResult<BrokerOverview> {
        let started = Instant::now();
        let result: DashboardResult<BrokerOverview> = async {
            let body = self.fetch_required(&["overview"]).await?;
            decode::<RawOverview, _>(BROKER_SERVICE, &body)
        }
        .await;
        record_upstream_call(BROKER_SERVICE, started, &result);
        result
    }

    #[instrument(skip(self))]
    async fn list_queues(&self) -> DashboardResult<Vec<QueueSnapshot>> {
        let started = Instant::now();
        let result: DashboardResult<Vec<QueueSnapshot>> = async {
            let body = self.fetch_required(&["queues"]).await?;
            decode_list::<RawQueue, _>(BROKER_SERVICE, &body)
        }
        .await;
        record_upstream_call(BROKER_SERVICE, started, &result);
        if let Ok(queues) = &result {
            debug!(count = queues.len(), "获取队列列表成功");
        }
        result
    }

    #[instrument(skip(self))]
    async fn get_queue(&self, vhost: &str, name: &str) -> DashboardResult<Option<QueueSnapshot>> {
        let started = Instant::now();
        let result: DashboardResult<Option<QueueSnapshot>> = async {
            match self.fetch(&["queues", vhost, name]).await? {
                Some(body) => decode::<RawQueue, _>(BROKER_SERVICE, &body).map(Some),
                None => {
                    debug!(vhost, name, "队列不存在");
                    Ok(None)
                }
            }
        }
        .await;
        record_upstream_call(BROKER_SERVICE, started, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_url: &str) -> LavinMqClient {
        LavinMqClient::new(&BrokerConfig {
            api_url: api_url.to_string(),
            ..BrokerConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_encodes_vhost() {
        let client = client("http://localhost:15672/api");
        let url = client.endpoint(&["queues", "/", "send-email"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:15672/api/queues/%2F/send-email");
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let client = client("http://localhost:15672/api/");
        let url = client.endpoint(&["overview"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:15672/api/overview");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = LavinMqClient::new(&BrokerConfig {
            api_url: "not a url".to_string(),
            ..BrokerConfig::default()
        });
        assert!(matches!(result, Err(DashboardError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_unreachable_broker_is_unavailable() {
        let client = LavinMqClient::new(&BrokerConfig {
            api_url: "http://127.0.0.1:9/api".to_string(),
            request_timeout_seconds: 1,
            ..BrokerConfig::default()
        })
        .unwrap();

        let error = client.list_queues().await.unwrap_err();
        assert!(error.is_unavailable());
    }
}

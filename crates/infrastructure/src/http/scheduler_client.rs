use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashboard_core::{
    config::SchedulerConfig, models::Task, traits::SchedulerClient, DashboardError, DashboardResult,
};
use reqwest::{StatusCode, Url};
use tracing::{debug, info, instrument};

use super::wire::{decode, decode_list, RawTask, SCHEDULER_SERVICE};
use crate::error_handling::{http_error, status_error};
use crate::observability::record_upstream_call;

/// 调度器任务API客户端
pub struct ZschedClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl ZschedClient {
    pub fn new(config: &SchedulerConfig) -> DashboardResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| DashboardError::config_error(format!("调度器地址无效: {e}")))?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| DashboardError::config_error(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    fn tasks_url(&self, name: Option<&str>) -> DashboardResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| DashboardError::config_error("调度器地址不能作为路径前缀"))?;
            segments.pop_if_empty().push("tasks");
            if let Some(name) = name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    async fn read_body(response: reqwest::Response) -> DashboardResult<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(SCHEDULER_SERVICE, status, &body));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| http_error(SCHEDULER_SERVICE, e))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl SchedulerClient for ZschedClient {
    #[instrument(skip(self))]
    async fn list_tasks(&self) -> DashboardResult<Vec<Task>> {
        let started = Instant::now();
        let result: DashboardResult<Vec<Task>> = async {
            let response = self
                .http_client
                .get(self.tasks_url(None)?)
                .send()
                .await
                .map_err(|e| http_error(SCHEDULER_SERVICE, e))?;
            let body = Self::read_body(response).await?;
            decode_list::<RawTask, _>(SCHEDULER_SERVICE, &body)
        }
        .await;
        record_upstream_call(SCHEDULER_SERVICE, started, &result);
        if let Ok(tasks) = &result {
            debug!(count = tasks.len(), "获取任务列表成功");
        }
        result
    }

    #[instrument(skip(self))]
    async fn get_task(&self, name: &str) -> DashboardResult<Option<Task>> {
        let started = Instant::now();
        let result: DashboardResult<Option<Task>> = async {
            let response = self
                .http_client
                .get(self.tasks_url(Some(name))?)
                .send()
                .await
                .map_err(|e| http_error(SCHEDULER_SERVICE, e))?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let body = Self::read_body(response).await?;
            decode::<RawTask, _>(SCHEDULER_SERVICE, &body).map(Some)
        }
        .await;
        record_upstream_call(SCHEDULER_SERVICE, started, &result);
        result
    }

    /// 调度器接受后立即返回，不等待执行完成
    #[instrument(skip(self, parameters))]
    async fn dispatch(&self, name: &str, parameters: &serde_json::Value) -> DashboardResult<()> {
        let started = Instant::now();
        let result: DashboardResult<()> = async {
            let response = self
                .http_client
                .post(self.tasks_url(Some(name))?)
                .json(parameters)
                .send()
                .await
                .map_err(|e| http_error(SCHEDULER_SERVICE, e))?;

            match response.status() {
                StatusCode::NOT_FOUND => Err(DashboardError::task_not_found(name)),
                StatusCode::BAD_REQUEST => {
                    let body = response.text().await.unwrap_or_default();
                    Err(DashboardError::validation(format!("调度器拒绝了任务参数: {body}")))
                }
                status if status.is_success() => Ok(()),
                status => {
                    let body = response.text().await.unwrap_or_default();
                    Err(status_error(SCHEDULER_SERVICE, status, &body))
                }
            }
        }
        .await;
        record_upstream_call(SCHEDULER_SERVICE, started, &result);
        if result.is_ok() {
            info!(task_name = name, "任务已派发");
        }
        result
    }
}

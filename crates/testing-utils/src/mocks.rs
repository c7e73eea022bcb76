//! 上游协作接口的内存实现
//!
//! 所有 mock 都可以通过 `unavailable()` 切换为始终返回 `UpstreamUnavailable`，
//! 用于验证视图区块的降级行为。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashboard_core::{
    models::{
        ActivityCounts, BrokerOverview, ExecutionDetail, ExecutionPageQuery, ExecutionRecord, ExecutionStats,
        ExecutionStatus, LogEntry, QueueSnapshot, Task,
    },
    traits::{BrokerClient, ExecutionRepository, LogRepository, SchedulerClient},
    DashboardError, DashboardResult,
};
use dashboard_domain::select_page;
use uuid::Uuid;

fn check(failure: &Option<DashboardError>) -> DashboardResult<()> {
    match failure {
        Some(error) => Err(error.clone()),
        None => Ok(()),
    }
}

/// Broker 管理 API 的 mock
#[derive(Debug, Clone, Default)]
pub struct MockBrokerClient {
    overview: BrokerOverview,
    queues: Vec<QueueSnapshot>,
    failure: Option<DashboardError>,
}

impl MockBrokerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overview(mut self, overview: BrokerOverview) -> Self {
        self.overview = overview;
        self
    }

    pub fn with_queues(mut self, queues: Vec<QueueSnapshot>) -> Self {
        self.queues = queues;
        self
    }

    pub fn unavailable() -> Self {
        Self::default().failing_with(DashboardError::upstream_unavailable("broker", "connection refused"))
    }

    pub fn failing_with(mut self, error: DashboardError) -> Self {
        self.failure = Some(error);
        self
    }
}

#[async_trait]
impl BrokerClient for MockBrokerClient {
    async fn overview(&self) -> DashboardResult<BrokerOverview> {
        check(&self.failure)?;
        Ok(self.overview.clone())
    }

    async fn list_queues(&self) -> DashboardResult<Vec<QueueSnapshot>> {
        check(&self.failure)?;
        Ok(self.queues.clone())
    }

    async fn get_queue(&self, vhost: &str, name: &str) -> DashboardResult<Option<QueueSnapshot>> {
        check(&self.failure)?;
        Ok(self
            .queues
            .iter()
            .find(|queue| queue.vhost == vhost && queue.name == name)
            .cloned())
    }
}

/// 调度器 API 的 mock，记录所有派发请求
#[derive(Debug, Clone, Default)]
pub struct MockSchedulerClient {
    tasks: Vec<Task>,
    dispatched: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    failure: Option<DashboardError>,
}

impl MockSchedulerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self::default().failing_with(DashboardError::upstream_unavailable("scheduler", "connection refused"))
    }

    pub fn failing_with(mut self, error: DashboardError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn dispatched(&self) -> Vec<(String, serde_json::Value)> {
        self.dispatched.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchedulerClient for MockSchedulerClient {
    async fn list_tasks(&self) -> DashboardResult<Vec<Task>> {
        check(&self.failure)?;
        Ok(self.tasks.clone())
    }

    async fn get_task(&self, name: &str) -> DashboardResult<Option<Task>> {
        check(&self.failure)?;
        Ok(self.tasks.iter().find(|task| task.name == name).cloned())
    }

    async fn dispatch(&self, name: &str, parameters: &serde_json::Value) -> DashboardResult<()> {
        check(&self.failure)?;
        if !self.tasks.iter().any(|task| task.name == name) {
            return Err(DashboardError::task_not_found(name));
        }
        self.dispatched
            .lock()
            .unwrap()
            .push((name.to_string(), parameters.clone()));
        Ok(())
    }
}

/// 执行历史的内存仓储
///
/// 分页语义与 PostgreSQL 实现一致，可以在测试中途插入新记录。
#[derive(Debug, Clone, Default)]
pub struct MockExecutionRepository {
    records: Arc<Mutex<Vec<ExecutionRecord>>>,
    parameters: Arc<Mutex<HashMap<Uuid, serde_json::Value>>>,
    failure: Option<DashboardError>,
}

impl MockExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ExecutionRecord>) -> Self {
        let repo = Self::new();
        for record in records {
            repo.insert(record);
        }
        repo
    }

    pub fn unavailable() -> Self {
        Self {
            failure: Some(DashboardError::upstream_unavailable("execution-store", "pool timed out")),
            ..Self::default()
        }
    }

    pub fn insert(&self, record: ExecutionRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn insert_with_parameters(&self, record: ExecutionRecord, parameters: serde_json::Value) {
        self.parameters.lock().unwrap().insert(record.task_id, parameters);
        self.insert(record);
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutionRepository for MockExecutionRepository {
    async fn find_page(&self, query: &ExecutionPageQuery) -> DashboardResult<Vec<ExecutionRecord>> {
        check(&self.failure)?;
        Ok(select_page(&self.records.lock().unwrap(), query))
    }

    async fn stats(&self, task_name: &str) -> DashboardResult<ExecutionStats> {
        check(&self.failure)?;
        let records = self.records.lock().unwrap();
        let mut stats = ExecutionStats::default();
        for record in records.iter().filter(|r| r.task_name == task_name) {
            stats.total_exec += 1;
            match record.status {
                ExecutionStatus::Success => stats.total_success += 1,
                ExecutionStatus::Failed => stats.total_err += 1,
                _ => {}
            }
            if record.started_at > stats.last_exec {
                stats.last_exec = record.started_at;
            }
        }
        Ok(stats)
    }

    async fn find_by_id(&self, task_id: Uuid) -> DashboardResult<Option<ExecutionDetail>> {
        check(&self.failure)?;
        let records = self.records.lock().unwrap();
        let Some(record) = records
            .iter()
            .filter(|r| r.task_id == task_id)
            .max_by_key(|r| r.published_at)
        else {
            return Ok(None);
        };
        let parameters = self
            .parameters
            .lock()
            .unwrap()
            .get(&task_id)
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        Ok(Some(ExecutionDetail {
            record: record.clone(),
            parameters,
        }))
    }

    async fn activity_since(&self, since: DateTime<Utc>) -> DashboardResult<ActivityCounts> {
        check(&self.failure)?;
        let records = self.records.lock().unwrap();
        let recent: Vec<&ExecutionRecord> = records
            .iter()
            .filter(|r| r.started_at.is_some_and(|at| at > since))
            .collect();

        Ok(ActivityCounts {
            executions: recent.len() as u64,
            errors: recent.iter().filter(|r| r.last_error.is_some()).count() as u64,
        })
    }
}

/// 执行日志的内存仓储
#[derive(Debug, Clone, Default)]
pub struct MockLogRepository {
    entries: Vec<LogEntry>,
    failure: Option<DashboardError>,
}

impl MockLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<LogEntry>) -> Self {
        Self {
            entries,
            failure: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            failure: Some(DashboardError::upstream_unavailable("execution-store", "pool timed out")),
            ..Self::default()
        }
    }
}

#[async_trait]
impl LogRepository for MockLogRepository {
    async fn list_for_execution(&self, task_id: Uuid) -> DashboardResult<Vec<LogEntry>> {
        check(&self.failure)?;
        let mut entries: Vec<LogEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.task_id == task_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.logged_at.cmp(&a.logged_at));
        Ok(entries)
    }
}

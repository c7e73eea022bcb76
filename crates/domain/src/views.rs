//! 展示层视图
//!
//! 每个视图由若干可独立降级的区块组成：上游不可达时对应区块标记为
//! `unavailable`，其余区块照常展示。其他错误不会被降级而是继续向上传播。

use std::collections::BTreeSet;

use dashboard_core::{
    models::{
        ActivityCounts, ExecutionCursor, ExecutionStats, LogEntry, QueueSnapshot, QueueState, Task,
        TimeSeriesPoint,
    },
    DashboardResult,
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::catalog::CatalogEntry;
use crate::history::{ExecutionHistoryPage, ExecutionView};
use crate::queue_metrics::QueueMetrics;

/// 可独立降级的视图区块
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SectionState<T> {
    Available { data: T },
    Unavailable { reason: String },
}

impl<T> SectionState<T> {
    /// 只有 `UpstreamUnavailable` 会降级为不可用区块
    pub fn from_result(section: &str, result: DashboardResult<T>) -> DashboardResult<Self> {
        match result {
            Ok(data) => Ok(SectionState::Available { data }),
            Err(e) if e.is_unavailable() => {
                warn!(section, error = %e, "视图区块降级为不可用");
                Ok(SectionState::Unavailable {
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            SectionState::Available { data } => Some(data),
            SectionState::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SectionState::Available { .. })
    }
}

/// 首页 Broker 区块
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokerSection {
    pub queues: u64,
    pub consumers: u64,
    pub connections: u64,
    pub uptime_seconds: u64,
    pub uptime_label: String,
    pub data_rate: Vec<TimeSeriesPoint>,
    pub queued_messages: Vec<TimeSeriesPoint>,
    pub message_rates: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewView {
    pub broker: SectionState<BrokerSection>,
    /// 最近24小时的执行数与错误数
    pub activity: SectionState<ActivityCounts>,
}

/// 任务目录中的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRow {
    pub name: String,
    pub tags: BTreeSet<String>,
    pub concurrency: u32,
    pub max_retries: i32,
    pub vhost: Option<String>,
    pub queue_state: Option<QueueState>,
    pub pending: u64,
    pub success_rate: f64,
    pub error_rate: f64,
}

impl From<&CatalogEntry> for CatalogRow {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            name: entry.task.name.clone(),
            tags: entry.task.tags.clone(),
            concurrency: entry.task.concurrency,
            max_retries: entry.task.max_retries,
            vhost: entry.queue.as_ref().map(|q| q.vhost.clone()),
            queue_state: entry.queue.as_ref().map(|q| q.state),
            pending: entry.metrics.pending,
            success_rate: entry.metrics.success_rate,
            error_rate: entry.metrics.error_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogView {
    pub rows: Vec<CatalogRow>,
    /// 队列列表不可用时所有行使用全零指标
    pub queues: SectionState<usize>,
}

/// 任务详情页的队列区块
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSection {
    pub snapshot: Option<QueueSnapshot>,
    pub metrics: QueueMetrics,
    pub message_rates: Vec<TimeSeriesPoint>,
}

/// 任务详情页的执行历史区块
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySection {
    pub stats: ExecutionStats,
    pub executions: Vec<ExecutionView>,
    pub has_more: bool,
    pub next_after: Option<ExecutionCursor>,
}

impl From<ExecutionHistoryPage> for HistorySection {
    fn from(page: ExecutionHistoryPage) -> Self {
        Self {
            stats: page.stats,
            executions: page.rows.iter().map(ExecutionView::from).collect(),
            has_more: page.has_more,
            next_after: page.next_after,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDetailView {
    pub task: Task,
    pub vhost: String,
    pub queue: SectionState<QueueSection>,
    pub history: SectionState<HistorySection>,
}

/// 单次执行的详情与日志
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionDetailView {
    pub task_id: Uuid,
    pub task_name: String,
    pub parameters: serde_json::Value,
    pub execution: ExecutionView,
    pub logs: Vec<LogEntry>,
}

/// 调度器已接受的派发请求
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchAccepted {
    pub task_name: String,
    pub parameters: serde_json::Value,
}

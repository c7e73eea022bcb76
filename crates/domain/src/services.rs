//! # 看板服务
//!
//! 按请求编排上游读取和聚合。每个请求并发获取所需的全部数据，
//! 在所有读取完成后才进入纯计算的聚合步骤；请求之间不共享可变状态。

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashboard_core::{
    models::{BrokerOverview, CursorBasis, ExecutionCursor, QueueSnapshot},
    traits::{BrokerClient, ExecutionRepository, LogRepository, SchedulerClient},
    Clock, DashboardError, DashboardResult,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    catalog::{join_catalog, CatalogFilter},
    formatters::format_duration,
    history::{ExecutionHistoryPaginator, ExecutionView},
    queue_metrics::MetricRateAggregator,
    time_series::TimeSeriesSynchronizer,
    views::{
        BrokerSection, CatalogRow, CatalogView, DispatchAccepted, ExecutionDetailView, HistorySection,
        OverviewView, QueueSection, SectionState, TaskDetailView,
    },
};

/// 首页活动统计的时间窗口
pub const ACTIVITY_WINDOW_HOURS: i64 = 24;

const DEFAULT_VHOST: &str = "/";

#[derive(Clone)]
pub struct DashboardService {
    broker: Arc<dyn BrokerClient>,
    scheduler: Arc<dyn SchedulerClient>,
    executions: Arc<dyn ExecutionRepository>,
    logs: Arc<dyn LogRepository>,
    clock: Arc<dyn Clock>,
    synchronizer: TimeSeriesSynchronizer,
    paginator: ExecutionHistoryPaginator,
    default_vhost: String,
}

impl DashboardService {
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        scheduler: Arc<dyn SchedulerClient>,
        executions: Arc<dyn ExecutionRepository>,
        logs: Arc<dyn LogRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let paginator = ExecutionHistoryPaginator::new(executions.clone(), CursorBasis::default());
        Self {
            broker,
            scheduler,
            executions,
            logs,
            clock,
            synchronizer: TimeSeriesSynchronizer::default(),
            paginator,
            default_vhost: DEFAULT_VHOST.to_string(),
        }
    }

    pub fn with_cursor_basis(mut self, basis: CursorBasis) -> Self {
        self.paginator = ExecutionHistoryPaginator::new(self.executions.clone(), basis);
        self
    }

    pub fn with_default_vhost<S: Into<String>>(mut self, vhost: S) -> Self {
        self.default_vhost = vhost.into();
        self
    }

    pub fn with_sample_interval_ms(mut self, interval_ms: i64) -> Self {
        self.synchronizer = TimeSeriesSynchronizer::new(interval_ms);
        self
    }

    /// 首页概览：Broker 全局统计与最近24小时的执行活动
    #[instrument(skip(self))]
    pub async fn overview(&self) -> DashboardResult<OverviewView> {
        let now = self.clock.now();
        let since = now - Duration::hours(ACTIVITY_WINDOW_HOURS);

        let (overview, activity) = tokio::join!(
            self.broker.overview(),
            self.executions.activity_since(since)
        );

        let broker = SectionState::from_result(
            "broker",
            overview.and_then(|overview| self.broker_section(&overview, now)),
        )?;
        let activity = SectionState::from_result("activity", activity)?;

        Ok(OverviewView { broker, activity })
    }

    /// 任务目录：任务定义左连接队列快照，筛选后按名称排序
    #[instrument(skip(self))]
    pub async fn task_catalog(&self, filter: &CatalogFilter) -> DashboardResult<CatalogView> {
        let (tasks, queues) = tokio::join!(self.scheduler.list_tasks(), self.broker.list_queues());
        let tasks = tasks?;
        let queues = SectionState::from_result("queues", queues)?;

        let snapshots: &[QueueSnapshot] = queues.data().map(Vec::as_slice).unwrap_or(&[]);
        let rows: Vec<CatalogRow> = join_catalog(&tasks, snapshots, filter)
            .iter()
            .map(CatalogRow::from)
            .collect();
        debug!(tasks = tasks.len(), rows = rows.len(), "任务目录连接完成");

        let queues = match queues {
            SectionState::Available { data } => SectionState::Available { data: data.len() },
            SectionState::Unavailable { reason } => SectionState::Unavailable { reason },
        };

        Ok(CatalogView { rows, queues })
    }

    /// 任务详情
    ///
    /// `vhost` 为空时使用默认 vhost；任务不存在时返回 `NotFound`。
    #[instrument(skip(self))]
    pub async fn task_detail(
        &self,
        name: &str,
        vhost: Option<&str>,
        after: Option<ExecutionCursor>,
    ) -> DashboardResult<TaskDetailView> {
        let vhost = vhost
            .filter(|vhost| !vhost.is_empty())
            .unwrap_or(self.default_vhost.as_str())
            .to_string();
        let now = self.clock.now();

        let (task, queue, history) = tokio::join!(
            self.scheduler.get_task(name),
            self.broker.get_queue(&vhost, name),
            self.paginator.page(name, after)
        );

        let task = task?.ok_or_else(|| DashboardError::task_not_found(name))?;
        let queue = SectionState::from_result(
            "queue",
            queue.and_then(|snapshot| self.queue_section(snapshot, now)),
        )?;
        let history = SectionState::from_result("history", history.map(HistorySection::from))?;

        Ok(TaskDetailView {
            task,
            vhost,
            queue,
            history,
        })
    }

    /// 单次执行的参数与日志
    #[instrument(skip(self))]
    pub async fn execution_detail(&self, task_id: Uuid) -> DashboardResult<ExecutionDetailView> {
        let (detail, logs) = tokio::join!(
            self.executions.find_by_id(task_id),
            self.logs.list_for_execution(task_id)
        );
        let detail = detail?.ok_or_else(|| DashboardError::execution_not_found(&task_id))?;
        let mut logs = logs?;
        logs.sort_by(|a, b| b.logged_at.cmp(&a.logged_at));

        Ok(ExecutionDetailView {
            task_id,
            task_name: detail.record.task_name.clone(),
            execution: ExecutionView::from(&detail.record),
            parameters: detail.parameters,
            logs,
        })
    }

    /// 以给定参数派发一次新执行，只等待调度器接受
    #[instrument(skip(self, parameters))]
    pub async fn dispatch(&self, name: &str, parameters: serde_json::Value) -> DashboardResult<DispatchAccepted> {
        if !parameters.is_object() {
            return Err(DashboardError::validation("任务参数必须是JSON对象"));
        }

        self.scheduler.dispatch(name, &parameters).await?;
        info!(task_name = name, "任务派发请求已被调度器接受");

        Ok(DispatchAccepted {
            task_name: name.to_string(),
            parameters,
        })
    }

    /// 以某次执行保存的参数重新派发
    #[instrument(skip(self))]
    pub async fn redispatch(&self, task_id: Uuid) -> DashboardResult<DispatchAccepted> {
        let detail = self
            .executions
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| DashboardError::execution_not_found(&task_id))?;

        let parameters = match detail.parameters {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other,
        };
        self.dispatch(&detail.record.task_name, parameters).await
    }

    fn broker_section(&self, overview: &BrokerOverview, now: DateTime<Utc>) -> DashboardResult<BrokerSection> {
        let data_rate = self.synchronizer.data_rate(overview, now).map_err(chart_error)?;
        let queued_messages = self.synchronizer.queued_messages(overview, now).map_err(chart_error)?;
        let message_rates = self
            .synchronizer
            .message_rates(&overview.message_stats, now)
            .map_err(chart_error)?;

        Ok(BrokerSection {
            queues: overview.object_totals.queues,
            consumers: overview.object_totals.consumers,
            connections: overview.object_totals.connections,
            uptime_seconds: overview.uptime,
            uptime_label: format_duration(overview.uptime as f64),
            data_rate,
            queued_messages,
            message_rates,
        })
    }

    fn queue_section(&self, snapshot: Option<QueueSnapshot>, now: DateTime<Utc>) -> DashboardResult<QueueSection> {
        let message_rates = match &snapshot {
            Some(queue) => self
                .synchronizer
                .message_rates(&queue.message_stats, now)
                .map_err(chart_error)?,
            None => Vec::new(),
        };

        Ok(QueueSection {
            metrics: MetricRateAggregator::aggregate(snapshot.as_ref()),
            snapshot,
            message_rates,
        })
    }
}

/// 图表输入来自 Broker，长度不一致说明上游响应本身有问题
fn chart_error(error: DashboardError) -> DashboardError {
    match error {
        DashboardError::Validation(message) => DashboardError::malformed("broker", message),
        other => other,
    }
}

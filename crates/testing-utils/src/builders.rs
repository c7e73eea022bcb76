//! 测试数据构建器

use chrono::{DateTime, Duration, TimeZone, Utc};
use dashboard_core::models::{
    metric, BrokerOverview, ExecutionCursor, ExecutionRecord, ExecutionStatus, LogEntry, MessageStats,
    ObjectTotals, QueueSnapshot, QueueState, QueueTotals, SampleLog,
};
use uuid::Uuid;

/// 测试用的基准时间
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// 构建执行记录，默认状态为 `pending`
pub struct ExecutionRecordBuilder {
    record: ExecutionRecord,
}

impl ExecutionRecordBuilder {
    pub fn new(task_name: &str) -> Self {
        Self {
            record: ExecutionRecord::pending(Uuid::new_v4(), task_name, base_time()),
        }
    }

    pub fn with_id(mut self, task_id: Uuid) -> Self {
        self.record.task_id = task_id;
        self
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.record.parent_id = Some(parent_id);
        self
    }

    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.record.published_at = at;
        self
    }

    /// 发布时间为基准时间之后的秒数
    pub fn published_secs(self, secs: i64) -> Self {
        self.published_at(base_time() + Duration::seconds(secs))
    }

    pub fn running(mut self, started_at: DateTime<Utc>) -> Self {
        self.record.status = ExecutionStatus::Running;
        self.record.started_at = Some(started_at);
        self
    }

    pub fn succeeded(mut self, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        self.record.status = ExecutionStatus::Success;
        self.record.started_at = Some(started_at);
        self.record.ended_at = Some(ended_at);
        self.record.iterations = 1;
        self
    }

    pub fn failed(mut self, started_at: DateTime<Utc>, ended_at: DateTime<Utc>, error: &str) -> Self {
        self.record.status = ExecutionStatus::Failed;
        self.record.started_at = Some(started_at);
        self.record.ended_at = Some(ended_at);
        self.record.last_error = Some(error.to_string());
        self.record.iterations = 1;
        self
    }

    pub fn build(mut self) -> ExecutionRecord {
        self.record.cursor = ExecutionCursor::new(self.record.published_at, self.record.task_id);
        self.record
    }
}

/// 构建队列快照
pub struct QueueSnapshotBuilder {
    snapshot: QueueSnapshot,
}

impl QueueSnapshotBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            snapshot: QueueSnapshot {
                vhost: "/".to_string(),
                name: name.to_string(),
                ready: 0,
                unacked: 0,
                state: QueueState::Running,
                message_stats: MessageStats::new(),
            },
        }
    }

    pub fn vhost(mut self, vhost: &str) -> Self {
        self.snapshot.vhost = vhost.to_string();
        self
    }

    pub fn counts(mut self, ready: u64, unacked: u64) -> Self {
        self.snapshot.ready = ready;
        self.snapshot.unacked = unacked;
        self
    }

    pub fn state(mut self, state: QueueState) -> Self {
        self.snapshot.state = state;
        self
    }

    pub fn rate(mut self, metric: &str, rate: f64, log: Vec<f64>) -> Self {
        self.snapshot.message_stats.insert(SampleLog::new(metric, rate, log));
        self
    }

    pub fn build(self) -> QueueSnapshot {
        self.snapshot
    }
}

/// 构建所有采样序列长度都为 `len` 的 Broker 概览
pub fn broker_overview(len: usize, queues: u64, consumers: u64, uptime: u64) -> BrokerOverview {
    let series = |seed: f64| (0..len).map(|i| seed + i as f64).collect::<Vec<f64>>();
    let message_stats = metric::MESSAGE_RATES
        .iter()
        .enumerate()
        .map(|(i, name)| SampleLog::new(*name, i as f64, series(i as f64 * 10.0)))
        .collect();

    BrokerOverview {
        object_totals: ObjectTotals {
            queues,
            consumers,
            ..ObjectTotals::default()
        },
        queue_totals: QueueTotals {
            messages_ready_log: series(100.0),
            messages_unacknowledged_log: series(200.0),
            ..QueueTotals::default()
        },
        message_stats,
        recv_oct_details: SampleLog::new("recv_oct", 0.0, series(1.0)),
        send_oct_details: SampleLog::new("send_oct", 0.0, series(4.0)),
        uptime,
    }
}

pub fn log_entry(task_id: Uuid, level: &str, message: &str, logged_at: DateTime<Utc>) -> LogEntry {
    LogEntry {
        task_id,
        state_id: Uuid::new_v4(),
        level: level.to_string(),
        message: message.to_string(),
        data: serde_json::json!({}),
        logged_at,
    }
}

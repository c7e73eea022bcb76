use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::sample::SampleLog;
use crate::errors::DashboardError;

/// 消息统计指标名称
pub mod metric {
    pub const ACK: &str = "ack";
    pub const DELIVER: &str = "deliver";
    pub const GET: &str = "get";
    pub const DELIVER_GET: &str = "deliver_get";
    pub const PUBLISH: &str = "publish";
    pub const CONFIRM: &str = "confirm";
    pub const REDELIVER: &str = "redeliver";
    pub const REJECT: &str = "reject";

    /// 消息速率图表展示的全部指标
    pub const MESSAGE_RATES: [&str; 8] = [
        ACK,
        DELIVER,
        GET,
        DELIVER_GET,
        PUBLISH,
        CONFIRM,
        REDELIVER,
        REJECT,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QueueState {
    Running,
    Paused,
    Idle,
}

impl QueueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueState::Running => "running",
            QueueState::Paused => "paused",
            QueueState::Idle => "idle",
        }
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueState {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(QueueState::Running),
            "paused" => Ok(QueueState::Paused),
            "idle" => Ok(QueueState::Idle),
            other => Err(DashboardError::validation(format!("无效的队列状态: {other}"))),
        }
    }
}

/// 指标名到采样序列的映射
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct MessageStats(BTreeMap<String, SampleLog>);

impl MessageStats {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, log: SampleLog) {
        self.0.insert(log.name.clone(), log);
    }
    pub fn get(&self, metric: &str) -> Option<&SampleLog> {
        self.0.get(metric)
    }
    /// 缺失的指标按0处理
    pub fn rate(&self, metric: &str) -> f64 {
        self.0.get(metric).map(|log| log.rate).unwrap_or(0.0)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &SampleLog> {
        self.0.values()
    }
}

impl FromIterator<SampleLog> for MessageStats {
    fn from_iter<T: IntoIterator<Item = SampleLog>>(iter: T) -> Self {
        let mut stats = MessageStats::new();
        for log in iter {
            stats.insert(log);
        }
        stats
    }
}

/// 队列快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub vhost: String,
    pub name: String,
    pub ready: u64,
    pub unacked: u64,
    pub state: QueueState,
    pub message_stats: MessageStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ObjectTotals {
    pub channels: u64,
    pub connections: u64,
    pub consumers: u64,
    pub exchanges: u64,
    pub queues: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QueueTotals {
    pub messages: u64,
    pub messages_ready: u64,
    pub messages_unacknowledged: u64,
    pub messages_log: Vec<f64>,
    pub messages_ready_log: Vec<f64>,
    pub messages_unacknowledged_log: Vec<f64>,
}

/// Broker 全局概览
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BrokerOverview {
    pub object_totals: ObjectTotals,
    pub queue_totals: QueueTotals,
    pub message_stats: MessageStats,
    pub recv_oct_details: SampleLog,
    pub send_oct_details: SampleLog,
    /// 运行时长（秒）
    pub uptime: u64,
}

//! 上游 HTTP 响应的原始结构
//!
//! 只在边界处使用。反序列化后立即转换为 core 中的模型，
//! 任何与预期结构不符的字段都转换为 `MalformedResponse`。

use std::collections::BTreeMap;

use dashboard_core::{
    models::{
        BrokerOverview, MessageStats, ObjectTotals, QueueSnapshot, QueueState, QueueTotals, SampleLog, Task,
        TaskSchedule,
    },
    DashboardError, DashboardResult,
};
use serde::Deserialize;

pub const BROKER_SERVICE: &str = "broker";
pub const SCHEDULER_SERVICE: &str = "scheduler";

const DETAILS_SUFFIX: &str = "_details";

#[derive(Debug, Deserialize, Default)]
pub struct RawSampleLog {
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub log: Vec<f64>,
}

impl RawSampleLog {
    fn into_sample_log(self, name: &str) -> SampleLog {
        SampleLog::new(name, self.rate, self.log)
    }
}

/// `message_stats` 同时包含计数字段（`ack`）和采样字段（`ack_details`），只保留后者
#[derive(Debug, Deserialize, Default)]
#[serde(transparent)]
pub struct RawMessageStats(BTreeMap<String, serde_json::Value>);

impl RawMessageStats {
    fn into_message_stats(self) -> DashboardResult<MessageStats> {
        let mut stats = MessageStats::new();
        for (key, value) in self.0 {
            let Some(metric) = key.strip_suffix(DETAILS_SUFFIX) else {
                continue;
            };
            let raw: RawSampleLog = serde_json::from_value(value).map_err(|e| {
                DashboardError::malformed(BROKER_SERVICE, format!("message_stats.{key} 格式错误: {e}"))
            })?;
            stats.insert(raw.into_sample_log(metric));
        }
        Ok(stats)
    }
}

#[derive(Debug, Deserialize)]
pub struct RawQueue {
    pub name: String,
    pub vhost: String,
    #[serde(default)]
    pub ready: Option<u64>,
    #[serde(default)]
    pub unacked: Option<u64>,
    #[serde(default)]
    pub messages_ready: Option<u64>,
    #[serde(default)]
    pub messages_unacknowledged: Option<u64>,
    pub state: String,
    #[serde(default)]
    pub message_stats: Option<RawMessageStats>,
}

impl TryFrom<RawQueue> for QueueSnapshot {
    type Error = DashboardError;

    fn try_from(raw: RawQueue) -> Result<Self, Self::Error> {
        let state: QueueState = raw.state.parse().map_err(|_| {
            DashboardError::malformed(BROKER_SERVICE, format!("队列 {} 的状态无效: {}", raw.name, raw.state))
        })?;

        // LavinMQ 同时返回两种写法，优先使用短名称
        let ready = raw.ready.or(raw.messages_ready).ok_or_else(|| {
            DashboardError::malformed(BROKER_SERVICE, format!("队列 {} 缺少 ready 计数", raw.name))
        })?;
        let unacked = raw.unacked.or(raw.messages_unacknowledged).ok_or_else(|| {
            DashboardError::malformed(BROKER_SERVICE, format!("队列 {} 缺少 unacked 计数", raw.name))
        })?;

        Ok(QueueSnapshot {
            vhost: raw.vhost,
            name: raw.name,
            ready,
            unacked,
            state,
            message_stats: raw.message_stats.unwrap_or_default().into_message_stats()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RawObjectTotals {
    #[serde(default)]
    pub channels: u64,
    #[serde(default)]
    pub connections: u64,
    #[serde(default)]
    pub consumers: u64,
    #[serde(default)]
    pub exchanges: u64,
    #[serde(default)]
    pub queues: u64,
}

#[derive(Debug, Deserialize)]
pub struct RawQueueTotals {
    #[serde(default)]
    pub messages: u64,
    #[serde(default)]
    pub messages_ready: u64,
    #[serde(default)]
    pub messages_unacknowledged: u64,
    #[serde(default)]
    pub messages_log: Vec<f64>,
    #[serde(default)]
    pub messages_ready_log: Vec<f64>,
    #[serde(default)]
    pub messages_unacknowledged_log: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RawOverview {
    pub object_totals: RawObjectTotals,
    pub queue_totals: RawQueueTotals,
    #[serde(default)]
    pub message_stats: Option<RawMessageStats>,
    pub recv_oct_details: RawSampleLog,
    pub send_oct_details: RawSampleLog,
    pub uptime: u64,
}

impl TryFrom<RawOverview> for BrokerOverview {
    type Error = DashboardError;

    fn try_from(raw: RawOverview) -> Result<Self, Self::Error> {
        let totals = raw.object_totals;
        let queue_totals = raw.queue_totals;

        Ok(BrokerOverview {
            object_totals: ObjectTotals {
                channels: totals.channels,
                connections: totals.connections,
                consumers: totals.consumers,
                exchanges: totals.exchanges,
                queues: totals.queues,
            },
            queue_totals: QueueTotals {
                messages: queue_totals.messages,
                messages_ready: queue_totals.messages_ready,
                messages_unacknowledged: queue_totals.messages_unacknowledged,
                messages_log: queue_totals.messages_log,
                messages_ready_log: queue_totals.messages_ready_log,
                messages_unacknowledged_log: queue_totals.messages_unacknowledged_log,
            },
            message_stats: raw.message_stats.unwrap_or_default().into_message_stats()?,
            recv_oct_details: raw.recv_oct_details.into_sample_log("recv_oct"),
            send_oct_details: raw.send_oct_details.into_sample_log("send_oct"),
            uptime: raw.uptime,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RawSchedule {
    pub schedule: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// 调度器返回的任务，空切片和空映射会被序列化为 `null`
#[derive(Debug, Deserialize)]
pub struct RawTask {
    pub name: String,
    pub concurrency: i64,
    pub max_retries: i64,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub schedules: Option<Vec<RawSchedule>>,
    #[serde(default)]
    pub default_parameters: Option<serde_json::Map<String, serde_json::Value>>,
}

impl TryFrom<RawTask> for Task {
    type Error = DashboardError;

    fn try_from(raw: RawTask) -> Result<Self, Self::Error> {
        if raw.name.is_empty() {
            return Err(DashboardError::malformed(SCHEDULER_SERVICE, "任务名称不能为空"));
        }
        let concurrency = u32::try_from(raw.concurrency).map_err(|_| {
            DashboardError::malformed(
                SCHEDULER_SERVICE,
                format!("任务 {} 的并发数无效: {}", raw.name, raw.concurrency),
            )
        })?;
        let max_retries = i32::try_from(raw.max_retries)
            .ok()
            .filter(|retries| *retries >= -1)
            .ok_or_else(|| {
                DashboardError::malformed(
                    SCHEDULER_SERVICE,
                    format!("任务 {} 的最大重试次数无效: {}", raw.name, raw.max_retries),
                )
            })?;

        let schedules = raw
            .schedules
            .unwrap_or_default()
            .into_iter()
            .map(|s| TaskSchedule {
                schedule: s.schedule,
                parameters: s.parameters,
            })
            .collect();

        Ok(Task {
            name: raw.name,
            concurrency,
            max_retries,
            tags: raw.tags.unwrap_or_default().into_iter().collect(),
            schedules,
            default_parameters: raw.default_parameters.unwrap_or_default(),
        })
    }
}

/// 解析响应体并转换为模型
pub fn decode<Raw, Model>(service: &str, body: &[u8]) -> DashboardResult<Model>
where
    Raw: serde::de::DeserializeOwned,
    Model: TryFrom<Raw, Error = DashboardError>,
{
    let raw: Raw = serde_json::from_slice(body)
        .map_err(|e| DashboardError::malformed(service, format!("响应解析失败: {e}")))?;
    Model::try_from(raw)
}

pub fn decode_list<Raw, Model>(service: &str, body: &[u8]) -> DashboardResult<Vec<Model>>
where
    Raw: serde::de::DeserializeOwned,
    Model: TryFrom<Raw, Error = DashboardError>,
{
    let raw: Vec<Raw> = serde_json::from_slice(body)
        .map_err(|e| DashboardError::malformed(service, format!("响应解析失败: {e}")))?;
    raw.into_iter().map(Model::try_from).collect()
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::errors::DashboardError;

/// 执行历史每页最多返回的行数
pub const HISTORY_PAGE_SIZE: usize = 100;

/// 任务执行状态
///
/// `pending → running → {success, failed}`，`pending` 为初始状态，`success`/`failed` 为终态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failed => "failed",
        }
    }
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Success | ExecutionStatus::Failed)
    }
    pub fn can_transition_to(&self, next: ExecutionStatus) -> bool {
        matches!(
            (self, next),
            (ExecutionStatus::Pending, ExecutionStatus::Running)
                | (ExecutionStatus::Running, ExecutionStatus::Success)
                | (ExecutionStatus::Running, ExecutionStatus::Failed)
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExecutionStatus::Pending),
            "running" => Ok(ExecutionStatus::Running),
            "success" => Ok(ExecutionStatus::Success),
            "failed" => Ok(ExecutionStatus::Failed),
            other => Err(DashboardError::validation(format!("无效的执行状态: {other}"))),
        }
    }
}

/// 游标基于的时间字段
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CursorBasis {
    /// 按发布时间排序
    #[default]
    Published,
    /// 按开始执行时间排序，未开始的执行不参与分页
    Started,
}

/// 执行历史分页游标
///
/// 由 (时间戳, task_id) 组成，按字典序全序比较，即使时间戳相同也能唯一定位一行。
/// 文本形式为 `"<微秒时间戳>:<task_id>"`；只有整数的旧格式表示"时间戳不晚于该值的所有行"。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExecutionCursor {
    pub timestamp: DateTime<Utc>,
    pub task_id: Uuid,
}

impl ExecutionCursor {
    pub fn new(timestamp: DateTime<Utc>, task_id: Uuid) -> Self {
        Self { timestamp, task_id }
    }

    /// 旧格式游标：同一时间戳下排在所有id之后
    pub fn at_or_before(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            task_id: Uuid::from_u128(u128::MAX),
        }
    }
}

impl fmt::Display for ExecutionCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.timestamp.timestamp_micros(), self.task_id)
    }
}

impl FromStr for ExecutionCursor {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let parse_micros = |value: &str| -> Result<DateTime<Utc>, DashboardError> {
            let micros: i64 = value
                .parse()
                .map_err(|_| DashboardError::validation(format!("无法解析的分页游标: {raw}")))?;
            DateTime::from_timestamp_micros(micros)
                .ok_or_else(|| DashboardError::validation(format!("分页游标超出时间范围: {raw}")))
        };

        match raw.split_once(':') {
            Some((micros, task_id)) => {
                let timestamp = parse_micros(micros)?;
                let task_id = Uuid::parse_str(task_id)
                    .map_err(|_| DashboardError::validation(format!("无法解析的分页游标: {raw}")))?;
                Ok(Self::new(timestamp, task_id))
            }
            None => Ok(Self::at_or_before(parse_micros(raw)?)),
        }
    }
}

impl Serialize for ExecutionCursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ExecutionCursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// 任务执行记录，由调度器创建和更新，看板只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub task_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub task_name: String,
    pub status: ExecutionStatus,
    pub published_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub iterations: i32,
    pub last_error: Option<String>,
    pub cursor: ExecutionCursor,
}

impl ExecutionRecord {
    pub fn pending<S: Into<String>>(task_id: Uuid, task_name: S, published_at: DateTime<Utc>) -> Self {
        Self {
            task_id,
            parent_id: None,
            task_name: task_name.into(),
            status: ExecutionStatus::Pending,
            published_at,
            started_at: None,
            ended_at: None,
            iterations: 0,
            last_error: None,
            cursor: ExecutionCursor::new(published_at, task_id),
        }
    }

    /// 按指定基准计算游标；按开始时间分页时未开始的记录没有游标
    pub fn cursor_for(&self, basis: CursorBasis) -> Option<ExecutionCursor> {
        match basis {
            CursorBasis::Published => Some(ExecutionCursor::new(self.published_at, self.task_id)),
            CursorBasis::Started => self
                .started_at
                .map(|started_at| ExecutionCursor::new(started_at, self.task_id)),
        }
    }

    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(started), Some(ended)) => Some((ended - started).num_milliseconds()),
            _ => None,
        }
    }
}

/// 全零id表示没有父任务
pub fn normalize_parent_id(parent_id: Option<Uuid>) -> Option<Uuid> {
    parent_id.filter(|id| !id.is_nil())
}

/// 调度器对未设置的时间写入零值，不晚于Unix纪元的时间按未设置处理
pub fn normalize_timestamp(value: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    value.filter(|at| at.timestamp_micros() > 0)
}

pub fn normalize_error(value: Option<String>) -> Option<String> {
    value.filter(|message| !message.is_empty())
}

/// 分页查询条件
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPageQuery {
    pub task_name: String,
    pub after: Option<ExecutionCursor>,
    pub limit: usize,
    pub basis: CursorBasis,
}

impl ExecutionPageQuery {
    pub fn new<S: Into<String>>(task_name: S, after: Option<ExecutionCursor>) -> Self {
        Self {
            task_name: task_name.into(),
            after,
            limit: HISTORY_PAGE_SIZE,
            basis: CursorBasis::default(),
        }
    }
    pub fn with_basis(mut self, basis: CursorBasis) -> Self {
        self.basis = basis;
        self
    }
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// 单个任务全部执行历史上的聚合计数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExecutionStats {
    pub total_exec: u64,
    pub total_success: u64,
    pub total_err: u64,
    pub last_exec: Option<DateTime<Utc>>,
}

/// 时间窗口内的执行与错误数量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ActivityCounts {
    pub executions: u64,
    pub errors: u64,
}

/// 执行记录及其启动参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionDetail {
    pub record: ExecutionRecord,
    pub parameters: serde_json::Value,
}

/// 任务执行日志，只追加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub task_id: Uuid,
    pub state_id: Uuid,
    pub level: String,
    pub message: String,
    pub data: serde_json::Value,
    pub logged_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_status_transitions() {
        use ExecutionStatus::*;

        assert!(Pending.can_transition_to(Running));
        assert!(Running.can_transition_to(Success));
        assert!(Running.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Success));
        assert!(!Success.can_transition_to(Running));
        assert!(!Failed.can_transition_to(Pending));
        assert!(Success.is_terminal() && Failed.is_terminal());
        assert!(!Pending.is_terminal() && !Running.is_terminal());
    }

    #[test]
    fn test_cursor_round_trip_text() {
        let id = Uuid::new_v4();
        let cursor = ExecutionCursor::new(at(1_700_000_000) + Duration::microseconds(42), id);
        let text = cursor.to_string();

        assert_eq!(text, format!("1700000000000042:{id}"));
        assert_eq!(text.parse::<ExecutionCursor>().unwrap(), cursor);
    }

    #[test]
    fn test_cursor_orders_ties_by_id() {
        let low = ExecutionCursor::new(at(10), Uuid::from_u128(1));
        let high = ExecutionCursor::new(at(10), Uuid::from_u128(2));
        let later = ExecutionCursor::new(at(11), Uuid::from_u128(0));

        assert!(low < high);
        assert!(high < later);
    }

    #[test]
    fn test_legacy_cursor_covers_whole_timestamp() {
        let legacy: ExecutionCursor = "10000000".parse().unwrap();
        let same_instant = ExecutionCursor::new(at(10), Uuid::new_v4());

        assert_eq!(legacy.timestamp, at(10));
        assert!(same_instant < legacy);
    }

    #[test]
    fn test_invalid_cursor_is_validation_error() {
        for raw in ["abc", "12:not-a-uuid", "", "x:00000000-0000-0000-0000-000000000000"] {
            let error = raw.parse::<ExecutionCursor>().unwrap_err();
            assert!(matches!(error, DashboardError::Validation(_)), "{raw}");
        }
    }

    #[test]
    fn test_cursor_serde_as_string() {
        let cursor = ExecutionCursor::new(at(1), Uuid::nil());
        let json = serde_json::to_string(&cursor).unwrap();
        assert_eq!(json, "\"1000000:00000000-0000-0000-0000-000000000000\"");

        let back: ExecutionCursor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cursor);
    }

    #[test]
    fn test_cursor_for_started_basis() {
        let id = Uuid::new_v4();
        let mut record = ExecutionRecord::pending(id, "job", at(100));
        assert_eq!(record.cursor_for(CursorBasis::Started), None);
        assert_eq!(
            record.cursor_for(CursorBasis::Published),
            Some(ExecutionCursor::new(at(100), id))
        );

        record.started_at = Some(at(105));
        record.ended_at = Some(at(107));
        assert_eq!(
            record.cursor_for(CursorBasis::Started),
            Some(ExecutionCursor::new(at(105), id))
        );
        assert_eq!(record.duration_ms(), Some(2000));
    }

    #[test]
    fn test_normalizers() {
        assert_eq!(normalize_parent_id(Some(Uuid::nil())), None);
        let id = Uuid::new_v4();
        assert_eq!(normalize_parent_id(Some(id)), Some(id));

        let go_zero_time = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(normalize_timestamp(Some(go_zero_time)), None);
        assert_eq!(normalize_timestamp(Some(at(5))), Some(at(5)));

        assert_eq!(normalize_error(Some(String::new())), None);
        assert_eq!(normalize_error(Some("boom".into())), Some("boom".to_string()));
    }
}

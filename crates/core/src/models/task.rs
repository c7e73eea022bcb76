use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// 无限重试
pub const UNLIMITED_RETRIES: i32 = -1;

/// 调度计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSchedule {
    /// 带秒精度的cron表达式，例如 "0 0 * * * *"
    pub schedule: String,
    pub parameters: serde_json::Value,
}

/// 调度器中的任务定义，`name` 唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub concurrency: u32,
    /// -1 表示无限重试
    pub max_retries: i32,
    pub tags: BTreeSet<String>,
    pub schedules: Vec<TaskSchedule>,
    pub default_parameters: serde_json::Map<String, serde_json::Value>,
}

impl Task {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            concurrency: 1,
            max_retries: 3,
            tags: BTreeSet::new(),
            schedules: Vec::new(),
            default_parameters: serde_json::Map::new(),
        }
    }
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
    pub fn has_unlimited_retries(&self) -> bool {
        self.max_retries == UNLIMITED_RETRIES
    }
}

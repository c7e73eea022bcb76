//! 执行历史仓储接口
//!
//! 执行记录和日志由调度器写入，看板只读取：
//! - `ExecutionRepository` - 按游标分页、统计和按id查询
//! - `LogRepository` - 单次执行的日志
//!
//! 所有实现都需要保证分页结果按 (时间戳, task_id) 降序排列，
//! 并且只返回游标严格小于 `after` 的记录。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    models::{
        ActivityCounts, ExecutionDetail, ExecutionPageQuery, ExecutionRecord, ExecutionStats,
        LogEntry,
    },
    DashboardResult,
};

#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// 查询一页执行记录
    ///
    /// 最多返回 `query.limit` 行，调用方通过多取一行判断是否还有下一页。
    async fn find_page(&self, query: &ExecutionPageQuery) -> DashboardResult<Vec<ExecutionRecord>>;

    /// 任务全部执行历史上的统计，与分页游标无关
    async fn stats(&self, task_name: &str) -> DashboardResult<ExecutionStats>;

    async fn find_by_id(&self, task_id: Uuid) -> DashboardResult<Option<ExecutionDetail>>;

    /// 统计 `since` 之后开始的执行数量和失败数量
    async fn activity_since(&self, since: DateTime<Utc>) -> DashboardResult<ActivityCounts>;
}

#[async_trait]
pub trait LogRepository: Send + Sync {
    /// 按记录时间降序返回单次执行的日志
    async fn list_for_execution(&self, task_id: Uuid) -> DashboardResult<Vec<LogEntry>>;
}

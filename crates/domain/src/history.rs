//! 执行历史分页
//!
//! 按游标降序向后翻页。游标是 (时间戳, task_id) 的组合，页内只返回严格早于
//! `after` 的记录，新插入的执行总是落在最前面，不会影响已经翻过的页。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashboard_core::{
    models::{
        CursorBasis, ExecutionCursor, ExecutionPageQuery, ExecutionRecord, ExecutionStats, ExecutionStatus,
        HISTORY_PAGE_SIZE,
    },
    traits::ExecutionRepository,
    DashboardResult,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::formatters::format_duration_ms;

pub const PAGE_SIZE: usize = HISTORY_PAGE_SIZE;

/// 解析 `after` 查询参数
///
/// 空字符串和旧格式的 `"0"` 表示从最新的记录开始。
pub fn parse_after(raw: Option<&str>) -> DashboardResult<Option<ExecutionCursor>> {
    match raw.map(str::trim) {
        None | Some("") | Some("0") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

/// 在内存中的记录上执行分页查询
///
/// 与数据库实现的语义一致：按任务名过滤，按基准时间计算游标，
/// 只保留游标严格小于 `after` 的记录，降序排列后截取 `limit` 行。
pub fn select_page(records: &[ExecutionRecord], query: &ExecutionPageQuery) -> Vec<ExecutionRecord> {
    let mut page: Vec<ExecutionRecord> = records
        .iter()
        .filter(|record| record.task_name == query.task_name)
        .filter_map(|record| {
            let cursor = record.cursor_for(query.basis)?;
            match query.after {
                Some(after) if cursor >= after => None,
                _ => Some(ExecutionRecord {
                    cursor,
                    ..record.clone()
                }),
            }
        })
        .collect();

    page.sort_by(|a, b| b.cursor.cmp(&a.cursor));
    page.truncate(query.limit);
    page
}

/// 一页执行历史
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionHistoryPage {
    pub rows: Vec<ExecutionRecord>,
    pub has_more: bool,
    pub next_after: Option<ExecutionCursor>,
    pub stats: ExecutionStats,
}

/// 执行历史分页器
#[derive(Clone)]
pub struct ExecutionHistoryPaginator {
    repository: Arc<dyn ExecutionRepository>,
    basis: CursorBasis,
}

impl ExecutionHistoryPaginator {
    pub fn new(repository: Arc<dyn ExecutionRepository>, basis: CursorBasis) -> Self {
        Self { repository, basis }
    }

    pub fn basis(&self) -> CursorBasis {
        self.basis
    }

    /// 获取 `after` 之前的一页记录和任务的聚合统计
    ///
    /// 返回恰好 `PAGE_SIZE` 行时 `has_more` 为真，`next_after` 为最后一行的游标。
    pub async fn page(&self, task_name: &str, after: Option<ExecutionCursor>) -> DashboardResult<ExecutionHistoryPage> {
        let query = ExecutionPageQuery::new(task_name, after).with_basis(self.basis);

        let (rows, mut stats) = tokio::try_join!(
            self.repository.find_page(&query),
            self.repository.stats(task_name)
        )?;

        let has_more = rows.len() == PAGE_SIZE;
        let next_after = if has_more {
            rows.last().map(|row| row.cursor)
        } else {
            None
        };
        stats.total_exec = stats.total_exec.max(rows.len() as u64);

        debug!(
            task_name,
            rows = rows.len(),
            has_more,
            "执行历史分页查询完成"
        );

        Ok(ExecutionHistoryPage {
            rows,
            has_more,
            next_after,
            stats,
        })
    }
}

/// 执行耗时的展示形式
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionDuration {
    Elapsed { millis: i64, label: String },
    InProgress,
    Planned,
}

/// 按状态决定展示字段的执行记录
///
/// `pending` 只展示发布时间；其余状态展示开始时间和（如果有）结束时间。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionView {
    pub task_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub status: ExecutionStatus,
    pub iterations: i32,
    pub last_error: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration: ExecutionDuration,
    pub cursor: ExecutionCursor,
}

impl From<&ExecutionRecord> for ExecutionView {
    fn from(record: &ExecutionRecord) -> Self {
        let pending = record.status == ExecutionStatus::Pending;
        let duration = match (pending, record.duration_ms()) {
            (true, _) => ExecutionDuration::Planned,
            (false, Some(millis)) => ExecutionDuration::Elapsed {
                millis,
                label: format_duration_ms(millis),
            },
            (false, None) => ExecutionDuration::InProgress,
        };

        Self {
            task_id: record.task_id,
            parent_id: record.parent_id,
            status: record.status,
            iterations: record.iterations,
            last_error: record.last_error.clone(),
            published_at: pending.then_some(record.published_at),
            started_at: if pending { None } else { record.started_at },
            ended_at: if pending { None } else { record.ended_at },
            duration,
            cursor: record.cursor,
        }
    }
}

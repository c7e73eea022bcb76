use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashboard_core::{
    models::{
        normalize_error, normalize_parent_id, normalize_timestamp, ActivityCounts, CursorBasis,
        ExecutionDetail, ExecutionPageQuery, ExecutionRecord, ExecutionStats, ExecutionStatus,
    },
    traits::ExecutionRepository,
    DashboardError, DashboardResult,
};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error_handling::{database_error, EXECUTION_STORE_SERVICE};
use crate::observability::record_upstream_call;

const RECORD_COLUMNS: &str =
    "task_id, status, task_name, parent_id, iterations, published_at, started_at, ended_at, last_error";

/// 分页SQL
///
/// 游标为 `(时间, task_id)` 复合键，按严格小于比较，同一时间的记录不会跨页重复或丢失。
fn page_sql(basis: CursorBasis, with_cursor: bool) -> String {
    let column = match basis {
        CursorBasis::Published => "published_at",
        CursorBasis::Started => "started_at",
    };
    let mut sql = format!("SELECT {RECORD_COLUMNS} FROM tasks WHERE task_name = $1");
    if basis == CursorBasis::Started {
        // 未开始的执行没有开始时间，调度器写入的是零值
        sql.push_str(" AND started_at > to_timestamp(0)");
    }
    if with_cursor {
        sql.push_str(&format!(" AND ({column}, task_id) < ($3::timestamptz, $4::uuid)"));
    }
    sql.push_str(&format!(" ORDER BY {column} DESC, task_id DESC LIMIT $2"));
    sql
}

/// TimescaleDB / PostgreSQL 执行历史存储
pub struct PostgresExecutionRepository {
    pool: PgPool,
}

impl PostgresExecutionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &PgRow, basis: CursorBasis) -> DashboardResult<ExecutionRecord> {
        let task_id: Uuid = row.try_get("task_id").map_err(database_error)?;
        let status = match row.try_get::<Option<String>, _>("status").map_err(database_error)? {
            Some(status) if !status.is_empty() => status.parse::<ExecutionStatus>().map_err(|_| {
                DashboardError::malformed(EXECUTION_STORE_SERVICE, format!("未知的执行状态: {status}"))
            })?,
            _ => ExecutionStatus::Pending,
        };
        let published_at: DateTime<Utc> = row.try_get("published_at").map_err(database_error)?;

        let mut record = ExecutionRecord::pending(
            task_id,
            row.try_get::<String, _>("task_name").map_err(database_error)?,
            published_at,
        );
        record.status = status;
        record.parent_id = normalize_parent_id(row.try_get("parent_id").map_err(database_error)?);
        record.started_at = normalize_timestamp(row.try_get("started_at").map_err(database_error)?);
        record.ended_at = normalize_timestamp(row.try_get("ended_at").map_err(database_error)?);
        record.iterations = row
            .try_get::<Option<i32>, _>("iterations")
            .map_err(database_error)?
            .unwrap_or_default();
        record.last_error = normalize_error(row.try_get("last_error").map_err(database_error)?);
        record.cursor = record.cursor_for(basis).ok_or_else(|| {
            DashboardError::malformed(
                EXECUTION_STORE_SERVICE,
                format!("执行记录 {task_id} 缺少游标所需的开始时间"),
            )
        })?;
        Ok(record)
    }

    async fn query_page(&self, query: &ExecutionPageQuery) -> DashboardResult<Vec<ExecutionRecord>> {
        let sql = page_sql(query.basis, query.after.is_some());
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

        let mut statement = sqlx::query(&sql).bind(&query.task_name).bind(limit);
        if let Some(after) = &query.after {
            statement = statement.bind(after.timestamp).bind(after.task_id);
        }
        let rows = statement.fetch_all(&self.pool).await.map_err(database_error)?;

        rows.iter()
            .map(|row| Self::row_to_record(row, query.basis))
            .collect()
    }

    async fn query_stats(&self, task_name: &str) -> DashboardResult<ExecutionStats> {
        let row = sqlx::query(
            r#"
            SELECT count(*) AS total_exec,
                   count(*) FILTER (WHERE status = 'success') AS total_success,
                   count(*) FILTER (WHERE status = 'failed') AS total_err,
                   max(started_at) FILTER (WHERE started_at > to_timestamp(0)) AS last_exec
            FROM tasks
            WHERE task_name = $1
            "#,
        )
        .bind(task_name)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(ExecutionStats {
            total_exec: count_column(&row, "total_exec")?,
            total_success: count_column(&row, "total_success")?,
            total_err: count_column(&row, "total_err")?,
            last_exec: normalize_timestamp(row.try_get("last_exec").map_err(database_error)?),
        })
    }

    async fn query_detail(&self, task_id: Uuid) -> DashboardResult<Option<ExecutionDetail>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS}, state FROM tasks WHERE task_id = $1 ORDER BY published_at DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        match row {
            Some(row) => {
                let record = Self::row_to_record(&row, CursorBasis::Published)?;
                let parameters = row
                    .try_get::<Option<serde_json::Value>, _>("state")
                    .map_err(database_error)?
                    .unwrap_or(serde_json::Value::Null);
                Ok(Some(ExecutionDetail { record, parameters }))
            }
            None => Ok(None),
        }
    }

    async fn query_activity(&self, since: DateTime<Utc>) -> DashboardResult<ActivityCounts> {
        let row = sqlx::query(
            r#"
            SELECT count(*) AS executions,
                   count(*) FILTER (WHERE last_error IS NOT NULL AND last_error <> '') AS errors
            FROM tasks
            WHERE started_at > $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(ActivityCounts {
            executions: count_column(&row, "executions")?,
            errors: count_column(&row, "errors")?,
        })
    }
}

fn count_column(row: &PgRow, column: &str) -> DashboardResult<u64> {
    let count: i64 = row.try_get(column).map_err(database_error)?;
    u64::try_from(count).map_err(|_| {
        DashboardError::malformed(EXECUTION_STORE_SERVICE, format!("{column} 为负数: {count}"))
    })
}

#[async_trait]
impl ExecutionRepository for PostgresExecutionRepository {
    #[instrument(skip(self, query), fields(
        task_name = %query.task_name,
        after = ?query.after.as_ref().map(ToString::to_string),
        basis = ?query.basis,
    ))]
    async fn find_page(&self, query: &ExecutionPageQuery) -> DashboardResult<Vec<ExecutionRecord>> {
        let started = Instant::now();
        let result = self.query_page(query).await;
        record_upstream_call(EXECUTION_STORE_SERVICE, started, &result);
        if let Ok(rows) = &result {
            debug!("查询执行历史成功，返回 {} 条记录", rows.len());
        }
        result
    }

    #[instrument(skip(self))]
    async fn stats(&self, task_name: &str) -> DashboardResult<ExecutionStats> {
        let started = Instant::now();
        let result = self.query_stats(task_name).await;
        record_upstream_call(EXECUTION_STORE_SERVICE, started, &result);
        result
    }

    #[instrument(skip(self), fields(task_id = %task_id))]
    async fn find_by_id(&self, task_id: Uuid) -> DashboardResult<Option<ExecutionDetail>> {
        let started = Instant::now();
        let result = self.query_detail(task_id).await;
        record_upstream_call(EXECUTION_STORE_SERVICE, started, &result);
        result
    }

    #[instrument(skip(self))]
    async fn activity_since(&self, since: DateTime<Utc>) -> DashboardResult<ActivityCounts> {
        let started = Instant::now();
        let result = self.query_activity(since).await;
        record_upstream_call(EXECUTION_STORE_SERVICE, started, &result);
        result
    }
}

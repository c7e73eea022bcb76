use std::time::Instant;

use async_trait::async_trait;
use dashboard_core::{models::LogEntry, traits::LogRepository, DashboardResult};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error_handling::{database_error, EXECUTION_STORE_SERVICE};
use crate::observability::record_upstream_call;

pub struct PostgresLogRepository {
    pool: PgPool,
}

impl PostgresLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: &PgRow) -> DashboardResult<LogEntry> {
        Ok(LogEntry {
            task_id: row.try_get("task_id").map_err(database_error)?,
            state_id: row.try_get("state_id").map_err(database_error)?,
            level: row
                .try_get::<Option<String>, _>("level")
                .map_err(database_error)?
                .unwrap_or_default(),
            message: row
                .try_get::<Option<String>, _>("message")
                .map_err(database_error)?
                .unwrap_or_default(),
            data: row
                .try_get::<Option<serde_json::Value>, _>("data")
                .map_err(database_error)?
                .unwrap_or(serde_json::Value::Null),
            logged_at: row.try_get("logged_at").map_err(database_error)?,
        })
    }
}

#[async_trait]
impl LogRepository for PostgresLogRepository {
    #[instrument(skip(self), fields(task_id = %task_id))]
    async fn list_for_execution(&self, task_id: Uuid) -> DashboardResult<Vec<LogEntry>> {
        let started = Instant::now();
        let result: DashboardResult<Vec<LogEntry>> = async {
            let rows = sqlx::query(
                "SELECT task_id, state_id, level, message, data, logged_at FROM logs WHERE task_id = $1 ORDER BY logged_at DESC",
            )
            .bind(task_id)
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;
            rows.iter().map(Self::row_to_entry).collect()
        }
        .await;

        record_upstream_call(EXECUTION_STORE_SERVICE, started, &result);
        if let Ok(entries) = &result {
            debug!("查询执行日志成功，共 {} 条", entries.len());
        }
        result
    }
}

pub mod postgres_execution_repository;
pub mod postgres_log_repository;

pub use postgres_execution_repository::PostgresExecutionRepository;
pub use postgres_log_repository::PostgresLogRepository;

use std::time::Duration;

use dashboard_core::{config::DatabaseConfig, DashboardResult};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::error_handling::database_error;

/// 执行历史数据库连接池管理器
///
/// 看板只读取调度器写入的表，不负责迁移。
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> DashboardResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(database_error)?;

        info!(max_connections = config.max_connections, "执行历史数据库连接池已创建");
        Ok(Self { pool })
    }

    /// 连接延迟到首次查询，数据库暂时不可达时服务仍可启动
    pub fn connect_lazy(config: &DatabaseConfig) -> DashboardResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_lazy(&config.url)
            .map_err(database_error)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> DashboardResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

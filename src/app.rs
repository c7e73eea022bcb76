use std::sync::Arc;

use anyhow::{Context, Result};
use dashboard_api::{create_app, AppState};
use dashboard_core::{config::AppConfig, SystemClock};
use dashboard_domain::DashboardService;
use dashboard_infrastructure::{
    DatabaseManager, LavinMqClient, PostgresExecutionRepository, PostgresLogRepository, ZschedClient,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::info;

/// 看板进程
pub struct Application {
    config: AppConfig,
    database: DatabaseManager,
    state: AppState,
}

impl Application {
    /// 装配上游客户端与看板服务
    ///
    /// 数据库连接延迟到首次查询，上游暂时不可达时看板仍然启动并按区块降级。
    pub fn new(config: AppConfig, metrics: Option<PrometheusHandle>) -> Result<Self> {
        info!("执行历史数据库: {}", mask_database_url(&config.database.url));
        let database = DatabaseManager::connect_lazy(&config.database).context("创建数据库连接池失败")?;

        info!("Broker管理API: {}", config.broker.api_url);
        let broker = LavinMqClient::new(&config.broker).context("创建Broker客户端失败")?;

        info!("调度器API: {}", config.scheduler.base_url);
        let scheduler = ZschedClient::new(&config.scheduler).context("创建调度器客户端失败")?;

        let dashboard = DashboardService::new(
            Arc::new(broker),
            Arc::new(scheduler),
            Arc::new(PostgresExecutionRepository::new(database.pool().clone())),
            Arc::new(PostgresLogRepository::new(database.pool().clone())),
            Arc::new(SystemClock),
        )
        .with_cursor_basis(config.history.cursor_basis)
        .with_default_vhost(config.broker.default_vhost.clone())
        .with_sample_interval_ms(config.broker.sample_interval_ms);

        let mut state = AppState::new(Arc::new(dashboard));
        if let Some(handle) = metrics {
            state = state.with_metrics(handle);
        }

        Ok(Self {
            config,
            database,
            state,
        })
    }

    /// 运行HTTP服务直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let app = create_app(self.state.clone(), &self.config.api, &self.config.observability);

        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;
        info!("看板服务启动在 http://{}", self.config.api.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP服务收到关闭信号");
            })
            .await
            .context("HTTP服务运行失败")?;

        self.database.close().await;
        info!("看板服务已停止");
        Ok(())
    }
}

/// 屏蔽数据库URL中的密码
fn mask_database_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if colon_pos > url.find("://").map(|p| p + 2).unwrap_or(0) {
                let mut masked = url.to_string();
                masked.replace_range(colon_pos + 1..at_pos, "***");
                return masked;
            }
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_database_url() {
        assert_eq!(
            mask_database_url("postgresql://zsched:secret@db:5432/zsched"),
            "postgresql://zsched:***@db:5432/zsched"
        );
        assert_eq!(
            mask_database_url("postgresql://localhost/zsched"),
            "postgresql://localhost/zsched"
        );
        assert_eq!(
            mask_database_url("postgresql://zsched@db/zsched"),
            "postgresql://zsched@db/zsched"
        );
    }
}

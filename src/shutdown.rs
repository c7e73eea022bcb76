use std::{future::Future, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use tokio::signal;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// 优雅关闭管理器
#[derive(Clone)]
pub struct ShutdownManager {
    shutdown_tx: Arc<RwLock<Option<broadcast::Sender<()>>>>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(4);
        Self {
            shutdown_tx: Arc::new(RwLock::new(Some(shutdown_tx))),
        }
    }

    /// 订阅关闭信号，已关闭时返回立即触发的接收器
    pub async fn subscribe(&self) -> broadcast::Receiver<()> {
        let shutdown_tx = self.shutdown_tx.read().await;
        match shutdown_tx.as_ref() {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(1);
                let _ = tx.send(());
                rx
            }
        }
    }

    /// 触发关闭，重复调用无效果
    pub async fn shutdown(&self) {
        let mut shutdown_tx = self.shutdown_tx.write().await;
        match shutdown_tx.take() {
            Some(tx) => {
                debug!("发送关闭信号给 {} 个订阅者", tx.receiver_count());
                let _ = tx.send(());
                info!("关闭信号已发送");
            }
            None => debug!("关闭管理器已经触发过关闭"),
        }
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 等待 Ctrl+C 或 SIGTERM
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("安装Ctrl+C信号处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("安装SIGTERM信号处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}

/// 运行服务直到收到关闭信号
///
/// 服务提前退出时立即返回其结果，收到信号后通知服务关闭并最多等待 `grace`。
pub async fn run_until_shutdown<F, S>(
    service: F,
    signal: S,
    manager: &ShutdownManager,
    grace: Duration,
) -> Result<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
    S: Future<Output = ()>,
{
    let mut handle = tokio::spawn(service);

    tokio::select! {
        joined = &mut handle => {
            return joined.map_err(|e| anyhow!("看板服务任务异常退出: {e}"))?;
        }
        _ = signal => {}
    }

    info!("收到关闭信号，开始优雅关闭...");
    manager.shutdown().await;

    match tokio::time::timeout(grace, handle).await {
        Ok(joined) => joined.map_err(|e| anyhow!("看板服务任务异常退出: {e}"))?,
        Err(_) => {
            warn!("看板服务关闭超时，强制退出");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_service_failure_returns_without_signal() {
        let manager = ShutdownManager::new();
        let result = run_until_shutdown(
            async { Err(anyhow!("地址已被占用")) },
            std::future::pending::<()>(),
            &manager,
            Duration::from_secs(1),
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("地址已被占用"));
    }

    #[tokio::test]
    async fn test_signal_stops_service_gracefully() {
        let manager = ShutdownManager::new();
        let mut rx = manager.subscribe().await;
        let service = async move {
            let _ = rx.recv().await;
            Ok(())
        };

        let result = run_until_shutdown(service, async {}, &manager, Duration::from_secs(1)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_times_out_on_stuck_service() {
        let manager = ShutdownManager::new();
        let service = async {
            std::future::pending::<()>().await;
            Ok(())
        };

        let result = run_until_shutdown(service, async {}, &manager, Duration::from_millis(10)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_notifies_subscribers() {
        let manager = ShutdownManager::new();
        let mut rx = manager.subscribe().await;

        manager.shutdown().await;
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_subscribe_after_shutdown_fires_immediately() {
        let manager = ShutdownManager::new();
        manager.shutdown().await;
        manager.shutdown().await;

        let mut rx = manager.subscribe().await;
        assert!(rx.recv().await.is_ok());
    }
}

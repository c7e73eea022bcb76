use async_trait::async_trait;

use crate::{
    models::{BrokerOverview, QueueSnapshot},
    DashboardResult,
};

/// Broker 管理接口
///
/// 只读访问 Broker 的 HTTP 管理 API。实现方需要把网络失败转换为
/// `UpstreamUnavailable`，把无法解析的响应转换为 `MalformedResponse`。
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// 获取 Broker 全局概览
    async fn overview(&self) -> DashboardResult<BrokerOverview>;

    /// 列出所有队列的快照
    async fn list_queues(&self) -> DashboardResult<Vec<QueueSnapshot>>;

    /// 获取单个队列快照，队列不存在时返回 `None`
    async fn get_queue(&self, vhost: &str, name: &str) -> DashboardResult<Option<QueueSnapshot>>;
}

use async_trait::async_trait;

use crate::{models::Task, DashboardResult};

/// 调度器任务接口
#[async_trait]
pub trait SchedulerClient: Send + Sync {
    /// 列出所有已注册任务
    async fn list_tasks(&self) -> DashboardResult<Vec<Task>>;

    /// 按名称获取任务，不存在时返回 `None`
    async fn get_task(&self, name: &str) -> DashboardResult<Option<Task>>;

    /// 以给定参数立即派发一次任务执行
    async fn dispatch(&self, name: &str, parameters: &serde_json::Value) -> DashboardResult<()>;
}

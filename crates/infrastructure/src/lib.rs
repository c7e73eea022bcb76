//! 看板基础设施层
//!
//! 上游适配器实现 `dashboard_core::traits` 中的接口：
//! - `http` - LavinMQ 管理 API 与 zsched 调度器 API 客户端
//! - `database` - TimescaleDB 中的执行历史和日志
//!
//! 所有上游调用都记录 `dashboard_upstream_*` 指标，失败统一转换为 `DashboardError`。

pub mod database;
pub mod error_handling;
pub mod http;
pub mod observability;

pub use database::{DatabaseManager, PostgresExecutionRepository, PostgresLogRepository};
pub use http::{LavinMqClient, ZschedClient};

//! 看板聚合核心
//!
//! - [`time_series`] 把定长采样序列对齐为带时间戳的图表点
//! - [`queue_metrics`] 从队列快照推导待处理数、成功率和错误率
//! - [`catalog`] 按任务名左连接任务定义与队列快照
//! - [`history`] 执行历史的游标分页与展示策略
//! - [`services`] 按请求编排上游读取和上述聚合

pub mod catalog;
pub mod formatters;
pub mod history;
pub mod queue_metrics;
pub mod services;
pub mod time_series;
pub mod views;

pub use catalog::{join_catalog, CatalogEntry, CatalogFilter};
pub use formatters::{format_duration, format_duration_ms};
pub use history::{
    parse_after, select_page, ExecutionDuration, ExecutionHistoryPage, ExecutionHistoryPaginator, ExecutionView,
    PAGE_SIZE,
};
pub use queue_metrics::{MetricRateAggregator, QueueMetrics};
pub use services::DashboardService;
pub use time_series::TimeSeriesSynchronizer;
pub use views::*;

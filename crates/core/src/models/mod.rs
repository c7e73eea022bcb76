//! # 数据模型
//!
//! 看板读取的上游数据结构：Broker 快照、调度器任务定义和执行历史。
//!
//! ## 核心模型
//!
//! ### SampleLog / TimeSeriesPoint
//! Broker 返回的定长采样序列，以及同步器对齐后的时间点。
//!
//! ### QueueSnapshot / BrokerOverview
//! 单个队列和 Broker 全局的快照，`message_stats` 按指标名索引。
//!
//! ### Task
//! 调度器中的任务定义，`name` 唯一。
//!
//! ### ExecutionRecord / ExecutionCursor
//! 执行历史记录和分页游标。游标按 (时间戳, task_id) 全序比较：
//!
//! ```text
//! pending → running → success
//!                   ↘ failed
//! ```
//!
//! ## 时间字段
//!
//! 所有时间字段使用 `DateTime<Utc>`。调度器对未设置的时间写入零值，
//! 读取时统一转换为 `None`，参见 [`normalize_timestamp`]。

pub mod execution;
pub mod queue;
pub mod sample;
pub mod task;

pub use execution::*;
pub use queue::*;
pub use sample::*;
pub use task::*;

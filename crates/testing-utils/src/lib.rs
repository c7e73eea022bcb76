//! # Dashboard Testing Utils
//!
//! 各 crate 共享的测试工具：
//!
//! - **mocks**: Broker、调度器和执行历史存储的内存实现
//! - **builders**: 执行记录、队列快照和 Broker 概览的构建器
//! - **containers**: 带执行历史表结构的 PostgreSQL 测试容器
//!
//! ```toml
//! [dev-dependencies]
//! dashboard-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod containers;
pub mod mocks;

pub use builders::*;
pub use containers::*;
pub use mocks::*;

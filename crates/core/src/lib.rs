//! 看板核心库：共享数据模型、错误类型、配置和上游访问接口

pub mod clock;
pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::*;

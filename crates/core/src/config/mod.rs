//! 看板配置
//!
//! 配置按以下顺序合并，后者覆盖前者：
//! 1. 各配置段的默认值
//! 2. TOML 配置文件
//! 3. 以 `DASHBOARD_` 为前缀、`__` 分隔层级的环境变量，例如 `DASHBOARD_BROKER__API_URL`
//!
//! 加载完成后逐段调用 `validate()`，任一段无效则加载失败。

pub mod models;


pub use models::*;

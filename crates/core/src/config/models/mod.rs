pub mod api_observability;
pub mod app_config;
pub mod broker;
pub mod database;
pub mod scheduler;

pub use api_observability::{ApiConfig, LogFormat, ObservabilityConfig};
pub use app_config::AppConfig;
pub use broker::BrokerConfig;
pub use database::{DatabaseConfig, HistoryConfig};
pub use scheduler::SchedulerConfig;

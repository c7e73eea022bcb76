pub mod broker_client;
pub mod scheduler_client;
pub mod wire;

pub use broker_client::LavinMqClient;
pub use scheduler_client::ZschedClient;

pub mod broker;
pub mod repository;
pub mod scheduler;

pub use broker::*;
pub use repository::*;
pub use scheduler::*;

pub mod executions;
pub mod health;
pub mod metrics;
pub mod overview;
pub mod tasks;

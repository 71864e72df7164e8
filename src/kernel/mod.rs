pub mod agent;
pub mod config;
pub mod error;
pub mod module;
pub mod reactor;
pub mod scheduler;
pub mod telemetry;
pub mod time;

mod client;
mod config;
mod insight_repository;
mod migration;
mod telemetry_sample_repository;

pub use client::*;
pub use config::*;
pub use insight_repository::*;
pub use migration::*;
pub use telemetry_sample_repository::*;

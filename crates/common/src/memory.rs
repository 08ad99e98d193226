mod in_memory_insight_repository;
mod in_memory_telemetry_sample_repository;

pub use in_memory_insight_repository::*;
pub use in_memory_telemetry_sample_repository::*;

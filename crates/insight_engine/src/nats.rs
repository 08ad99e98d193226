mod telemetry_sample_processor;

pub use telemetry_sample_processor::*;

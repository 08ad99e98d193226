mod insight;
mod result;
mod sky_condition;
mod telemetry_sample;

pub use insight::*;
pub use result::*;
pub use sky_condition::*;
pub use telemetry_sample::*;

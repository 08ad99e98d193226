pub mod domain;
pub mod insight_worker;
pub mod nats;

pub use domain::*;
pub use insight_worker::*;
pub use nats::*;

mod efficiency;
mod ingestion_service;
mod query_service;
mod rules;
mod window;

pub use efficiency::*;
pub use ingestion_service::*;
pub use query_service::*;
pub use rules::*;
pub use window::*;

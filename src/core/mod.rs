pub mod body;
pub mod caller;
pub mod encoding;
pub mod engine;
pub mod materializer;
pub mod table_reader;
pub mod upload;

pub use crate::domain::model::{ApiContext, Payload, Record, RecordSet, ResponseEnvelope, Value};
pub use crate::domain::ports::Storage;
pub use crate::utils::error::Result;

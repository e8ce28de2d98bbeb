mod aggregate;
mod config;
mod error;
mod event;
mod exam;
mod ingest;
mod query;
pub mod snapshot;
pub mod source;
mod student;

pub use aggregate::{Aggregator, mean};
pub use config::{
    Config, ConfigBuilder, DEFAULT_BATCH_SIZE, ENV_BATCH_SIZE, ENV_EVENT_NAME, ENV_SOURCE_ADDR,
};
pub use error::{DecodeError, Error};
pub use event::{ExamId, ScoreEvent, TestRecord, decode};
pub use exam::{ExamRecord, ExamStore};
pub use ingest::{Applied, IngestHandle, IngestLoop, IngestReport, IngestState, pipeline};
pub use query::QueryService;
pub use snapshot::Snapshot;
pub use source::{EventSource, JsonLinesSource, SseSource, channel};
pub use student::{StudentRecord, StudentStore};

//! Request-scoped structured logging: leveled, machine-parsable events
//! enriched with a per-request correlation id and timestamp.

pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod level;
pub mod pipeline;
pub mod render;
pub mod sink;

pub use config::{Config, LogConfig};
pub use error::LogError;
pub use event::{EventDict, Fields};
pub use level::Level;
pub use pipeline::{Logger, Pipeline};
pub use render::Renderer;
pub use sink::{MemorySink, Sink, StdoutSink};

use std::sync::Arc;

/// Build a pipeline writing to standard output.
pub fn init(config: &LogConfig) -> Result<Arc<Pipeline>, LogError> {
    Pipeline::new(config, Arc::new(StdoutSink))
}

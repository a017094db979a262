pub mod assembler;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod inspector;
pub mod model;
pub mod pipeline;
pub mod projector;
pub mod simplifier;

pub use config::MapmakerParams;
pub use error::{ConfigError, MapmakerError, Result};
pub use model::{Area, Dataset, Level, ObjectId};
pub use pipeline::{MapData, NoopObserver, PipelineEvent, PipelineObserver, TracingObserver, run};

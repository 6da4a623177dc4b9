//! Mail Triage — buffered email triage pipeline.

pub mod agent;
pub mod config;
pub mod error;
pub mod mailstore;
pub mod model;
pub mod pipeline;
pub mod source;

pub use config::{ClassifyConcurrency, TriageConfig};
pub use error::{Error, Result};
pub use model::{Direction, Message, Tier};
pub use pipeline::{PipelineEvent, PipelinePhase, TriageController};

//! The triage buffering pipeline.
//!
//! Pages from the message source land in a FIFO [`buffer`], the
//! [`dispatcher`] classifies drained messages into tiered [`buckets`],
//! and the [`scheduler`] decides when removals pull replacements from
//! the buffer and when the buffer itself needs another page. The
//! [`controller`] ties the pieces together behind a single lock.

pub mod buffer;
pub mod buckets;
pub mod controller;
pub mod dispatcher;
pub mod scheduler;

pub use buffer::BufferQueue;
pub use buckets::{Bucket, BucketStore};
pub use controller::{PipelineEvent, PipelinePhase, TriageController};
pub use dispatcher::ClassificationDispatcher;
pub use scheduler::RefillScheduler;

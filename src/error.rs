//! Error types for the triage pipeline.

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Mail store error: {0}")]
    MailStore(#[from] MailStoreError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the paginated message source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Fetch failed for page {page}: {reason}")]
    Fetch { page: u64, reason: String },

    #[error("Malformed page response: {0}")]
    Decode(String),
}

/// Errors from the classification/summarization service.
///
/// Classification callers treat every variant as a fail-open signal;
/// summarization callers treat them as "summary stays absent".
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Service returned status {status}")]
    Status { status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors from the mail-store mark-read/delete API.
#[derive(Debug, thiserror::Error)]
pub enum MailStoreError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Mark read rejected for message {id}")]
    MarkReadFailed { id: String },

    #[error("Delete rejected for message {id}")]
    DeleteFailed { id: String },
}

/// Pipeline-level errors surfaced to the consumer.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Page fetch failed: {0}")]
    PageFetch(String),

    #[error("Removal failed: {0}")]
    Removal(#[from] MailStoreError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

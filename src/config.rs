//! Configuration types.

use crate::error::ConfigError;

/// Bound on concurrent classification calls outside the initial fill.
///
/// The initial fill is always sequential regardless of this setting;
/// that phase deliberately awaits each classification to produce a
/// deterministic first-page ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyConcurrency {
    /// One classification at a time, in buffer order.
    Sequential,
    /// At most `n` classifications in flight.
    Pooled(usize),
    /// No bound; every drained message classifies immediately.
    Unbounded,
}

/// Triage pipeline configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Maximum total messages held across all buckets.
    pub working_set_capacity: usize,
    /// Messages fetched per page from the source.
    pub page_size: usize,
    /// Buffer depth below which the next page is requested.
    pub low_buffer_threshold: usize,
    /// Concurrency bound for classification calls.
    pub classify_concurrency: ClassifyConcurrency,
    /// Base URL of the mail-store API (fetch/mark-read/delete).
    pub mail_store_url: String,
    /// Base URL of the classify/summarize service.
    pub agent_url: String,
    /// Base URL of the workflow-automation endpoint.
    pub automation_url: String,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            working_set_capacity: 100,
            page_size: 50,
            low_buffer_threshold: 20,
            classify_concurrency: ClassifyConcurrency::Sequential,
            mail_store_url: "http://localhost:8000".to_string(),
            agent_url: "http://localhost:8000".to_string(),
            automation_url: "http://localhost:8000".to_string(),
        }
    }
}

impl TriageConfig {
    /// Build a config from environment variables, falling back to defaults.
    ///
    /// `MAIL_TRIAGE_BASE_URL` sets all three service URLs at once;
    /// `MAIL_TRIAGE_AGENT_URL` / `MAIL_TRIAGE_AUTOMATION_URL` override
    /// individually.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("MAIL_TRIAGE_BASE_URL") {
            config.mail_store_url = base.clone();
            config.agent_url = base.clone();
            config.automation_url = base;
        }
        if let Ok(url) = std::env::var("MAIL_TRIAGE_AGENT_URL") {
            config.agent_url = url;
        }
        if let Ok(url) = std::env::var("MAIL_TRIAGE_AUTOMATION_URL") {
            config.automation_url = url;
        }
        if let Ok(raw) = std::env::var("MAIL_TRIAGE_CAPACITY") {
            config.working_set_capacity =
                raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "MAIL_TRIAGE_CAPACITY".into(),
                    message: format!("not a number: {raw}"),
                })?;
        }
        if let Ok(raw) = std::env::var("MAIL_TRIAGE_CLASSIFY_POOL") {
            config.classify_concurrency = match raw.as_str() {
                "seq" | "sequential" => ClassifyConcurrency::Sequential,
                "unbounded" => ClassifyConcurrency::Unbounded,
                n => ClassifyConcurrency::Pooled(n.parse().map_err(|_| {
                    ConfigError::InvalidValue {
                        key: "MAIL_TRIAGE_CLASSIFY_POOL".into(),
                        message: format!("expected seq|unbounded|<n>, got {n}"),
                    }
                })?),
            };
        }

        Ok(config)
    }
}

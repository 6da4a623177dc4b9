//! Triage agent client — classify and summarize calls.
//!
//! Both endpoints are pure functions of the message text, so retries
//! are always safe. Callers decide what a failure means: classification
//! fails open to `Tier::Other`, summarization just leaves the summary
//! absent.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AgentError;

/// External classification/summarization service.
#[async_trait]
pub trait TriageAgent: Send + Sync {
    /// Classify message text. Returns the raw category string; tier
    /// mapping (including the fail-open default) is the dispatcher's job.
    async fn classify(&self, text: &str) -> Result<String, AgentError>;

    /// Summarize message text.
    async fn summarize(&self, text: &str) -> Result<String, AgentError>;
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    summary: String,
}

/// HTTP agent against `POST /classify` and `POST /summarize`.
pub struct HttpTriageAgent {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTriageAgent {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn post_text(&self, endpoint: &str, text: &str) -> Result<reqwest::Response, AgentError> {
        let resp = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .json(&serde_json::json!({ "email_text": text }))
            .send()
            .await
            .map_err(|e| AgentError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AgentError::Status {
                status: resp.status().as_u16(),
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl TriageAgent for HttpTriageAgent {
    async fn classify(&self, text: &str) -> Result<String, AgentError> {
        let resp = self.post_text("classify", text).await?;
        let body: ClassifyResponse = resp
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;
        // A missing category is not an error here: the dispatcher's
        // fail-open mapping turns the empty string into Tier::Other.
        Ok(body.category.unwrap_or_default())
    }

    async fn summarize(&self, text: &str) -> Result<String, AgentError> {
        let resp = self.post_text("summarize", text).await?;
        let body: SummarizeResponse = resp
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;
        Ok(body.summary)
    }
}

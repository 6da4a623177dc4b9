//! Mail-store actions (mark-read, delete) and the automation hook.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AgentError, MailStoreError};

/// Mark-read/delete actions against the mail store.
///
/// Both return only after the store has confirmed the action; the
/// pipeline never mutates local state before that confirmation, so a
/// failed attempt needs no rollback.
#[async_trait]
pub trait MailStore: Send + Sync {
    async fn mark_read(&self, id: &str) -> Result<(), MailStoreError>;
    async fn delete(&self, id: &str) -> Result<(), MailStoreError>;
}

/// Workflow-automation endpoint, called only for `important` messages.
///
/// Callers launch this as a detached task: the result and any failure
/// are discarded and must never affect pipeline state.
#[async_trait]
pub trait AutomationHook: Send + Sync {
    async fn trigger(&self, id: &str) -> Result<(), AgentError>;
}

#[derive(Debug, Deserialize)]
struct SuccessResponse {
    #[serde(default)]
    success: bool,
}

/// HTTP mail store against `POST /emails/mark_read` and `POST /emails/delete`.
pub struct HttpMailStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMailStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn post_action(&self, endpoint: &str, id: &str) -> Result<bool, MailStoreError> {
        let resp = self
            .client
            .post(format!("{}/emails/{endpoint}", self.base_url))
            .json(&serde_json::json!({ "email_id": id }))
            .send()
            .await
            .map_err(|e| MailStoreError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Ok(false);
        }
        let body: SuccessResponse = resp
            .json()
            .await
            .map_err(|e| MailStoreError::Request(e.to_string()))?;
        Ok(body.success)
    }
}

#[async_trait]
impl MailStore for HttpMailStore {
    async fn mark_read(&self, id: &str) -> Result<(), MailStoreError> {
        if self.post_action("mark_read", id).await? {
            Ok(())
        } else {
            Err(MailStoreError::MarkReadFailed { id: id.to_string() })
        }
    }

    async fn delete(&self, id: &str) -> Result<(), MailStoreError> {
        if self.post_action("delete", id).await? {
            Ok(())
        } else {
            Err(MailStoreError::DeleteFailed { id: id.to_string() })
        }
    }
}

/// HTTP automation hook against `POST /emails/process_one`.
pub struct HttpAutomationHook {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAutomationHook {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AutomationHook for HttpAutomationHook {
    async fn trigger(&self, id: &str) -> Result<(), AgentError> {
        let resp = self
            .client
            .post(format!("{}/emails/process_one", self.base_url))
            .json(&serde_json::json!({ "email_id": id }))
            .send()
            .await
            .map_err(|e| AgentError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AgentError::Status {
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}

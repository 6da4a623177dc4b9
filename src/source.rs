//! Message source — paginated retrieval from the mail-store API.

use async_trait::async_trait;
use tracing::debug;

use crate::error::SourceError;
use crate::model::Message;

/// Paginated message retrieval. Pure I/O, no pipeline state.
///
/// Offsets are in units of the page size. An empty page is the
/// authoritative exhaustion signal: once a caller observes one it must
/// record terminal exhaustion and not query again for the session
/// (an explicit refresh starts a new session).
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch one page of messages. `page` is a 0-based page index.
    async fn fetch_page(&self, page: u64) -> Result<Vec<Message>, SourceError>;
}

/// HTTP message source against `GET {base}/emails?max_results=N&skip=M`.
pub struct HttpMessageSource {
    base_url: String,
    page_size: usize,
    client: reqwest::Client,
}

impl HttpMessageSource {
    pub fn new(base_url: impl Into<String>, page_size: usize) -> Self {
        Self {
            base_url: base_url.into(),
            page_size,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MessageSource for HttpMessageSource {
    async fn fetch_page(&self, page: u64) -> Result<Vec<Message>, SourceError> {
        let url = format!(
            "{}/emails?max_results={}&skip={}",
            self.base_url,
            self.page_size,
            page * self.page_size as u64
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Fetch {
                page,
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(SourceError::Fetch {
                page,
                reason: format!("status {}", resp.status()),
            });
        }

        let messages: Vec<Message> = resp
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        debug!(page, count = messages.len(), "Fetched message page");
        Ok(messages)
    }
}

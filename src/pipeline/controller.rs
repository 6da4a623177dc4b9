//! Triage controller — orchestrates the buffering pipeline.
//!
//! Flow per session:
//! 1. `refresh()` clears all state and fetches the first page
//! 2. Initial fill classifies the first page sequentially from the
//!    buffer head, then a low-buffer top-up pre-buffers the next page
//! 3. Every confirmed removal pops one buffered message, classifies it,
//!    and re-checks buffer depth for the next page fetch
//!
//! All state lives in one `PipelineState` behind a single lock; every
//! network await happens with the lock released, and completions are
//! re-validated against the epoch current when they resolve.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock, Semaphore};
use tracing::{debug, error, info, warn};

use crate::agent::TriageAgent;
use crate::config::{ClassifyConcurrency, TriageConfig};
use crate::error::{PipelineError, Result};
use crate::mailstore::{AutomationHook, MailStore};
use crate::model::{Direction, Message, Tier};
use crate::pipeline::buffer::BufferQueue;
use crate::pipeline::buckets::BucketStore;
use crate::pipeline::dispatcher::ClassificationDispatcher;
use crate::pipeline::scheduler::RefillScheduler;
use crate::source::MessageSource;

/// Default event channel capacity.
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Pipeline lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// No session started yet.
    Idle,
    /// Reset done, first page not yet landed.
    Loading,
    /// First page landed; source still has (or may have) more.
    Active,
    /// Source returned an empty page. No further fetches this session;
    /// buffered messages still feed backfill.
    Exhausted,
}

/// Events broadcast to pipeline consumers.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Full reset: buffer, buckets, cursors and exhaustion cleared.
    Reset,
    /// A page landed in the buffer.
    PageFetched { page: u64, count: usize },
    /// A message was classified and bucketed.
    Classified { id: String, tier: Tier },
    /// A message was removed after a confirmed mark-read/delete.
    Removed { id: String, tier: Tier },
    /// The source reported no more messages.
    Exhausted,
    /// A pipeline-level error (page fetch). Also readable via `last_error`.
    Error { message: String },
}

/// Everything a session owns. Replaced wholesale on refresh.
struct PipelineState {
    phase: PipelinePhase,
    buffer: BufferQueue,
    buckets: BucketStore,
    scheduler: RefillScheduler,
    /// Session generation. In-flight completions carry the epoch they
    /// were issued under and are dropped on mismatch.
    epoch: u64,
    last_error: Option<String>,
}

/// Orchestrates source, dispatcher, buckets and refill policy.
pub struct TriageController {
    state: RwLock<PipelineState>,
    dispatcher: ClassificationDispatcher,
    source: Arc<dyn MessageSource>,
    store: Arc<dyn MailStore>,
    agent: Arc<dyn TriageAgent>,
    capacity: usize,
    /// Bound on concurrent classification calls; `None` is unbounded.
    classify_gate: Option<Semaphore>,
    events: broadcast::Sender<PipelineEvent>,
}

impl TriageController {
    pub fn new(
        config: &TriageConfig,
        source: Arc<dyn MessageSource>,
        agent: Arc<dyn TriageAgent>,
        store: Arc<dyn MailStore>,
        automation: Arc<dyn AutomationHook>,
    ) -> Arc<Self> {
        let (events, _rx) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        let classify_gate = match config.classify_concurrency {
            ClassifyConcurrency::Sequential => Some(Semaphore::new(1)),
            ClassifyConcurrency::Pooled(n) => Some(Semaphore::new(n.max(1))),
            ClassifyConcurrency::Unbounded => None,
        };

        Arc::new(Self {
            state: RwLock::new(PipelineState {
                phase: PipelinePhase::Idle,
                buffer: BufferQueue::new(),
                buckets: BucketStore::new(),
                scheduler: RefillScheduler::new(
                    config.low_buffer_threshold,
                    config.working_set_capacity,
                ),
                epoch: 0,
                last_error: None,
            }),
            dispatcher: ClassificationDispatcher::new(Arc::clone(&agent), automation),
            source,
            store,
            agent,
            capacity: config.working_set_capacity,
            classify_gate,
            events,
        })
    }

    /// Subscribe to pipeline events.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// (Re)start the pipeline: clear buffer, buckets, cursors, the
    /// exhaustion flag and the page index, then fetch the first page
    /// and run the initial fill.
    ///
    /// Earlier in-flight requests are not cancelled; the epoch bump
    /// makes their completions no-ops instead.
    pub async fn refresh(&self) {
        let (epoch, first_page) = {
            let mut state = self.state.write().await;
            state.epoch += 1;
            state.buffer.clear();
            state.buckets.clear();
            state.scheduler.reset();
            state.phase = PipelinePhase::Loading;
            state.last_error = None;
            let page = state.scheduler.next_fetch(0, false);
            (state.epoch, page)
        };

        info!(epoch, "Pipeline refresh");
        let _ = self.events.send(PipelineEvent::Reset);

        if let Some(page) = first_page {
            self.fetch_page_into_buffer(page, epoch).await;
        }
        self.initial_fill(epoch).await;
    }

    /// Sequential initial fill: classify the first page from the buffer
    /// head, each call awaited before the next starts, until the buffer
    /// drains or the working set reaches capacity. Later pages are only
    /// pre-buffered; removals feed them into buckets one at a time.
    async fn initial_fill(&self, epoch: u64) {
        loop {
            let message = {
                let mut state = self.state.write().await;
                if state.epoch != epoch {
                    return;
                }
                if state.buckets.total_count() >= self.capacity {
                    None
                } else {
                    state.buffer.pop_front()
                }
            };

            match message {
                Some(message) => self.classify_and_bucket(message, epoch).await,
                None => break,
            }
        }

        // Top up the buffer so removal-driven backfill has material.
        let page = {
            let mut state = self.state.write().await;
            if state.epoch != epoch || state.last_error.is_some() {
                None
            } else {
                let exhausted = state.phase == PipelinePhase::Exhausted;
                let buffered = state.buffer.len();
                state.scheduler.next_fetch(buffered, exhausted)
            }
        };
        if let Some(page) = page {
            self.fetch_page_into_buffer(page, epoch).await;
        }

        let state = self.state.read().await;
        if state.epoch == epoch {
            info!(
                bucketed = state.buckets.total_count(),
                buffered = state.buffer.len(),
                phase = ?state.phase,
                "Initial fill complete"
            );
        }
    }

    /// Fetch one page and apply the outcome to the session that issued
    /// it. An empty page flips the session to `Exhausted`; a fetch
    /// failure records the pipeline error and is not retried; the page
    /// index has already moved past it.
    async fn fetch_page_into_buffer(&self, page: u64, epoch: u64) {
        let outcome = self.source.fetch_page(page).await;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            warn!(page, "Dropping stale page fetch (pipeline was reset)");
            return;
        }

        match outcome {
            Ok(messages) if messages.is_empty() => {
                info!(page, "Source exhausted");
                state.phase = PipelinePhase::Exhausted;
                let _ = self.events.send(PipelineEvent::Exhausted);
            }
            Ok(messages) => {
                let count = messages.len();
                state.buffer.push(messages);
                if state.phase == PipelinePhase::Loading {
                    state.phase = PipelinePhase::Active;
                }
                debug!(page, count, buffered = state.buffer.len(), "Page buffered");
                let _ = self.events.send(PipelineEvent::PageFetched { page, count });
            }
            Err(e) => {
                let err = PipelineError::PageFetch(e.to_string());
                error!(page, error = %err, "Page fetch failed");
                state.last_error = Some(err.to_string());
                let _ = self.events.send(PipelineEvent::Error {
                    message: err.to_string(),
                });
            }
        }
    }

    /// Classify one in-flight message and append it to its bucket.
    ///
    /// The message is in neither the buffer nor a bucket while the call
    /// is in flight. A stale epoch drops it; a working set that filled
    /// up in the meantime re-buffers it at the head instead of losing
    /// it, carrying the resolved tier so the retry skips the agent.
    /// Automation fires only once the message actually lands in a
    /// bucket.
    async fn classify_and_bucket(&self, mut message: Message, epoch: u64) {
        let tier = match message.tier {
            Some(tier) => tier,
            None => {
                let _permit = match &self.classify_gate {
                    Some(gate) => Some(gate.acquire().await.expect("gate never closed")),
                    None => None,
                };
                self.dispatcher.classify(&message).await
            }
        };

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            warn!(id = %message.id, "Dropping stale classification (pipeline was reset)");
            return;
        }
        if state.buckets.total_count() >= self.capacity {
            debug!(id = %message.id, "Working set full, re-buffering message");
            message.tier = Some(tier);
            state.buffer.push_front(message);
            return;
        }

        debug_assert!(
            !state.buffer.contains(&message.id),
            "message {} is still buffered while being bucketed",
            message.id
        );
        let id = message.id.clone();
        state.buckets.append(tier, message);
        if tier == Tier::Important {
            self.dispatcher.trigger_automation(&id);
        }
        let _ = self.events.send(PipelineEvent::Classified { id, tier });
    }

    // ── Removal and backfill ────────────────────────────────────────

    /// Mark a bucketed message as read in the mail store, then remove
    /// it locally and backfill. No local mutation happens before the
    /// store confirms.
    pub async fn mark_read(&self, tier: Tier, id: &str) -> Result<()> {
        self.store
            .mark_read(id)
            .await
            .map_err(PipelineError::Removal)
            .map_err(crate::error::Error::Pipeline)?;
        self.remove_and_backfill(tier, id).await;
        Ok(())
    }

    /// Delete a bucketed message in the mail store, then remove it
    /// locally and backfill.
    pub async fn delete(&self, tier: Tier, id: &str) -> Result<()> {
        self.store
            .delete(id)
            .await
            .map_err(PipelineError::Removal)
            .map_err(crate::error::Error::Pipeline)?;
        self.remove_and_backfill(tier, id).await;
        Ok(())
    }

    /// Remove a message whose store-side action was confirmed, then run
    /// the refill policy: classify at most one buffered message, and
    /// fetch the next page if the buffer ran low.
    async fn remove_and_backfill(&self, tier: Tier, id: &str) {
        let epoch = {
            let mut state = self.state.write().await;
            match state.buckets.remove_by_id(tier, id) {
                Some(removed) => {
                    let _ = self.events.send(PipelineEvent::Removed {
                        id: removed.id,
                        tier,
                    });
                }
                None => {
                    // Already gone locally (e.g. a refresh raced the
                    // confirmation). The store action still succeeded.
                    debug!(id = %id, tier = %tier, "Removal target not present locally");
                    return;
                }
            }
            state.epoch
        };

        self.run_refill(epoch).await;
    }

    /// One refill round: capacity backfill (exactly one message), then
    /// the low-buffer check against the post-pop depth.
    async fn run_refill(&self, epoch: u64) {
        let message = {
            let mut state = self.state.write().await;
            if state.epoch != epoch {
                return;
            }
            if state
                .scheduler
                .should_backfill(state.buffer.len(), state.buckets.total_count())
            {
                state.buffer.pop_front()
            } else {
                None
            }
        };

        if let Some(message) = message {
            self.classify_and_bucket(message, epoch).await;
        }

        let page = {
            let mut state = self.state.write().await;
            if state.epoch != epoch {
                return;
            }
            let exhausted = state.phase == PipelinePhase::Exhausted;
            let buffered = state.buffer.len();
            state.scheduler.next_fetch(buffered, exhausted)
        };
        if let Some(page) = page {
            self.fetch_page_into_buffer(page, epoch).await;
        }
    }

    // ── On-demand operations ────────────────────────────────────────

    /// Summarize the given bucketed message. Failures are silently
    /// ignored (the summary stays absent and the call can be retried);
    /// returns the summary on success.
    pub async fn summarize(&self, tier: Tier, id: &str) -> Option<String> {
        let text = {
            let state = self.state.read().await;
            state
                .buckets
                .bucket(tier)
                .messages()
                .iter()
                .find(|m| m.id == id)
                .map(|m| m.agent_text().to_string())
        }?;

        match self.agent.summarize(&text).await {
            Ok(summary) => {
                let mut state = self.state.write().await;
                let stored = state.buckets.update_message(tier, id, |m| {
                    m.summary = Some(summary.clone());
                });
                stored.then_some(summary)
            }
            Err(e) => {
                debug!(id = %id, error = %e, "Summarize failed (summary stays absent)");
                None
            }
        }
    }

    /// Move a tier's navigation cursor. No-op at the boundaries.
    pub async fn navigate(&self, tier: Tier, direction: Direction) {
        let mut state = self.state.write().await;
        state.buckets.navigate(tier, direction);
    }

    // ── Observation ─────────────────────────────────────────────────

    pub async fn phase(&self) -> PipelinePhase {
        self.state.read().await.phase
    }

    /// Sum of all bucket lengths. Never exceeds the configured capacity.
    pub async fn total_count(&self) -> usize {
        self.state.read().await.buckets.total_count()
    }

    pub async fn buffer_len(&self) -> usize {
        self.state.read().await.buffer.len()
    }

    /// Per-tier bucket lengths, in display order.
    pub async fn tier_counts(&self) -> [(Tier, usize); 3] {
        let state = self.state.read().await;
        Tier::ALL.map(|tier| (tier, state.buckets.bucket(tier).len()))
    }

    /// Snapshot of one tier's messages in bucket order.
    pub async fn messages(&self, tier: Tier) -> Vec<Message> {
        self.state.read().await.buckets.bucket(tier).messages().to_vec()
    }

    /// Message under a tier's cursor, with the cursor position.
    pub async fn current(&self, tier: Tier) -> Option<(usize, Message)> {
        let state = self.state.read().await;
        let bucket = state.buckets.bucket(tier);
        bucket.current().cloned().map(|m| (bucket.cursor(), m))
    }

    /// Last pipeline-level error, if any. Cleared on refresh.
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }
}

//! Classification dispatcher — maps agent output to tiers, fail-open.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::TriageAgent;
use crate::mailstore::AutomationHook;
use crate::model::{Message, Tier};

/// Resolves a tier for one message via the external classifier.
///
/// Classification never blocks pipeline progress: any failure (network,
/// bad status, malformed body) and any unrecognized category both fall
/// open to `Tier::Other`.
pub struct ClassificationDispatcher {
    agent: Arc<dyn TriageAgent>,
    automation: Arc<dyn AutomationHook>,
}

impl ClassificationDispatcher {
    pub fn new(agent: Arc<dyn TriageAgent>, automation: Arc<dyn AutomationHook>) -> Self {
        Self { agent, automation }
    }

    /// Classify one message and return its tier. No side effects; the
    /// caller decides if and when automation fires.
    pub async fn classify(&self, message: &Message) -> Tier {
        match self.agent.classify(message.agent_text()).await {
            Ok(category) => {
                let tier = Tier::from_category(&category);
                debug!(id = %message.id, category = %category, tier = %tier, "Classified message");
                tier
            }
            Err(e) => {
                warn!(id = %message.id, error = %e, "Classification failed, defaulting to other");
                Tier::Other
            }
        }
    }

    /// Fire the workflow-automation endpoint for an important message
    /// that landed in its bucket. The task is detached, never awaited,
    /// and its errors are dropped at this boundary; it must not affect
    /// bucket placement or any other pipeline state.
    pub fn trigger_automation(&self, id: &str) {
        let automation = Arc::clone(&self.automation);
        let id = id.to_string();
        tokio::spawn(async move {
            if let Err(e) = automation.trigger(&id).await {
                debug!(id = %id, error = %e, "Automation trigger failed (ignored)");
            }
        });
    }
}

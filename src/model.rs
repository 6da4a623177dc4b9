//! Core data types: messages, tiers, navigation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Tier ────────────────────────────────────────────────────────────

/// Priority tier a message is sorted into. Assigned at most once per
/// message, never re-classified after bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Important,
    Moderate,
    Other,
}

impl Tier {
    /// All tiers, in display order.
    pub const ALL: [Tier; 3] = [Tier::Important, Tier::Moderate, Tier::Other];

    /// Short label for logging and wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Important => "important",
            Self::Moderate => "moderate",
            Self::Other => "other",
        }
    }

    /// Map a classifier category string to a tier.
    ///
    /// Fail-open: matching is case-insensitive, and anything outside the
    /// closed set ("Spam", empty string, garbage) lands in `Other`.
    pub fn from_category(category: &str) -> Self {
        match category.trim().to_lowercase().as_str() {
            "important" => Self::Important,
            "moderate" => Self::Moderate,
            _ => Self::Other,
        }
    }

    /// Strict parse for user input (tier names typed at the CLI).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "important" => Some(Self::Important),
            "moderate" => Some(Self::Moderate),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Message ─────────────────────────────────────────────────────────

/// A mail message as delivered by the mail-store API.
///
/// `id` is the unique, stable key across every collection in the
/// pipeline. `tier` and `summary` start absent and are filled in by the
/// dispatcher and the summarize call respectively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique, stable identifier.
    pub id: String,
    /// Subject line (may be empty).
    #[serde(default)]
    pub subject: String,
    /// Sender address or display string.
    #[serde(default)]
    pub sender: String,
    /// Short preview of the body.
    #[serde(default)]
    pub snippet: String,
    /// Full plain-text body, when the store could extract one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Raw received timestamp as emitted by the store (RFC 2822-ish,
    /// not guaranteed parseable).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<String>,
    /// Assigned tier, set exactly once by the dispatcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    /// On-demand summary text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Read flag as reported by the store. A message that is marked
    /// read through the pipeline leaves the working set instead.
    #[serde(default)]
    pub read: bool,
}

impl Message {
    /// Text used for classification and summarization: the full body
    /// when present, the snippet otherwise.
    pub fn agent_text(&self) -> &str {
        self.body.as_deref().unwrap_or(&self.snippet)
    }

    /// Lenient parse of `received_at`. The store forwards whatever the
    /// upstream Date header said, so failures just yield `None`.
    pub fn received_datetime(&self) -> Option<DateTime<Utc>> {
        let raw = self.received_at.as_deref()?;
        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ── Navigation ──────────────────────────────────────────────────────

/// Cursor movement within a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Decrement, floored at 0.
    Prev,
    /// Increment, capped at the last index.
    Next,
}

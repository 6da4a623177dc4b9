//! Bucket store — three ordered per-tier collections with navigation cursors.

use tracing::debug;

use crate::model::{Direction, Message, Tier};

/// One tier's ordered messages plus its navigation cursor.
///
/// Order is classification-completion order, not source order. The
/// cursor always stays within `[0, len-1]`, and is 0 when empty.
#[derive(Debug, Default)]
pub struct Bucket {
    messages: Vec<Message>,
    cursor: usize,
}

impl Bucket {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Message currently under the cursor.
    pub fn current(&self) -> Option<&Message> {
        self.messages.get(self.cursor)
    }

    fn clamp_cursor(&mut self) {
        if self.messages.is_empty() {
            self.cursor = 0;
        } else if self.cursor >= self.messages.len() {
            self.cursor = self.messages.len() - 1;
        }
    }
}

/// The three tier buckets, capped in aggregate at the working-set size.
///
/// `append` and `remove_by_id` are the only mutating primitives besides
/// navigation. The capacity cap itself is the scheduler's business;
/// the store only reports `total_count`.
#[derive(Debug, Default)]
pub struct BucketStore {
    important: Bucket,
    moderate: Bucket,
    other: Bucket,
}

impl BucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket(&self, tier: Tier) -> &Bucket {
        match tier {
            Tier::Important => &self.important,
            Tier::Moderate => &self.moderate,
            Tier::Other => &self.other,
        }
    }

    fn bucket_mut(&mut self, tier: Tier) -> &mut Bucket {
        match tier {
            Tier::Important => &mut self.important,
            Tier::Moderate => &mut self.moderate,
            Tier::Other => &mut self.other,
        }
    }

    /// Append a classified message to the tail of its tier bucket.
    ///
    /// The id must not already exist in any bucket: duplicate insertion
    /// is a programming error upstream (the pipeline moves a message out
    /// of the buffer before classifying it), not a recoverable state.
    pub fn append(&mut self, tier: Tier, mut message: Message) {
        assert!(
            self.find_tier(&message.id).is_none(),
            "duplicate bucket insert for message {}",
            message.id
        );
        message.tier = Some(tier);
        debug!(id = %message.id, tier = %tier, "Bucketed message");
        self.bucket_mut(tier).messages.push(message);
    }

    /// Remove a message by id from the given tier, re-clamping the
    /// cursor afterwards. Returns the removed message if it was present.
    pub fn remove_by_id(&mut self, tier: Tier, id: &str) -> Option<Message> {
        let bucket = self.bucket_mut(tier);
        let idx = bucket.messages.iter().position(|m| m.id == id)?;
        let removed = bucket.messages.remove(idx);
        bucket.clamp_cursor();
        debug!(id = %id, tier = %tier, remaining = bucket.messages.len(), "Removed message");
        Some(removed)
    }

    /// Move a tier's cursor. No-op at either boundary, no wraparound.
    pub fn navigate(&mut self, tier: Tier, direction: Direction) {
        let bucket = self.bucket_mut(tier);
        match direction {
            Direction::Prev => {
                bucket.cursor = bucket.cursor.saturating_sub(1);
            }
            Direction::Next => {
                if bucket.cursor + 1 < bucket.messages.len() {
                    bucket.cursor += 1;
                }
            }
        }
    }

    /// Sum of all bucket lengths, checked against the working-set cap.
    pub fn total_count(&self) -> usize {
        self.important.len() + self.moderate.len() + self.other.len()
    }

    /// Which tier holds this id, if any.
    pub fn find_tier(&self, id: &str) -> Option<Tier> {
        Tier::ALL
            .into_iter()
            .find(|&tier| self.bucket(tier).messages.iter().any(|m| m.id == id))
    }

    /// Apply an edit to a bucketed message in place (summary, read flag).
    /// The tier assignment itself is never changed through this.
    pub fn update_message(&mut self, tier: Tier, id: &str, f: impl FnOnce(&mut Message)) -> bool {
        let bucket = self.bucket_mut(tier);
        if let Some(message) = bucket.messages.iter_mut().find(|m| m.id == id) {
            f(message);
            true
        } else {
            false
        }
    }

    /// Drop everything. Part of a full pipeline reset.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str) -> Message {
        Message {
            id: id.into(),
            subject: String::new(),
            sender: String::new(),
            snippet: String::new(),
            body: None,
            received_at: None,
            tier: None,
            summary: None,
            read: false,
        }
    }

    #[test]
    fn append_sets_tier_and_orders_by_insertion() {
        let mut store = BucketStore::new();
        store.append(Tier::Important, message("a"));
        store.append(Tier::Important, message("b"));

        let bucket = store.bucket(Tier::Important);
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket.messages()[0].id, "a");
        assert_eq!(bucket.messages()[1].id, "b");
        assert_eq!(bucket.messages()[0].tier, Some(Tier::Important));
    }

    #[test]
    #[should_panic(expected = "duplicate bucket insert")]
    fn duplicate_append_panics() {
        let mut store = BucketStore::new();
        store.append(Tier::Important, message("a"));
        store.append(Tier::Other, message("a"));
    }

    #[test]
    fn total_count_spans_tiers() {
        let mut store = BucketStore::new();
        store.append(Tier::Important, message("a"));
        store.append(Tier::Moderate, message("b"));
        store.append(Tier::Other, message("c"));
        assert_eq!(store.total_count(), 3);
    }

    #[test]
    fn remove_reclamps_cursor_to_new_end() {
        let mut store = BucketStore::new();
        for id in ["a", "b", "c"] {
            store.append(Tier::Other, message(id));
        }
        store.navigate(Tier::Other, Direction::Next);
        store.navigate(Tier::Other, Direction::Next);
        assert_eq!(store.bucket(Tier::Other).cursor(), 2);

        store.remove_by_id(Tier::Other, "c");
        assert_eq!(store.bucket(Tier::Other).cursor(), 1);

        store.remove_by_id(Tier::Other, "b");
        store.remove_by_id(Tier::Other, "a");
        assert_eq!(store.bucket(Tier::Other).cursor(), 0);
        assert!(store.bucket(Tier::Other).is_empty());
    }

    #[test]
    fn remove_missing_id_is_none() {
        let mut store = BucketStore::new();
        store.append(Tier::Other, message("a"));
        assert!(store.remove_by_id(Tier::Other, "zzz").is_none());
        assert!(store.remove_by_id(Tier::Important, "a").is_none());
        assert_eq!(store.total_count(), 1);
    }

    #[test]
    fn navigate_no_wraparound() {
        let mut store = BucketStore::new();
        store.append(Tier::Moderate, message("a"));
        store.append(Tier::Moderate, message("b"));

        // Floor at 0
        store.navigate(Tier::Moderate, Direction::Prev);
        assert_eq!(store.bucket(Tier::Moderate).cursor(), 0);

        // Ceiling at len-1
        store.navigate(Tier::Moderate, Direction::Next);
        store.navigate(Tier::Moderate, Direction::Next);
        store.navigate(Tier::Moderate, Direction::Next);
        assert_eq!(store.bucket(Tier::Moderate).cursor(), 1);
    }

    #[test]
    fn navigate_empty_bucket_stays_zero() {
        let mut store = BucketStore::new();
        store.navigate(Tier::Important, Direction::Next);
        store.navigate(Tier::Important, Direction::Prev);
        assert_eq!(store.bucket(Tier::Important).cursor(), 0);
    }

    #[test]
    fn find_tier_locates_message() {
        let mut store = BucketStore::new();
        store.append(Tier::Moderate, message("m"));
        assert_eq!(store.find_tier("m"), Some(Tier::Moderate));
        assert_eq!(store.find_tier("x"), None);
    }

    #[test]
    fn update_message_edits_in_place() {
        let mut store = BucketStore::new();
        store.append(Tier::Other, message("a"));
        assert!(store.update_message(Tier::Other, "a", |m| {
            m.summary = Some("short".into());
        }));
        assert_eq!(
            store.bucket(Tier::Other).messages()[0].summary.as_deref(),
            Some("short")
        );
        assert!(!store.update_message(Tier::Other, "nope", |_| {}));
    }

    #[test]
    fn current_follows_cursor() {
        let mut store = BucketStore::new();
        store.append(Tier::Important, message("a"));
        store.append(Tier::Important, message("b"));
        assert_eq!(store.bucket(Tier::Important).current().unwrap().id, "a");
        store.navigate(Tier::Important, Direction::Next);
        assert_eq!(store.bucket(Tier::Important).current().unwrap().id, "b");
    }
}

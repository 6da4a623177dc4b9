//! Buffer queue — FIFO holding area for retrieved-but-unclassified messages.

use std::collections::VecDeque;

use crate::model::Message;

/// FIFO queue between page retrieval and classification. Head is
/// consumed first; new pages append to the tail.
#[derive(Debug, Default)]
pub struct BufferQueue {
    messages: VecDeque<Message>,
}

impl BufferQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page of messages to the tail.
    pub fn push(&mut self, messages: Vec<Message>) {
        self.messages.extend(messages);
    }

    /// Remove and return the head message, if any.
    pub fn pop_front(&mut self) -> Option<Message> {
        self.messages.pop_front()
    }

    /// Return an in-flight message to the head. Used when a popped
    /// message cannot be bucketed because capacity filled up while its
    /// classification was in flight.
    pub fn push_front(&mut self, message: Message) {
        self.messages.push_front(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether a message id is currently buffered. Used to uphold the
    /// id-appears-in-at-most-one-collection invariant.
    pub fn contains(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    /// Drop everything. Part of a full pipeline reset.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

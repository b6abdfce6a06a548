//! Append-only message log

use super::types::{ContextTag, Message, Role};
use serde::Serialize;

/// Ordered record of the messages exchanged in one session.
///
/// Insertion order is display order. Sequence numbers start at 1 and
/// strictly increase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message with the next sequence number. Content checks are
    /// the store's job.
    pub(super) fn push(&mut self, role: Role, content: String, context: ContextTag) -> &Message {
        let sequence = self.next_sequence();
        self.messages.push(Message::new(role, content, sequence, context));
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Sequence of the most recent user message
    pub fn last_user_sequence(&self) -> Option<u64> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role() == Role::User)
            .map(Message::sequence)
    }

    fn next_sequence(&self) -> u64 {
        self.messages.last().map_or(1, |m| m.sequence() + 1)
    }
}

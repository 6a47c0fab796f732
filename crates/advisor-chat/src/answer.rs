//! Assistant answer accumulation

use crate::conversation::{Conversation, Message};

/// Running text of the in-progress assistant message.
///
/// Fragments are appended to an internal buffer; consumers always receive the
/// whole buffer and replace the stored content with it.
#[derive(Debug, Clone)]
pub struct AnswerAccumulator {
    message_id: String,
    buffer: String,
    fragments: usize,
}

impl AnswerAccumulator {
    pub fn new() -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            buffer: String::new(),
            fragments: 0,
        }
    }

    /// Append a fragment and return the full text so far
    pub fn push(&mut self, fragment: &str) -> &str {
        self.buffer.push_str(fragment);
        self.fragments += 1;
        &self.buffer
    }

    /// Id the assistant message is created with
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn content(&self) -> &str {
        &self.buffer
    }

    /// Whether any fragment has arrived
    pub fn is_started(&self) -> bool {
        self.fragments > 0
    }
}

impl Default for AnswerAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `content` into the assistant message `message_id`.
///
/// The message is appended on first sight and replaced by id afterwards, so it
/// stays the last element of the sequence while it streams.
pub fn upsert_answer(conversation: &Conversation, message_id: &str, content: &str) -> Conversation {
    if conversation.message(message_id).is_some() {
        conversation.map_message(message_id, |m| m.with_content(content))
    } else {
        conversation.with_message(Message::assistant_with_id(message_id, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    #[test]
    fn test_growth_is_monotonic() {
        let mut acc = AnswerAccumulator::new();
        assert!(!acc.is_started());

        let mut seen = Vec::new();
        for fragment in ["Hello, ", "world", "!"] {
            seen.push(acc.push(fragment).to_string());
        }
        assert_eq!(seen, ["Hello, ", "Hello, world", "Hello, world!"]);
        assert_eq!(acc.content(), "Hello, world!");
        assert!(acc.is_started());
    }

    #[test]
    fn test_upsert_creates_then_replaces() {
        let conversation = Conversation::start(Message::user("Hello"));
        let mut acc = AnswerAccumulator::new();

        let content = acc.push("Hi ").to_string();
        let first = upsert_answer(&conversation, acc.message_id(), &content);
        assert_eq!(first.messages.len(), 2);
        assert_eq!(first.messages[1].role, Role::Assistant);
        assert_eq!(first.messages[1].id, acc.message_id());

        let content = acc.push("there").to_string();
        let second = upsert_answer(&first, acc.message_id(), &content);
        assert_eq!(second.messages.len(), 2);
        assert_eq!(second.messages[1].content, "Hi there");
    }

    #[test]
    fn test_replaying_the_same_update_does_not_duplicate() {
        let conversation = Conversation::start(Message::user("Hello"));
        let mut acc = AnswerAccumulator::new();
        let content = acc.push("Hi").to_string();

        let once = upsert_answer(&conversation, acc.message_id(), &content);
        let twice = upsert_answer(&once, acc.message_id(), &content);
        assert_eq!(once, twice);
    }
}

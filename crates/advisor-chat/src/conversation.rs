//! Conversation data model
//!
//! Conversations and messages are treated as values: every change produces a new
//! value and the list is swapped wholesale, so a reader holding a snapshot never
//! observes a half-applied update.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum characters taken from the first message for a new conversation title
pub const TITLE_MAX_CHARS: usize = 30;

/// Highest star rating a message can carry
pub const MAX_RATING: u8 = 5;

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Default title for a conversation started with `text`
pub fn default_title(text: &str) -> String {
    text.chars().take(TITLE_MAX_CHARS).collect()
}

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Epoch milliseconds
    pub created_at: i64,
    /// 0 means unrated
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: now_millis(),
            rating: 0,
            comment: String::new(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message with a preassigned id
    pub fn assistant_with_id(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new(Role::Assistant, content)
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..self.clone()
        }
    }

    pub fn with_rating(&self, rating: u8) -> Self {
        Self {
            rating,
            ..self.clone()
        }
    }

    pub fn with_comment(&self, comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            ..self.clone()
        }
    }
}

/// A titled, ordered sequence of messages owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Epoch milliseconds
    pub created_at: i64,
}

impl Conversation {
    /// Start a conversation from its first user message
    pub fn start(first: Message) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: default_title(&first.content),
            messages: vec![first],
            created_at: now_millis(),
        }
    }

    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    pub fn with_messages(&self, messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..self.clone()
        }
    }

    /// Append a message
    pub fn with_message(&self, message: Message) -> Self {
        let mut messages = self.messages.clone();
        messages.push(message);
        self.with_messages(messages)
    }

    /// Replace the message with `id` by `f(message)`; unchanged if absent
    pub fn map_message(&self, id: &str, f: impl FnOnce(&Message) -> Message) -> Self {
        let mut messages = self.messages.clone();
        if let Some(message) = messages.iter_mut().find(|m| m.id == id) {
            *message = f(message);
        }
        self.with_messages(messages)
    }

    /// Remove the message with `id`
    pub fn without_message(&self, id: &str) -> Self {
        let messages = self
            .messages
            .iter()
            .filter(|m| m.id != id)
            .cloned()
            .collect();
        self.with_messages(messages)
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Immutable, cheaply cloneable conversation list (newest first)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationList {
    items: Arc<Vec<Conversation>>,
}

impl ConversationList {
    pub fn new(items: Vec<Conversation>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }

    pub fn as_slice(&self) -> &[Conversation] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conversation> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.items.iter().find(|c| c.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// New list with `conversation` at the head
    pub fn prepend(&self, conversation: Conversation) -> Self {
        self.insert_at(0, conversation)
    }

    /// New list with `conversation` inserted at `index` (clamped to the end)
    pub fn insert_at(&self, index: usize, conversation: Conversation) -> Self {
        let mut items = self.items.as_ref().clone();
        items.insert(index.min(items.len()), conversation);
        Self::new(items)
    }

    /// New list without `id`, plus the removed entry and its former index
    pub fn remove(&self, id: &str) -> (Self, Option<(usize, Conversation)>) {
        match self.position(id) {
            Some(index) => {
                let mut items = self.items.as_ref().clone();
                let removed = items.remove(index);
                (Self::new(items), Some((index, removed)))
            }
            None => (self.clone(), None),
        }
    }

    /// New list with the conversation `id` replaced by `f(conversation)`
    pub fn map(&self, id: &str, f: impl FnOnce(&Conversation) -> Conversation) -> Self {
        match self.position(id) {
            Some(index) => {
                let mut items = self.items.as_ref().clone();
                items[index] = f(&items[index]);
                Self::new(items)
            }
            None => self.clone(),
        }
    }

    /// Conversations whose title contains `term`, ignoring case
    pub fn search(&self, term: &str) -> Vec<Conversation> {
        let term = term.to_lowercase();
        self.items
            .iter()
            .filter(|c| c.title.to_lowercase().contains(&term))
            .cloned()
            .collect()
    }
}

impl From<Vec<Conversation>> for ConversationList {
    fn from(items: Vec<Conversation>) -> Self {
        Self::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(id: &str, title: &str) -> Conversation {
        Conversation {
            id: id.into(),
            title: title.into(),
            messages: vec![],
            created_at: 0,
        }
    }

    #[test]
    fn test_default_title_truncates_by_chars() {
        assert_eq!(default_title("short"), "short");
        let long = "What is the process for registering a private limited company?";
        assert_eq!(default_title(long).chars().count(), TITLE_MAX_CHARS);
        assert_eq!(default_title(long), "What is the process for regist");

        let nepali = "नेपालको संविधान अनुसार मौलिक हकहरू के के हुन्?";
        assert_eq!(default_title(nepali).chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn test_start_uses_first_message() {
        let first = Message::user("Hello");
        let c = Conversation::start(first.clone());
        assert_eq!(c.title, "Hello");
        assert_eq!(c.messages, vec![first]);
    }

    #[test]
    fn test_map_message_replaces_by_id() {
        let a = Message::user("a");
        let b = Message::assistant("b");
        let c = conversation("c1", "t").with_message(a.clone()).with_message(b.clone());

        let updated = c.map_message(&b.id, |m| m.with_content("bb"));
        assert_eq!(updated.messages[0], a);
        assert_eq!(updated.messages[1].content, "bb");
        assert_eq!(updated.messages[1].id, b.id);
        // original untouched
        assert_eq!(c.messages[1].content, "b");
    }

    #[test]
    fn test_without_message() {
        let a = Message::user("a");
        let c = conversation("c1", "t").with_message(a.clone());
        assert!(c.without_message(&a.id).messages.is_empty());
        assert_eq!(c.without_message("missing").messages.len(), 1);
    }

    #[test]
    fn test_list_remove_and_reinsert_restores_order() {
        let list = ConversationList::new(vec![
            conversation("a", "A"),
            conversation("b", "B"),
            conversation("c", "C"),
        ]);
        let (without, removed) = list.remove("b");
        assert_eq!(without.len(), 2);
        let (index, removed) = removed.unwrap();
        assert_eq!(index, 1);

        let restored = without.insert_at(index, removed);
        assert_eq!(restored, list);
    }

    #[test]
    fn test_list_map_is_functional() {
        let list = ConversationList::new(vec![conversation("a", "A")]);
        let renamed = list.map("a", |c| c.with_title("Renamed"));
        assert_eq!(list.get("a").unwrap().title, "A");
        assert_eq!(renamed.get("a").unwrap().title, "Renamed");
        assert_eq!(list.map("zzz", |c| c.with_title("x")), list);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let list = ConversationList::new(vec![
            conversation("a", "Rental agreement"),
            conversation("b", "Company registration"),
            conversation("c", "Labor Act rights"),
        ]);
        let found = list.search("AGREE");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
        assert_eq!(list.search("").len(), 3);
    }

    #[test]
    fn test_message_serde_defaults_and_camel_case() {
        let json = r#"{"id":"m1","role":"assistant","content":"hi","createdAt":1700000000000}"#;
        let m: Message = serde_json::from_str(json).unwrap();
        assert_eq!(m.rating, 0);
        assert_eq!(m.comment, "");
        assert_eq!(m.role, Role::Assistant);

        let value = serde_json::to_value(&m).unwrap();
        assert_eq!(value["createdAt"], 1700000000000i64);
    }
}

//! Conversation persistence collaborator

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

use crate::{
    conversation::{Conversation, Message},
    error::{Error, Result},
};

/// Partial update of a stored conversation; `None` fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationUpdate {
    pub title: Option<String>,
    pub messages: Option<Vec<Message>>,
}

impl ConversationUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            messages: None,
        }
    }

    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            title: None,
            messages: Some(messages),
        }
    }

    /// Apply to a stored record
    pub fn apply(self, conversation: &mut Conversation) {
        if let Some(title) = self.title {
            conversation.title = title;
        }
        if let Some(messages) = self.messages {
            conversation.messages = messages;
        }
    }
}

/// Per-user conversation collection
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// All conversations of a user, newest first
    async fn list(&self, user_id: &str) -> Result<Vec<Conversation>>;

    /// Store a new conversation under its own id
    async fn create(&self, user_id: &str, conversation: &Conversation) -> Result<()>;

    async fn update(&self, user_id: &str, id: &str, update: ConversationUpdate) -> Result<()>;

    async fn delete(&self, user_id: &str, id: &str) -> Result<()>;
}

/// A store bound to one user, exposing the adapter operations the advisor uses
#[derive(Clone)]
pub struct ScopedStore {
    store: Arc<dyn ConversationStore>,
    user_id: String,
}

impl ScopedStore {
    pub fn new(store: Arc<dyn ConversationStore>, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn list(&self) -> Result<Vec<Conversation>> {
        self.store.list(&self.user_id).await
    }

    pub async fn create(&self, conversation: &Conversation) -> Result<()> {
        self.store.create(&self.user_id, conversation).await
    }

    pub async fn rename(&self, id: &str, title: &str) -> Result<()> {
        self.store
            .update(&self.user_id, id, ConversationUpdate::title(title))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(&self.user_id, id).await
    }

    /// Persist the final message state of a conversation
    pub async fn save(&self, id: &str, messages: Vec<Message>) -> Result<()> {
        self.store
            .update(&self.user_id, id, ConversationUpdate::messages(messages))
            .await
    }
}

/// In-process store, used by tests and the offline mode
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, Vec<Conversation>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct read of a stored record
    pub fn get(&self, user_id: &str, id: &str) -> Option<Conversation> {
        self.users
            .lock()
            .get(user_id)
            .and_then(|items| items.iter().find(|c| c.id == id).cloned())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let mut items = self.users.lock().get(user_id).cloned().unwrap_or_default();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn create(&self, user_id: &str, conversation: &Conversation) -> Result<()> {
        let mut users = self.users.lock();
        let items = users.entry(user_id.to_string()).or_default();
        items.retain(|c| c.id != conversation.id);
        items.push(conversation.clone());
        Ok(())
    }

    async fn update(&self, user_id: &str, id: &str, update: ConversationUpdate) -> Result<()> {
        let mut users = self.users.lock();
        let conversation = users
            .get_mut(user_id)
            .and_then(|items| items.iter_mut().find(|c| c.id == id))
            .ok_or_else(|| Error::ConversationNotFound(id.to_string()))?;
        update.apply(conversation);
        Ok(())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        if let Some(items) = self.users.lock().get_mut(user_id) {
            items.retain(|c| c.id != id);
        }
        Ok(())
    }
}

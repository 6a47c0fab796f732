//! File-backed conversation store
//!
//! Layout under the data directory:
//!
//! ```text
//! users/<uid>/conversations/<id>.json   one pretty JSON document per conversation
//! users/<uid>/active                    id of the last active conversation
//! ```

use advisor_chat::{
    Conversation, ConversationStore, ConversationUpdate,
    error::{Error, Result},
};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.root.join("users").join(sanitize(user_id))
    }

    fn conversations_dir(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("conversations")
    }

    fn conversation_path(&self, user_id: &str, id: &str) -> PathBuf {
        self.conversations_dir(user_id)
            .join(format!("{}.json", sanitize(id)))
    }

    async fn read(&self, path: &Path) -> Result<Conversation> {
        let content = fs::read_to_string(path).await.map_err(Error::store)?;
        serde_json::from_str(&content).map_err(Error::store)
    }

    async fn write(&self, path: &Path, conversation: &Conversation) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await.map_err(Error::store)?;
        }
        let content = serde_json::to_string_pretty(conversation).map_err(Error::store)?;
        fs::write(path, content).await.map_err(Error::store)
    }

    /// Id of the conversation that was active when the user last quit
    pub async fn last_active(&self, user_id: &str) -> Option<String> {
        let path = self.user_dir(user_id).join("active");
        let id = fs::read_to_string(path).await.ok()?;
        let id = id.trim();
        (!id.is_empty()).then(|| id.to_string())
    }

    /// Remember (or with `None`, forget) the active conversation
    pub async fn set_last_active(&self, user_id: &str, id: Option<&str>) -> std::io::Result<()> {
        let dir = self.user_dir(user_id);
        let path = dir.join("active");
        match id {
            Some(id) => {
                fs::create_dir_all(&dir).await?;
                fs::write(path, id).await
            }
            None => match fs::remove_file(path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        }
    }
}

/// Keep ids usable as single path components
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl ConversationStore for FileStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let dir = self.conversations_dir(user_id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::store(e)),
        };

        let mut conversations = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(Error::store)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read(&path).await {
                Ok(conversation) => conversations.push(conversation),
                Err(e) => warn!(path = %path.display(), "Skipping unreadable conversation: {}", e),
            }
        }

        conversations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(conversations)
    }

    async fn create(&self, user_id: &str, conversation: &Conversation) -> Result<()> {
        let path = self.conversation_path(user_id, &conversation.id);
        self.write(&path, conversation).await
    }

    async fn update(&self, user_id: &str, id: &str, update: ConversationUpdate) -> Result<()> {
        let path = self.conversation_path(user_id, id);
        if !fs::try_exists(&path).await.map_err(Error::store)? {
            return Err(Error::ConversationNotFound(id.to_string()));
        }
        let mut conversation = self.read(&path).await?;
        update.apply(&mut conversation);
        self.write(&path, &conversation).await
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        let path = self.conversation_path(user_id, id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::ConversationNotFound(id.to_string()))
            }
            Err(e) => Err(Error::store(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_chat::Message;

    fn conversation(id: &str, title: &str, created_at: i64) -> Conversation {
        Conversation {
            id: id.into(),
            title: title.into(),
            messages: vec![Message::user(title)],
            created_at,
        }
    }

    #[tokio::test]
    async fn test_list_empty_for_new_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.list("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.create("u1", &conversation("a", "Older", 1)).await.unwrap();
        store.create("u1", &conversation("b", "Newer", 2)).await.unwrap();
        store.create("u2", &conversation("c", "Other user", 3)).await.unwrap();

        let listed = store.list("u1").await.unwrap();
        let ids: Vec<_> = listed.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(listed[0].messages[0].content, "Newer");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.create("u1", &conversation("a", "Title", 1)).await.unwrap();

        store
            .update("u1", "a", ConversationUpdate::title("Renamed"))
            .await
            .unwrap();
        let answer = Message::assistant("Answer").with_rating(4);
        store
            .update(
                "u1",
                "a",
                ConversationUpdate::messages(vec![Message::user("Q"), answer]),
            )
            .await
            .unwrap();

        let listed = store.list("u1").await.unwrap();
        let stored = &listed[0];
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.messages[1].rating, 4);

        store.delete("u1", "a").await.unwrap();
        assert!(store.list("u1").await.unwrap().is_empty());
        assert!(matches!(
            store.delete("u1", "a").await,
            Err(Error::ConversationNotFound(_))
        ));
        assert!(matches!(
            store.update("u1", "a", ConversationUpdate::title("x")).await,
            Err(Error::ConversationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_documents_without_feedback_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let path = store.conversation_path("u1", "legacy");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{
                "id": "legacy",
                "title": "Old chat",
                "createdAt": 5,
                "messages": [
                    {"id": "m1", "role": "user", "content": "Hi", "createdAt": 5},
                    {"id": "m2", "role": "assistant", "content": "Hello", "createdAt": 6}
                ]
            }"#,
        )
        .unwrap();
        std::fs::write(path.with_file_name("junk.json"), "not json").unwrap();

        let listed = store.list("u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].messages[1].rating, 0);
        assert_eq!(listed[0].messages[1].comment, "");
    }

    #[tokio::test]
    async fn test_last_active_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.last_active("u1").await, None);

        store.set_last_active("u1", Some("abc")).await.unwrap();
        assert_eq!(store.last_active("u1").await.as_deref(), Some("abc"));

        store.set_last_active("u1", None).await.unwrap();
        assert_eq!(store.last_active("u1").await, None);
        // forgetting twice is fine
        store.set_last_active("u1", None).await.unwrap();
    }

    #[test]
    fn test_sanitize_ids() {
        assert_eq!(sanitize("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize("a1-b_2"), "a1-b_2");
    }
}

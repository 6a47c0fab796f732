//! Authentication collaborator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Error, Result};

/// A signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    /// Name shown to the user: display name, else email, else uid
    pub fn label(&self) -> &str {
        if !self.display_name.is_empty() {
            &self.display_name
        } else {
            self.email.as_deref().unwrap_or(&self.uid)
        }
    }
}

/// Sign-in details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub display_name: String,
    pub email: Option<String>,
}

impl Credentials {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Stable account id: the same email (or name when no email) always maps
    /// to the same uid, so history survives signing out and back in.
    pub fn user_id(&self) -> String {
        let key = match &self.email {
            Some(email) => email.trim().to_lowercase(),
            None => self.display_name.trim().to_lowercase(),
        };
        uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
    }

    /// Validate and turn into a user record
    pub fn into_user(self) -> Result<User> {
        let display_name = self.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(Error::auth("a display name is required"));
        }
        let email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(Error::auth(format!("invalid email '{}'", email)));
            }
        }
        let uid = Credentials {
            display_name: display_name.clone(),
            email: email.clone(),
        }
        .user_id();
        Ok(User {
            uid,
            display_name,
            email,
        })
    }
}

/// Session source: current user, sign-in/out, change notification
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<User>;

    /// Whether the provider has what it needs to sign anyone in
    fn is_configured(&self) -> bool;

    async fn sign_in(&self, credentials: Credentials) -> Result<User>;

    async fn sign_out(&self) -> Result<()>;

    /// Receiver that changes on every sign-in and sign-out
    fn subscribe(&self) -> watch::Receiver<Option<User>>;
}

/// In-memory session
#[derive(Debug)]
pub struct StaticAuth {
    tx: watch::Sender<Option<User>>,
}

impl StaticAuth {
    pub fn signed_out() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn signed_in(user: User) -> Self {
        let (tx, _) = watch::channel(Some(user));
        Self { tx }
    }
}

impl Default for StaticAuth {
    fn default() -> Self {
        Self::signed_out()
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    fn current_user(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<User> {
        let user = credentials.into_user()?;
        tracing::info!(uid = %user.uid, "signed in");
        self.tx.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.tx.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }
}

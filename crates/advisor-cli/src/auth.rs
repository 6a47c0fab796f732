//! Local profile sign-in
//!
//! The signed-in user is kept in ~/.config/legal-advisor/profile.json with
//! restricted permissions (0o600). Signing out removes the file.

use advisor_chat::{
    AuthProvider, Credentials, User,
    error::{Error, Result},
};
use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub struct ProfileAuth {
    path: PathBuf,
    tx: watch::Sender<Option<User>>,
}

impl ProfileAuth {
    /// Open the profile at `path`, signed in if it holds a valid user
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let user = load_profile(&path);
        let (tx, _) = watch::channel(user);
        Self { path, tx }
    }
}

fn load_profile(path: &Path) -> Option<User> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!(path = %path.display(), "Ignoring unreadable profile: {}", e);
            None
        }
    }
}

fn save_profile(path: &Path, user: &User) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            #[cfg(unix)]
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
        }
    }

    let content = serde_json::to_string_pretty(user)?;
    fs::write(path, content)?;

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}

#[async_trait]
impl AuthProvider for ProfileAuth {
    fn current_user(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    fn is_configured(&self) -> bool {
        self.path.parent().is_some()
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<User> {
        let user = credentials.into_user()?;
        save_profile(&self.path, &user).map_err(Error::auth)?;
        tracing::info!(uid = %user.uid, "signed in");
        self.tx.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(Error::auth(e)),
            _ => {}
        }
        self.tx.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }
}

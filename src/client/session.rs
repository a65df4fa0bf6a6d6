use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

/// Client-held session. `authenticated` is derived purely from token
/// presence; expiry is discovered reactively through a rejected API call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Durable token storage scoped to the application. Mirrors what a browser
/// origin-scoped store provides: survives restarts, holds one token.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    async fn load(&self) -> anyhow::Result<Option<String>>;
    async fn save(&self, token: &str) -> anyhow::Result<()>;
    async fn clear(&self) -> anyhow::Result<()>;
}

/// Token persisted as a single file under the app's data directory.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn load(&self) -> anyhow::Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => {
                let token = raw.trim().to_string();
                Ok((!token.is_empty()).then_some(token))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("read token file"),
        }
    }

    async fn save(&self, token: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
        tokio::fs::write(&self.path, token)
            .await
            .context("write token file")
    }

    async fn clear(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("remove token file"),
        }
    }
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStorage {
    inner: Mutex<Option<String>>,
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn load(&self) -> anyhow::Result<Option<String>> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, token: &str) -> anyhow::Result<()> {
        *self.inner.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        *self.inner.lock().await = None;
        Ok(())
    }
}

/// The single session object of the client. Every consumer — API layer,
/// navigation guard, render gates — subscribes to the one watch channel;
/// nothing reads the backing storage ad hoc.
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    tx: watch::Sender<Session>,
}

impl SessionStore {
    /// Open the store, seeding the channel from whatever token survived the
    /// last run.
    pub async fn open(storage: Arc<dyn TokenStorage>) -> anyhow::Result<Self> {
        let token = storage.load().await?;
        let (tx, _) = watch::channel(Session { token });
        Ok(Self { storage, tx })
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Login success: persist first, then broadcast.
    pub async fn set_token(&self, token: &str) -> anyhow::Result<()> {
        self.storage.save(token).await?;
        self.tx.send_replace(Session {
            token: Some(token.to_string()),
        });
        debug!("session token set");
        Ok(())
    }

    /// Logout: durable state is gone before any subscriber reacts.
    pub async fn clear(&self) -> anyhow::Result<()> {
        self.storage.clear().await?;
        self.tx.send_replace(Session::default());
        debug!("session cleared");
        Ok(())
    }

    /// An authentication failure observed on any API call invalidates the
    /// session; from here it is indistinguishable from a logout.
    pub async fn invalidate(&self) -> anyhow::Result<()> {
        warn!("session invalidated by authentication failure");
        self.clear().await
    }
}

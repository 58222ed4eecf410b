//! Process-local session store.
//!
//! Sessions live in a `tokio::sync::RwLock<HashMap<..>>` for the lifetime of
//! the store. Each is held behind an `Arc`: `get` shares it, and writes go
//! through `Arc::make_mut`, so a handle taken earlier is never mutated
//! underneath its holder. There is no eviction; a long-running host that
//! needs one should wrap or replace this adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;
use vibe_application::{GenerationCommit, SessionStore, SessionStoreError};
use vibe_domain::{Message, Role, Session, Version};

/// In-memory [`SessionStore`] keyed by random UUIDs.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop a session. Returns false if it did not exist.
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    async fn update<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> T + Send,
    ) -> Result<T, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionStoreError::NotFound(id.to_string()))?;
        Ok(f(Arc::make_mut(session)))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self) -> Session {
        let session = Session::new(Uuid::new_v4().to_string());
        debug!(session_id = %session.id(), "Session created");
        self.sessions
            .write()
            .await
            .insert(session.id().to_string(), Arc::new(session.clone()));
        session
    }

    async fn get(&self, id: &str) -> Result<Arc<Session>, SessionStoreError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionStoreError::NotFound(id.to_string()))
    }

    async fn append_message(
        &self,
        id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), SessionStoreError> {
        let message = Message {
            role,
            content: content.to_string(),
        };
        self.update(id, |s| s.add_message(message)).await
    }

    async fn set_artifact(&self, id: &str, artifact: &str) -> Result<(), SessionStoreError> {
        self.update(id, |s| s.set_artifact(artifact)).await
    }

    async fn append_version(&self, id: &str, version: Version) -> Result<(), SessionStoreError> {
        self.update(id, |s| s.add_version(version)).await
    }

    async fn get_artifact(&self, id: &str) -> Result<String, SessionStoreError> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(id)
            .ok_or_else(|| SessionStoreError::NotFound(id.to_string()))?;
        Ok(session.artifact().unwrap_or_default().to_string())
    }

    /// All four writes happen under one write lock.
    async fn commit_generation(
        &self,
        id: &str,
        commit: GenerationCommit,
    ) -> Result<(), SessionStoreError> {
        self.update(id, |s| commit.apply_to(s)).await
    }
}

//! Session store port
//!
//! The store exclusively owns every [`Session`]. Other components refer to a
//! session by id and mutate it only through these operations, so a change
//! made by one caller is visible to every later `get`. `get` hands out a
//! shared handle to the stored session rather than a deep copy; a write made
//! while a handle is held leaves that handle's view unchanged.
//!
//! Each operation on a single session is atomic. Running two generations
//! against the same session in parallel is not supported: callers keep at
//! most one in-flight generation per session.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use vibe_domain::{Message, Role, Session, Version};

/// Errors that can occur during session store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Everything a successful generation writes, applied in order:
/// user message, assistant message, artifact, version.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCommit {
    pub user_message: String,
    pub assistant_message: String,
    pub artifact: String,
    pub version: Version,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create an empty session: no messages, no artifact, version 0.
    async fn create(&self) -> Session;

    /// Shared handle to the session with `id`.
    async fn get(&self, id: &str) -> Result<Arc<Session>, SessionStoreError>;

    async fn append_message(
        &self,
        id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), SessionStoreError>;

    /// Replace the current artifact.
    async fn set_artifact(&self, id: &str, artifact: &str) -> Result<(), SessionStoreError>;

    /// Append to the version log and advance the counter to `version.version`.
    async fn append_version(&self, id: &str, version: Version) -> Result<(), SessionStoreError>;

    /// Current artifact, or an empty string before the first generation.
    async fn get_artifact(&self, id: &str) -> Result<String, SessionStoreError> {
        let session = self.get(id).await?;
        Ok(session.artifact().unwrap_or_default().to_string())
    }

    async fn list_versions(&self, id: &str) -> Result<Vec<Version>, SessionStoreError> {
        Ok(self.get(id).await?.versions().to_vec())
    }

    /// Apply a finished generation.
    ///
    /// The default applies the four writes one after another. Stores that
    /// can hold one lock across them should override this.
    async fn commit_generation(
        &self,
        id: &str,
        commit: GenerationCommit,
    ) -> Result<(), SessionStoreError> {
        self.append_message(id, Role::User, &commit.user_message)
            .await?;
        self.append_message(id, Role::Assistant, &commit.assistant_message)
            .await?;
        self.set_artifact(id, &commit.artifact).await?;
        self.append_version(id, commit.version).await
    }
}

impl GenerationCommit {
    /// Apply this commit to a session owned by a store.
    pub fn apply_to(self, session: &mut Session) {
        session.add_message(Message::user(self.user_message));
        session.add_message(Message::assistant(self.assistant_message));
        session.set_artifact(self.artifact);
        session.add_version(self.version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_to_writes_in_order() {
        let mut session = Session::new("s1");
        GenerationCommit {
            user_message: "make a red button".to_string(),
            assistant_message: "```html\n<button></button>\n```".to_string(),
            artifact: "<button></button>".to_string(),
            version: Version::generated(1, "<button></button>", "+<button></button>"),
        }
        .apply_to(&mut session);

        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[0].role, Role::User);
        assert_eq!(session.messages()[1].role, Role::Assistant);
        assert_eq!(session.artifact(), Some("<button></button>"));
        assert_eq!(session.current_version(), 1);
    }
}

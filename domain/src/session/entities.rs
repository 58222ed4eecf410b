//! Session domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
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

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// What produced a [`Version`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionOrigin {
    /// A model generation turn.
    Generation,
}

/// Immutable, numbered snapshot of a session artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    /// 1-based, gap-free version number.
    pub version: u64,
    /// Full artifact text at this version.
    pub artifact: String,
    /// Unified diff relative to the previous version.
    pub diff: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub origin: VersionOrigin,
}

impl Version {
    /// Create a version record produced by a generation turn.
    pub fn generated(version: u64, artifact: impl Into<String>, diff: impl Into<String>) -> Self {
        Self {
            version,
            artifact: artifact.into(),
            diff: diff.into(),
            summary: None,
            created_at: Utc::now(),
            origin: VersionOrigin::Generation,
        }
    }
}

/// A conversation plus its evolving artifact and version history (Entity)
///
/// Sessions are owned by a session store. Mutators exist for store
/// implementations; every other component goes through the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: String,
    messages: Vec<Message>,
    artifact: Option<String>,
    versions: Vec<Version>,
    current_version: u64,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            artifact: None,
            versions: Vec::new(),
            current_version: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current artifact, absent before the first generation.
    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn current_version(&self) -> u64 {
        self.current_version
    }

    /// Number the next appended version should carry.
    pub fn next_version_number(&self) -> u64 {
        self.current_version + 1
    }

    pub fn latest_version(&self) -> Option<&Version> {
        self.versions.last()
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn set_artifact(&mut self, artifact: impl Into<String>) {
        self.artifact = Some(artifact.into());
    }

    /// Append a version and advance the counter to its number.
    ///
    /// Numbering consistency is the caller's responsibility.
    pub fn add_version(&mut self, version: Version) {
        self.current_version = version.version;
        self.versions.push(version);
    }
}

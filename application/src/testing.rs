//! Scripted test doubles shared by the use case tests.

use crate::ports::llm_gateway::{CompletionRequest, GatewayError, LlmGateway, StreamHandle};
use crate::ports::session_store::{SessionStore, SessionStoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use vibe_domain::{Message, Model, Role, Session, StreamEvent, Version};

pub fn model(id: &str) -> Model {
    Model::new(id).unwrap()
}

pub fn denied() -> GatewayError {
    GatewayError::Provider {
        status: Some(403),
        category: "forbidden".to_string(),
        message: "This model is not available in your region".to_string(),
    }
}

pub fn server_error() -> GatewayError {
    GatewayError::Provider {
        status: Some(500),
        category: "server_error".to_string(),
        message: "upstream exploded".to_string(),
    }
}

/// What the scripted gateway does for one model.
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Fail(GatewayError),
    /// Send these events, then close the stream.
    Stream(Vec<StreamEvent>),
    /// Send these events, then keep the stream open until the receiver
    /// goes away.
    Hang(Vec<StreamEvent>),
}

#[derive(Default)]
pub struct ScriptedGateway {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, model: &str, reply: Reply) -> Self {
        self.replies.insert(model.to_string(), reply);
        self
    }

    /// Model ids called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn script_for(&self, request: &CompletionRequest) -> Result<Reply, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push(request.model.as_str().to_string());
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .get(request.model.as_str())
            .cloned()
            .ok_or_else(|| GatewayError::Other(format!("no script for {}", request.model)))
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        match self.script_for(request)? {
            Reply::Text(text) => Ok(text),
            Reply::Fail(e) => Err(e),
            Reply::Stream(events) | Reply::Hang(events) => Ok(events
                .iter()
                .filter_map(|e| match e {
                    StreamEvent::Delta(t) => Some(t.as_str()),
                    _ => None,
                })
                .collect()),
        }
    }

    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
    ) -> Result<StreamHandle, GatewayError> {
        let (events, hang) = match self.script_for(request)? {
            Reply::Text(text) => (vec![StreamEvent::Completed(text)], false),
            Reply::Fail(e) => return Err(e),
            Reply::Stream(events) => (events, false),
            Reply::Hang(events) => (events, true),
        };
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            tx.send(event).await.unwrap();
        }
        if hang {
            tokio::spawn(async move { tx.closed().await });
        }
        Ok(StreamHandle::new(rx))
    }
}

/// Session store double backed by a plain map.
#[derive(Default)]
pub struct MockSessionStore {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    reject_writes: AtomicBool,
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later write fails with `NotFound`; reads keep working.
    pub fn reject_writes(&self) {
        self.reject_writes.store(true, Ordering::SeqCst);
    }

    fn write<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T, SessionStoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(SessionStoreError::NotFound(id.to_string()));
        }
        self.with_session(id, f)
    }

    fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T, SessionStoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionStoreError::NotFound(id.to_string()))?;
        Ok(f(Arc::make_mut(session)))
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn create(&self) -> Session {
        let mut sessions = self.sessions.lock().unwrap();
        let session = Session::new(format!("session-{}", sessions.len() + 1));
        sessions.insert(session.id().to_string(), Arc::new(session.clone()));
        session
    }

    async fn get(&self, id: &str) -> Result<Arc<Session>, SessionStoreError> {
        self.sessions
            .lock()
            .unwrap()
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
        self.write(id, |s| {
            s.add_message(Message {
                role,
                content: content.to_string(),
            })
        })
    }

    async fn set_artifact(&self, id: &str, artifact: &str) -> Result<(), SessionStoreError> {
        self.write(id, |s| s.set_artifact(artifact))
    }

    async fn append_version(&self, id: &str, version: Version) -> Result<(), SessionStoreError> {
        self.write(id, |s| s.add_version(version))
    }
}

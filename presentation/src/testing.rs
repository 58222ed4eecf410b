//! Test doubles for driving the use case from the presentation layer.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use vibe_application::{
    CompletionRequest, GatewayError, GenerationParams, LlmGateway, RunGenerationUseCase,
    SessionStore, SessionStoreError, StreamHandle,
};
use vibe_domain::{Message, Model, Role, Session, StreamEvent, Version};

/// What every model answers.
#[derive(Clone)]
pub enum Script {
    Text(String),
    /// Deltas followed by `Completed`.
    Tokens(Vec<&'static str>),
    /// Deltas, then the stream stays open.
    Stall(Vec<&'static str>),
}

pub struct ScriptGateway {
    script: Script,
}

#[async_trait]
impl LlmGateway for ScriptGateway {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, GatewayError> {
        Ok(match &self.script {
            Script::Text(text) => text.clone(),
            Script::Tokens(parts) | Script::Stall(parts) => parts.concat(),
        })
    }

    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
    ) -> Result<StreamHandle, GatewayError> {
        let (parts, hang) = match &self.script {
            Script::Text(_) => {
                let text = self.complete(request).await?;
                let (tx, rx) = mpsc::channel(1);
                let _ = tx.send(StreamEvent::Completed(text)).await;
                return Ok(StreamHandle::new(rx));
            }
            Script::Tokens(parts) => (parts.clone(), false),
            Script::Stall(parts) => (parts.clone(), true),
        };
        let (tx, rx) = mpsc::channel(parts.len() + 1);
        for part in &parts {
            let _ = tx.send(StreamEvent::Delta(part.to_string())).await;
        }
        if hang {
            tokio::spawn(async move { tx.closed().await });
        } else {
            let _ = tx.send(StreamEvent::Completed(parts.concat())).await;
        }
        Ok(StreamHandle::new(rx))
    }
}

#[derive(Default)]
pub struct TestStore {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl TestStore {
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
impl SessionStore for TestStore {
    async fn create(&self) -> Session {
        let mut sessions = self.sessions.lock().unwrap();
        let session = Session::new(format!("s{}", sessions.len() + 1));
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
        self.with_session(id, |s| {
            s.add_message(Message {
                role,
                content: content.to_string(),
            })
        })
    }

    async fn set_artifact(&self, id: &str, artifact: &str) -> Result<(), SessionStoreError> {
        self.with_session(id, |s| s.set_artifact(artifact))
    }

    async fn append_version(&self, id: &str, version: Version) -> Result<(), SessionStoreError> {
        self.with_session(id, |s| s.add_version(version))
    }
}

/// Use case over a fresh store, answering every request with `script`.
pub fn harness(script: Script) -> (RunGenerationUseCase, Arc<TestStore>) {
    let store = Arc::new(TestStore::default());
    let params = GenerationParams::default().with_primary_model(Model::new("test/model").ok());
    let use_case = RunGenerationUseCase::new(
        store.clone(),
        Arc::new(ScriptGateway { script }),
        params,
    );
    (use_case, store)
}

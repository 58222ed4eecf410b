//! Run Generation use case.
//!
//! The generation orchestrator: one user message in, one committed
//! artifact revision out.
//!
//! 1. Read the session's current artifact
//! 2. Build the bounded snippet and the prompt
//! 3. Ask the [`ProviderGateway`] (with model fallback)
//! 4. Commit the user/assistant messages, the new artifact and a new
//!    [`Version`] carrying the diff against the previous artifact
//!
//! The session store is only written in step 4, after the provider call has
//! fully succeeded. A failed, stalled or cancelled generation leaves the
//! session exactly as it was.
//!
//! Generations for the same session must not overlap: callers run at most
//! one per session at a time.

use crate::config::GenerationParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::session_store::{GenerationCommit, SessionStore, SessionStoreError};
use crate::use_cases::provider_gateway::{GenerateError, ProviderGateway};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vibe_domain::util::preview;
use vibe_domain::{
    GenerationEvent, GenerationResult, Model, PromptTemplate, StreamEvent, Version,
    extract_artifact, unified_diff,
};

/// Errors that can occur during a generation turn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunGenerationError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("Stream stalled: no provider event for {}s", .0.as_secs_f32())]
    StreamStalled(Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

impl From<SessionStoreError> for RunGenerationError {
    fn from(e: SessionStoreError) -> Self {
        match e {
            SessionStoreError::NotFound(id) => RunGenerationError::SessionNotFound(id),
        }
    }
}

/// Coarse error classification for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown session; a caller error.
    NotFound,
    /// No model configured, or the provider is not set up.
    Configuration,
    /// Every model was refused for access or region reasons.
    AccessDenied,
    /// Any other upstream failure, including stalls.
    Upstream,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Configuration => "configuration",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RunGenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunGenerationError::SessionNotFound(_) => ErrorKind::NotFound,
            RunGenerationError::Generate(GenerateError::NoModelConfigured)
            | RunGenerationError::Generate(GenerateError::Provider(
                GatewayError::Configuration(_),
            )) => ErrorKind::Configuration,
            RunGenerationError::Generate(GenerateError::AllModelsDenied { .. }) => {
                ErrorKind::AccessDenied
            }
            RunGenerationError::Generate(GenerateError::Provider(_))
            | RunGenerationError::StreamStalled(_) => ErrorKind::Upstream,
            RunGenerationError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunGenerationError::Cancelled)
    }

    /// Detail carried by the streaming `error` event.
    pub fn detail(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

/// Input for the [`RunGenerationUseCase`].
#[derive(Debug, Clone)]
pub struct RunGenerationInput {
    pub session_id: String,
    pub user_message: String,
}

impl RunGenerationInput {
    pub fn new(session_id: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_message: user_message.into(),
        }
    }
}

/// State read from the session before the provider call.
struct PreparedTurn {
    previous_artifact: String,
    next_version: u64,
    user_prompt: String,
}

/// Use case for running one generation turn, batch or streamed.
#[derive(Clone)]
pub struct RunGenerationUseCase {
    store: Arc<dyn SessionStore>,
    provider: ProviderGateway,
    params: GenerationParams,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl RunGenerationUseCase {
    pub fn new(
        store: Arc<dyn SessionStore>,
        gateway: Arc<dyn LlmGateway>,
        params: GenerationParams,
    ) -> Self {
        Self {
            store,
            provider: ProviderGateway::new(gateway, &params),
            params,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.provider = self.provider.with_conversation_logger(logger.clone());
        self.conversation_logger = logger;
        self
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn provider(&self) -> &ProviderGateway {
        &self.provider
    }

    /// Run one generation and wait for the full reply.
    pub async fn execute(
        &self,
        input: RunGenerationInput,
    ) -> Result<GenerationResult, RunGenerationError> {
        let result = self.execute_inner(&input).await;
        if let Err(e) = &result {
            self.log_failure(&input, e);
        }
        result
    }

    async fn execute_inner(
        &self,
        input: &RunGenerationInput,
    ) -> Result<GenerationResult, RunGenerationError> {
        let turn = self.prepare(input).await?;
        let output = self
            .provider
            .generate(PromptTemplate::system(), &turn.user_prompt)
            .await?;
        self.commit(
            input,
            turn,
            output.assistant_text,
            output.artifact,
            output.model,
            output.attempted,
        )
        .await
    }

    /// Run one generation, forwarding each token to `events` as it arrives.
    ///
    /// Events follow the order `token* (assistantComplete artifact diff done | error)`.
    /// Cancelling `cancel`, or dropping the receiver of `events`, aborts the
    /// turn at the next token boundary without committing anything.
    pub async fn execute_streaming(
        &self,
        input: RunGenerationInput,
        events: mpsc::Sender<GenerationEvent>,
        cancel: CancellationToken,
    ) -> Result<GenerationResult, RunGenerationError> {
        let result = self.stream_inner(&input, &events, &cancel).await;
        if let Err(e) = &result {
            self.log_failure(&input, e);
            // Receiver may be gone already
            let _ = events.send(GenerationEvent::error(e.detail())).await;
        }
        result
    }

    /// Spawn [`execute_streaming`](Self::execute_streaming) on the runtime
    /// and hand back the event receiver and a cancellation handle.
    pub fn spawn_stream(&self, input: RunGenerationInput, buffer: usize) -> GenerationStream {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let cancel = CancellationToken::new();
        let this = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move { this.execute_streaming(input, tx, token).await });
        GenerationStream {
            events: rx,
            cancel,
            task,
        }
    }

    async fn stream_inner(
        &self,
        input: &RunGenerationInput,
        events: &mpsc::Sender<GenerationEvent>,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, RunGenerationError> {
        let turn = self.prepare(input).await?;
        let idle = self.params.stream_idle_timeout;

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RunGenerationError::Cancelled),
            r = self.provider.open_stream(PromptTemplate::system(), &turn.user_prompt, idle) => r,
        };
        let mut stream = opened.map_err(|e| match e {
            GenerateError::Provider(GatewayError::Timeout) => RunGenerationError::StreamStalled(idle),
            other => other.into(),
        })?;

        let mut text = String::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RunGenerationError::Cancelled),
                r = tokio::time::timeout(idle, stream.next()) => r,
            };
            let event = next.map_err(|_| RunGenerationError::StreamStalled(idle))?;

            match event {
                Some(StreamEvent::Delta(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    text.push_str(&chunk);
                    emit(events, cancel, GenerationEvent::token(chunk)).await?;
                }
                Some(StreamEvent::Completed(full)) => {
                    if text.is_empty() && !full.is_empty() {
                        emit(events, cancel, GenerationEvent::token(full.clone())).await?;
                        text = full;
                    }
                    break;
                }
                Some(StreamEvent::Error(failure)) => {
                    warn!(model = %stream.model, error = %failure, "Stream failed mid-flight");
                    return Err(GenerateError::Provider(failure.into()).into());
                }
                None => {
                    return Err(GenerateError::Provider(GatewayError::TransportClosed).into());
                }
            }
        }

        debug!(model = %stream.model, chars = text.len(), "Stream finished");
        if cancel.is_cancelled() || events.is_closed() {
            return Err(RunGenerationError::Cancelled);
        }

        // Nothing past this point is emitted until the turn is stored, so a
        // failed commit ends the stream with `error` after the last token.
        let artifact = extract_artifact(&text);
        let result = self
            .commit(input, turn, text.clone(), artifact, stream.model, stream.attempted)
            .await?;

        // Committed; a vanished receiver no longer changes the outcome
        let _ = events
            .send(GenerationEvent::AssistantComplete { raw: text })
            .await;
        let _ = events
            .send(GenerationEvent::Artifact {
                artifact: result.artifact.clone(),
            })
            .await;
        let _ = events
            .send(GenerationEvent::Diff {
                diff: result.diff.clone(),
            })
            .await;
        let _ = events.send(GenerationEvent::Done).await;

        Ok(result)
    }

    async fn prepare(&self, input: &RunGenerationInput) -> Result<PreparedTurn, RunGenerationError> {
        let session = self.store.get(&input.session_id).await?;
        let current = session.artifact();
        let snippet = self.params.snippet.build_snippet(current, &input.user_message);

        info!(
            session_id = %input.session_id,
            version = session.current_version(),
            "Starting generation: {}",
            preview(&input.user_message, 80)
        );
        self.conversation_logger.log(ConversationEvent::new(
            "generation_started",
            serde_json::json!({
                "session_id": input.session_id,
                "user_message": input.user_message,
                "artifact_chars": current.map(|a| a.chars().count()).unwrap_or(0),
                "snippet_chars": snippet.chars().count(),
            }),
        ));

        Ok(PreparedTurn {
            previous_artifact: current.unwrap_or_default().to_string(),
            next_version: session.next_version_number(),
            user_prompt: PromptTemplate::user_instruction(&input.user_message, &snippet),
        })
    }

    async fn commit(
        &self,
        input: &RunGenerationInput,
        turn: PreparedTurn,
        assistant_text: String,
        artifact: String,
        model: Model,
        attempted_models: Vec<Model>,
    ) -> Result<GenerationResult, RunGenerationError> {
        let diff = unified_diff(Some(&turn.previous_artifact), Some(&artifact));
        let version = Version::generated(turn.next_version, artifact.clone(), diff.clone());

        self.store
            .commit_generation(
                &input.session_id,
                GenerationCommit {
                    user_message: input.user_message.clone(),
                    assistant_message: assistant_text.clone(),
                    artifact: artifact.clone(),
                    version,
                },
            )
            .await?;

        info!(
            session_id = %input.session_id,
            version = turn.next_version,
            model = %model,
            "Generation committed"
        );
        self.conversation_logger.log(ConversationEvent::new(
            "generation_completed",
            serde_json::json!({
                "session_id": input.session_id,
                "version": turn.next_version,
                "model": model.as_str(),
                "attempted_models": attempted_models.iter().map(Model::as_str).collect::<Vec<_>>(),
                "artifact_chars": artifact.chars().count(),
                "diff_lines": diff.lines().count(),
            }),
        ));

        Ok(GenerationResult {
            assistant_text_raw: assistant_text.clone(),
            assistant_text,
            artifact,
            diff,
            version: turn.next_version,
            model,
            attempted_models,
        })
    }

    fn log_failure(&self, input: &RunGenerationInput, error: &RunGenerationError) {
        if error.is_cancelled() {
            info!(session_id = %input.session_id, "Generation cancelled");
        } else {
            warn!(session_id = %input.session_id, error = %error, "Generation failed");
        }
        self.conversation_logger.log(ConversationEvent::new(
            "generation_failed",
            serde_json::json!({
                "session_id": input.session_id,
                "kind": error.kind().as_str(),
                "error": error.to_string(),
            }),
        ));
    }
}

/// Forward one event unless the turn was cancelled or the receiver left.
async fn emit(
    events: &mpsc::Sender<GenerationEvent>,
    cancel: &CancellationToken,
    event: GenerationEvent,
) -> Result<(), RunGenerationError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RunGenerationError::Cancelled),
        r = events.send(event) => r.map_err(|_| RunGenerationError::Cancelled),
    }
}

/// A streamed generation running on its own task.
pub struct GenerationStream {
    events: mpsc::Receiver<GenerationEvent>,
    cancel: CancellationToken,
    task: JoinHandle<Result<GenerationResult, RunGenerationError>>,
}

impl GenerationStream {
    /// Next event; `None` after the terminal event.
    pub async fn recv(&mut self) -> Option<GenerationEvent> {
        self.events.recv().await
    }

    /// Request cancellation at the next token boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the task and return its outcome.
    pub async fn finish(self) -> Result<GenerationResult, RunGenerationError> {
        drop(self.events);
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Generation task aborted");
                Err(RunGenerationError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockSessionStore, Reply, ScriptedGateway, denied, model, server_error};
    use vibe_domain::{EventSequence, Role, apply_unified_diff};

    fn params(ids: &[&str]) -> GenerationParams {
        let mut models = ids.iter().map(|id| model(id));
        GenerationParams::default()
            .with_primary_model(models.next())
            .with_fallback_models(models.collect())
            .with_stream_idle_timeout(Duration::from_secs(5))
    }

    fn fenced(body: &str) -> String {
        format!("Here you go:\n```html\n{body}\n```\nEnjoy.")
    }

    async fn setup(
        gateway: ScriptedGateway,
        ids: &[&str],
    ) -> (RunGenerationUseCase, Arc<MockSessionStore>, Arc<ScriptedGateway>, String) {
        let store = Arc::new(MockSessionStore::new());
        let gateway = Arc::new(gateway);
        let use_case = RunGenerationUseCase::new(store.clone(), gateway.clone(), params(ids));
        let session_id = store.create().await.id().to_string();
        (use_case, store, gateway, session_id)
    }

    async fn drain(mut rx: mpsc::Receiver<GenerationEvent>) -> Vec<GenerationEvent> {
        let mut out = Vec::new();
        while let Some(event) = rx.recv().await {
            out.push(event);
        }
        out
    }

    fn assert_well_ordered(events: &[GenerationEvent]) {
        let mut seq = EventSequence::new();
        for event in events {
            seq.accept(event).unwrap();
        }
        assert!(seq.is_finished());
    }

    #[tokio::test]
    async fn first_generation_creates_version_one() {
        let gateway = ScriptedGateway::new()
            .reply("a", Reply::Text(fenced("<button style=\"color:red\">Go</button>")));
        let (use_case, store, _, id) = setup(gateway, &["a"]).await;

        let result = use_case
            .execute(RunGenerationInput::new(&id, "make a red button"))
            .await
            .unwrap();

        assert_eq!(result.version, 1);
        assert_eq!(result.artifact, "<button style=\"color:red\">Go</button>");
        assert!(result.assistant_text.contains("```html"));
        assert_eq!(result.assistant_text_raw, result.assistant_text);
        assert_eq!(result.diff, unified_diff(Some(""), Some(&result.artifact)));
        for line in result.diff.lines().skip(3) {
            assert!(line.starts_with('+'), "unexpected diff line {line:?}");
        }

        let session = store.get(&id).await.unwrap();
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[0].role, Role::User);
        assert_eq!(session.messages()[0].content, "make a red button");
        assert_eq!(session.messages()[1].content, result.assistant_text);
        assert_eq!(session.artifact(), Some(result.artifact.as_str()));
        assert_eq!(session.current_version(), 1);
    }

    #[tokio::test]
    async fn second_generation_diffs_against_previous() {
        let gateway = ScriptedGateway::new().reply("a", Reply::Text(fenced("<p>one</p>")));
        let (use_case, store, gateway, id) = setup(gateway, &["a"]).await;
        use_case
            .execute(RunGenerationInput::new(&id, "first"))
            .await
            .unwrap();

        let gateway2 = ScriptedGateway::new().reply("a", Reply::Text(fenced("<p>two</p>")));
        let gateway2 = Arc::new(gateway2);
        let use_case2 = RunGenerationUseCase::new(store.clone(), gateway2.clone(), params(&["a"]));
        let result = use_case2
            .execute(RunGenerationInput::new(&id, "second"))
            .await
            .unwrap();

        assert_eq!(result.version, 2);
        assert_eq!(apply_unified_diff("<p>one</p>", &result.diff).unwrap(), "<p>two</p>");
        let prompt = gateway2.last_request().unwrap().user_prompt;
        assert!(prompt.contains("<p>one</p>"));
        assert!(gateway.last_request().unwrap().user_prompt.contains("User request:\nfirst"));

        let versions = store.list_versions(&id).await.unwrap();
        assert_eq!(versions.iter().map(|v| v.version).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(store.get(&id).await.unwrap().messages().len(), 4);
    }

    #[tokio::test]
    async fn unchanged_artifact_still_gets_a_version() {
        let gateway = ScriptedGateway::new().reply("a", Reply::Text(fenced("<p>same</p>")));
        let (use_case, store, _, id) = setup(gateway, &["a"]).await;
        use_case.execute(RunGenerationInput::new(&id, "one")).await.unwrap();
        let result = use_case.execute(RunGenerationInput::new(&id, "again")).await.unwrap();

        assert!(result.is_unchanged());
        assert_eq!(result.version, 2);
        assert_eq!(store.get(&id).await.unwrap().current_version(), 2);
    }

    #[tokio::test]
    async fn long_artifact_is_truncated_in_prompt() {
        let gateway = ScriptedGateway::new().reply("a", Reply::Text(fenced("<p>new</p>")));
        let (use_case, store, gateway, id) = setup(gateway, &["a"]).await;
        let big = "x".repeat(7000);
        store.set_artifact(&id, &big).await.unwrap();

        use_case.execute(RunGenerationInput::new(&id, "shrink")).await.unwrap();

        let prompt = gateway.last_request().unwrap().user_prompt;
        assert!(prompt.contains("TRUNCATED 1700 chars omitted"));
        assert!(!prompt.contains(&big));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (use_case, _, gateway, _) = setup(ScriptedGateway::new(), &["a"]).await;

        let err = use_case
            .execute(RunGenerationInput::new("missing", "hi"))
            .await
            .unwrap_err();
        assert_eq!(err, RunGenerationError::SessionNotFound("missing".into()));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn denied_everywhere_leaves_session_untouched() {
        let gateway = ScriptedGateway::new()
            .reply("a", Reply::Fail(denied()))
            .reply("b", Reply::Fail(denied()));
        let (use_case, store, _, id) = setup(gateway, &["a", "b"]).await;

        let err = use_case
            .execute(RunGenerationInput::new(&id, "hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        assert!(err.detail().starts_with("access_denied: "));

        let session = store.get(&id).await.unwrap();
        assert!(session.messages().is_empty());
        assert!(session.artifact().is_none());
        assert_eq!(session.current_version(), 0);
    }

    #[tokio::test]
    async fn error_kinds() {
        assert_eq!(
            RunGenerationError::from(GenerateError::NoModelConfigured).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            RunGenerationError::from(GenerateError::Provider(GatewayError::Configuration(
                "OPENROUTER_API_KEY is not set".into()
            )))
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            RunGenerationError::from(GenerateError::Provider(server_error())).kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            RunGenerationError::StreamStalled(Duration::from_secs(1)).kind(),
            ErrorKind::Upstream
        );
        assert!(RunGenerationError::Cancelled.is_cancelled());
    }

    #[tokio::test]
    async fn three_token_stream() {
        let gateway = ScriptedGateway::new().reply(
            "a",
            Reply::Stream(vec![
                StreamEvent::Delta("<".into()),
                StreamEvent::Delta("html".into()),
                StreamEvent::Delta(">".into()),
                StreamEvent::Completed("<html>".into()),
            ]),
        );
        let (use_case, store, _, id) = setup(gateway, &["a"]).await;

        let (tx, rx) = mpsc::channel(16);
        let result = use_case
            .execute_streaming(RunGenerationInput::new(&id, "page"), tx, CancellationToken::new())
            .await
            .unwrap();
        let events = drain(rx).await;

        assert_eq!(
            events,
            vec![
                GenerationEvent::token("<"),
                GenerationEvent::token("html"),
                GenerationEvent::token(">"),
                GenerationEvent::AssistantComplete {
                    raw: "<html>".into()
                },
                GenerationEvent::Artifact {
                    artifact: "<html>".into()
                },
                GenerationEvent::Diff {
                    diff: result.diff.clone()
                },
                GenerationEvent::Done,
            ]
        );
        assert_well_ordered(&events);

        let session = store.get(&id).await.unwrap();
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].content, "<html>");
        assert_eq!(session.versions().len(), 1);
        assert_eq!(result.version, 1);
    }

    #[tokio::test]
    async fn completion_without_deltas_emits_one_token() {
        let gateway = ScriptedGateway::new().reply("a", Reply::Text(fenced("<p>x</p>")));
        let (use_case, _, _, id) = setup(gateway, &["a"]).await;

        let (tx, rx) = mpsc::channel(16);
        let result = use_case
            .execute_streaming(RunGenerationInput::new(&id, "x"), tx, CancellationToken::new())
            .await
            .unwrap();
        let events = drain(rx).await;

        assert_eq!(events[0], GenerationEvent::token(fenced("<p>x</p>")));
        assert_eq!(result.artifact, "<p>x</p>");
        assert_well_ordered(&events);
    }

    #[tokio::test]
    async fn mid_stream_failure_commits_nothing() {
        let gateway = ScriptedGateway::new().reply(
            "a",
            Reply::Stream(vec![
                StreamEvent::Delta("<".into()),
                StreamEvent::Error(vibe_domain::ProviderFailure::new("server_error", "boom")),
            ]),
        );
        let (use_case, store, _, id) = setup(gateway, &["a"]).await;

        let (tx, rx) = mpsc::channel(16);
        let err = use_case
            .execute_streaming(RunGenerationInput::new(&id, "x"), tx, CancellationToken::new())
            .await
            .unwrap_err();
        let events = drain(rx).await;

        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], GenerationEvent::token("<"));
        assert!(matches!(&events[1], GenerationEvent::Error { detail } if detail.starts_with("upstream: ")));
        assert_well_ordered(&events);

        let session = store.get(&id).await.unwrap();
        assert!(session.messages().is_empty());
        assert_eq!(session.current_version(), 0);
    }

    #[tokio::test]
    async fn failed_commit_ends_stream_with_error_only() {
        let gateway = ScriptedGateway::new().reply(
            "a",
            Reply::Stream(vec![
                StreamEvent::Delta("<p>hi</p>".into()),
                StreamEvent::Completed("<p>hi</p>".into()),
            ]),
        );
        let (use_case, store, _, id) = setup(gateway, &["a"]).await;
        store.reject_writes();

        let (tx, rx) = mpsc::channel(16);
        let err = use_case
            .execute_streaming(RunGenerationInput::new(&id, "x"), tx, CancellationToken::new())
            .await
            .unwrap_err();
        let events = drain(rx).await;

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], GenerationEvent::token("<p>hi</p>"));
        assert!(matches!(&events[1], GenerationEvent::Error { detail } if detail.starts_with("not_found: ")));
        assert_well_ordered(&events);

        let session = store.get(&id).await.unwrap();
        assert!(session.messages().is_empty());
        assert_eq!(session.current_version(), 0);
    }

    #[tokio::test]
    async fn stream_closed_without_completion_is_a_failure() {
        let gateway = ScriptedGateway::new()
            .reply("a", Reply::Stream(vec![StreamEvent::Delta("<p".into())]));
        let (use_case, store, _, id) = setup(gateway, &["a"]).await;

        let (tx, rx) = mpsc::channel(16);
        let err = use_case
            .execute_streaming(RunGenerationInput::new(&id, "x"), tx, CancellationToken::new())
            .await
            .unwrap_err();
        drop(rx);

        assert_eq!(
            err,
            RunGenerationError::Generate(GenerateError::Provider(GatewayError::TransportClosed))
        );
        assert!(store.get(&id).await.unwrap().messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_stream_times_out() {
        let gateway = ScriptedGateway::new()
            .reply("a", Reply::Hang(vec![StreamEvent::Delta("<".into())]));
        let (use_case, store, _, id) = setup(gateway, &["a"]).await;

        let (tx, rx) = mpsc::channel(16);
        let err = use_case
            .execute_streaming(RunGenerationInput::new(&id, "x"), tx, CancellationToken::new())
            .await
            .unwrap_err();
        let events = drain(rx).await;

        assert_eq!(err, RunGenerationError::StreamStalled(Duration::from_secs(5)));
        assert_eq!(events.len(), 2);
        assert_well_ordered(&events);
        assert!(store.get(&id).await.unwrap().messages().is_empty());
    }

    #[tokio::test]
    async fn cancel_between_tokens_commits_nothing() {
        let gateway = ScriptedGateway::new()
            .reply("a", Reply::Hang(vec![StreamEvent::Delta("<".into())]));
        let (use_case, store, _, id) = setup(gateway, &["a"]).await;

        let mut stream = use_case.spawn_stream(RunGenerationInput::new(&id, "x"), 16);
        assert_eq!(stream.recv().await, Some(GenerationEvent::token("<")));
        stream.cancel();
        let mut rest = Vec::new();
        while let Some(event) = stream.recv().await {
            rest.push(event);
        }
        let err = stream.finish().await.unwrap_err();

        assert!(err.is_cancelled());
        assert!(matches!(&rest[..], [GenerationEvent::Error { detail }] if detail.starts_with("cancelled")));
        let session = store.get(&id).await.unwrap();
        assert!(session.messages().is_empty());
        assert_eq!(session.current_version(), 0);
    }

    #[tokio::test]
    async fn dropped_receiver_cancels() {
        let gateway = ScriptedGateway::new().reply(
            "a",
            Reply::Stream(vec![
                StreamEvent::Delta("<".into()),
                StreamEvent::Completed("<".into()),
            ]),
        );
        let (use_case, store, _, id) = setup(gateway, &["a"]).await;

        let (tx, rx) = mpsc::channel(16);
        drop(rx);
        let err = use_case
            .execute_streaming(RunGenerationInput::new(&id, "x"), tx, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(store.get(&id).await.unwrap().messages().is_empty());
    }

    #[tokio::test]
    async fn streaming_falls_back_before_first_token() {
        let gateway = ScriptedGateway::new()
            .reply("a", Reply::Fail(denied()))
            .reply(
                "b",
                Reply::Stream(vec![
                    StreamEvent::Delta("ok".into()),
                    StreamEvent::Completed("ok".into()),
                ]),
            );
        let (use_case, _, _, id) = setup(gateway, &["a", "b"]).await;

        let (tx, rx) = mpsc::channel(16);
        let result = use_case
            .execute_streaming(RunGenerationInput::new(&id, "x"), tx, CancellationToken::new())
            .await
            .unwrap();
        drop(rx);

        assert_eq!(result.model, model("b"));
        assert_eq!(result.attempted_models, vec![model("a"), model("b")]);
    }
}

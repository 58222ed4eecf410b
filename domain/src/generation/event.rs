//! Outbound events of a streamed generation.
//!
//! A stream is strictly ordered:
//!
//! ```text
//! Token* ( AssistantComplete Artifact Diff Done | Error )
//! ```
//!
//! Nothing follows `Done` or `Error`. [`EventSequence`] checks a sequence
//! against this grammar.

use serde::{Deserialize, Serialize};

/// One event of a streamed generation, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GenerationEvent {
    /// A text increment from the model.
    Token { text: String },
    /// The full assistant reply, after the last token.
    AssistantComplete { raw: String },
    /// The artifact extracted from the reply.
    Artifact { artifact: String },
    /// Unified diff against the previous artifact.
    Diff { diff: String },
    /// The generation has been committed.
    Done,
    /// The generation failed; nothing was committed.
    Error { detail: String },
}

impl GenerationEvent {
    pub fn token(text: impl Into<String>) -> Self {
        GenerationEvent::Token { text: text.into() }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        GenerationEvent::Error {
            detail: detail.into(),
        }
    }

    /// Returns true if no event may follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationEvent::Done | GenerationEvent::Error { .. })
    }

    /// Wire name of the event type.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationEvent::Token { .. } => "token",
            GenerationEvent::AssistantComplete { .. } => "assistantComplete",
            GenerationEvent::Artifact { .. } => "artifact",
            GenerationEvent::Diff { .. } => "diff",
            GenerationEvent::Done => "done",
            GenerationEvent::Error { .. } => "error",
        }
    }
}

/// Position in the event grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SequenceState {
    #[default]
    Tokens,
    Completed,
    ArtifactSent,
    DiffSent,
    Finished,
}

/// Validates that events arrive in protocol order.
#[derive(Debug, Clone, Default)]
pub struct EventSequence {
    state: SequenceState,
}

impl EventSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `event` if it may follow the events seen so far.
    pub fn accept(&mut self, event: &GenerationEvent) -> Result<(), String> {
        use SequenceState::*;
        let next = match (self.state, event) {
            (Tokens, GenerationEvent::Token { .. }) => Tokens,
            (Tokens, GenerationEvent::AssistantComplete { .. }) => Completed,
            (Completed, GenerationEvent::Artifact { .. }) => ArtifactSent,
            (ArtifactSent, GenerationEvent::Diff { .. }) => DiffSent,
            (DiffSent, GenerationEvent::Done) => Finished,
            (Tokens, GenerationEvent::Error { .. }) => Finished,
            (state, event) => {
                return Err(format!(
                    "unexpected `{}` event in state {state:?}",
                    event.kind()
                ));
            }
        };
        self.state = next;
        Ok(())
    }

    /// Returns true once `Done` or `Error` has been accepted.
    pub fn is_finished(&self) -> bool {
        self.state == SequenceState::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_string(&GenerationEvent::token("<")).unwrap();
        assert_eq!(json, r#"{"type":"token","text":"<"}"#);

        let json = serde_json::to_string(&GenerationEvent::AssistantComplete {
            raw: "<html>".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"assistantComplete","raw":"<html>"}"#);

        let json = serde_json::to_string(&GenerationEvent::Done).unwrap();
        assert_eq!(json, r#"{"type":"done"}"#);

        let json = serde_json::to_string(&GenerationEvent::error("boom")).unwrap();
        assert_eq!(json, r#"{"type":"error","detail":"boom"}"#);
    }

    #[test]
    fn terminal_events() {
        assert!(GenerationEvent::Done.is_terminal());
        assert!(GenerationEvent::error("x").is_terminal());
        assert!(!GenerationEvent::token("x").is_terminal());
    }

    #[test]
    fn successful_sequence_is_accepted() {
        let events = vec![
            GenerationEvent::token("<"),
            GenerationEvent::token("html"),
            GenerationEvent::AssistantComplete {
                raw: "<html".to_string(),
            },
            GenerationEvent::Artifact {
                artifact: "<html".to_string(),
            },
            GenerationEvent::Diff {
                diff: String::new(),
            },
            GenerationEvent::Done,
        ];
        let mut seq = EventSequence::new();
        for event in &events {
            seq.accept(event).unwrap();
        }
        assert!(seq.is_finished());
    }

    #[test]
    fn early_error_is_accepted() {
        let mut seq = EventSequence::new();
        seq.accept(&GenerationEvent::token("a")).unwrap();
        seq.accept(&GenerationEvent::error("stalled")).unwrap();
        assert!(seq.is_finished());
    }

    #[test]
    fn error_after_completion_is_rejected() {
        let mut seq = EventSequence::new();
        seq.accept(&GenerationEvent::token("<p>")).unwrap();
        seq.accept(&GenerationEvent::AssistantComplete {
            raw: "<p>".to_string(),
        })
        .unwrap();
        assert!(seq.accept(&GenerationEvent::error("session gone")).is_err());

        let mut seq = EventSequence::new();
        seq.accept(&GenerationEvent::AssistantComplete { raw: String::new() })
            .unwrap();
        seq.accept(&GenerationEvent::Artifact {
            artifact: String::new(),
        })
        .unwrap();
        assert!(seq.accept(&GenerationEvent::error("late")).is_err());
    }

    #[test]
    fn nothing_after_terminal_event() {
        let mut seq = EventSequence::new();
        seq.accept(&GenerationEvent::error("denied")).unwrap();
        assert!(seq.accept(&GenerationEvent::token("late")).is_err());
        assert!(seq.accept(&GenerationEvent::Done).is_err());
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let mut seq = EventSequence::new();
        assert!(seq.accept(&GenerationEvent::Done).is_err());
        seq.accept(&GenerationEvent::AssistantComplete { raw: String::new() })
            .unwrap();
        assert!(seq.accept(&GenerationEvent::token("x")).is_err());
    }
}

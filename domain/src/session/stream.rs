//! Streaming events for upstream provider communication.
//!
//! [`StreamEvent`] represents individual events in a streaming provider
//! response, bridging transport-level streaming (SSE chunks) to the
//! application layer.

use crate::provider::ProviderFailure;

/// An event in a streaming provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text increment from the model.
    Delta(String),
    /// The complete response text (signals stream end).
    Completed(String),
    /// A failure that occurred during streaming (signals stream end).
    Error(ProviderFailure),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta or Completed event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) | StreamEvent::Completed(s) => Some(s),
            StreamEvent::Error(_) => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}

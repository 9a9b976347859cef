//! Chat gateway port
//!
//! Defines the interface for opening a streaming conversation turn with the
//! assistant backend. Implementations (adapters) live in the infrastructure
//! layer; the session controller only ever sees the typed
//! [`TransportEvent`] sequence.

use async_trait::async_trait;
use docschat_domain::{AgentId, OutboundMessage, TransportEvent};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while opening or running a chat stream
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Timeout")]
    Timeout,

    #[error("Transport closed")]
    TransportClosed,
}

/// One logical "open chat stream" request.
///
/// This is the engine's entire outbound surface: an agent selector plus the
/// composed payload. No other backend coupling exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Which backend persona/tool-set handles this turn.
    pub agent_id: AgentId,
    /// User text and optional hidden context, as separate fields.
    pub message: OutboundMessage,
}

impl ChatRequest {
    pub fn new(agent_id: AgentId, message: OutboundMessage) -> Self {
        Self { agent_id, message }
    }
}

/// Handle for one opened stream: the event receiver plus its cancellation
/// token.
///
/// The session controller owns the handle and is responsible for releasing
/// it. Cancelling the token stops event delivery within bounded time; events
/// already delivered stay applied.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<TransportEvent>,
    cancellation: CancellationToken,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<TransportEvent>, cancellation: CancellationToken) -> Self {
        Self {
            receiver,
            cancellation,
        }
    }

    /// Clone of the cancellation token, for callers that need to cancel from
    /// another task.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Receive the next event; `None` once the channel closes.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.receiver.recv().await
    }
}

/// Gateway for streaming assistant communication
///
/// The adapter guarantees at most one terminal event
/// ([`TransportEvent::Done`] or [`TransportEvent::Failure`]) per opened
/// stream and silence afterward.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Open a chat stream for one submission.
    async fn open(&self, request: ChatRequest) -> Result<StreamHandle, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stream_handle_yields_events_then_none() {
        let (tx, rx) = mpsc::channel(4);
        let mut handle = StreamHandle::new(rx, CancellationToken::new());

        tx.send(TransportEvent::TextDelta("hi".into())).await.unwrap();
        tx.send(TransportEvent::Done).await.unwrap();
        drop(tx);

        assert_eq!(
            handle.next_event().await,
            Some(TransportEvent::TextDelta("hi".into()))
        );
        assert_eq!(handle.next_event().await, Some(TransportEvent::Done));
        assert_eq!(handle.next_event().await, None);
    }

    #[tokio::test]
    async fn cancellation_token_is_shared() {
        let (_tx, rx) = mpsc::channel::<TransportEvent>(1);
        let handle = StreamHandle::new(rx, CancellationToken::new());

        let token = handle.cancellation();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(handle.cancellation().is_cancelled());
    }
}

//! Chat session controller.
//!
//! [`ChatSession`] orchestrates one conversation with one assistant agent:
//! it accepts user input, manages the single outstanding request slot,
//! applies transport events to the transcript strictly in arrival order,
//! exposes cancellation, and publishes an immutable
//! [`ConversationSnapshot`] to subscribers after every state change.
//!
//! # State machine
//!
//! ```text
//! Idle ──submit──> Sending ──first event──> Streaming ──terminal──> Idle
//!                     └──────── cancel / failure / timeout ──────────┘
//! ```
//!
//! `submit` completes only at the terminal event; callers that want
//! intermediate updates subscribe to snapshots instead of awaiting it.
//! Per-request errors are absorbed into turn status/content and never
//! propagate out of `submit` — only control-API misuse
//! ([`SessionError::Busy`]) surfaces to the caller.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use docschat_domain::core::string::truncate;
use docschat_domain::{
    AgentId, DocumentContext, FailureKind, OutboundMessage, Transcript, TransportEvent, Turn,
    TurnId, UnmatchedToolResult,
};
use serde_json::json;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::ports::chat_gateway::{ChatGateway, ChatRequest};
use crate::ports::chat_logger::{ChatEvent, ChatLogger, NoChatLogger};

/// Visible content for a cancelled request with no partial answer.
pub const CANCELLED_MESSAGE: &str = "Request cancelled.";
/// Visible content when the watchdog fires.
pub const TIMEOUT_MESSAGE: &str = "The assistant did not respond in time. Please try again.";
/// Visible content for a protocol violation; the detail goes to the log.
pub const PROTOCOL_MESSAGE: &str = "The assistant response could not be processed.";

/// Watchdog interval: a streaming request with no event for this long is
/// treated as failed rather than left hanging.
const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors surfaced synchronously by the control API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("A request is already in flight")]
    Busy,
}

/// Where the session is in its request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No outstanding request; `submit` and `clear` are permitted.
    Idle,
    /// A request was submitted; the stream is being opened.
    Sending,
    /// At least one event has arrived for the in-flight request.
    Streaming,
}

/// Immutable view of the conversation, published after every state change.
#[derive(Debug, Clone)]
pub struct ConversationSnapshot {
    /// Full turn sequence in display order. Copies — mutating them never
    /// affects the live store.
    pub turns: Vec<Turn>,
    /// Whether a request is in flight.
    pub busy: bool,
}

impl ConversationSnapshot {
    fn empty() -> Self {
        Self {
            turns: Vec::new(),
            busy: false,
        }
    }
}

/// Configuration fixed at session creation.
///
/// Changing the agent or the hidden context means creating a new session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend persona handling this session.
    pub agent_id: AgentId,
    /// Hidden context sent with every submission, never shown in the
    /// transcript.
    pub hidden_context: Option<String>,
    /// Watchdog interval between stream events.
    pub event_timeout: Duration,
}

impl SessionConfig {
    pub fn new(agent_id: impl Into<AgentId>) -> Self {
        Self {
            agent_id: agent_id.into(),
            hidden_context: None,
            event_timeout: DEFAULT_EVENT_TIMEOUT,
        }
    }

    pub fn with_hidden_context(mut self, context: impl Into<String>) -> Self {
        self.hidden_context = Some(context.into());
        self
    }

    /// Anchor the session to a documentation page.
    pub fn with_document(self, document: &DocumentContext) -> Self {
        self.with_hidden_context(document.hidden_context())
    }

    pub fn with_event_timeout(mut self, event_timeout: Duration) -> Self {
        self.event_timeout = event_timeout;
        self
    }
}

/// The in-flight request slot.
struct ActiveRequest {
    turn_id: TurnId,
    cancellation: CancellationToken,
}

struct Inner {
    transcript: Transcript,
    state: SessionState,
    active: Option<ActiveRequest>,
}

/// How the event loop proceeds after applying one event.
enum Flow {
    Continue,
    Finished,
    Protocol(UnmatchedToolResult),
}

/// One isolated, stateful conversation with a single assistant agent.
///
/// Sessions share nothing: each owns its transcript, its in-flight-request
/// slot, and its snapshot channel. All state lives behind a mutex that is
/// never held across an await point; event application is therefore strictly
/// sequential per session.
pub struct ChatSession {
    gateway: Arc<dyn ChatGateway>,
    config: SessionConfig,
    logger: Arc<dyn ChatLogger>,
    inner: Mutex<Inner>,
    snapshots: watch::Sender<ConversationSnapshot>,
}

impl ChatSession {
    pub fn new(gateway: Arc<dyn ChatGateway>, config: SessionConfig) -> Self {
        let (snapshots, _) = watch::channel(ConversationSnapshot::empty());
        Self {
            gateway,
            config,
            logger: Arc::new(NoChatLogger),
            inner: Mutex::new(Inner {
                transcript: Transcript::new(),
                state: SessionState::Idle,
                active: None,
            }),
            snapshots,
        }
    }

    /// Create with a session logger.
    pub fn with_logger(mut self, logger: Arc<dyn ChatLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.config.agent_id
    }

    /// Subscribe to snapshot publication.
    ///
    /// The receiver always holds the latest snapshot; no intermediate state
    /// is ever observable between two publications.
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshots.subscribe()
    }

    /// Current snapshot, for callers that do not hold a subscription.
    pub fn snapshot(&self) -> ConversationSnapshot {
        let inner = self.lock();
        ConversationSnapshot {
            turns: inner.transcript.snapshot(),
            busy: inner.state != SessionState::Idle,
        }
    }

    /// Whether a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.lock().state != SessionState::Idle
    }

    /// Submit one user message and drive its response to completion.
    ///
    /// Fails with [`SessionError::Busy`] — before touching the transcript —
    /// if a request is already in flight. Otherwise appends the user turn
    /// (text exactly as typed) and an empty assistant turn, opens the
    /// stream, and applies events until the terminal one.
    pub async fn submit(&self, text: &str) -> Result<(), SessionError> {
        // Claim the request slot atomically, before the first await.
        let (turn_id, cancellation) = {
            let mut inner = self.lock();
            if inner.state != SessionState::Idle {
                return Err(SessionError::Busy);
            }
            inner.transcript.append_user(text);
            let turn_id = inner.transcript.append_assistant();
            let cancellation = CancellationToken::new();
            inner.state = SessionState::Sending;
            inner.active = Some(ActiveRequest {
                turn_id,
                cancellation: cancellation.clone(),
            });
            (turn_id, cancellation)
        };
        self.publish();

        info!(agent = %self.config.agent_id, %turn_id, "submitting chat request");
        self.logger.log(ChatEvent::new(
            "submitted",
            json!({
                "agent": self.config.agent_id.as_str(),
                "turn": turn_id.to_string(),
                "text": truncate(text, 200),
            }),
        ));

        let message = OutboundMessage::compose(text, self.config.hidden_context.as_deref());
        let request = ChatRequest::new(self.config.agent_id.clone(), message);

        // Opening the stream may suspend on connection setup; keep it
        // cancellable.
        let opened = tokio::select! {
            _ = cancellation.cancelled() => {
                self.finish_failed(turn_id, FailureKind::Cancelled, CANCELLED_MESSAGE);
                return Ok(());
            }
            opened = self.gateway.open(request) => opened,
        };

        let mut handle = match opened {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "failed to open chat stream");
                self.finish_failed(turn_id, FailureKind::Transport, &e.to_string());
                return Ok(());
            }
        };

        loop {
            let event = tokio::select! {
                _ = cancellation.cancelled() => {
                    handle.cancellation().cancel();
                    self.finish_failed(turn_id, FailureKind::Cancelled, CANCELLED_MESSAGE);
                    return Ok(());
                }
                received = timeout(self.config.event_timeout, handle.next_event()) => {
                    match received {
                        Ok(Some(event)) => event,
                        Ok(None) => {
                            warn!(%turn_id, "chat stream closed without a terminal event");
                            self.finish_failed(
                                turn_id,
                                FailureKind::Transport,
                                "The connection to the assistant was lost.",
                            );
                            return Ok(());
                        }
                        Err(_) => {
                            handle.cancellation().cancel();
                            warn!(%turn_id, timeout = ?self.config.event_timeout,
                                "no stream event within the watchdog interval");
                            self.finish_failed(turn_id, FailureKind::Timeout, TIMEOUT_MESSAGE);
                            return Ok(());
                        }
                    }
                }
            };

            match self.apply_event(turn_id, event) {
                Flow::Continue => {}
                Flow::Finished => return Ok(()),
                Flow::Protocol(violation) => {
                    handle.cancellation().cancel();
                    warn!(%turn_id, tool = %violation.tool_name,
                        "unmatched tool result; failing the turn");
                    self.finish_failed(turn_id, FailureKind::Protocol, PROTOCOL_MESSAGE);
                    return Ok(());
                }
            }
        }
    }

    /// Cancel the in-flight request, if any.
    ///
    /// Idempotent: a no-op when idle. The event loop observes the token,
    /// marks the in-flight turn failed with the cancellation marker, and
    /// returns the session to idle.
    pub fn cancel(&self) {
        let token = self
            .lock()
            .active
            .as_ref()
            .map(|active| active.cancellation.clone());
        if let Some(token) = token {
            info!(agent = %self.config.agent_id, "cancelling in-flight request");
            token.cancel();
        }
    }

    /// Reset the conversation to empty.
    ///
    /// Only permitted when idle — callers must cancel first, so an active
    /// stream is never silently discarded.
    pub fn clear(&self) -> Result<(), SessionError> {
        {
            let mut inner = self.lock();
            if inner.state != SessionState::Idle {
                return Err(SessionError::Busy);
            }
            inner.transcript.clear();
        }
        self.publish();
        debug!(agent = %self.config.agent_id, "conversation cleared");
        self.logger.log(ChatEvent::new(
            "cleared",
            json!({ "agent": self.config.agent_id.as_str() }),
        ));
        Ok(())
    }

    /// Apply one transport event to the transcript and republish.
    fn apply_event(&self, turn_id: TurnId, event: TransportEvent) -> Flow {
        let flow = {
            let mut inner = self.lock();
            if inner.state == SessionState::Sending {
                inner.state = SessionState::Streaming;
            }
            match event {
                TransportEvent::TextDelta(chunk) => {
                    Self::with_turn(&mut inner, turn_id, |turn| {
                        turn.mark_streaming();
                        turn.append_text(&chunk);
                    });
                    Flow::Continue
                }
                TransportEvent::ToolStart { tool_name, input } => {
                    debug!(%turn_id, tool = %tool_name, "tool call started");
                    Self::with_turn(&mut inner, turn_id, |turn| {
                        turn.mark_streaming();
                        turn.start_tool(tool_name, input);
                    });
                    Flow::Continue
                }
                TransportEvent::ToolResult {
                    tool_name,
                    output,
                    ok,
                } => {
                    match Self::with_turn(&mut inner, turn_id, |turn| {
                        turn.resolve_tool(&tool_name, output, ok)
                    }) {
                        Some(Err(violation)) => Flow::Protocol(violation),
                        _ => Flow::Continue,
                    }
                }
                TransportEvent::Done => {
                    Self::with_turn(&mut inner, turn_id, |turn| turn.complete());
                    Self::release(&mut inner);
                    Flow::Finished
                }
                TransportEvent::Failure(message) => {
                    Self::with_turn(&mut inner, turn_id, |turn| {
                        turn.fail(FailureKind::Transport, &message)
                    });
                    Self::release(&mut inner);
                    Flow::Finished
                }
            }
        };
        self.publish();

        if let Flow::Finished = flow {
            let snapshot = self.snapshot();
            let turn = snapshot.turns.iter().find(|t| t.id == turn_id);
            let failure = turn.and_then(|t| t.failure);
            match failure {
                None => {
                    info!(%turn_id, "chat request completed");
                    self.logger.log(ChatEvent::new(
                        "completed",
                        json!({ "turn": turn_id.to_string() }),
                    ));
                }
                Some(kind) => {
                    self.logger.log(ChatEvent::new(
                        "failed",
                        json!({ "turn": turn_id.to_string(), "kind": kind.as_str() }),
                    ));
                }
            }
        }
        flow
    }

    /// Mark the in-flight turn failed, release the slot, and republish.
    fn finish_failed(&self, turn_id: TurnId, kind: FailureKind, message: &str) {
        {
            let mut inner = self.lock();
            Self::with_turn(&mut inner, turn_id, |turn| turn.fail(kind, message));
            Self::release(&mut inner);
        }
        self.publish();
        self.logger.log(ChatEvent::new(
            "failed",
            json!({
                "turn": turn_id.to_string(),
                "kind": kind.as_str(),
                "message": message,
            }),
        ));
    }

    /// Patch a turn that the controller itself created.
    ///
    /// The id cannot be stale under correct use; if it somehow is, the bug
    /// is logged instead of panicking mid-stream.
    fn with_turn<R>(inner: &mut Inner, turn_id: TurnId, patch: impl FnOnce(&mut Turn) -> R) -> Option<R> {
        match inner.transcript.mutate(turn_id, patch) {
            Ok(result) => Some(result),
            Err(e) => {
                error!(error = %e, "transcript rejected controller mutation");
                None
            }
        }
    }

    /// Drop the active request slot and return to idle.
    fn release(inner: &mut Inner) {
        inner.state = SessionState::Idle;
        inner.active = None;
    }

    fn publish(&self) {
        let snapshot = {
            let inner = self.lock();
            ConversationSnapshot {
                turns: inner.transcript.snapshot(),
                busy: inner.state != SessionState::Idle,
            }
        };
        self.snapshots.send_replace(snapshot);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Recover rather than poison-cascade: the transcript is still
        // consistent because mutations are applied whole under the lock.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docschat_domain::{Role, ToolStatus, TurnStatus};
    use std::collections::VecDeque;
    use tokio::sync::mpsc;

    use crate::ports::chat_gateway::{GatewayError, StreamHandle};

    /// Gateway whose streams are fed manually by the test.
    struct TestGateway {
        streams: Mutex<VecDeque<mpsc::Receiver<TransportEvent>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl TestGateway {
        fn new() -> Self {
            Self {
                streams: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Queue one stream and return the sender that feeds it.
        fn stream(&self) -> mpsc::Sender<TransportEvent> {
            let (tx, rx) = mpsc::channel(32);
            self.streams.lock().unwrap().push_back(rx);
            tx
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatGateway for TestGateway {
        async fn open(&self, request: ChatRequest) -> Result<StreamHandle, GatewayError> {
            self.requests.lock().unwrap().push(request);
            let rx = self
                .streams
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| GatewayError::ConnectionError("no scripted stream".into()))?;
            Ok(StreamHandle::new(rx, CancellationToken::new()))
        }
    }

    fn session_with(gateway: &Arc<TestGateway>, config: SessionConfig) -> Arc<ChatSession> {
        Arc::new(ChatSession::new(
            Arc::clone(gateway) as Arc<dyn ChatGateway>,
            config,
        ))
    }

    /// Wait until the published snapshot satisfies a predicate.
    async fn wait_for(
        rx: &mut watch::Receiver<ConversationSnapshot>,
        predicate: impl Fn(&ConversationSnapshot) -> bool,
    ) {
        loop {
            if predicate(&rx.borrow()) {
                return;
            }
            rx.changed().await.expect("session dropped");
        }
    }

    #[tokio::test]
    async fn happy_path_streams_deltas_into_one_assistant_turn() {
        let gateway = Arc::new(TestGateway::new());
        let tx = gateway.stream();
        let session = session_with(
            &gateway,
            SessionConfig::new("docs-assistant")
                .with_hidden_context("Doc: component:default/website"),
        );

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("What is this?").await })
        };

        tx.send(TransportEvent::TextDelta("It is".into())).await.unwrap();
        tx.send(TransportEvent::TextDelta(" a guide.".into())).await.unwrap();
        tx.send(TransportEvent::Done).await.unwrap();
        task.await.unwrap().unwrap();

        let snapshot = session.snapshot();
        assert!(!snapshot.busy);
        assert_eq!(snapshot.turns.len(), 2);

        assert_eq!(snapshot.turns[0].role, Role::User);
        assert_eq!(snapshot.turns[0].content, "What is this?");

        assert_eq!(snapshot.turns[1].role, Role::Assistant);
        assert_eq!(snapshot.turns[1].content, "It is a guide.");
        assert_eq!(snapshot.turns[1].status, TurnStatus::Complete);

        // The hidden context went out as its own field...
        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message.text, "What is this?");
        assert_eq!(
            requests[0].message.context.as_deref(),
            Some("Doc: component:default/website")
        );

        // ...and never into the visible transcript.
        for turn in &snapshot.turns {
            assert!(!turn.content.contains("Doc: component:default/website"));
        }
    }

    #[tokio::test]
    async fn submit_while_busy_is_rejected_and_store_unchanged() {
        let gateway = Arc::new(TestGateway::new());
        let tx = gateway.stream();
        let session = session_with(&gateway, SessionConfig::new("docs-assistant"));
        let mut snapshots = session.subscribe();

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("x").await })
        };
        wait_for(&mut snapshots, |s| s.busy).await;

        let before = session.snapshot();
        assert_eq!(before.turns[1].status, TurnStatus::Pending);

        assert_eq!(session.submit("y").await, Err(SessionError::Busy));
        let after = session.snapshot();
        assert_eq!(after.turns, before.turns);

        let user_turns: Vec<_> = after
            .turns
            .iter()
            .filter(|t| t.role == Role::User)
            .collect();
        assert_eq!(user_turns.len(), 1);
        assert_eq!(user_turns[0].content, "x");

        tx.send(TransportEvent::Done).await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn turn_order_matches_submission_order() {
        let gateway = Arc::new(TestGateway::new());
        let session = session_with(&gateway, SessionConfig::new("docs-assistant"));

        for text in ["one", "two", "three"] {
            let tx = gateway.stream();
            let task = {
                let session = Arc::clone(&session);
                let text = text.to_string();
                tokio::spawn(async move { session.submit(&text).await })
            };
            tx.send(TransportEvent::TextDelta(format!("re: {text}")))
                .await
                .unwrap();
            tx.send(TransportEvent::Done).await.unwrap();
            task.await.unwrap().unwrap();
        }

        let snapshot = session.snapshot();
        let contents: Vec<_> = snapshot.turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["one", "re: one", "two", "re: two", "three", "re: three"]
        );
    }

    #[tokio::test]
    async fn tool_lifecycle_is_tracked_fifo() {
        let gateway = Arc::new(TestGateway::new());
        let tx = gateway.stream();
        let session = session_with(&gateway, SessionConfig::new("docs-assistant"));

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("search twice").await })
        };

        tx.send(TransportEvent::ToolStart {
            tool_name: "documentSearch".into(),
            input: json!({"query": "auth"}),
        })
        .await
        .unwrap();
        tx.send(TransportEvent::ToolStart {
            tool_name: "documentSearch".into(),
            input: json!({"query": "deploy"}),
        })
        .await
        .unwrap();
        tx.send(TransportEvent::ToolResult {
            tool_name: "documentSearch".into(),
            output: json!({"resultCount": 2}),
            ok: true,
        })
        .await
        .unwrap();
        tx.send(TransportEvent::ToolResult {
            tool_name: "documentSearch".into(),
            output: json!({"error": "search unavailable"}),
            ok: false,
        })
        .await
        .unwrap();
        tx.send(TransportEvent::TextDelta("Found it.".into())).await.unwrap();
        tx.send(TransportEvent::Done).await.unwrap();
        task.await.unwrap().unwrap();

        let snapshot = session.snapshot();
        let turn = &snapshot.turns[1];
        assert_eq!(turn.tools.len(), 2);
        // FIFO: results resolved in initiation order
        assert_eq!(turn.tools[0].status, ToolStatus::Succeeded);
        assert_eq!(turn.tools[0].input["query"], "auth");
        assert_eq!(turn.tools[1].status, ToolStatus::Failed);
        assert_eq!(turn.status, TurnStatus::Complete);
    }

    #[tokio::test]
    async fn unmatched_tool_result_fails_the_turn() {
        let gateway = Arc::new(TestGateway::new());
        let tx = gateway.stream();
        let session = session_with(&gateway, SessionConfig::new("docs-assistant"));

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("hello").await })
        };

        tx.send(TransportEvent::ToolResult {
            tool_name: "documentSearch".into(),
            output: json!(null),
            ok: true,
        })
        .await
        .unwrap();
        task.await.unwrap().unwrap();

        let snapshot = session.snapshot();
        assert!(!snapshot.busy);
        let turn = &snapshot.turns[1];
        assert_eq!(turn.status, TurnStatus::Failed);
        assert_eq!(turn.failure, Some(FailureKind::Protocol));
        assert_eq!(turn.role, Role::Error);
        assert_eq!(turn.content, PROTOCOL_MESSAGE);
    }

    #[tokio::test]
    async fn cancel_during_streaming_marks_turn_cancelled() {
        let gateway = Arc::new(TestGateway::new());
        let tx = gateway.stream();
        let session = session_with(&gateway, SessionConfig::new("docs-assistant"));
        let mut snapshots = session.subscribe();

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("long question").await })
        };

        tx.send(TransportEvent::TextDelta("Partial".into())).await.unwrap();
        wait_for(&mut snapshots, |s| {
            s.turns.len() == 2 && s.turns[1].content == "Partial"
        })
        .await;

        session.cancel();
        task.await.unwrap().unwrap();

        let snapshot = session.snapshot();
        assert!(!snapshot.busy);
        let turn = &snapshot.turns[1];
        assert_eq!(turn.status, TurnStatus::Failed);
        assert_eq!(turn.failure, Some(FailureKind::Cancelled));
        assert_ne!(turn.failure, Some(FailureKind::Transport));
        assert_eq!(turn.content, format!("Partial\n\n{CANCELLED_MESSAGE}"));
    }

    #[tokio::test]
    async fn cancel_when_idle_is_a_noop() {
        let gateway = Arc::new(TestGateway::new());
        let session = session_with(&gateway, SessionConfig::new("docs-assistant"));

        session.cancel();
        assert!(!session.is_busy());
        assert!(session.snapshot().turns.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_returns_session_to_idle_and_usable() {
        let gateway = Arc::new(TestGateway::new());
        let tx = gateway.stream();
        let session = session_with(&gateway, SessionConfig::new("docs-assistant"));

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("first").await })
        };
        tx.send(TransportEvent::Failure("backend unavailable".into()))
            .await
            .unwrap();
        task.await.unwrap().unwrap();

        let snapshot = session.snapshot();
        assert!(!snapshot.busy);
        assert_eq!(snapshot.turns[1].status, TurnStatus::Failed);
        assert_eq!(snapshot.turns[1].failure, Some(FailureKind::Transport));
        assert_eq!(snapshot.turns[1].content, "backend unavailable");

        // The session can retry immediately
        let tx = gateway.stream();
        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("second").await })
        };
        tx.send(TransportEvent::Done).await.unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(session.snapshot().turns.len(), 4);
    }

    #[tokio::test]
    async fn open_error_becomes_transport_failure() {
        let gateway = Arc::new(TestGateway::new());
        // No scripted stream: open() fails
        let session = session_with(&gateway, SessionConfig::new("docs-assistant"));

        session.submit("hello").await.unwrap();

        let snapshot = session.snapshot();
        assert!(!snapshot.busy);
        assert_eq!(snapshot.turns[1].status, TurnStatus::Failed);
        assert_eq!(snapshot.turns[1].failure, Some(FailureKind::Transport));
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_times_out_a_silent_stream() {
        let gateway = Arc::new(TestGateway::new());
        let tx = gateway.stream();
        let session = session_with(
            &gateway,
            SessionConfig::new("docs-assistant").with_event_timeout(Duration::from_secs(5)),
        );

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("anyone there?").await })
        };
        // Never send anything; paused time auto-advances past the watchdog
        task.await.unwrap().unwrap();
        drop(tx);

        let snapshot = session.snapshot();
        assert!(!snapshot.busy);
        let turn = &snapshot.turns[1];
        assert_eq!(turn.status, TurnStatus::Failed);
        assert_eq!(turn.failure, Some(FailureKind::Timeout));
        assert_eq!(turn.content, TIMEOUT_MESSAGE);
    }

    #[tokio::test]
    async fn clear_requires_idle() {
        let gateway = Arc::new(TestGateway::new());
        let tx = gateway.stream();
        let session = session_with(&gateway, SessionConfig::new("docs-assistant"));
        let mut snapshots = session.subscribe();

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("x").await })
        };
        wait_for(&mut snapshots, |s| s.busy).await;

        assert_eq!(session.clear(), Err(SessionError::Busy));

        tx.send(TransportEvent::Done).await.unwrap();
        task.await.unwrap().unwrap();

        session.clear().unwrap();
        let snapshot = session.snapshot();
        assert!(snapshot.turns.is_empty());
        assert!(!snapshot.busy);
    }

    #[tokio::test]
    async fn snapshots_publish_intermediate_progress() {
        let gateway = Arc::new(TestGateway::new());
        let tx = gateway.stream();
        let session = session_with(&gateway, SessionConfig::new("docs-assistant"));
        let mut snapshots = session.subscribe();

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("stream it").await })
        };

        tx.send(TransportEvent::TextDelta("chunk".into())).await.unwrap();
        // Subscribers see the delta while the request is still in flight
        wait_for(&mut snapshots, |s| {
            s.busy && s.turns.len() == 2 && s.turns[1].content == "chunk"
        })
        .await;

        tx.send(TransportEvent::Done).await.unwrap();
        task.await.unwrap().unwrap();
        wait_for(&mut snapshots, |s| !s.busy).await;
    }
}

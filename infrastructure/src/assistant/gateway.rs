//! HTTP chat gateway implementation.
//!
//! [`HttpAssistantGateway`] implements the application layer's
//! [`ChatGateway`] port over the backend's streaming chat endpoint. Each
//! opened stream gets a background reader task that owns the HTTP response
//! body, decodes newline-delimited wire events, and forwards them as
//! [`TransportEvent`]s over a bounded channel.
//!
//! The reader enforces the adapter contract: at most one terminal event per
//! stream, silence afterward, and prompt shutdown when the returned
//! cancellation token fires.

use async_trait::async_trait;
use docschat_application::ports::chat_gateway::{
    ChatGateway, ChatRequest, GatewayError, StreamHandle,
};
use docschat_domain::TransportEvent;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::{AssistantError, Result};
use super::protocol::{self, ChatStreamBody};

/// Bounded capacity for the per-stream event channel. Backpressure, not
/// growth, if the backend outruns event application.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Chat gateway implementation for the portal's assistant backend.
#[derive(Debug)]
pub struct HttpAssistantGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAssistantGateway {
    /// Create a gateway for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AssistantError::InvalidBaseUrl(base_url));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Streaming chat endpoint for an agent.
    fn chat_url(&self, agent_id: &str) -> String {
        format!("{}/api/genai/v1/agents/{}/chat", self.base_url, agent_id)
    }
}

#[async_trait]
impl ChatGateway for HttpAssistantGateway {
    async fn open(&self, request: ChatRequest) -> std::result::Result<StreamHandle, GatewayError> {
        let url = self.chat_url(request.agent_id.as_str());
        let body = ChatStreamBody::from(&request.message);

        debug!(%url, "opening chat stream");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::UnknownAgent(
                request.agent_id.as_str().to_string(),
            ));
        }
        if !status.is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "backend returned status {status}"
            )));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancellation = CancellationToken::new();

        tokio::spawn(pump_stream(response, tx, cancellation.clone()));

        Ok(StreamHandle::new(rx, cancellation))
    }
}

/// Forward decoded wire events from the response body to the session.
///
/// Runs until a terminal event has been forwarded, the body ends, the
/// receiver is dropped, or the cancellation token fires — whichever comes
/// first. Exactly one terminal event is ever sent.
async fn pump_stream(
    response: reqwest::Response,
    tx: mpsc::Sender<TransportEvent>,
    cancellation: CancellationToken,
) {
    let mut body = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    loop {
        let chunk = tokio::select! {
            _ = cancellation.cancelled() => {
                debug!("chat stream cancelled");
                return;
            }
            chunk = body.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                buffer.extend_from_slice(&bytes);
                for line in protocol::drain_lines(&mut buffer) {
                    match protocol::parse_line(&line) {
                        Ok(None) => {}
                        Ok(Some(event)) => {
                            let terminal = event.is_terminal();
                            if tx.send(event.into()).await.is_err() {
                                // Session went away; nothing left to deliver.
                                return;
                            }
                            if terminal {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "dropping malformed chat stream");
                            let _ = tx
                                .send(TransportEvent::Failure(
                                    "The assistant sent an unreadable response.".to_string(),
                                ))
                                .await;
                            return;
                        }
                    }
                }
            }
            Some(Err(e)) => {
                warn!(error = %e, "chat stream transport error");
                let _ = tx.send(TransportEvent::Failure(e.to_string())).await;
                return;
            }
            None => {
                // Body ended without done/error; surface it rather than hang.
                warn!("chat stream ended without a terminal event");
                let _ = tx
                    .send(TransportEvent::Failure(
                        "The assistant connection closed unexpectedly.".to_string(),
                    ))
                    .await;
                return;
            }
        }
    }
}

//! Dialog backend bridge
//!
//! One conversation session per call. Inbound turn messages arrive as
//! framed JSON message sets; the receive loop buffers to complete
//! message boundaries, drops caller-originated echoes, and batches bot
//! messages until the backend is ready for user input or explicitly
//! signals forwarding. Outbound user turns are posted independently of
//! the receive direction.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use callpilot_core::TurnMessage;

use crate::traits::{BackendEvent, BackendFrame, BackendStream};
use crate::BridgeError;

/// Wire envelope for one streamed message boundary: zero or more turn
/// messages delivered together.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TurnMessageSet {
    #[serde(default)]
    pub messages: Vec<TurnMessage>,
}

/// An open conversation with the dialog backend
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendSessionHandle {
    pub session_id: String,
    /// Where the backend streams its side of the conversation
    pub stream_url: String,
}

/// Batching receive loop plus the outbound post path for one call
pub struct BackendChannelBridge {
    call_id: String,
    /// Messages not from this sender are caller echoes and dropped
    bot_name: String,
}

impl BackendChannelBridge {
    pub fn new(call_id: impl Into<String>, bot_name: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            bot_name: bot_name.into(),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Read streamed frames until the backend closes.
    ///
    /// Messages accumulate into a pending batch; the batch is flushed
    /// to `on_batch` when the most recent message's input hint is not
    /// `ignoring`, or when it carries a forward entity. A partial JSON
    /// message spanning frame boundaries is never flushed early: the
    /// byte buffer keeps growing until it parses. A message that is
    /// malformed beyond truncation is dropped whole.
    pub async fn receive_loop<S, F, Fut>(
        &self,
        mut stream: S,
        mut on_batch: F,
    ) -> Result<(), BridgeError>
    where
        S: BackendStream,
        F: FnMut(Vec<TurnMessage>, String) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let mut buffer: Vec<u8> = Vec::new();
        let mut pending: Vec<TurnMessage> = Vec::new();
        loop {
            match stream.recv().await? {
                BackendEvent::Frame(frame) => {
                    buffer.extend_from_slice(&frame.data);
                    if !frame.end_of_message || buffer.is_empty() {
                        continue;
                    }
                    match serde_json::from_slice::<TurnMessageSet>(&buffer) {
                        Ok(set) => {
                            buffer.clear();
                            self.accept(set, &mut pending, &mut on_batch).await;
                        },
                        // Truncated JSON keeps buffering until a later
                        // frame completes it.
                        Err(err) if err.is_eof() => {
                            debug!(%err, buffered = buffer.len(), "message boundary not parseable yet")
                        },
                        // Anything else can never become valid by
                        // appending more bytes; drop it so later
                        // messages still parse.
                        Err(err) => {
                            warn!(%err, dropped = buffer.len(), "malformed message dropped");
                            buffer.clear();
                        },
                    }
                },
                BackendEvent::Closed => {
                    // Drain a complete in-flight message, then stop.
                    if !buffer.is_empty() {
                        match serde_json::from_slice::<TurnMessageSet>(&buffer) {
                            Ok(set) => self.accept(set, &mut pending, &mut on_batch).await,
                            Err(err) => {
                                warn!(%err, dropped = buffer.len(), "incomplete message at close")
                            },
                        }
                    }
                    info!(call_id = %self.call_id, "backend stream closed");
                    return Ok(());
                },
            }
        }
    }

    async fn accept<F, Fut>(
        &self,
        set: TurnMessageSet,
        pending: &mut Vec<TurnMessage>,
        on_batch: &mut F,
    ) where
        F: FnMut(Vec<TurnMessage>, String) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        for message in set.messages {
            if !message.is_from(&self.bot_name) {
                debug!(from = %message.from.name, "dropping non-bot message");
                continue;
            }
            let is_forwarding = message.forwarding_number().is_some();
            let ready_for_input = !message.input_hint.is_ignoring();
            pending.push(message);
            if ready_for_input || is_forwarding {
                let batch = std::mem::take(pending);
                on_batch(batch, self.call_id.clone()).await;
            }
        }
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, BridgeError>> + Send>>;

/// Backend stream over newline-delimited JSON chunks.
///
/// Each line is one message boundary; a chunk ending mid-line yields a
/// non-final frame so the receive loop keeps buffering.
pub struct NdjsonBackendStream {
    inner: ByteStream,
    queued: VecDeque<BackendEvent>,
    closed: bool,
}

impl NdjsonBackendStream {
    pub fn new(inner: ByteStream) -> Self {
        Self {
            inner,
            queued: VecDeque::new(),
            closed: false,
        }
    }

    fn enqueue_chunk(&mut self, chunk: &[u8]) {
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            let (line, tail) = rest.split_at(pos);
            if !line.is_empty() {
                self.queued.push_back(BackendEvent::Frame(BackendFrame {
                    data: line.to_vec(),
                    end_of_message: true,
                }));
            } else {
                // Bare newline still terminates whatever was buffered.
                self.queued.push_back(BackendEvent::Frame(BackendFrame {
                    data: Vec::new(),
                    end_of_message: true,
                }));
            }
            rest = &tail[1..];
        }
        if !rest.is_empty() {
            self.queued.push_back(BackendEvent::Frame(BackendFrame {
                data: rest.to_vec(),
                end_of_message: false,
            }));
        }
    }
}

#[async_trait::async_trait]
impl BackendStream for NdjsonBackendStream {
    async fn recv(&mut self) -> Result<BackendEvent, BridgeError> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Ok(event);
            }
            if self.closed {
                return Ok(BackendEvent::Closed);
            }
            match self.inner.next().await {
                Some(chunk) => self.enqueue_chunk(&chunk?),
                None => {
                    self.closed = true;
                    return Ok(BackendEvent::Closed);
                },
            }
        }
    }
}

/// Backend stream fed from an in-process channel. Used when the dialog
/// backend runs inside the same server as the bridges.
pub struct ChannelBackendStream {
    rx: tokio::sync::mpsc::Receiver<BackendEvent>,
}

impl ChannelBackendStream {
    pub fn new(rx: tokio::sync::mpsc::Receiver<BackendEvent>) -> Self {
        Self { rx }
    }
}

#[async_trait::async_trait]
impl BackendStream for ChannelBackendStream {
    async fn recv(&mut self) -> Result<BackendEvent, BridgeError> {
        // A dropped sender is a normal end of conversation.
        Ok(self.rx.recv().await.unwrap_or(BackendEvent::Closed))
    }
}

/// HTTP client for the dialog backend's conversation API
#[derive(Debug, Clone)]
pub struct HttpBackendConnector {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackendConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Start a conversation for this call. The handle carries the
    /// session id and the streaming endpoint.
    pub async fn open(&self, call_id: &str) -> Result<BackendSessionHandle, BridgeError> {
        let response = self
            .client
            .post(format!("{}/conversations", self.base_url))
            .json(&serde_json::json!({ "callId": call_id }))
            .send()
            .await?
            .error_for_status()?;
        let handle: BackendSessionHandle = response.json().await?;
        info!(call_id, session_id = %handle.session_id, "backend session opened");
        Ok(handle)
    }

    /// Connect to the session's stream of turn messages
    pub async fn stream(
        &self,
        handle: &BackendSessionHandle,
    ) -> Result<NdjsonBackendStream, BridgeError> {
        let response = self
            .client
            .get(&handle.stream_url)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(BridgeError::from));
        Ok(NdjsonBackendStream::new(Box::pin(bytes)))
    }

    /// Post one outbound turn into the session
    pub async fn post(
        &self,
        handle: &BackendSessionHandle,
        message: &TurnMessage,
    ) -> Result<(), BridgeError> {
        self.client
            .post(format!(
                "{}/conversations/{}/messages",
                self.base_url, handle.session_id
            ))
            .json(message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

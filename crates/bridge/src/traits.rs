//! Transport and speech capability traits
//!
//! The bridges are written against these traits so the server can plug
//! in websockets and tests can plug in scripted transports.

use async_trait::async_trait;

use crate::BridgeError;

/// One binary frame from the telephony socket. A message may span
/// several frames; the last one carries `end_of_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub data: Vec<u8>,
    pub end_of_message: bool,
}

/// What the audio receive loop can observe next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    Frame(AudioFrame),
    /// Close frame; the peer's status code is echoed back
    Closed { status: Option<u16> },
}

/// Receive half of the telephony socket
#[async_trait]
pub trait AudioSource: Send {
    async fn recv(&mut self) -> Result<AudioEvent, BridgeError>;
}

/// Send half of the telephony socket. Implementations must deliver
/// chunks in call order; the bridge serializes callers.
#[async_trait]
pub trait AudioSink: Send {
    async fn send_chunk(&mut self, data: &[u8], is_final: bool) -> Result<(), BridgeError>;
    /// Echo the close handshake with the peer's status code
    async fn close(&mut self, status: Option<u16>) -> Result<(), BridgeError>;
}

/// One text frame from the backend stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFrame {
    pub data: Vec<u8>,
    pub end_of_message: bool,
}

/// What the backend receive loop can observe next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Frame(BackendFrame),
    Closed,
}

/// Streamed turn-message frames from the dialog backend
#[async_trait]
pub trait BackendStream: Send {
    async fn recv(&mut self) -> Result<BackendEvent, BridgeError>;
}

#[async_trait]
impl<T: BackendStream + ?Sized> BackendStream for Box<T> {
    async fn recv(&mut self) -> Result<BackendEvent, BridgeError> {
        (**self).recv().await
    }
}

/// Speech-to-text capability consumed by the audio bridge
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn recognize(&self, audio: &[u8]) -> Result<String, BridgeError>;
}

/// Text-to-speech capability consumed by the session owner
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BridgeError>;
}

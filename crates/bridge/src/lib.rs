//! Duplex bridges
//!
//! Two bridges carry one call:
//! - [`AudioChannelBridge`] owns the telephony-side socket: inbound
//!   binary frames are reassembled into utterances and transcribed;
//!   outbound synthesized speech is streamed in fixed-size chunks.
//! - [`BackendChannelBridge`] owns the dialog backend session: framed
//!   JSON turn messages are batched and delivered to a handler;
//!   outbound turns are posted into the session.
//!
//! They meet at one signal: a turn message carrying a `forward` entity
//! makes the backend bridge flush immediately so the call can be
//! redirected instead of spoken to.

pub mod audio;
pub mod backend;
pub mod traits;

use thiserror::Error;

pub use audio::{AudioChannelBridge, SpeechSender, AUDIO_CHUNK_SIZE};
pub use backend::{
    BackendChannelBridge, BackendSessionHandle, ChannelBackendStream, HttpBackendConnector,
    NdjsonBackendStream, TurnMessageSet,
};
pub use traits::{
    AudioEvent, AudioFrame, AudioSink, AudioSource, BackendEvent, BackendFrame, BackendStream,
    Synthesizer, Transcriber,
};

/// Bridge failures. All of them tear the session down silently from
/// the caller's perspective; they are logged for operators.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The peer closed or the transport errored; never retried
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// An inbound frame violated the framing contract
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    /// The dialog backend rejected a request
    #[error("backend request failed: {0}")]
    Backend(String),
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::Backend(err.to_string())
    }
}

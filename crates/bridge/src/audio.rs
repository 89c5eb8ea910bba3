//! Telephony-side audio bridge
//!
//! The receive loop reassembles fragmented binary frames into complete
//! utterances, transcribes them and emits the text as user turn
//! messages. The send path streams synthesized speech in fixed-size
//! chunks, all but the last flagged non-final.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use callpilot_core::TurnMessage;

use crate::traits::{AudioEvent, AudioSink, AudioSource, Transcriber};
use crate::BridgeError;

/// Outbound speech chunk size in bytes. The telephony peer expects
/// fixed-size frames; the final chunk carries the remainder.
pub const AUDIO_CHUNK_SIZE: usize = 640;

/// Serialized access to the send half of the telephony socket.
///
/// Cloneable so the session owner and the receive loop (for the close
/// echo) can both reach the sink; the mutex keeps writes strictly
/// sequential, chunk order preserved.
pub struct SpeechSender<K> {
    sink: Arc<Mutex<K>>,
    chunk_size: usize,
}

impl<K> Clone for SpeechSender<K> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            chunk_size: self.chunk_size,
        }
    }
}

impl<K: AudioSink> SpeechSender<K> {
    pub fn new(sink: K) -> Self {
        Self::with_chunk_size(sink, AUDIO_CHUNK_SIZE)
    }

    pub fn with_chunk_size(sink: K, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        Self {
            sink: Arc::new(Mutex::new(sink)),
            chunk_size,
        }
    }

    /// Stream synthesized audio to the peer in `chunk_size` pieces.
    ///
    /// A transport failure aborts the remaining chunks and surfaces as
    /// `ChannelClosed`; nothing is retried.
    pub async fn send_synthesized_speech(&self, audio: &[u8]) -> Result<(), BridgeError> {
        if audio.is_empty() {
            return Ok(());
        }
        let mut sink = self.sink.lock().await;
        let mut chunks = audio.chunks(self.chunk_size).peekable();
        while let Some(chunk) = chunks.next() {
            let is_final = chunks.peek().is_none();
            sink.send_chunk(chunk, is_final).await?;
        }
        debug!(bytes = audio.len(), "synthesized speech sent");
        Ok(())
    }

    /// Echo the peer's close handshake
    pub async fn close(&self, status: Option<u16>) -> Result<(), BridgeError> {
        self.sink.lock().await.close(status).await
    }
}

/// Receive side of the telephony socket for one call
pub struct AudioChannelBridge<S, K> {
    source: S,
    sender: SpeechSender<K>,
    transcriber: Arc<dyn Transcriber>,
    /// Sender name stamped on emitted user turns
    caller_name: String,
    /// Utterance texts flow to the backend bridge through here
    outbound: mpsc::Sender<TurnMessage>,
}

impl<S: AudioSource, K: AudioSink> AudioChannelBridge<S, K> {
    pub fn new(
        source: S,
        sender: SpeechSender<K>,
        transcriber: Arc<dyn Transcriber>,
        caller_name: impl Into<String>,
        outbound: mpsc::Sender<TurnMessage>,
    ) -> Self {
        Self {
            source,
            sender,
            transcriber,
            caller_name: caller_name.into(),
            outbound,
        }
    }

    /// Run the receive loop until the peer closes.
    ///
    /// Frames are buffered until an end-of-message marker, then the
    /// complete utterance is transcribed and emitted as one user turn.
    /// A close frame is echoed back with the peer's status code.
    pub async fn accept_audio_stream(mut self) -> Result<(), BridgeError> {
        let mut utterance: Vec<u8> = Vec::new();
        loop {
            match self.source.recv().await? {
                AudioEvent::Frame(frame) => {
                    utterance.extend_from_slice(&frame.data);
                    if !frame.end_of_message {
                        continue;
                    }
                    let audio = std::mem::take(&mut utterance);
                    if audio.is_empty() {
                        continue;
                    }
                    match self.transcriber.recognize(&audio).await {
                        Ok(text) if text.is_empty() => {
                            debug!("utterance transcribed to nothing, dropped")
                        },
                        Ok(text) => {
                            let turn = TurnMessage::user(self.caller_name.clone(), text);
                            if self.outbound.send(turn).await.is_err() {
                                return Err(BridgeError::ChannelClosed(
                                    "backend bridge gone".into(),
                                ));
                            }
                        },
                        // A failed transcription loses one utterance,
                        // not the call.
                        Err(err) => warn!(%err, "transcription failed"),
                    }
                },
                AudioEvent::Closed { status } => {
                    info!(?status, "telephony peer closed, echoing handshake");
                    self.sender.close(status).await.ok();
                    return Ok(());
                },
            }
        }
    }
}

//! Speech capability implementations
//!
//! Production deployments plug a speech provider in behind the
//! [`Transcriber`] and [`Synthesizer`] traits. The passthrough below
//! treats the audio payload as UTF-8 text in both directions, which is
//! what the test harness and text-mode softphone clients speak.

use async_trait::async_trait;

use callpilot_bridge::{BridgeError, Synthesizer, Transcriber};

/// Text-as-audio passthrough for text-mode clients
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSpeech;

#[async_trait]
impl Transcriber for PlainTextSpeech {
    async fn recognize(&self, audio: &[u8]) -> Result<String, BridgeError> {
        String::from_utf8(audio.to_vec())
            .map(|text| text.trim().to_string())
            .map_err(|err| BridgeError::Transcription(err.to_string()))
    }
}

#[async_trait]
impl Synthesizer for PlainTextSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BridgeError> {
        Ok(text.as_bytes().to_vec())
    }
}

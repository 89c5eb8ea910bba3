//! WebSocket call endpoint
//!
//! One websocket per call. Binary messages carry caller audio; the
//! split halves are adapted to the audio bridge's source and sink
//! traits so the session wiring never sees axum types.

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::warn;

use callpilot_bridge::{AudioEvent, AudioFrame, AudioSink, AudioSource, BridgeError};

use crate::session::run_call;
use crate::state::AppState;

/// GET /ws/call/:call_id
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, call_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, call_id: String) {
    if !state.register_call(&call_id) {
        warn!(call_id = %call_id, "call id already connected, dropping");
        return;
    }
    let (sink, stream) = socket.split();
    run_call(
        state,
        call_id,
        WsAudioSource { stream },
        WsAudioSink { sink },
    )
    .await;
}

pub struct WsAudioSource {
    stream: SplitStream<WebSocket>,
}

#[async_trait]
impl AudioSource for WsAudioSource {
    async fn recv(&mut self) -> Result<AudioEvent, BridgeError> {
        loop {
            match self.stream.next().await {
                None => return Ok(AudioEvent::Closed { status: None }),
                Some(Err(err)) => return Err(BridgeError::ChannelClosed(err.to_string())),
                // axum reassembles fragmented websocket messages, so
                // every binary message is a complete utterance.
                Some(Ok(Message::Binary(data))) => {
                    return Ok(AudioEvent::Frame(AudioFrame {
                        data,
                        end_of_message: true,
                    }))
                },
                Some(Ok(Message::Close(frame))) => {
                    return Ok(AudioEvent::Closed {
                        status: frame.map(|f| f.code),
                    })
                },
                // Pings are answered by axum; text is not audio.
                Some(Ok(_)) => continue,
            }
        }
    }
}

pub struct WsAudioSink {
    sink: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl AudioSink for WsAudioSink {
    async fn send_chunk(&mut self, data: &[u8], _is_final: bool) -> Result<(), BridgeError> {
        // The telephony peer consumes fixed-size binary messages;
        // message boundaries carry the finality.
        self.sink
            .send(Message::Binary(data.to_vec()))
            .await
            .map_err(|err| BridgeError::ChannelClosed(err.to_string()))
    }

    async fn close(&mut self, status: Option<u16>) -> Result<(), BridgeError> {
        let frame = status.map(|code| CloseFrame {
            code,
            reason: "".into(),
        });
        self.sink
            .send(Message::Close(frame))
            .await
            .map_err(|err| BridgeError::ChannelClosed(err.to_string()))
    }
}

//! Per-call session wiring
//!
//! One call runs three tasks: the audio receive loop, the dialog
//! backend (in-process engine or remote conversation API), and the
//! backend receive loop that speaks batched bot messages back to the
//! caller. Teardown is driven by the telephony side: when the peer
//! hangs up the turn channel drops and the backend side winds down.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use callpilot_bridge::{
    AudioChannelBridge, AudioSink, AudioSource, BackendChannelBridge, BackendEvent, BackendFrame,
    BackendStream, ChannelBackendStream, SpeechSender, TurnMessageSet,
};
use callpilot_core::{InputHint, SessionState, TurnMessage};
use callpilot_dialog::{phrases, DialogEngine, ResolverConfig, SessionSeed};

use crate::recognizer::IntentRecognizer;
use crate::settings::BackendMode;
use crate::state::AppState;

/// Run one call to completion. The caller must have registered the
/// call id; it is released here on the way out.
pub async fn run_call<S, K>(state: AppState, call_id: String, source: S, sink: K)
where
    S: AudioSource + Send + 'static,
    K: AudioSink + Send + 'static,
{
    let settings = Arc::clone(&state.settings);
    let speech = SpeechSender::with_chunk_size(sink, settings.server.audio_chunk_size);
    let (turn_tx, turn_rx) = mpsc::channel::<TurnMessage>(16);

    let bot_name = settings.backend.bot_name.clone();

    // Backend side first: a failed remote setup never answers the call.
    let setup = match settings.backend.mode {
        BackendMode::Local => {
            let seed = match &settings.crm.auth_token {
                Some(token) => SessionSeed::Provided(SessionState::with_token(token.clone())),
                None => SessionSeed::Fresh,
            };
            let engine = DialogEngine::new(
                ResolverConfig::new(
                    bot_name.clone(),
                    settings.crm.opportunity_owner_phone.clone(),
                ),
                Arc::clone(&state.crm),
                seed,
            );
            let (events_tx, events_rx) = mpsc::channel(16);
            let task = tokio::spawn(run_local_backend(
                engine,
                Arc::clone(&state.recognizer),
                bot_name.clone(),
                turn_rx,
                events_tx,
            ));
            let stream: Box<dyn BackendStream> = Box::new(ChannelBackendStream::new(events_rx));
            Ok((stream, task))
        },
        BackendMode::Remote => open_remote_backend(&state, &call_id, turn_rx).await,
    };
    let (stream, backend_task) = match setup {
        Ok(setup) => setup,
        Err(err) => {
            error!(call_id = %call_id, %err, "backend setup failed, dropping the call");
            speech.close(None).await.ok();
            state.finish_call(&call_id);
            return;
        },
    };

    let audio = AudioChannelBridge::new(
        source,
        speech.clone(),
        Arc::clone(&state.transcriber),
        settings.server.caller_name.clone(),
        turn_tx,
    );
    let audio_task = tokio::spawn(audio.accept_audio_stream());

    let bridge = BackendChannelBridge::new(call_id.clone(), bot_name);
    let synthesizer = Arc::clone(&state.synthesizer);
    let speech_out = speech.clone();
    let recv_task = tokio::spawn(async move {
        bridge
            .receive_loop(stream, move |batch, call_id| {
                let synthesizer = Arc::clone(&synthesizer);
                let speech = speech_out.clone();
                async move {
                    for message in batch {
                        // A forward signal redirects the call instead
                        // of being spoken.
                        if let Some(number) = message.forwarding_number() {
                            info!(call_id = %call_id, number, "forward signal received");
                            continue;
                        }
                        match synthesizer.synthesize(&message.text).await {
                            Ok(audio) => {
                                if let Err(err) = speech.send_synthesized_speech(&audio).await {
                                    warn!(call_id = %call_id, %err, "speech delivery failed");
                                    return;
                                }
                            },
                            Err(err) => {
                                warn!(call_id = %call_id, %err, "synthesis failed, message dropped")
                            },
                        }
                    }
                }
            })
            .await
    });

    // Either side ending drops the whole call.
    let mut audio_task = audio_task;
    let mut recv_task = recv_task;
    tokio::select! {
        result = &mut audio_task => {
            match result {
                Ok(Ok(())) => info!(call_id = %call_id, "audio channel closed"),
                Ok(Err(err)) => warn!(call_id = %call_id, %err, "audio channel failed"),
                Err(err) => warn!(call_id = %call_id, %err, "audio task aborted"),
            }
            // The turn channel is gone now; the backend task exits.
            let _ = backend_task.await;
            match settings.backend.mode {
                BackendMode::Local => {
                    // The local event stream closes itself; let the
                    // receive loop flush what is left.
                    if let Ok(Err(err)) = recv_task.await {
                        warn!(call_id = %call_id, %err, "backend receive loop failed");
                    }
                },
                BackendMode::Remote => recv_task.abort(),
            }
        },
        result = &mut recv_task => {
            if let Ok(Err(err)) = result {
                warn!(call_id = %call_id, %err, "backend receive loop failed");
            }
            info!(call_id = %call_id, "backend stream ended, dropping the call");
            speech.close(None).await.ok();
            audio_task.abort();
            backend_task.abort();
        },
    }

    state.finish_call(&call_id);
    info!(call_id = %call_id, "call session finished");
}

async fn open_remote_backend(
    state: &AppState,
    call_id: &str,
    mut turns: mpsc::Receiver<TurnMessage>,
) -> Result<(Box<dyn BackendStream>, JoinHandle<()>), callpilot_bridge::BridgeError> {
    let connector = state
        .backend
        .clone()
        .ok_or_else(|| callpilot_bridge::BridgeError::Backend("no connector configured".into()))?;
    let handle = connector.open(call_id).await?;
    let stream = connector.stream(&handle).await?;
    let task = tokio::spawn(async move {
        while let Some(turn) = turns.recv().await {
            if let Err(err) = connector.post(&handle, &turn).await {
                warn!(%err, "posting caller turn failed, stopping");
                break;
            }
        }
    });
    Ok((Box::new(stream), task))
}

/// In-process dialog backend: recognize fresh utterances, resume
/// suspended prompts, and emit each turn's replies as one framed
/// message set.
async fn run_local_backend(
    mut engine: DialogEngine,
    recognizer: Arc<dyn IntentRecognizer>,
    bot_name: String,
    mut turns: mpsc::Receiver<TurnMessage>,
    events: mpsc::Sender<BackendEvent>,
) {
    while let Some(turn) = turns.recv().await {
        let replies = if engine.is_suspended() {
            engine.handle_answer(&turn.text).await
        } else {
            match recognizer.recognize(&turn.text).await {
                Some((intent, attributes)) => engine.start(intent, attributes).await,
                None => {
                    debug!(text = %turn.text, "no intent recognized");
                    Ok(vec![TurnMessage::bot(
                        bot_name.clone(),
                        phrases::ask_for_request(),
                        InputHint::Accepting,
                    )])
                },
            }
        };
        let messages = match replies {
            Ok(messages) => messages,
            Err(err) => {
                error!(%err, "dialog failed, ending the conversation");
                break;
            },
        };
        let set = TurnMessageSet { messages };
        let data = match serde_json::to_vec(&set) {
            Ok(data) => data,
            Err(err) => {
                error!(%err, "turn message set not serializable");
                break;
            },
        };
        let frame = BackendEvent::Frame(BackendFrame {
            data,
            end_of_message: true,
        });
        // Dropping the sender closes the stream, which ends the
        // receive loop after its final drain.
        if events.send(frame).await.is_err() {
            break;
        }
    }
}

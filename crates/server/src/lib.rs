//! Call Server
//!
//! Accepts one websocket per phone call, wires the audio bridge to the
//! dialog backend, and tracks active calls.

pub mod http;
pub mod recognizer;
pub mod session;
pub mod settings;
pub mod speech;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use recognizer::{IntentRecognizer, KeywordRecognizer};
pub use session::run_call;
pub use settings::{BackendMode, CrmMode, Settings};
pub use speech::PlainTextSpeech;
pub use state::AppState;

//! Server configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `CALLPILOT__*` environment variables (double underscore separates
//! nesting, e.g. `CALLPILOT__CRM__BASE_URL`).

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub crm: CrmSettings,
    pub backend: BackendSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen_addr: String,
    /// Sender name stamped on transcribed caller turns
    pub caller_name: String,
    /// Outbound speech chunk size in bytes; the telephony peer's frame
    /// size
    pub audio_chunk_size: usize,
    /// Default tracing filter when RUST_LOG is unset
    pub log_filter: String,
    /// Emit JSON log lines instead of the human format
    pub log_json: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            caller_name: "Caller".to_string(),
            audio_chunk_size: callpilot_bridge::AUDIO_CHUNK_SIZE,
            log_filter: "callpilot=info,tower_http=info".to_string(),
            log_json: false,
        }
    }
}

/// How CRM lookups are served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrmMode {
    /// REST gateway against a CRM service
    Http,
    /// In-memory store, for development and demos
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmSettings {
    pub mode: CrmMode,
    pub base_url: String,
    /// Per-deployment CRM bearer token seeded into every session.
    /// Without it every lookup fails fast as a missing credential.
    pub auth_token: Option<String>,
    /// Owner phone number used to scope opportunity lookups
    pub opportunity_owner_phone: String,
}

impl Default for CrmSettings {
    fn default() -> Self {
        Self {
            mode: CrmMode::Http,
            base_url: "http://localhost:5000/api".to_string(),
            auth_token: None,
            opportunity_owner_phone: "32491180031".to_string(),
        }
    }
}

/// Where the dialog backend runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Dialog engine hosted in this process
    Local,
    /// Remote conversation API streaming NDJSON turn messages
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub mode: BackendMode,
    /// Conversation API base URL, remote mode only
    pub base_url: String,
    /// Sender name identifying bot messages on the stream
    pub bot_name: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            mode: BackendMode::Local,
            base_url: "http://localhost:3979".to_string(),
            bot_name: "Callpilot".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `config/callpilot.toml` (if present) and the
    /// environment.
    pub fn load() -> Result<Settings, ConfigError> {
        Self::load_from("config/callpilot")
    }

    pub fn load_from(path: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("CALLPILOT").separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the bridges cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.audio_chunk_size == 0 {
            return Err(ConfigError::Message(
                "server.audio_chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

//! Application state
//!
//! Shared across all handlers. One entry per active call; a call id
//! can only be connected once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use callpilot_bridge::{HttpBackendConnector, Synthesizer, Transcriber};
use callpilot_crm::{CrmGateway, HttpCrmGateway, StaticCrmGateway};

use crate::recognizer::{IntentRecognizer, KeywordRecognizer};
use crate::settings::{BackendMode, CrmMode, Settings};
use crate::speech::PlainTextSpeech;

/// Registry entry for one connected call
#[derive(Debug, Clone)]
pub struct CallHandle {
    pub started_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub crm: Arc<dyn CrmGateway>,
    pub recognizer: Arc<dyn IntentRecognizer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn Synthesizer>,
    /// Conversation API client, remote backend mode only
    pub backend: Option<Arc<HttpBackendConnector>>,
    pub calls: Arc<DashMap<String, CallHandle>>,
}

impl AppState {
    pub fn from_settings(settings: Settings) -> Self {
        let crm: Arc<dyn CrmGateway> = match settings.crm.mode {
            CrmMode::Http => Arc::new(HttpCrmGateway::new(settings.crm.base_url.clone())),
            CrmMode::Static => Arc::new(StaticCrmGateway::new()),
        };
        let backend = match settings.backend.mode {
            BackendMode::Remote => Some(Arc::new(HttpBackendConnector::new(
                settings.backend.base_url.clone(),
            ))),
            BackendMode::Local => None,
        };
        Self {
            settings: Arc::new(settings),
            crm,
            recognizer: Arc::new(KeywordRecognizer),
            transcriber: Arc::new(PlainTextSpeech),
            synthesizer: Arc::new(PlainTextSpeech),
            backend,
            calls: Arc::new(DashMap::new()),
        }
    }

    /// Swap the CRM gateway, for tests and demo fixtures
    pub fn with_crm(mut self, crm: Arc<dyn CrmGateway>) -> Self {
        self.crm = crm;
        self
    }

    /// Claim a call id. Returns false when the id is already live.
    pub fn register_call(&self, call_id: &str) -> bool {
        match self.calls.entry(call_id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(CallHandle {
                    started_at: Utc::now(),
                });
                true
            },
        }
    }

    pub fn finish_call(&self, call_id: &str) {
        self.calls.remove(call_id);
    }

    pub fn active_calls(&self) -> usize {
        self.calls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_ids_are_claimed_once() {
        let state = AppState::from_settings(Settings::default());
        assert!(state.register_call("call-1"));
        assert!(!state.register_call("call-1"));
        state.finish_call("call-1");
        assert!(state.register_call("call-1"));
    }

    #[test]
    fn local_mode_has_no_backend_connector() {
        let state = AppState::from_settings(Settings::default());
        assert!(state.backend.is_none());
        assert_eq!(state.active_calls(), 0);
    }
}

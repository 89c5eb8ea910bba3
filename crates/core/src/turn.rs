//! Turn messages exchanged with the dialog backend
//!
//! The wire format is JSON with `text`, `inputHint`, `from.name` and
//! `entities[].properties`. The forwarding signal is an entity whose
//! properties map contains the key `forward` with the phone number to
//! redirect the call to.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Entity key signalling that the call must be redirected rather than
/// spoken to. The value is the destination phone number.
pub const FORWARD_ENTITY_KEY: &str = "forward";

/// Whether the backend is ready for user input after this message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum InputHint {
    /// The backend expects the user to speak next
    #[default]
    Accepting,
    /// More backend messages follow; user input is not expected yet
    Ignoring,
}

impl InputHint {
    pub fn is_ignoring(&self) -> bool {
        matches!(self, InputHint::Ignoring)
    }
}

/// Identity of the party that produced a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Sender {
    #[serde(default)]
    pub name: String,
}

/// An attached entity: an opaque key/value property bag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TurnEntity {
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// One conversational unit, in either direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub input_hint: InputHint,
    #[serde(default)]
    pub from: Sender,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<TurnEntity>,
}

impl TurnMessage {
    /// A message spoken by the caller, ready for the backend
    pub fn user(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            input_hint: InputHint::Accepting,
            from: Sender { name: name.into() },
            entities: Vec::new(),
        }
    }

    /// A message produced by the bot
    pub fn bot(name: impl Into<String>, text: impl Into<String>, hint: InputHint) -> Self {
        Self {
            text: text.into(),
            input_hint: hint,
            from: Sender { name: name.into() },
            entities: Vec::new(),
        }
    }

    /// Attach a forward entity carrying the destination phone number
    pub fn with_forward(mut self, phone_number: impl Into<String>) -> Self {
        let mut properties = HashMap::new();
        properties.insert(FORWARD_ENTITY_KEY.to_string(), phone_number.into());
        self.entities.push(TurnEntity { properties });
        self
    }

    /// The destination number of the first forward entity, if any.
    ///
    /// Multiple forward entities on one message are not expected from
    /// the backend; the first one wins.
    pub fn forwarding_number(&self) -> Option<&str> {
        self.entities
            .iter()
            .find_map(|e| e.properties.get(FORWARD_ENTITY_KEY))
            .map(String::as_str)
    }

    pub fn is_from(&self, name: &str) -> bool {
        self.from.name == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_matches_backend_contract() {
        let msg = TurnMessage::bot("CallpilotBot", "I am forwarding the call.", InputHint::Ignoring)
            .with_forward("0491180031");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["inputHint"], "ignoring");
        assert_eq!(json["from"]["name"], "CallpilotBot");
        assert_eq!(json["entities"][0]["properties"]["forward"], "0491180031");
    }

    #[test]
    fn deserializes_with_missing_optional_fields() {
        let msg: TurnMessage =
            serde_json::from_str(r#"{"text":"hello","from":{"name":"bot"}}"#).unwrap();
        assert_eq!(msg.input_hint, InputHint::Accepting);
        assert!(msg.entities.is_empty());
        assert!(msg.forwarding_number().is_none());
    }

    #[test]
    fn first_forward_entity_wins() {
        let mut msg = TurnMessage::bot("bot", "", InputHint::Ignoring)
            .with_forward("111")
            .with_forward("222");
        assert_eq!(msg.forwarding_number(), Some("111"));
        // An entity without a forward key is skipped, not treated as a miss.
        msg.entities.insert(0, TurnEntity::default());
        assert_eq!(msg.forwarding_number(), Some("111"));
    }
}

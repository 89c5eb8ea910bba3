//! Core types for the call assistant
//!
//! This crate provides the types shared across all other crates:
//! - Turn messages exchanged with the dialog backend
//! - CRM models (companies, leads, opportunities)
//! - Intent and requested-attribute types from the recognizer
//! - Per-call session state

pub mod crm;
pub mod intent;
pub mod session;
pub mod turn;

pub use crm::{Company, Lead, Opportunity};
pub use intent::{AttributeTag, Intent, IntentState, RequestedAttributes};
pub use session::SessionState;
pub use turn::{InputHint, Sender, TurnEntity, TurnMessage, FORWARD_ENTITY_KEY};

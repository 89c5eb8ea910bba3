//! Per-call session state
//!
//! One call owns exactly one `SessionState`; it is created on the
//! first dialog turn and discarded when the call's dialog terminates
//! or the call disconnects. Dialog steps mutate it strictly
//! sequentially, so no interior locking is needed here.

use serde::{Deserialize, Serialize};

use crate::crm::{Company, Lead, Opportunity};
use crate::intent::IntentState;

/// CRM resolution state plus recognizer state for one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionState {
    /// Bearer token for the CRM; required before any gateway call
    pub auth_token: Option<String>,
    pub company: Company,
    pub lead: Lead,
    /// Fetched lazily, only when an opportunity attribute was requested
    pub opportunities: Option<Vec<Opportunity>>,
    pub intent: IntentState,
    /// The caller asked to place a call but the resolved lead has no number
    pub wants_call_but_number_missing: bool,
    /// Set only when the lead's phone is non-empty and the request was
    /// for the phone number alone
    pub eligible_for_forwarding: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            auth_token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Clear everything learned about the company under resolution
    pub fn reset_company(&mut self) {
        self.company = Company::default();
    }

    /// Clear everything learned about the lead under resolution
    pub fn reset_lead(&mut self) {
        self.lead = Lead::default();
        self.opportunities = None;
        self.wants_call_but_number_missing = false;
        self.eligible_for_forwarding = false;
    }

    /// Full reset at the end of a resolution flow
    pub fn reset_crm_and_intent(&mut self) {
        self.reset_company();
        self.reset_lead();
        self.intent.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{AttributeTag, Intent, IntentState};

    #[test]
    fn reset_lead_clears_flags_and_opportunities() {
        let mut state = SessionState::with_token("tok");
        state.lead.set_full_name("John Doe");
        state.opportunities = Some(vec![]);
        state.wants_call_but_number_missing = true;
        state.eligible_for_forwarding = true;

        state.reset_lead();
        assert!(!state.lead.has_full_name());
        assert!(state.opportunities.is_none());
        assert!(!state.wants_call_but_number_missing);
        assert!(!state.eligible_for_forwarding);
        // The token survives a lead reset.
        assert_eq!(state.auth_token.as_deref(), Some("tok"));
    }

    #[test]
    fn full_reset_clears_intent_state_too() {
        let mut state = SessionState::new();
        state.intent = IntentState::new(
            Intent::SearchLeadData,
            [AttributeTag::Phone].into_iter().collect(),
        );
        state.company.name = "Acme".into();
        state.reset_crm_and_intent();
        assert_eq!(state.intent.intent, None);
        assert!(state.intent.attributes.is_empty());
        assert!(state.company.name.is_empty());
    }
}

//! Dialog engine: one per call
//!
//! Owns the session state and the currently active resolver, routes
//! recognized intents to the right flow, and carries the company ->
//! lead hand-off. All stepping is strictly sequential; the engine is
//! driven by one task per call.

use std::sync::Arc;

use tracing::info;

use callpilot_core::{Intent, RequestedAttributes, SessionState, TurnMessage};
use callpilot_crm::CrmGateway;

use crate::company::CompanyResolver;
use crate::lead::LeadResolver;
use crate::step::{ResolverConfig, StepOutcome, StepStatus};
use crate::DialogError;

/// Whether the first turn starts from caller-supplied state or empty
pub enum SessionSeed {
    Fresh,
    Provided(SessionState),
}

enum Active {
    Company(CompanyResolver),
    Lead(LeadResolver),
}

/// Drives the resolution flows for one call
pub struct DialogEngine {
    config: ResolverConfig,
    gateway: Arc<dyn CrmGateway>,
    session: SessionState,
    active: Option<Active>,
}

impl DialogEngine {
    pub fn new(config: ResolverConfig, gateway: Arc<dyn CrmGateway>, seed: SessionSeed) -> Self {
        let session = match seed {
            SessionSeed::Fresh => SessionState::new(),
            SessionSeed::Provided(session) => session,
        };
        Self {
            config,
            gateway,
            session,
            active: None,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// A prompt is pending and the next caller turn is its answer
    pub fn is_suspended(&self) -> bool {
        self.active.is_some()
    }

    /// Begin a resolution flow for a freshly recognized intent.
    pub async fn start(
        &mut self,
        intent: Intent,
        attributes: RequestedAttributes,
    ) -> Result<Vec<TurnMessage>, DialogError> {
        if self.active.is_some() {
            return Err(DialogError::OutOfTurn("a dialog flow is already active"));
        }
        info!(intent = %intent, "starting resolution flow");
        self.session.intent = callpilot_core::IntentState::new(intent, attributes);
        self.active = Some(match intent {
            Intent::SearchCompanyData => {
                Active::Company(CompanyResolver::new(self.config.clone()))
            },
            Intent::SearchLeadData | Intent::MakeACall => {
                Active::Lead(LeadResolver::new(self.config.clone()))
            },
        });
        self.drive(None).await
    }

    /// Resume the suspended flow with the caller's answer.
    pub async fn handle_answer(&mut self, text: &str) -> Result<Vec<TurnMessage>, DialogError> {
        if self.active.is_none() {
            return Err(DialogError::OutOfTurn("no prompt is pending"));
        }
        self.drive(Some(text)).await
    }

    async fn drive(&mut self, answer: Option<&str>) -> Result<Vec<TurnMessage>, DialogError> {
        let mut messages = Vec::new();
        let mut answer = answer;
        loop {
            let outcome = self.step_active(answer).await?;
            messages.extend(outcome.messages);
            match outcome.status {
                StepStatus::Suspended => break,
                StepStatus::Done => {
                    self.active = None;
                    break;
                },
                StepStatus::RedirectToLead => {
                    // The lead flow picks up the copied contact; its
                    // first step runs without an answer.
                    self.active = Some(Active::Lead(LeadResolver::new(self.config.clone())));
                    answer = None;
                },
            }
        }
        Ok(messages)
    }

    async fn step_active(&mut self, answer: Option<&str>) -> Result<StepOutcome, DialogError> {
        let gateway = Arc::clone(&self.gateway);
        match self
            .active
            .as_mut()
            .ok_or(DialogError::OutOfTurn("no active flow"))?
        {
            Active::Company(resolver) => {
                resolver.step(answer, &mut self.session, gateway.as_ref()).await
            },
            Active::Lead(resolver) => {
                resolver.step(answer, &mut self.session, gateway.as_ref()).await
            },
        }
    }
}

//! Step driver types shared by the company and lead resolvers

use callpilot_core::TurnMessage;

/// Configuration shared by every resolver of one call
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Sender name stamped on every outgoing bot message
    pub bot_name: String,
    /// Owner phone number used to filter opportunity lookups
    pub opportunity_owner_phone: String,
}

impl ResolverConfig {
    pub fn new(
        bot_name: impl Into<String>,
        opportunity_owner_phone: impl Into<String>,
    ) -> Self {
        Self {
            bot_name: bot_name.into(),
            opportunity_owner_phone: opportunity_owner_phone.into(),
        }
    }
}

/// Where the state machine stands after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// A prompt was issued; the next caller answer resumes the step
    Suspended,
    /// This resolver is finished
    Done,
    /// Company resolution hands control to the lead resolver
    RedirectToLead,
}

/// Messages produced by one step plus the machine's resulting status
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub messages: Vec<TurnMessage>,
    pub status: StepStatus,
}

impl StepOutcome {
    pub fn suspended(messages: Vec<TurnMessage>) -> Self {
        Self {
            messages,
            status: StepStatus::Suspended,
        }
    }

    pub fn done(messages: Vec<TurnMessage>) -> Self {
        Self {
            messages,
            status: StepStatus::Done,
        }
    }

    pub fn redirect(messages: Vec<TurnMessage>) -> Self {
        Self {
            messages,
            status: StepStatus::RedirectToLead,
        }
    }
}

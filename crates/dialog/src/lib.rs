//! Dialog orchestration
//!
//! Turn-based resolution of CRM entities. Each recognized intent
//! spawns one orchestrator instance that walks the shared state
//! machine:
//!
//! `Init -> AskName -> Resolve -> {RetryPrompt -> Resolve (loop) |
//! ResultDispatch} -> {ConfirmForward -> End | End}`
//!
//! A step either completes immediately or suspends on a prompt until
//! the caller's answer arrives as the next turn. The company flow can
//! hand off to the lead flow mid-dialog when the caller asked for a
//! company's contact.

pub mod answer;
pub mod company;
pub mod engine;
pub mod format;
pub mod lead;
pub mod phrases;
pub mod step;

use thiserror::Error;

pub use answer::parse_yes_no;
pub use company::CompanyResolver;
pub use engine::{DialogEngine, SessionSeed};
pub use lead::LeadResolver;
pub use step::{ResolverConfig, StepOutcome, StepStatus};

use callpilot_crm::CrmError;

/// Dialog-level failures. CRM faults pass through unchanged; the
/// remaining variants are driver protocol violations.
#[derive(Error, Debug)]
pub enum DialogError {
    #[error(transparent)]
    Crm(#[from] CrmError),

    /// An answer turn arrived while no prompt was pending, or a
    /// suspended step was resumed without one.
    #[error("dialog step out of sync: {0}")]
    OutOfTurn(&'static str),
}

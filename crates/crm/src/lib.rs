//! CRM gateway
//!
//! Read-only lookups against the CRM backend: companies and leads by
//! name, opportunities by lead. Two implementations are provided:
//! [`HttpCrmGateway`] speaking the CRM's REST API with bearer
//! authentication, and [`StaticCrmGateway`], an in-memory fixture
//! store for tests and local development.

pub mod http;
pub mod static_store;

use async_trait::async_trait;
use thiserror::Error;

use callpilot_core::{Company, Lead, Opportunity};

pub use http::HttpCrmGateway;
pub use static_store::StaticCrmGateway;

/// CRM gateway errors
///
/// Not-found is not an error: lookups return `Ok(None)` or an empty
/// vector and the dialog recovers with a retry prompt. Everything in
/// this enum terminates the current resolution flow.
#[derive(Error, Debug)]
pub enum CrmError {
    /// No bearer token on the session; raised before any network call
    #[error("authentication token missing")]
    MissingCredential,

    /// The CRM rejected the credentials for this resource
    #[error("access to the CRM resource is forbidden")]
    Forbidden,

    #[error("CRM request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Read-only CRM lookups consumed by the dialog engine
#[async_trait]
pub trait CrmGateway: Send + Sync {
    /// Fetch a company by exact name. `Ok(None)` when unknown.
    async fn company_by_name(&self, token: &str, name: &str)
        -> Result<Option<Company>, CrmError>;

    /// Fetch a lead by exact first/last name. `Ok(None)` when unknown.
    async fn lead_by_name(
        &self,
        token: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Lead>, CrmError>;

    /// Fetch the opportunities a lead owns, filtered by owner phone.
    /// Empty when the lead has none.
    async fn opportunities(
        &self,
        token: &str,
        first_name: &str,
        last_name: &str,
        owner_phone: &str,
    ) -> Result<Vec<Opportunity>, CrmError>;
}

/// Guard shared by gateway implementations: a missing or empty token
/// is a precondition fault, detected before any I/O.
pub(crate) fn require_token(token: &str) -> Result<(), CrmError> {
    if token.is_empty() {
        return Err(CrmError::MissingCredential);
    }
    Ok(())
}

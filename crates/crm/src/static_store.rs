//! In-memory CRM fixture store
//!
//! Backs tests and local development runs. Names are matched exactly
//! and case-sensitively, the same policy the real CRM applies.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use callpilot_core::{Company, Lead, Opportunity};

use crate::{require_token, CrmError, CrmGateway};

/// Fixture-backed gateway
#[derive(Default)]
pub struct StaticCrmGateway {
    companies: RwLock<Vec<Company>>,
    leads: RwLock<Vec<Lead>>,
    opportunities: RwLock<HashMap<(String, String), Vec<Opportunity>>>,
    /// When set, every lookup fails with `Forbidden`
    deny_all: RwLock<bool>,
}

impl StaticCrmGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_company(&self, company: Company) {
        self.companies.write().push(company);
    }

    pub fn insert_lead(&self, lead: Lead) {
        self.leads.write().push(lead);
    }

    pub fn insert_opportunities(
        &self,
        first_name: &str,
        last_name: &str,
        opportunities: Vec<Opportunity>,
    ) {
        self.opportunities
            .write()
            .insert((first_name.to_string(), last_name.to_string()), opportunities);
    }

    /// Make every lookup fail with `Forbidden`, to exercise the
    /// fatal-fault path.
    pub fn deny_all(&self) {
        *self.deny_all.write() = true;
    }

    fn check_access(&self, token: &str) -> Result<(), CrmError> {
        require_token(token)?;
        if *self.deny_all.read() {
            return Err(CrmError::Forbidden);
        }
        Ok(())
    }
}

#[async_trait]
impl CrmGateway for StaticCrmGateway {
    async fn company_by_name(
        &self,
        token: &str,
        name: &str,
    ) -> Result<Option<Company>, CrmError> {
        self.check_access(token)?;
        Ok(self
            .companies
            .read()
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn lead_by_name(
        &self,
        token: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Lead>, CrmError> {
        self.check_access(token)?;
        Ok(self
            .leads
            .read()
            .iter()
            .find(|l| l.first_name == first_name && l.last_name == last_name)
            .cloned())
    }

    async fn opportunities(
        &self,
        token: &str,
        first_name: &str,
        last_name: &str,
        _owner_phone: &str,
    ) -> Result<Vec<Opportunity>, CrmError> {
        self.check_access(token)?;
        Ok(self
            .opportunities
            .read()
            .get(&(first_name.to_string(), last_name.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

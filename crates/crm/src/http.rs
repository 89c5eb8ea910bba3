//! HTTP implementation of the CRM gateway
//!
//! Endpoints mirror the CRM's REST API:
//! `GET api/companies/byName?name=`,
//! `GET api/leads/byName?firstName=&lastName=`,
//! `GET api/leads/opportunities?leadFirstName=&leadLastName=&ownerPhoneNumber=`.
//! All requests carry bearer authentication.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use callpilot_core::{Company, Lead, Opportunity};

use crate::{require_token, CrmError, CrmGateway};

/// Gateway backed by the CRM's HTTP API
#[derive(Debug, Clone)]
pub struct HttpCrmGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCrmGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, CrmError> {
        require_token(token)?;
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;
        if response.status() == StatusCode::FORBIDDEN {
            return Err(CrmError::Forbidden);
        }
        Ok(response)
    }
}

#[async_trait]
impl CrmGateway for HttpCrmGateway {
    async fn company_by_name(
        &self,
        token: &str,
        name: &str,
    ) -> Result<Option<Company>, CrmError> {
        let response = self
            .get(token, "api/companies/byName", &[("name", name)])
            .await?;
        if !response.status().is_success() {
            debug!(status = %response.status(), name, "company lookup missed");
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    async fn lead_by_name(
        &self,
        token: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Lead>, CrmError> {
        let query = [("firstName", first_name), ("lastName", last_name)];
        let response = self.get(token, "api/leads/byName", &query).await?;
        if !response.status().is_success() {
            debug!(status = %response.status(), first_name, last_name, "lead lookup missed");
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    async fn opportunities(
        &self,
        token: &str,
        first_name: &str,
        last_name: &str,
        owner_phone: &str,
    ) -> Result<Vec<Opportunity>, CrmError> {
        let query = [
            ("leadFirstName", first_name),
            ("leadLastName", last_name),
            ("ownerPhoneNumber", owner_phone),
        ];
        let response = self.get(token, "api/leads/opportunities", &query).await?;
        if !response.status().is_success() {
            debug!(status = %response.status(), first_name, last_name, "no opportunities returned");
            return Ok(Vec::new());
        }
        Ok(response.json().await?)
    }
}

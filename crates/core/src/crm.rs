//! CRM models
//!
//! A `Lead` may reference the `Company` it works for, and a `Company`
//! carries its contact `Lead`. The pair is a valid back-reference but
//! never an ownership cycle: when a lead is derived from a company's
//! contact, the attached company copy has its own contact link severed
//! (see [`Lead::clone_with_company`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A company record. Fields other than the name may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    /// The company's contact person
    #[serde(default)]
    pub contact: Option<Box<Lead>>,
}

impl Company {
    /// A copy of this company safe to attach to one of its leads:
    /// the contact link is dropped so the pair cannot recurse.
    pub fn without_contact(&self) -> Company {
        Company {
            contact: None,
            ..self.clone()
        }
    }
}

/// A person in the CRM, possibly attached to a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: Option<Box<Company>>,
}

impl Lead {
    /// "First Last", trimmed when either part is empty
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn has_full_name(&self) -> bool {
        !self.first_name.is_empty() || !self.last_name.is_empty()
    }

    /// Split a spoken full name into first/last. A single word becomes
    /// the first name; everything after the first word is the last name.
    pub fn set_full_name(&mut self, full_name: &str) {
        let mut parts = full_name.trim().splitn(2, char::is_whitespace);
        self.first_name = parts.next().unwrap_or_default().to_string();
        self.last_name = parts.next().unwrap_or_default().trim().to_string();
    }

    /// Clone `lead` with `company` attached, severing the company's
    /// contact back-reference to prevent unbounded mutual recursion.
    pub fn clone_with_company(lead: &Lead, company: &Company) -> Lead {
        Lead {
            company: Some(Box::new(company.without_contact())),
            ..lead.clone()
        }
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company
            .as_deref()
            .map(|c| c.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// An opportunity owned by a lead, read-only in this system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    /// Product title
    pub product: String,
    /// Creation date
    pub creation_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_round_trip() {
        let mut lead = Lead::default();
        lead.set_full_name("Marie Curie");
        assert_eq!(lead.first_name, "Marie");
        assert_eq!(lead.last_name, "Curie");
        assert_eq!(lead.full_name(), "Marie Curie");
    }

    #[test]
    fn single_word_name_has_empty_last_name() {
        let mut lead = Lead::default();
        lead.set_full_name("Cher");
        assert_eq!(lead.first_name, "Cher");
        assert!(lead.last_name.is_empty());
        assert_eq!(lead.full_name(), "Cher");
    }

    #[test]
    fn clone_with_company_severs_back_reference() {
        let contact = Lead {
            first_name: "Jane".into(),
            ..Default::default()
        };
        let company = Company {
            name: "Acme".into(),
            contact: Some(Box::new(contact.clone())),
            ..Default::default()
        };
        let lead = Lead::clone_with_company(&contact, &company);
        let attached = lead.company.as_deref().unwrap();
        assert_eq!(attached.name, "Acme");
        assert!(attached.contact.is_none());
        assert_eq!(lead.company_name(), Some("Acme"));
    }
}

//! Intent and requested-attribute types from the recognizer
//!
//! The tag strings are a cross-component contract with the intent
//! recognizer; they are matched by exact identity, never fuzzily.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Intents this system acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    SearchLeadData,
    SearchCompanyData,
    MakeACall,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::SearchLeadData => "SearchLeadData",
            Intent::SearchCompanyData => "SearchCompanyData",
            Intent::MakeACall => "MakeACall",
        }
    }

    /// Parse a recognizer intent name; unknown intents are not ours.
    pub fn parse(name: &str) -> Option<Intent> {
        match name {
            "SearchLeadData" => Some(Intent::SearchLeadData),
            "SearchCompanyData" => Some(Intent::SearchCompanyData),
            "MakeACall" => Some(Intent::MakeACall),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute entities the recognizer can tag on an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeTag {
    Phone,
    Address,
    Company,
    Email,
    Contact,
    ContactName,
    Opportunities,
    OpportunityCount,
}

impl AttributeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeTag::Phone => "phone",
            AttributeTag::Address => "address",
            AttributeTag::Company => "company",
            AttributeTag::Email => "email",
            AttributeTag::Contact => "contact",
            AttributeTag::ContactName => "contact-name",
            AttributeTag::Opportunities => "opportunities",
            AttributeTag::OpportunityCount => "opportunity-count",
        }
    }

    pub fn parse(tag: &str) -> Option<AttributeTag> {
        match tag {
            "phone" => Some(AttributeTag::Phone),
            "address" => Some(AttributeTag::Address),
            "company" => Some(AttributeTag::Company),
            "email" => Some(AttributeTag::Email),
            "contact" => Some(AttributeTag::Contact),
            "contact-name" => Some(AttributeTag::ContactName),
            "opportunities" => Some(AttributeTag::Opportunities),
            "opportunity-count" => Some(AttributeTag::OpportunityCount),
            _ => None,
        }
    }
}

/// The set of attributes the caller asked about. Order-irrelevant,
/// membership-tested only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestedAttributes(HashSet<AttributeTag>);

impl RequestedAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: AttributeTag) {
        self.0.insert(tag);
    }

    pub fn contains(&self, tag: AttributeTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// True when the phone tag is present and no other data attribute
    /// is. The contact tags do not count as "other data": a request
    /// for a company contact's phone number is still a phone-only
    /// request once the lead flow takes over.
    pub fn wants_phone_only(&self) -> bool {
        self.contains(AttributeTag::Phone)
            && !(self.contains(AttributeTag::Address)
                || self.contains(AttributeTag::Company)
                || self.contains(AttributeTag::Email)
                || self.contains(AttributeTag::Opportunities)
                || self.contains(AttributeTag::OpportunityCount))
    }
}

impl FromIterator<AttributeTag> for RequestedAttributes {
    fn from_iter<I: IntoIterator<Item = AttributeTag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Recognizer output carried across turns within one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IntentState {
    pub intent: Option<Intent>,
    pub attributes: RequestedAttributes,
}

impl IntentState {
    pub fn new(intent: Intent, attributes: RequestedAttributes) -> Self {
        Self {
            intent: Some(intent),
            attributes,
        }
    }

    pub fn is(&self, intent: Intent) -> bool {
        self.intent == Some(intent)
    }

    pub fn reset(&mut self) {
        self.intent = None;
        self.attributes.clear();
    }

    /// Drop the intent once no attribute entities remain attached to it
    pub fn reset_intent_if_no_entities(&mut self) {
        if self.attributes.is_empty() {
            self.intent = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_only_is_monotone_in_the_requested_set() {
        let mut set: RequestedAttributes = [AttributeTag::Phone].into_iter().collect();
        assert!(set.wants_phone_only());
        set.insert(AttributeTag::Email);
        assert!(!set.wants_phone_only());
    }

    #[test]
    fn contact_tag_does_not_break_phone_only() {
        let set: RequestedAttributes = [AttributeTag::Phone, AttributeTag::Contact]
            .into_iter()
            .collect();
        assert!(set.wants_phone_only());
    }

    #[test]
    fn tags_round_trip_through_their_wire_names() {
        for tag in [
            AttributeTag::Phone,
            AttributeTag::Address,
            AttributeTag::Company,
            AttributeTag::Email,
            AttributeTag::Contact,
            AttributeTag::ContactName,
            AttributeTag::Opportunities,
            AttributeTag::OpportunityCount,
        ] {
            assert_eq!(AttributeTag::parse(tag.as_str()), Some(tag));
        }
        assert_eq!(AttributeTag::parse("fax"), None);
    }

    #[test]
    fn intent_resets_only_without_entities() {
        let mut state = IntentState::new(
            Intent::MakeACall,
            [AttributeTag::Phone].into_iter().collect(),
        );
        state.reset_intent_if_no_entities();
        assert!(state.is(Intent::MakeACall));
        state.attributes.clear();
        state.reset_intent_if_no_entities();
        assert_eq!(state.intent, None);
    }
}

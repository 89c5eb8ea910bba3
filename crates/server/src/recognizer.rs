//! Intent recognition
//!
//! The dialog engine consumes recognizer output through the
//! [`IntentRecognizer`] trait; an NLU service sits behind it in
//! production. [`KeywordRecognizer`] is the built-in fallback for
//! deployments without one.

use async_trait::async_trait;

use callpilot_core::{AttributeTag, Intent, RequestedAttributes};

/// Maps one utterance to an intent plus the attributes it asks about.
/// `None` means the utterance is not something this system acts on.
#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    async fn recognize(&self, text: &str) -> Option<(Intent, RequestedAttributes)>;
}

/// Keyword-based recognizer. Deliberately rough: it covers the demo
/// phrasings, not natural language.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRecognizer;

#[async_trait]
impl IntentRecognizer for KeywordRecognizer {
    async fn recognize(&self, text: &str) -> Option<(Intent, RequestedAttributes)> {
        let text = text.to_lowercase();
        let mut tags = RequestedAttributes::new();
        if text.contains("phone") || text.contains("number") {
            tags.insert(AttributeTag::Phone);
        }
        if text.contains("address") {
            tags.insert(AttributeTag::Address);
        }
        if text.contains("email") || text.contains("mail") {
            tags.insert(AttributeTag::Email);
        }
        if text.contains("how many opportunit") {
            tags.insert(AttributeTag::OpportunityCount);
        } else if text.contains("opportunit") {
            tags.insert(AttributeTag::Opportunities);
        }
        if text.contains("contact") {
            tags.insert(AttributeTag::Contact);
        }

        let about_company = text.contains("company");
        if about_company && !tags.is_empty() {
            // Asking about a company's data, possibly its contact.
            if text.contains("call") {
                tags.insert(AttributeTag::Phone);
            }
            return Some((Intent::SearchCompanyData, tags));
        }
        if text.contains("call") || text.contains("forward") {
            tags.insert(AttributeTag::Phone);
            return Some((Intent::MakeACall, tags));
        }
        if about_company {
            // "which company does … work for" is a lead question.
            tags.insert(AttributeTag::Company);
            return Some((Intent::SearchLeadData, tags));
        }
        if tags.is_empty() {
            return None;
        }
        Some((Intent::SearchLeadData, tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn phone_question_is_a_lead_search() {
        let (intent, tags) = KeywordRecognizer
            .recognize("What is the phone number of Jane Doe?")
            .await
            .unwrap();
        assert_eq!(intent, Intent::SearchLeadData);
        assert!(tags.contains(AttributeTag::Phone));
        assert!(tags.wants_phone_only());
    }

    #[tokio::test]
    async fn company_address_is_a_company_search() {
        let (intent, tags) = KeywordRecognizer
            .recognize("Give me the address of the company Acme")
            .await
            .unwrap();
        assert_eq!(intent, Intent::SearchCompanyData);
        assert!(tags.contains(AttributeTag::Address));
    }

    #[tokio::test]
    async fn employer_question_asks_for_the_company_attribute() {
        let (intent, tags) = KeywordRecognizer
            .recognize("Which company does John work for?")
            .await
            .unwrap();
        assert_eq!(intent, Intent::SearchLeadData);
        assert!(tags.contains(AttributeTag::Company));
    }

    #[tokio::test]
    async fn call_request_carries_the_phone_attribute() {
        let (intent, tags) = KeywordRecognizer.recognize("Call John Smith").await.unwrap();
        assert_eq!(intent, Intent::MakeACall);
        assert!(tags.contains(AttributeTag::Phone));
    }

    #[tokio::test]
    async fn small_talk_is_not_recognized() {
        assert!(KeywordRecognizer.recognize("Nice weather today").await.is_none());
    }
}

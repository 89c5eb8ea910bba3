//! Response formatting against the requested-attribute set
//!
//! One sentence per attribute that was both requested and resolved,
//! in a fixed order: contact name, company name, address, phone,
//! email, opportunity count, opportunity list. When nothing resolved,
//! a single not-found sentence replaces the list.

use callpilot_core::{AttributeTag, Opportunity, SessionState};
use callpilot_crm::{CrmError, CrmGateway};

use crate::phrases;
use crate::step::ResolverConfig;

/// Join opportunities as `"title (date)"` entries, comma separated,
/// with "and" before the final entry when more than one exists.
pub fn format_opportunity_list(opportunities: &[Opportunity]) -> String {
    let mut rendered = String::new();
    let count = opportunities.len();
    for (i, opportunity) in opportunities.iter().enumerate() {
        rendered.push_str(&format!(
            "{} ({})",
            opportunity.product, opportunity.creation_date
        ));
        if count >= 2 && i == count - 2 {
            rendered.push_str(&format!(" {} ", phrases::and_word()));
        } else if i + 2 < count {
            rendered.push_str(", ");
        }
    }
    rendered
}

/// Build the spoken answer for the resolved lead. Opportunities are
/// fetched lazily, only when one of the opportunity tags was asked
/// for, and cached on the session.
pub async fn build_lead_response(
    config: &ResolverConfig,
    session: &mut SessionState,
    gateway: &dyn CrmGateway,
    token: &str,
) -> Result<String, CrmError> {
    let requested = session.intent.attributes.clone();
    let lead = session.lead.clone();

    let want_opportunities = requested.contains(AttributeTag::Opportunities);
    let want_count = requested.contains(AttributeTag::OpportunityCount);
    if want_opportunities || want_count {
        let fetched = gateway
            .opportunities(
                token,
                &lead.first_name,
                &lead.last_name,
                &config.opportunity_owner_phone,
            )
            .await?;
        session.opportunities = Some(fetched);
    }
    let opportunities = session.opportunities.as_deref().unwrap_or_default();

    let has_phone = !lead.phone_number.is_empty();
    let has_address = !lead.address.is_empty();
    let has_email = !lead.email.is_empty();
    let company_name = lead.company_name();
    let has_opportunities = !opportunities.is_empty();

    let mut sentences: Vec<String> = Vec::new();

    if requested.contains(AttributeTag::Contact)
        || requested.contains(AttributeTag::ContactName)
    {
        if let Some(company) = company_name {
            sentences.push(phrases::give_contact_name(company, &lead.full_name()));
        }
    }
    if requested.contains(AttributeTag::Company) {
        if let Some(company) = company_name {
            sentences.push(phrases::give_company_name(&lead.full_name(), company));
        }
    }
    if requested.contains(AttributeTag::Address) && has_address {
        sentences.push(phrases::give_address(&lead.address));
    }
    if requested.contains(AttributeTag::Phone) && has_phone {
        sentences.push(phrases::give_phone_number(&lead.phone_number));
    }
    if requested.contains(AttributeTag::Email) && has_email {
        sentences.push(phrases::give_email(&lead.email));
    }
    if want_count || want_opportunities {
        sentences.push(phrases::give_opportunity_count(opportunities.len()));
    }
    if want_opportunities && has_opportunities {
        sentences.push(phrases::give_opportunities(&format_opportunity_list(
            opportunities,
        )));
    }

    let has_no_results = !(company_name.is_some()
        || has_address
        || has_phone
        || has_email
        || has_opportunities);
    if has_no_results {
        let sentence = if requested.len() > 1 {
            phrases::no_data_found()
        } else {
            phrases::this_data_not_found()
        };
        return Ok(sentence);
    }

    Ok(sentences.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use callpilot_core::{Intent, IntentState, Lead};
    use callpilot_crm::StaticCrmGateway;
    use chrono::NaiveDate;

    fn opportunity(title: &str, date: (i32, u32, u32)) -> Opportunity {
        Opportunity {
            product: title.into(),
            creation_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        }
    }

    #[test]
    fn list_of_three_uses_commas_then_and() {
        let list = [
            opportunity("Widget", (2024, 1, 5)),
            opportunity("Gadget", (2024, 2, 6)),
            opportunity("Gizmo", (2024, 3, 7)),
        ];
        assert_eq!(
            format_opportunity_list(&list),
            "Widget (2024-01-05), Gadget (2024-02-06) and Gizmo (2024-03-07)"
        );
    }

    #[test]
    fn single_entry_has_no_joiner() {
        let list = [opportunity("Widget", (2024, 1, 5))];
        assert_eq!(format_opportunity_list(&list), "Widget (2024-01-05)");
    }

    #[test]
    fn two_entries_join_with_and_only() {
        let list = [
            opportunity("Widget", (2024, 1, 5)),
            opportunity("Gadget", (2024, 2, 6)),
        ];
        assert_eq!(
            format_opportunity_list(&list),
            "Widget (2024-01-05) and Gadget (2024-02-06)"
        );
    }

    fn config() -> ResolverConfig {
        ResolverConfig::new("TestBot", "32491180031")
    }

    #[tokio::test]
    async fn phone_only_request_yields_only_the_phone_sentence() {
        let gateway = StaticCrmGateway::new();
        let mut session = SessionState::with_token("tok");
        session.lead = Lead {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            phone_number: "0491180031".into(),
            ..Default::default()
        };
        session.intent = IntentState::new(
            Intent::SearchLeadData,
            [AttributeTag::Phone].into_iter().collect(),
        );
        let text = build_lead_response(&config(), &mut session, &gateway, "tok")
            .await
            .unwrap();
        assert_eq!(text, "The phone number is 0491180031.");
    }

    #[tokio::test]
    async fn nothing_resolved_for_one_attribute_says_this_data_not_found() {
        let gateway = StaticCrmGateway::new();
        let mut session = SessionState::with_token("tok");
        session.lead.set_full_name("Jane Doe");
        session.intent = IntentState::new(
            Intent::SearchLeadData,
            [AttributeTag::Email].into_iter().collect(),
        );
        let text = build_lead_response(&config(), &mut session, &gateway, "tok")
            .await
            .unwrap();
        assert_eq!(text, "This data was not found.");
    }

    #[tokio::test]
    async fn nothing_resolved_for_many_attributes_says_no_data_found() {
        let gateway = StaticCrmGateway::new();
        let mut session = SessionState::with_token("tok");
        session.lead.set_full_name("Jane Doe");
        session.intent = IntentState::new(
            Intent::SearchLeadData,
            [AttributeTag::Email, AttributeTag::Address]
                .into_iter()
                .collect(),
        );
        let text = build_lead_response(&config(), &mut session, &gateway, "tok")
            .await
            .unwrap();
        assert_eq!(text, "No data was found.");
    }

    #[tokio::test]
    async fn opportunities_are_fetched_lazily_and_cached_on_the_session() {
        let gateway = StaticCrmGateway::new();
        gateway.insert_opportunities(
            "Jane",
            "Doe",
            vec![opportunity("Widget", (2024, 1, 5))],
        );
        let mut session = SessionState::with_token("tok");
        session.lead = Lead {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            ..Default::default()
        };
        session.intent = IntentState::new(
            Intent::SearchLeadData,
            [AttributeTag::Opportunities].into_iter().collect(),
        );
        let text = build_lead_response(&config(), &mut session, &gateway, "tok")
            .await
            .unwrap();
        assert_eq!(
            text,
            "1 opportunity was found. The opportunities are Widget (2024-01-05)."
        );
        assert_eq!(session.opportunities.as_ref().unwrap().len(), 1);
    }
}

//! Company resolution state machine
//!
//! Resolves a company by name with the same retry loop as the lead
//! flow. When the caller asked about the company's contact, the
//! resolved contact is copied into the session (back-reference
//! severed) and control is handed to the lead resolver.

use tracing::{debug, info};

use callpilot_core::{AttributeTag, InputHint, Lead, SessionState, TurnMessage};
use callpilot_crm::{CrmError, CrmGateway};

use crate::answer::parse_yes_no;
use crate::phrases;
use crate::step::{ResolverConfig, StepOutcome};
use crate::DialogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    AwaitingName,
    AwaitingRetry,
    Ended,
}

/// One company resolution flow
pub struct CompanyResolver {
    config: ResolverConfig,
    state: State,
}

impl CompanyResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            state: State::Init,
        }
    }

    fn bot(&self, text: String, hint: InputHint) -> TurnMessage {
        TurnMessage::bot(self.config.bot_name.clone(), text, hint)
    }

    /// Advance the machine. `answer` must be `Some` exactly when the
    /// previous step suspended on a prompt.
    pub async fn step(
        &mut self,
        answer: Option<&str>,
        session: &mut SessionState,
        gateway: &dyn CrmGateway,
    ) -> Result<StepOutcome, DialogError> {
        match self.state {
            State::Init => self.ask_name(session, gateway).await,
            State::AwaitingName => {
                let name = answer.ok_or(DialogError::OutOfTurn("company name prompt"))?;
                session.company.name = name.trim().to_string();
                self.resolve(session, gateway).await
            },
            State::AwaitingRetry => {
                let answer = answer.ok_or(DialogError::OutOfTurn("retry prompt"))?;
                self.handle_retry_answer(answer, session, gateway).await
            },
            State::Ended => Err(DialogError::OutOfTurn("company flow already ended")),
        }
    }

    async fn ask_name(
        &mut self,
        session: &mut SessionState,
        gateway: &dyn CrmGateway,
    ) -> Result<StepOutcome, DialogError> {
        if !session.company.name.is_empty() {
            return self.resolve(session, gateway).await;
        }
        self.state = State::AwaitingName;
        Ok(StepOutcome::suspended(vec![
            self.bot(phrases::ask_company_name(), InputHint::Accepting)
        ]))
    }

    async fn resolve(
        &mut self,
        session: &mut SessionState,
        gateway: &dyn CrmGateway,
    ) -> Result<StepOutcome, DialogError> {
        let token = session
            .auth_token
            .clone()
            .ok_or(CrmError::MissingCredential)?;
        let given_name = session.company.name.clone();
        debug!(name = %given_name, "looking up company");

        let found = gateway.company_by_name(&token, &given_name).await?;
        match found {
            Some(company) if !company.name.is_empty() => {
                session.company = company;
                self.dispatch_result(session)
            },
            _ => {
                self.state = State::AwaitingRetry;
                Ok(StepOutcome::suspended(vec![self.bot(
                    phrases::not_found_retry(&given_name),
                    InputHint::Accepting,
                )]))
            },
        }
    }

    async fn handle_retry_answer(
        &mut self,
        answer: &str,
        session: &mut SessionState,
        gateway: &dyn CrmGateway,
    ) -> Result<StepOutcome, DialogError> {
        match parse_yes_no(answer) {
            None => Ok(StepOutcome::suspended(vec![
                self.bot(phrases::ask_yes_or_no(), InputHint::Accepting)
            ])),
            Some(true) => {
                session.reset_company();
                self.state = State::Init;
                self.ask_name(session, gateway).await
            },
            Some(false) => {
                info!("caller declined retry, closing company flow");
                session.reset_company();
                session.intent.reset();
                self.state = State::Ended;
                Ok(StepOutcome::done(vec![
                    self.bot(phrases::ask_for_request(), InputHint::Accepting)
                ]))
            },
        }
    }

    /// The company resolved. Either hand off to the lead flow with the
    /// company's contact, or close.
    fn dispatch_result(&mut self, session: &mut SessionState) -> Result<StepOutcome, DialogError> {
        if session.intent.attributes.contains(AttributeTag::Contact) {
            let mut contact = session
                .company
                .contact
                .as_deref()
                .cloned()
                .unwrap_or_default();
            if contact.company.is_none() {
                // Attach a copy of this company with its own contact
                // link severed, so the pair never recurses.
                contact = Lead::clone_with_company(&contact, &session.company);
            }
            info!(contact = %contact.full_name(), "redirecting to lead flow for company contact");
            session.lead = contact;
            self.state = State::Ended;
            return Ok(StepOutcome::redirect(Vec::new()));
        }

        session.reset_company();
        session.intent.reset();
        self.state = State::Ended;
        Ok(StepOutcome::done(vec![
            self.bot(phrases::ask_for_request(), InputHint::Accepting)
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepStatus;
    use callpilot_core::{Company, Intent, IntentState};
    use callpilot_crm::StaticCrmGateway;

    fn resolver() -> CompanyResolver {
        CompanyResolver::new(ResolverConfig::new("TestBot", "32491180031"))
    }

    fn acme_with_contact() -> Company {
        Company {
            name: "Acme".into(),
            contact: Some(Box::new(Lead {
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                phone_number: "0491180031".into(),
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    fn session_for(tags: &[AttributeTag]) -> SessionState {
        let mut session = SessionState::with_token("tok");
        session.intent =
            IntentState::new(Intent::SearchCompanyData, tags.iter().copied().collect());
        session
    }

    #[tokio::test]
    async fn contact_request_redirects_with_severed_back_reference() {
        let gateway = StaticCrmGateway::new();
        gateway.insert_company(acme_with_contact());
        let mut session = session_for(&[AttributeTag::Contact, AttributeTag::Phone]);
        let mut resolver = resolver();

        let out = resolver.step(None, &mut session, &gateway).await.unwrap();
        assert_eq!(out.status, StepStatus::Suspended);

        let out = resolver
            .step(Some("Acme"), &mut session, &gateway)
            .await
            .unwrap();
        assert_eq!(out.status, StepStatus::RedirectToLead);
        assert_eq!(session.lead.full_name(), "Jane Doe");
        let attached = session.lead.company.as_deref().unwrap();
        assert_eq!(attached.name, "Acme");
        assert!(attached.contact.is_none());
    }

    #[tokio::test]
    async fn not_found_then_no_resets_and_closes() {
        let gateway = StaticCrmGateway::new();
        let mut session = session_for(&[AttributeTag::Address]);
        let mut resolver = resolver();

        resolver.step(None, &mut session, &gateway).await.unwrap();
        let out = resolver
            .step(Some("Ghost Corp"), &mut session, &gateway)
            .await
            .unwrap();
        assert_eq!(
            out.messages[0].text,
            "Ghost Corp was not found. Do you want to try again?"
        );

        let out = resolver
            .step(Some("no"), &mut session, &gateway)
            .await
            .unwrap();
        assert_eq!(out.status, StepStatus::Done);
        assert_eq!(out.messages[0].text, "What can I do for you?");
        assert!(session.company.name.is_empty());
        assert_eq!(session.intent.intent, None);
    }

    #[tokio::test]
    async fn known_name_skips_the_prompt() {
        let gateway = StaticCrmGateway::new();
        gateway.insert_company(acme_with_contact());
        let mut session = session_for(&[AttributeTag::Contact]);
        session.company.name = "Acme".into();
        let mut resolver = resolver();

        let out = resolver.step(None, &mut session, &gateway).await.unwrap();
        assert_eq!(out.status, StepStatus::RedirectToLead);
    }

    #[tokio::test]
    async fn plain_company_search_closes_politely() {
        let gateway = StaticCrmGateway::new();
        gateway.insert_company(acme_with_contact());
        let mut session = session_for(&[AttributeTag::Address]);
        session.company.name = "Acme".into();
        let mut resolver = resolver();

        let out = resolver.step(None, &mut session, &gateway).await.unwrap();
        assert_eq!(out.status, StepStatus::Done);
        assert_eq!(out.messages[0].text, "What can I do for you?");
    }
}

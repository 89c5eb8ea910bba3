//! Lead resolution state machine
//!
//! Resolves a person by name, with a retry loop on miss, then either
//! answers the requested attributes or forwards the call. Also serves
//! the tail of a company resolution when the caller asked for the
//! company's contact.

use tracing::{debug, info};

use callpilot_core::{InputHint, Intent, SessionState, TurnMessage};
use callpilot_crm::{CrmError, CrmGateway};

use crate::answer::parse_yes_no;
use crate::format::build_lead_response;
use crate::phrases;
use crate::step::{ResolverConfig, StepOutcome, StepStatus};
use crate::DialogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    AwaitingName,
    AwaitingRetry,
    AwaitingForward,
    Ended,
}

/// One lead resolution flow. Created per intent, stepped once per
/// caller answer, discarded at `Done`.
pub struct LeadResolver {
    config: ResolverConfig,
    state: State,
}

impl LeadResolver {
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
                let name = answer.ok_or(DialogError::OutOfTurn("lead name prompt"))?;
                session.lead.set_full_name(name);
                self.resolve(session, gateway).await
            },
            State::AwaitingRetry => {
                let answer = answer.ok_or(DialogError::OutOfTurn("retry prompt"))?;
                self.handle_retry_answer(answer, session, gateway).await
            },
            State::AwaitingForward => {
                let answer = answer.ok_or(DialogError::OutOfTurn("forward prompt"))?;
                match parse_yes_no(answer) {
                    None => Ok(StepOutcome::suspended(vec![
                        self.bot(phrases::ask_yes_or_no(), InputHint::Accepting)
                    ])),
                    Some(forward) => Ok(self.end(forward, session)),
                }
            },
            State::Ended => Err(DialogError::OutOfTurn("lead flow already ended")),
        }
    }

    async fn ask_name(
        &mut self,
        session: &mut SessionState,
        gateway: &dyn CrmGateway,
    ) -> Result<StepOutcome, DialogError> {
        if session.lead.has_full_name() {
            return self.resolve(session, gateway).await;
        }
        self.state = State::AwaitingName;
        Ok(StepOutcome::suspended(vec![
            self.bot(phrases::ask_person_full_name(), InputHint::Accepting)
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
        let given_name = session.lead.full_name();
        debug!(name = %given_name, "looking up lead");

        let found = gateway
            .lead_by_name(&token, &session.lead.first_name, &session.lead.last_name)
            .await?;

        let retry_prompt = match found {
            None => Some(phrases::not_found_retry(&given_name)),
            Some(lead) => {
                session.lead = lead;
                if session.intent.is(Intent::MakeACall)
                    && session.lead.phone_number.is_empty()
                {
                    session.wants_call_but_number_missing = true;
                    Some(phrases::phone_not_found_retry(&given_name))
                } else {
                    None
                }
            },
        };

        match retry_prompt {
            Some(prompt) => {
                self.state = State::AwaitingRetry;
                Ok(StepOutcome::suspended(vec![
                    self.bot(prompt, InputHint::Accepting)
                ]))
            },
            None => self.dispatch_result(session, gateway, &token).await,
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
                // The reset clears the stale name, so re-entry always
                // re-prompts.
                session.reset_lead();
                self.state = State::Init;
                self.ask_name(session, gateway).await
            },
            Some(false) => {
                info!("caller declined retry, closing lead flow");
                session.reset_lead();
                session.intent.reset();
                self.state = State::Ended;
                Ok(StepOutcome::done(vec![
                    self.bot(phrases::ask_for_request(), InputHint::Accepting)
                ]))
            },
        }
    }

    async fn dispatch_result(
        &mut self,
        session: &mut SessionState,
        gateway: &dyn CrmGateway,
        token: &str,
    ) -> Result<StepOutcome, DialogError> {
        let is_search = session.intent.is(Intent::SearchLeadData)
            || session.intent.is(Intent::SearchCompanyData);
        if !is_search {
            // MakeACall with a resolved number goes straight to the end
            // step, which emits the forward signal.
            return Ok(self.end(false, session));
        }

        session.eligible_for_forwarding = session.intent.attributes.wants_phone_only()
            && !session.lead.phone_number.is_empty();

        let text = build_lead_response(&self.config, session, gateway, token).await?;
        let mut messages = vec![self.bot(text, InputHint::Ignoring)];

        if session.eligible_for_forwarding {
            self.state = State::AwaitingForward;
            messages.push(self.bot(phrases::ask_forward_call(), InputHint::Accepting));
            return Ok(StepOutcome::suspended(messages));
        }

        let mut outcome = self.end(false, session);
        messages.append(&mut outcome.messages);
        outcome.messages = messages;
        Ok(outcome)
    }

    /// Terminal step: emit the forward signal or the closing message,
    /// then reset all CRM and intent state.
    fn end(&mut self, forward: bool, session: &mut SessionState) -> StepOutcome {
        let mut messages = Vec::new();

        let is_search = session.intent.is(Intent::SearchLeadData)
            || (session.intent.is(Intent::SearchCompanyData)
                && session
                    .intent
                    .attributes
                    .contains(callpilot_core::AttributeTag::Contact));
        if is_search && !forward {
            messages.push(self.bot(phrases::ask_for_request(), InputHint::Accepting));
        }

        let has_phone = !session.lead.phone_number.is_empty();
        if forward || (session.intent.is(Intent::MakeACall) && has_phone) {
            let number = session.lead.phone_number.clone();
            info!(%number, "emitting forward signal");
            messages.push(
                self.bot(phrases::forwarding_call(), InputHint::Ignoring)
                    .with_forward(number),
            );
        }

        session.reset_lead();
        session.intent.reset();
        self.state = State::Ended;
        StepOutcome {
            messages,
            status: StepStatus::Done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callpilot_core::{AttributeTag, IntentState, Lead, RequestedAttributes};
    use callpilot_crm::StaticCrmGateway;

    fn resolver() -> LeadResolver {
        LeadResolver::new(ResolverConfig::new("TestBot", "32491180031"))
    }

    fn session_with_intent(intent: Intent, tags: &[AttributeTag]) -> SessionState {
        let mut session = SessionState::with_token("tok");
        session.intent = IntentState::new(intent, tags.iter().copied().collect());
        session
    }

    fn jane() -> Lead {
        Lead {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            phone_number: "0491180031".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn phone_only_search_answers_then_offers_forwarding() {
        let gateway = StaticCrmGateway::new();
        gateway.insert_lead(jane());
        let mut session = session_with_intent(Intent::SearchLeadData, &[AttributeTag::Phone]);
        let mut resolver = resolver();

        let out = resolver.step(None, &mut session, &gateway).await.unwrap();
        assert_eq!(out.status, StepStatus::Suspended);
        assert_eq!(
            out.messages[0].text,
            "What is the full name of the person you are looking for?"
        );

        let out = resolver
            .step(Some("Jane Doe"), &mut session, &gateway)
            .await
            .unwrap();
        assert_eq!(out.status, StepStatus::Suspended);
        assert_eq!(out.messages[0].text, "The phone number is 0491180031.");
        assert!(out.messages[0].input_hint.is_ignoring());
        assert_eq!(out.messages[1].text, "Do you want me to forward the call?");
        assert!(session.eligible_for_forwarding);

        let out = resolver
            .step(Some("yes"), &mut session, &gateway)
            .await
            .unwrap();
        assert_eq!(out.status, StepStatus::Done);
        assert_eq!(out.messages[0].forwarding_number(), Some("0491180031"));
        // Terminal step resets the CRM and intent state.
        assert!(!session.lead.has_full_name());
        assert_eq!(session.intent.intent, None);
    }

    #[tokio::test]
    async fn declining_forward_closes_with_accepting_message() {
        let gateway = StaticCrmGateway::new();
        gateway.insert_lead(jane());
        let mut session = session_with_intent(Intent::SearchLeadData, &[AttributeTag::Phone]);
        session.lead.set_full_name("Jane Doe");
        let mut resolver = resolver();

        resolver.step(None, &mut session, &gateway).await.unwrap();
        let out = resolver
            .step(Some("no"), &mut session, &gateway)
            .await
            .unwrap();
        assert_eq!(out.status, StepStatus::Done);
        assert_eq!(out.messages[0].text, "What can I do for you?");
        assert_eq!(out.messages[0].input_hint, InputHint::Accepting);
        assert!(out.messages.iter().all(|m| m.forwarding_number().is_none()));
    }

    #[tokio::test]
    async fn retry_loop_reprompts_once_per_yes_then_resets_on_no() {
        let gateway = StaticCrmGateway::new();
        let mut session = session_with_intent(Intent::SearchLeadData, &[AttributeTag::Phone]);
        let mut resolver = resolver();

        resolver.step(None, &mut session, &gateway).await.unwrap();
        let out = resolver
            .step(Some("Unknown Person"), &mut session, &gateway)
            .await
            .unwrap();
        assert_eq!(
            out.messages[0].text,
            "Unknown Person was not found. Do you want to try again?"
        );

        // yes -> name cleared, AskName re-entered exactly once
        let out = resolver
            .step(Some("yes"), &mut session, &gateway)
            .await
            .unwrap();
        assert_eq!(out.status, StepStatus::Suspended);
        assert_eq!(
            out.messages[0].text,
            "What is the full name of the person you are looking for?"
        );
        assert!(!session.lead.has_full_name());

        let out = resolver
            .step(Some("Still Unknown"), &mut session, &gateway)
            .await
            .unwrap();
        assert_eq!(out.status, StepStatus::Suspended);

        // no -> closing message, everything reset, flow done
        let out = resolver
            .step(Some("no"), &mut session, &gateway)
            .await
            .unwrap();
        assert_eq!(out.status, StepStatus::Done);
        assert_eq!(out.messages[0].text, "What can I do for you?");
        assert_eq!(session.intent.intent, None);
        assert!(!session.lead.has_full_name());
    }

    #[tokio::test]
    async fn unparseable_confirm_answer_reprompts() {
        let gateway = StaticCrmGateway::new();
        let mut session = session_with_intent(Intent::SearchLeadData, &[AttributeTag::Phone]);
        let mut resolver = resolver();

        resolver.step(None, &mut session, &gateway).await.unwrap();
        resolver
            .step(Some("Unknown Person"), &mut session, &gateway)
            .await
            .unwrap();
        let out = resolver
            .step(Some("maybe"), &mut session, &gateway)
            .await
            .unwrap();
        assert_eq!(out.status, StepStatus::Suspended);
        assert_eq!(out.messages[0].text, "Please answer yes or no.");
    }

    #[tokio::test]
    async fn make_a_call_with_number_forwards_without_prompting() {
        let gateway = StaticCrmGateway::new();
        gateway.insert_lead(jane());
        let mut session = session_with_intent(Intent::MakeACall, &[]);
        session.lead.set_full_name("Jane Doe");
        let mut resolver = resolver();

        let out = resolver.step(None, &mut session, &gateway).await.unwrap();
        assert_eq!(out.status, StepStatus::Done);
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.messages[0].text, "I am forwarding the call.");
        assert!(out.messages[0].input_hint.is_ignoring());
        assert_eq!(out.messages[0].forwarding_number(), Some("0491180031"));
    }

    #[tokio::test]
    async fn make_a_call_without_number_asks_for_retry() {
        let gateway = StaticCrmGateway::new();
        gateway.insert_lead(Lead {
            first_name: "John".into(),
            last_name: "Mute".into(),
            ..Default::default()
        });
        let mut session = session_with_intent(Intent::MakeACall, &[]);
        session.lead.set_full_name("John Mute");
        let mut resolver = resolver();

        let out = resolver.step(None, &mut session, &gateway).await.unwrap();
        assert_eq!(out.status, StepStatus::Suspended);
        assert_eq!(
            out.messages[0].text,
            "The phone number of John Mute was not found. Do you want to try again?"
        );
        assert!(session.wants_call_but_number_missing);
    }

    #[tokio::test]
    async fn extra_requested_attribute_disables_forwarding() {
        let gateway = StaticCrmGateway::new();
        gateway.insert_lead(jane());
        let mut session = session_with_intent(
            Intent::SearchLeadData,
            &[AttributeTag::Phone, AttributeTag::Email],
        );
        session.lead.set_full_name("Jane Doe");
        let mut resolver = resolver();

        let out = resolver.step(None, &mut session, &gateway).await.unwrap();
        // Completing without suspension means no forward prompt was issued.
        assert_eq!(out.status, StepStatus::Done);
        assert_eq!(out.messages.last().unwrap().text, "What can I do for you?");
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_lookup() {
        let gateway = StaticCrmGateway::new();
        let mut session = session_with_intent(Intent::SearchLeadData, &[AttributeTag::Phone]);
        session.auth_token = None;
        session.lead.set_full_name("Jane Doe");
        let mut resolver = resolver();

        let err = resolver.step(None, &mut session, &gateway).await.unwrap_err();
        assert!(matches!(err, DialogError::Crm(CrmError::MissingCredential)));
    }

    #[tokio::test]
    async fn forbidden_lookup_is_fatal_with_no_retry_prompt() {
        let gateway = StaticCrmGateway::new();
        gateway.insert_lead(jane());
        gateway.deny_all();
        let mut session = session_with_intent(Intent::SearchLeadData, &[AttributeTag::Phone]);
        session.lead.set_full_name("Jane Doe");
        let mut resolver = resolver();

        let err = resolver.step(None, &mut session, &gateway).await.unwrap_err();
        assert!(matches!(err, DialogError::Crm(CrmError::Forbidden)));
    }

    #[test]
    fn requested_set_eligibility_is_monotone() {
        let mut tags: RequestedAttributes = [AttributeTag::Phone].into_iter().collect();
        assert!(tags.wants_phone_only());
        tags.insert(AttributeTag::OpportunityCount);
        assert!(!tags.wants_phone_only());
    }
}

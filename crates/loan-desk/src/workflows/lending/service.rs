use std::sync::Arc;

use tracing::{info, warn};

use super::advisor::{
    negotiation_transcript, parse_negotiation_reply, AdvisorError, ChatMessage,
    NegotiationAdvisor, OversightVerdict,
};
use super::domain::{LoanApplication, LoanRequest, NegotiatorPayload};
use super::evaluation::{self, LoanQuote};
use super::guard::{LoanGuard, ValidationError};
use super::negotiation::{NegotiationEngine, NegotiationError, NegotiationRound};

/// Service composing the input guard, the oversight advisor, and the negotiation engine.
pub struct LendingService<A> {
    guard: LoanGuard,
    engine: NegotiationEngine,
    advisor: Arc<A>,
}

/// Chat-mediated round plus the transcript to send back with the next message.
#[derive(Debug, Clone)]
pub struct ChatNegotiation {
    pub round: NegotiationRound,
    pub conversation: Vec<ChatMessage>,
}

impl<A> LendingService<A>
where
    A: NegotiationAdvisor + 'static,
{
    pub fn new(advisor: Arc<A>) -> Self {
        Self::with_guard(LoanGuard::default(), advisor)
    }

    pub fn with_guard(guard: LoanGuard, advisor: Arc<A>) -> Self {
        Self {
            guard,
            engine: NegotiationEngine::new(),
            advisor,
        }
    }

    pub fn guard(&self) -> &LoanGuard {
        &self.guard
    }

    /// Quote without consulting the advisor. Used for offline batch quoting.
    pub fn quote_unreviewed(&self, request: &LoanRequest) -> Result<LoanQuote, ValidationError> {
        let application = self.guard.application_from_request(request)?;
        Ok(self.price(application))
    }

    /// Validate, review, and price an application.
    pub async fn quote(&self, request: &LoanRequest) -> Result<LoanQuote, LendingServiceError> {
        let application = self.guard.application_from_request(request)?;
        self.review(&application).await?;
        Ok(self.price(application))
    }

    /// Run one negotiation round against the initial offer built from `request`.
    pub async fn negotiate(
        &self,
        request: &LoanRequest,
        payload: &NegotiatorPayload,
    ) -> Result<NegotiationRound, LendingServiceError> {
        let application = self.guard.application_from_request(request)?;
        let negotiation = self.guard.negotiation_from_payload(payload)?;
        self.review(&application).await?;

        let initial = self.price(application);
        let round = self.engine.negotiate(&initial, &negotiation)?;
        info!(
            attempt = round.attempt_number,
            parameter = round.negotiated_parameter.tag(),
            status = ?round.status,
            remaining = round.remaining_attempts,
            "negotiation round evaluated"
        );
        Ok(round)
    }

    /// Ask the advisor to turn a natural-language message into negotiator
    /// parameters, then run the round exactly as if they had been sent directly.
    pub async fn negotiate_with_message(
        &self,
        request: &LoanRequest,
        message: &str,
        history: Vec<ChatMessage>,
    ) -> Result<ChatNegotiation, LendingServiceError> {
        let application = self.guard.application_from_request(request)?;
        self.review(&application).await?;

        let initial = self.price(application);
        if !initial.negotiable() {
            return Err(NegotiationError::AlreadyCompliant {
                initial: Box::new(initial),
            }
            .into());
        }

        let mut conversation = negotiation_transcript(history, &initial, message);
        let reply = self
            .advisor
            .propose_terms(&conversation)
            .await
            .inspect_err(|err| warn!(error = %err, "advisor negotiation call failed"))?;
        let payload = parse_negotiation_reply(&reply, initial.application.terms.principal)
            .inspect_err(|err| warn!(error = %err, "advisor negotiation reply rejected"))?;
        conversation.push(ChatMessage::assistant(reply));

        let negotiation = self.guard.negotiation_from_payload(&payload)?;
        let round = self.engine.negotiate(&initial, &negotiation)?;
        info!(
            attempt = round.attempt_number,
            parameter = round.negotiated_parameter.tag(),
            status = ?round.status,
            "chat negotiation round evaluated"
        );

        Ok(ChatNegotiation {
            round,
            conversation,
        })
    }

    async fn review(&self, application: &LoanApplication) -> Result<(), LendingServiceError> {
        let verdict = self
            .advisor
            .review(application)
            .await
            .inspect_err(|err| warn!(error = %err, "advisor oversight call failed"))?;

        match verdict {
            OversightVerdict::Clear => Ok(()),
            OversightVerdict::Flagged { message } => {
                warn!(
                    credit_score = application.credit_score,
                    %message,
                    "application flagged by oversight"
                );
                Err(LendingServiceError::Oversight { message })
            }
        }
    }

    fn price(&self, application: LoanApplication) -> LoanQuote {
        let quote = evaluation::quote(application);
        info!(
            tier = quote.application.tier.label(),
            meets_requirement = quote.evaluation.meets_requirement,
            term_months = quote.application.terms.term_months,
            "quote evaluated"
        );
        quote
    }
}

/// Error raised by the lending service.
#[derive(Debug, thiserror::Error)]
pub enum LendingServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error("application flagged for review: {message}")]
    Oversight { message: String },
    #[error(transparent)]
    Upstream(#[from] AdvisorError),
}

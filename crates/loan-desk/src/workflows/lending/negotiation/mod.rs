//! Attempt-bounded negotiation over a failed initial offer.
//!
//! Every round is evaluated against the original offer; nothing carries over
//! between rounds except what the caller sends back.

mod counter;
mod request;

pub use counter::{
    counter_offer, AdjustedParameter, CounterOffer, CounterProposal, LOW_RATE_COUNTER_NOTICE,
    ZERO_RATE_COUNTER_NOTICE,
};
pub use request::{Coverage, NegotiatedParameter, NegotiationRequest, TermChange};

use serde::Serialize;

use super::evaluation::{evaluate, LoanQuote, OfferEvaluation};
use super::options::{self, OptionMenu};

pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationStatus {
    Accepted,
    CounterOfferSent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationPhase {
    Initial,
    InNegotiation,
    Terminal,
}

impl NegotiationPhase {
    /// Phase of a freshly quoted offer. Compliant offers have nothing to negotiate.
    pub fn before_first_round(quote: &LoanQuote) -> Self {
        if quote.negotiable() {
            NegotiationPhase::Initial
        } else {
            NegotiationPhase::Terminal
        }
    }

    /// Phase a client lands in after a round with the given outcome.
    pub fn after(status: NegotiationStatus, remaining_attempts: u32) -> Self {
        match status {
            NegotiationStatus::Accepted => NegotiationPhase::Terminal,
            NegotiationStatus::CounterOfferSent if remaining_attempts == 0 => {
                NegotiationPhase::Terminal
            }
            NegotiationStatus::CounterOfferSent => NegotiationPhase::InNegotiation,
        }
    }
}

/// Outcome of one negotiation attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationRound {
    pub attempt_number: u32,
    pub remaining_attempts: u32,
    pub negotiated_parameter: NegotiatedParameter,
    pub status: NegotiationStatus,
    pub phase: NegotiationPhase,
    pub original: LoanQuote,
    pub negotiated: OfferEvaluation,
    pub counter_offer: Option<CounterOffer>,
}

impl NegotiationRound {
    pub fn accepted(&self) -> bool {
        matches!(self.status, NegotiationStatus::Accepted)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NegotiationError {
    #[error("negotiation is not available because the initial offer already meets the benchmark")]
    AlreadyCompliant { initial: Box<LoanQuote> },
    #[error(
        "maximum negotiation attempts ({}) exceeded (received attempt {attempt}); please proceed with one of the original offers",
        MAX_ATTEMPTS
    )]
    AttemptsExhausted {
        attempt: u32,
        original_options: Box<OptionMenu>,
    },
}

/// Stateless negotiator applying the counter-offer rules to a single round.
#[derive(Debug, Clone, Default)]
pub struct NegotiationEngine;

impl NegotiationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn negotiate(
        &self,
        original: &LoanQuote,
        request: &NegotiationRequest,
    ) -> Result<NegotiationRound, NegotiationError> {
        if !original.negotiable() {
            return Err(NegotiationError::AlreadyCompliant {
                initial: Box::new(original.clone()),
            });
        }

        if request.attempt_number > MAX_ATTEMPTS {
            let original_options = original.options.clone().unwrap_or_else(|| {
                options::generate(
                    &original.application.terms,
                    original.application.tier,
                    original.evaluation.benchmark.total,
                )
            });
            return Err(NegotiationError::AttemptsExhausted {
                attempt: request.attempt_number,
                original_options: Box::new(original_options),
            });
        }

        let tier = original.application.tier;
        let parameter = request.change.parameter();
        let working = request.change.apply(original.application.terms);
        let negotiated = evaluate(working, tier);

        let (status, counter_offer) = if negotiated.meets_requirement {
            (NegotiationStatus::Accepted, None)
        } else {
            (
                NegotiationStatus::CounterOfferSent,
                Some(counter_offer(working, tier, parameter)),
            )
        };

        let remaining_attempts = MAX_ATTEMPTS - request.attempt_number;

        Ok(NegotiationRound {
            attempt_number: request.attempt_number,
            remaining_attempts,
            negotiated_parameter: parameter,
            status,
            phase: NegotiationPhase::after(status, remaining_attempts),
            original: original.clone(),
            negotiated,
            counter_offer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_turns_terminal_on_acceptance_or_last_counter() {
        assert_eq!(
            NegotiationPhase::after(NegotiationStatus::Accepted, 2),
            NegotiationPhase::Terminal
        );
        assert_eq!(
            NegotiationPhase::after(NegotiationStatus::CounterOfferSent, 0),
            NegotiationPhase::Terminal
        );
        assert_eq!(
            NegotiationPhase::after(NegotiationStatus::CounterOfferSent, 1),
            NegotiationPhase::InNegotiation
        );
    }

    #[test]
    fn status_serializes_in_screaming_case() {
        let value = serde_json::to_value(NegotiationStatus::CounterOfferSent).expect("serializes");
        assert_eq!(value, "COUNTER_OFFER_SENT");
    }
}

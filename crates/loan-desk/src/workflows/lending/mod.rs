//! Credit-tiered loan pricing and bounded negotiation.
//!
//! A request flows through the guard, tier resolution, profit calculation and
//! evaluation in that order. Failing offers get an option menu and may be
//! negotiated for up to three attempts, each judged against the original offer.

pub mod advisor;
pub mod domain;
pub mod evaluation;
pub(crate) mod guard;
pub mod negotiation;
pub mod options;
pub mod pricing;
pub mod router;
pub mod service;
pub mod tiers;
pub mod views;

#[cfg(test)]
mod tests;

pub use advisor::{
    AdvisorError, ChatMessage, ChatRole, ConfiguredAdvisor, DisabledAdvisor, NegotiationAdvisor,
    OpenRouterAdvisor, OversightVerdict,
};
pub use domain::{LoanApplication, LoanRequest, LoanTerms, NegotiatorPayload};
pub use evaluation::{LoanQuote, OfferEvaluation};
pub use guard::{LoanGuard, ValidationError, DEFAULT_TERM_MONTHS};
pub use negotiation::{
    CounterOffer, NegotiatedParameter, NegotiationEngine, NegotiationError, NegotiationPhase,
    NegotiationRequest, NegotiationRound, NegotiationStatus, MAX_ATTEMPTS,
};
pub use options::{OptionMenu, PricedOption, TimeOptions};
pub use pricing::ProfitBreakdown;
pub use router::lending_router;
pub use service::{ChatNegotiation, LendingService, LendingServiceError};
pub use tiers::{CreditTier, TierProfile};
pub use views::{NegotiationView, QuoteView};

use serde::Serialize;

use super::request::NegotiatedParameter;
use crate::workflows::lending::domain::LoanTerms;
use crate::workflows::lending::pricing::{
    monthly_installment, months_to_reach, required_rate_percent, ProfitBreakdown, UnreachableTerm,
};
use crate::workflows::lending::tiers::CreditTier;

pub const ZERO_RATE_COUNTER_NOTICE: &str =
    "Cannot generate counter-offer with 0% or negative interest rate. Please increase the rate.";

pub const LOW_RATE_COUNTER_NOTICE: &str =
    "Interest rate is too low to reach the benchmark within any loan duration. Please increase the rate.";

/// Dimension the system moved to restore compliance. Principal is never one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdjustedParameter {
    #[serde(rename = "R")]
    Rate,
    #[serde(rename = "T")]
    Term,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterProposal {
    pub terms: LoanTerms,
    pub adjusted: AdjustedParameter,
    pub profit: ProfitBreakdown,
    pub monthly_installment: f64,
    pub total_repayment: f64,
}

impl CounterProposal {
    fn priced(terms: LoanTerms, adjusted: AdjustedParameter) -> Self {
        let profit = ProfitBreakdown::compute(
            terms.principal,
            terms.annual_rate_percent,
            terms.term_months,
        );
        Self {
            terms,
            adjusted,
            profit,
            monthly_installment: monthly_installment(
                terms.principal,
                terms.annual_rate_percent,
                terms.term_months,
            ),
            total_repayment: terms.principal + profit.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CounterOffer {
    Proposal(CounterProposal),
    Unavailable {
        message: &'static str,
        suggested_rate_percent: f64,
    },
}

impl CounterOffer {
    pub fn proposal(&self) -> Option<&CounterProposal> {
        match self {
            CounterOffer::Proposal(proposal) => Some(proposal),
            CounterOffer::Unavailable { .. } => None,
        }
    }
}

/// Build the single counter-offer for non-compliant `working` terms.
///
/// The required profit is the tier benchmark at the working principal and
/// working term, recomputed here rather than taken from the initial offer.
pub fn counter_offer(
    working: LoanTerms,
    tier: CreditTier,
    parameter: NegotiatedParameter,
) -> CounterOffer {
    let required_total = ProfitBreakdown::compute(
        working.principal,
        tier.benchmark_rate_percent(),
        working.term_months,
    )
    .total;

    match parameter {
        NegotiatedParameter::Principal => CounterOffer::Proposal(CounterProposal::priced(
            working.with_rate(tier.benchmark_rate_percent()),
            AdjustedParameter::Rate,
        )),
        NegotiatedParameter::Rate => {
            match months_to_reach(
                working.principal,
                working.annual_rate_percent,
                required_total,
            ) {
                Ok(months) => CounterOffer::Proposal(CounterProposal::priced(
                    working.with_term(months.max(1)),
                    AdjustedParameter::Term,
                )),
                Err(unreachable) => CounterOffer::Unavailable {
                    message: match unreachable {
                        UnreachableTerm::NoMonthlyProfit => ZERO_RATE_COUNTER_NOTICE,
                        UnreachableTerm::TooManyMonths => LOW_RATE_COUNTER_NOTICE,
                    },
                    suggested_rate_percent: tier.benchmark_rate_percent(),
                },
            }
        }
        NegotiatedParameter::Term | NegotiatedParameter::All | NegotiatedParameter::Multiple => {
            let rate_percent =
                required_rate_percent(working.principal, required_total, working.term_months);
            CounterOffer::Proposal(CounterProposal::priced(
                working.with_rate(rate_percent),
                AdjustedParameter::Rate,
            ))
        }
    }
}

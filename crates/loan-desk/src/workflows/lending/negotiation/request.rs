use serde::{Deserialize, Serialize};

use crate::workflows::lending::domain::LoanTerms;

/// Which loan dimensions the negotiator asked to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NegotiatedParameter {
    #[serde(rename = "P")]
    Principal,
    #[serde(rename = "R")]
    Rate,
    #[serde(rename = "T")]
    Term,
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "MULTIPLE")]
    Multiple,
}

impl NegotiatedParameter {
    pub const fn tag(self) -> &'static str {
        match self {
            NegotiatedParameter::Principal => "P",
            NegotiatedParameter::Rate => "R",
            NegotiatedParameter::Term => "T",
            NegotiatedParameter::All => "ALL",
            NegotiatedParameter::Multiple => "MULTIPLE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    All,
    Multiple,
}

/// Negotiator's requested change, classified once at the entry point.
///
/// Values replace the original offer's, never a previous round's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TermChange {
    Principal {
        principal: f64,
    },
    Rate {
        rate_percent: f64,
    },
    Term {
        term_months: u32,
    },
    Combined {
        coverage: Coverage,
        principal: Option<f64>,
        rate_percent: Option<f64>,
        term_months: Option<u32>,
    },
}

impl TermChange {
    /// `None` when nothing was supplied.
    pub fn classify(
        principal: Option<f64>,
        rate_percent: Option<f64>,
        term_months: Option<u32>,
    ) -> Option<Self> {
        let change = match (principal, rate_percent, term_months) {
            (None, None, None) => return None,
            (Some(principal), None, None) => TermChange::Principal { principal },
            (None, Some(rate_percent), None) => TermChange::Rate { rate_percent },
            (None, None, Some(term_months)) => TermChange::Term { term_months },
            (Some(_), Some(_), Some(_)) => TermChange::Combined {
                coverage: Coverage::All,
                principal,
                rate_percent,
                term_months,
            },
            _ => TermChange::Combined {
                coverage: Coverage::Multiple,
                principal,
                rate_percent,
                term_months,
            },
        };
        Some(change)
    }

    pub fn parameter(&self) -> NegotiatedParameter {
        match self {
            TermChange::Principal { .. } => NegotiatedParameter::Principal,
            TermChange::Rate { .. } => NegotiatedParameter::Rate,
            TermChange::Term { .. } => NegotiatedParameter::Term,
            TermChange::Combined {
                coverage: Coverage::All,
                ..
            } => NegotiatedParameter::All,
            TermChange::Combined {
                coverage: Coverage::Multiple,
                ..
            } => NegotiatedParameter::Multiple,
        }
    }

    /// Working terms for this round: supplied values over the original offer.
    pub fn apply(&self, original: LoanTerms) -> LoanTerms {
        match *self {
            TermChange::Principal { principal } => original.with_principal(principal),
            TermChange::Rate { rate_percent } => original.with_rate(rate_percent),
            TermChange::Term { term_months } => original.with_term(term_months),
            TermChange::Combined {
                principal,
                rate_percent,
                term_months,
                ..
            } => LoanTerms::new(
                principal.unwrap_or(original.principal),
                rate_percent.unwrap_or(original.annual_rate_percent),
                term_months.unwrap_or(original.term_months),
            ),
        }
    }
}

/// Validated negotiation round. `attempt_number` is at least 1; the ceiling is
/// enforced by the engine so it can point back at the original options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegotiationRequest {
    pub attempt_number: u32,
    pub change: TermChange,
}

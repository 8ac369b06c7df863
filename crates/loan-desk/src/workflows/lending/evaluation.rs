use serde::Serialize;

use super::domain::{LoanApplication, LoanTerms};
use super::options::{self, OptionMenu};
use super::pricing::{monthly_installment, ProfitBreakdown};
use super::tiers::CreditTier;

/// Proposal measured against the tier benchmark at the same principal and term.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferEvaluation {
    pub terms: LoanTerms,
    pub tier: CreditTier,
    pub proposed: ProfitBreakdown,
    pub benchmark: ProfitBreakdown,
    pub monthly_installment: f64,
    pub meets_requirement: bool,
    pub profit_gap: f64,
}

impl OfferEvaluation {
    pub fn total_repayment(&self) -> f64 {
        self.terms.principal + self.proposed.total
    }
}

/// Compare a proposal against the benchmark for `tier`.
///
/// Principal and term are shared by both sides, so the rate comparison decides
/// compliance. Comparing rounded profits could disagree with it at the margin.
pub fn evaluate(terms: LoanTerms, tier: CreditTier) -> OfferEvaluation {
    let proposed = ProfitBreakdown::compute(
        terms.principal,
        terms.annual_rate_percent,
        terms.term_months,
    );
    let benchmark = ProfitBreakdown::compute(
        terms.principal,
        tier.benchmark_rate_percent(),
        terms.term_months,
    );
    let meets_requirement = terms.rate_decimal() >= tier.benchmark_rate();
    let profit_gap = if meets_requirement {
        0.0
    } else {
        (benchmark.total - proposed.total).max(0.0)
    };

    OfferEvaluation {
        terms,
        tier,
        proposed,
        benchmark,
        monthly_installment: monthly_installment(
            terms.principal,
            terms.annual_rate_percent,
            terms.term_months,
        ),
        meets_requirement,
        profit_gap,
    }
}

/// Initial offer: the evaluation plus the option menu when the proposal falls short.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuote {
    pub application: LoanApplication,
    pub evaluation: OfferEvaluation,
    pub options: Option<OptionMenu>,
}

impl LoanQuote {
    pub fn negotiable(&self) -> bool {
        !self.evaluation.meets_requirement
    }
}

/// Run tier benchmark, evaluation, and (on failure) option generation in that order.
pub fn quote(application: LoanApplication) -> LoanQuote {
    let evaluation = evaluate(application.terms, application.tier);
    let options = if evaluation.meets_requirement {
        None
    } else {
        Some(options::generate(
            &application.terms,
            application.tier,
            evaluation.benchmark.total,
        ))
    };

    LoanQuote {
        application,
        evaluation,
        options,
    }
}

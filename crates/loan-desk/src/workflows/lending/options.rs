use serde::Serialize;

use super::domain::LoanTerms;
use super::pricing::{
    monthly_installment, months_to_reach, required_rate_percent, ProfitBreakdown, UnreachableTerm,
};
use super::tiers::CreditTier;

const RATE_LADDER: [(f64, &str); 3] = [
    (1.00, "Minimum Required"),
    (1.15, "Recommended"),
    (1.35, "Premium"),
];

const MIN_SHORT_TERM_MONTHS: u32 = 6;

pub const ZERO_RATE_TIME_NOTICE: &str =
    "Cannot calculate time options with 0% interest rate. Please use rate adjustment options above.";

pub const LOW_RATE_TIME_NOTICE: &str =
    "Interest rate is too low to reach the benchmark within any loan duration. Please use rate adjustment options above.";

/// One entry of the option menu, fully priced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedOption {
    pub option_number: u8,
    pub label: &'static str,
    pub terms: LoanTerms,
    pub profit: ProfitBreakdown,
    pub monthly_installment: f64,
    pub total_repayment: f64,
}

impl PricedOption {
    fn new(
        option_number: u8,
        label: &'static str,
        terms: LoanTerms,
        profit: ProfitBreakdown,
    ) -> Self {
        Self {
            option_number,
            label,
            terms,
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

/// Duration-based alternatives, or a notice when no duration can be solved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TimeOptions {
    Available { options: Vec<PricedOption> },
    Unavailable { message: String },
}

impl TimeOptions {
    pub fn options(&self) -> &[PricedOption] {
        match self {
            TimeOptions::Available { options } => options,
            TimeOptions::Unavailable { .. } => &[],
        }
    }
}

/// Alternatives offered when a proposal misses the benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionMenu {
    pub by_adjusting_rate: Vec<PricedOption>,
    pub by_adjusting_time: TimeOptions,
}

pub fn generate(terms: &LoanTerms, tier: CreditTier, required_total: f64) -> OptionMenu {
    OptionMenu {
        by_adjusting_rate: rate_options(terms.principal, tier.benchmark_rate(), terms.term_months),
        by_adjusting_time: time_options(terms.principal, terms.annual_rate_percent, required_total),
    }
}

/// Three rates at the proposal's term: the benchmark and two premiums above it.
pub fn rate_options(principal: f64, benchmark_rate: f64, term_months: u32) -> Vec<PricedOption> {
    RATE_LADDER
        .iter()
        .zip(1_u8..)
        .map(|(&(multiplier, label), option_number)| {
            let rate_percent = benchmark_rate * multiplier * 100.0;
            let terms = LoanTerms::new(principal, rate_percent, term_months);
            let profit = ProfitBreakdown::compute(principal, rate_percent, term_months);
            PricedOption::new(option_number, label, terms, profit)
        })
        .collect()
}

/// Three durations anchored on the term at which the current rate alone would
/// clear the benchmark. Each duration carries the rate re-solved so that it
/// earns exactly `required_total`; the rate, not the duration, is what makes
/// the option compliant.
pub fn time_options(principal: f64, current_rate_percent: f64, required_total: f64) -> TimeOptions {
    let base_months = match months_to_reach(principal, current_rate_percent, required_total) {
        Ok(months) => months.max(1),
        Err(unreachable) => {
            let message = match unreachable {
                UnreachableTerm::NoMonthlyProfit => ZERO_RATE_TIME_NOTICE,
                UnreachableTerm::TooManyMonths => LOW_RATE_TIME_NOTICE,
            };
            return TimeOptions::Unavailable {
                message: message.to_string(),
            };
        }
    };

    let durations = [
        (
            MIN_SHORT_TERM_MONTHS.max(base_months / 2),
            "Shorter Duration",
        ),
        (base_months, "Standard Duration"),
        (base_months.saturating_mul(2), "Extended Duration"),
    ];

    let options = durations
        .into_iter()
        .zip(1_u8..)
        .map(|((months, label), option_number)| {
            let rate_percent = required_rate_percent(principal, required_total, months);
            let terms = LoanTerms::new(principal, rate_percent, months);
            PricedOption::new(
                option_number,
                label,
                terms,
                ProfitBreakdown::spread(required_total, months),
            )
        })
        .collect();

    TimeOptions::Available { options }
}

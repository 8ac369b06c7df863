//! Profit and installment arithmetic.
//!
//! Profit uses simple, non-compounding interest while the installment (EMI) uses
//! the amortizing formula with monthly compounding. The two figures answer
//! different questions and are reported side by side without reconciliation.

use serde::Serialize;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Lender profit on a loan under the simple-interest model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitBreakdown {
    pub annual: f64,
    pub monthly: f64,
    pub total: f64,
}

impl ProfitBreakdown {
    pub fn compute(principal: f64, rate_percent: f64, term_months: u32) -> Self {
        let annual = principal * (rate_percent / 100.0);
        let monthly = annual / MONTHS_PER_YEAR;
        Self {
            annual,
            monthly,
            total: monthly * f64::from(term_months),
        }
    }

    /// Breakdown that earns exactly `total` over `term_months`.
    pub fn spread(total: f64, term_months: u32) -> Self {
        let monthly = total / f64::from(term_months);
        Self {
            annual: monthly * MONTHS_PER_YEAR,
            monthly,
            total,
        }
    }
}

/// Equated monthly installment for an amortizing loan.
pub fn monthly_installment(principal: f64, annual_rate_percent: f64, term_months: u32) -> f64 {
    let months = f64::from(term_months);
    if annual_rate_percent == 0.0 {
        return principal / months;
    }

    let monthly_rate = annual_rate_percent / 100.0 / MONTHS_PER_YEAR;
    let growth = (1.0 + monthly_rate).powf(months);
    principal * monthly_rate * growth / (growth - 1.0)
}

/// Annual rate (percent) at which `principal` earns `required_total` over `term_months`.
pub fn required_rate_percent(principal: f64, required_total: f64, term_months: u32) -> f64 {
    let required_monthly = required_total / f64::from(term_months);
    let required_annual = required_monthly * MONTHS_PER_YEAR;
    (required_annual / principal) * 100.0
}

/// Why no duration could be solved for a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreachableTerm {
    /// The rate earns nothing per month.
    NoMonthlyProfit,
    /// The rate earns so little that the duration does not fit a term.
    TooManyMonths,
}

/// Smallest whole number of months at which `rate_percent` earns `required_total`.
pub fn months_to_reach(
    principal: f64,
    rate_percent: f64,
    required_total: f64,
) -> Result<u32, UnreachableTerm> {
    let monthly = ProfitBreakdown::compute(principal, rate_percent, 1).monthly;
    if monthly <= 0.0 {
        return Err(UnreachableTerm::NoMonthlyProfit);
    }

    let months = (required_total / monthly).ceil();
    if months.is_finite() && months <= f64::from(u32::MAX) {
        Ok(months.max(0.0) as u32)
    } else {
        Err(UnreachableTerm::TooManyMonths)
    }
}

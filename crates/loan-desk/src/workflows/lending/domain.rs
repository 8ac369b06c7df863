use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tiers::CreditTier;

/// Loan application as received over the wire.
///
/// Numeric fields stay as raw JSON values so the guard can name the offending field
/// and echo back what it received instead of failing inside the deserializer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_in_months: Option<Value>,
}

impl LoanRequest {
    pub fn new(
        principal: f64,
        interest_rate: f64,
        credit_score: i64,
        salary: f64,
        time_in_months: Option<i64>,
    ) -> Self {
        Self {
            principal: Some(Value::from(principal)),
            interest_rate: Some(Value::from(interest_rate)),
            credit_score: Some(Value::from(credit_score)),
            salary: Some(Value::from(salary)),
            time_in_months: time_in_months.map(Value::from),
        }
    }
}

/// Negotiator-supplied changes (`negotiatorPara`), untrusted until validated.
///
/// The same shape is produced by the chat advisor so both paths share one validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NegotiatorPayload {
    #[serde(rename = "P", default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Value>,
    #[serde(rename = "R", default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Value>,
    #[serde(rename = "T", default, skip_serializing_if = "Option::is_none")]
    pub term: Option<Value>,
    #[serde(rename = "attemptNumber", default, skip_serializing_if = "Option::is_none")]
    pub attempt_number: Option<Value>,
}

impl NegotiatorPayload {
    pub fn with_attempt(attempt_number: i64) -> Self {
        Self {
            attempt_number: Some(Value::from(attempt_number)),
            ..Self::default()
        }
    }

    pub fn principal(mut self, principal: f64) -> Self {
        self.principal = Some(Value::from(principal));
        self
    }

    pub fn rate(mut self, rate_percent: f64) -> Self {
        self.rate = Some(Value::from(rate_percent));
        self
    }

    pub fn term(mut self, term_months: i64) -> Self {
        self.term = Some(Value::from(term_months));
        self
    }
}

/// Principal, annual rate, and duration of a loan. Recomputed, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub term_months: u32,
}

impl LoanTerms {
    pub const fn new(principal: f64, annual_rate_percent: f64, term_months: u32) -> Self {
        Self {
            principal,
            annual_rate_percent,
            term_months,
        }
    }

    pub fn rate_decimal(&self) -> f64 {
        self.annual_rate_percent / 100.0
    }

    pub fn term_years(&self) -> f64 {
        f64::from(self.term_months) / 12.0
    }

    pub const fn with_principal(self, principal: f64) -> Self {
        Self { principal, ..self }
    }

    pub const fn with_rate(self, annual_rate_percent: f64) -> Self {
        Self {
            annual_rate_percent,
            ..self
        }
    }

    pub const fn with_term(self, term_months: u32) -> Self {
        Self {
            term_months,
            ..self
        }
    }
}

/// Validated application: terms in domain, score resolved to exactly one tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    pub terms: LoanTerms,
    pub credit_score: u16,
    pub tier: CreditTier,
    pub annual_salary: f64,
}

impl LoanApplication {
    pub fn monthly_salary(&self) -> f64 {
        self.annual_salary / 12.0
    }
}

use serde_json::Value;

use super::domain::{LoanApplication, LoanRequest, LoanTerms, NegotiatorPayload};
use super::negotiation::{NegotiationRequest, TermChange};
use super::tiers::CreditTier;

pub const DEFAULT_TERM_MONTHS: u32 = 12;

/// Input errors. Every variant names the field and the value that was received.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("`{field}` must be a number (received {received})")]
    NotANumber {
        field: &'static str,
        received: String,
    },
    #[error("`{field}` must be a whole number (received {received})")]
    NotAWholeNumber { field: &'static str, received: f64 },
    #[error("`{field}` must be a positive number (received {received})")]
    NotPositive { field: &'static str, received: f64 },
    #[error("`{field}` cannot be negative (received {received})")]
    Negative { field: &'static str, received: f64 },
    #[error("`creditScore` must be between 300 and 900 (received {received})")]
    CreditScoreOutOfRange { received: i64 },
    #[error("`attemptNumber` must be between 1 and 3 (received {received})")]
    AttemptOutOfRange { received: f64 },
    #[error("`negotiatorPara` must include at least one of P, R, or T")]
    NothingToNegotiate,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::NotANumber { field, .. }
            | ValidationError::NotAWholeNumber { field, .. }
            | ValidationError::NotPositive { field, .. }
            | ValidationError::Negative { field, .. } => *field,
            ValidationError::CreditScoreOutOfRange { .. } => "creditScore",
            ValidationError::AttemptOutOfRange { .. } => "attemptNumber",
            ValidationError::NothingToNegotiate => "negotiatorPara",
        }
    }
}

/// Turns untrusted request payloads into validated domain values.
///
/// Checks run in a fixed order (presence, type, then domain) so the first
/// reported problem is stable for a given payload.
#[derive(Debug, Clone)]
pub struct LoanGuard {
    default_term_months: u32,
}

impl Default for LoanGuard {
    fn default() -> Self {
        Self::with_default_term(DEFAULT_TERM_MONTHS)
    }
}

impl LoanGuard {
    pub fn with_default_term(default_term_months: u32) -> Self {
        Self {
            default_term_months: default_term_months.max(1),
        }
    }

    pub fn default_term_months(&self) -> u32 {
        self.default_term_months
    }

    pub fn application_from_request(
        &self,
        request: &LoanRequest,
    ) -> Result<LoanApplication, ValidationError> {
        let principal = required(&request.principal, "principal")?;
        let interest_rate = required(&request.interest_rate, "interestRate")?;
        let credit_score = required(&request.credit_score, "creditScore")?;
        let salary = required(&request.salary, "salary")?;

        let principal = number(principal, "principal")?;
        let interest_rate = number(interest_rate, "interestRate")?;
        let credit_score = number(credit_score, "creditScore")?;
        let salary = number(salary, "salary")?;

        let principal = positive(principal, "principal")?;
        let interest_rate = non_negative(interest_rate, "interestRate")?;
        let salary = positive(salary, "salary")?;
        let credit_score = whole(credit_score, "creditScore")?;
        let tier = CreditTier::resolve(credit_score)?;

        let term_months = match &request.time_in_months {
            Some(value) => months(value, "timeInMonths")?,
            None => self.default_term_months,
        };

        Ok(LoanApplication {
            terms: LoanTerms::new(principal, interest_rate, term_months),
            // resolve() bounds the score to 300..=900
            credit_score: credit_score as u16,
            tier,
            annual_salary: salary,
        })
    }

    /// Validate negotiator parameters with the same rules regardless of their source.
    pub fn negotiation_from_payload(
        &self,
        payload: &NegotiatorPayload,
    ) -> Result<NegotiationRequest, ValidationError> {
        let attempt = required(&payload.attempt_number, "attemptNumber")?;
        let attempt = number(attempt, "attemptNumber")?;
        if attempt < 1.0 || attempt > f64::from(u32::MAX) {
            return Err(ValidationError::AttemptOutOfRange { received: attempt });
        }
        let attempt_number = whole(attempt, "attemptNumber")?;
        let attempt_number = u32::try_from(attempt_number)
            .map_err(|_| ValidationError::AttemptOutOfRange { received: attempt })?;

        let principal = payload
            .principal
            .as_ref()
            .map(|value| number(value, "P").and_then(|raw| positive(raw, "P")))
            .transpose()?;
        let rate_percent = payload
            .rate
            .as_ref()
            .map(|value| number(value, "R").and_then(|raw| non_negative(raw, "R")))
            .transpose()?;
        let term_months = payload
            .term
            .as_ref()
            .map(|value| months(value, "T"))
            .transpose()?;

        let change = TermChange::classify(principal, rate_percent, term_months)
            .ok_or(ValidationError::NothingToNegotiate)?;

        Ok(NegotiationRequest {
            attempt_number,
            change,
        })
    }
}

fn required<'a>(
    value: &'a Option<Value>,
    field: &'static str,
) -> Result<&'a Value, ValidationError> {
    value
        .as_ref()
        .ok_or(ValidationError::MissingField { field })
}

fn number(value: &Value, field: &'static str) -> Result<f64, ValidationError> {
    value
        .as_f64()
        .filter(|raw| raw.is_finite())
        .ok_or_else(|| ValidationError::NotANumber {
            field,
            received: value.to_string(),
        })
}

fn positive(raw: f64, field: &'static str) -> Result<f64, ValidationError> {
    if raw > 0.0 {
        Ok(raw)
    } else {
        Err(ValidationError::NotPositive {
            field,
            received: raw,
        })
    }
}

fn non_negative(raw: f64, field: &'static str) -> Result<f64, ValidationError> {
    if raw >= 0.0 {
        Ok(raw)
    } else {
        Err(ValidationError::Negative {
            field,
            received: raw,
        })
    }
}

fn whole(raw: f64, field: &'static str) -> Result<i64, ValidationError> {
    if raw.fract() != 0.0 || raw.abs() > i64::MAX as f64 {
        return Err(ValidationError::NotAWholeNumber {
            field,
            received: raw,
        });
    }
    Ok(raw as i64)
}

fn months(value: &Value, field: &'static str) -> Result<u32, ValidationError> {
    let raw = positive(number(value, field)?, field)?;
    let whole = whole(raw, field)?;
    u32::try_from(whole).map_err(|_| ValidationError::NotAWholeNumber {
        field,
        received: raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> LoanRequest {
        LoanRequest::new(100_000.0, 8.0, 720, 600_000.0, Some(12))
    }

    #[test]
    fn builds_application_with_resolved_tier() {
        let application = LoanGuard::default()
            .application_from_request(&request())
            .expect("valid request");

        assert_eq!(application.terms, LoanTerms::new(100_000.0, 8.0, 12));
        assert_eq!(application.credit_score, 720);
        assert_eq!(application.tier, CreditTier::Moderate);
        assert_eq!(application.monthly_salary(), 50_000.0);
    }

    #[test]
    fn missing_term_falls_back_to_default() {
        let mut request = request();
        request.time_in_months = None;

        let application = LoanGuard::with_default_term(24)
            .application_from_request(&request)
            .expect("valid request");

        assert_eq!(application.terms.term_months, 24);
    }

    #[test]
    fn reports_first_missing_field() {
        let mut request = request();
        request.interest_rate = None;
        request.salary = None;

        let err = LoanGuard::default()
            .application_from_request(&request)
            .expect_err("missing fields rejected");

        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "interestRate"
            }
        );
    }

    #[test]
    fn non_numeric_values_echo_what_was_received() {
        let mut request = request();
        request.principal = Some(json!("100000"));

        let err = LoanGuard::default()
            .application_from_request(&request)
            .expect_err("string principal rejected");

        assert_eq!(err.field(), "principal");
        assert!(err.to_string().contains("\"100000\""), "{err}");
    }

    #[test]
    fn domain_checks_name_field_and_value() {
        let cases = [
            ("principal", json!(0), "principal"),
            ("interestRate", json!(-1.5), "interestRate"),
            ("salary", json!(-10), "salary"),
            ("creditScore", json!(901), "creditScore"),
            ("creditScore", json!(720.5), "creditScore"),
            ("timeInMonths", json!(0), "timeInMonths"),
            ("timeInMonths", json!(6.5), "timeInMonths"),
        ];

        for (key, value, field) in cases {
            let mut request = request();
            let slot = match key {
                "principal" => &mut request.principal,
                "interestRate" => &mut request.interest_rate,
                "salary" => &mut request.salary,
                "creditScore" => &mut request.credit_score,
                _ => &mut request.time_in_months,
            };
            *slot = Some(value.clone());

            let err = LoanGuard::default()
                .application_from_request(&request)
                .expect_err("out of domain value rejected");
            assert_eq!(err.field(), field, "{key}={value}");
            assert!(
                err.to_string().contains(&value.to_string()),
                "message `{err}` should echo {value}"
            );
        }
    }

    #[test]
    fn zero_rate_is_accepted() {
        let mut request = request();
        request.interest_rate = Some(json!(0));

        let application = LoanGuard::default()
            .application_from_request(&request)
            .expect("zero rate is valid input");
        assert_eq!(application.terms.annual_rate_percent, 0.0);
    }

    #[test]
    fn negotiation_requires_an_attempt_number_of_at_least_one() {
        let guard = LoanGuard::default();

        let missing = NegotiatorPayload {
            rate: Some(json!(10)),
            ..NegotiatorPayload::default()
        };
        assert_eq!(
            guard.negotiation_from_payload(&missing),
            Err(ValidationError::MissingField {
                field: "attemptNumber"
            })
        );

        let zero = NegotiatorPayload::with_attempt(0).rate(10.0);
        assert_eq!(
            guard.negotiation_from_payload(&zero),
            Err(ValidationError::AttemptOutOfRange { received: 0.0 })
        );

        let text = NegotiatorPayload {
            attempt_number: Some(json!("one")),
            rate: Some(json!(10)),
            ..NegotiatorPayload::default()
        };
        assert!(matches!(
            guard.negotiation_from_payload(&text),
            Err(ValidationError::NotANumber {
                field: "attemptNumber",
                ..
            })
        ));
    }

    #[test]
    fn negotiation_values_are_validated_like_application_values() {
        let guard = LoanGuard::default();

        let negative_rate = NegotiatorPayload::with_attempt(1).rate(-2.0);
        assert!(matches!(
            guard.negotiation_from_payload(&negative_rate),
            Err(ValidationError::Negative { field: "R", .. })
        ));

        let fractional_term = NegotiatorPayload {
            term: Some(json!(18.5)),
            ..NegotiatorPayload::with_attempt(1)
        };
        assert!(matches!(
            guard.negotiation_from_payload(&fractional_term),
            Err(ValidationError::NotAWholeNumber { field: "T", .. })
        ));

        let nothing = NegotiatorPayload::with_attempt(2);
        assert_eq!(
            guard.negotiation_from_payload(&nothing),
            Err(ValidationError::NothingToNegotiate)
        );
    }

    #[test]
    fn attempts_beyond_the_limit_pass_the_guard() {
        let request = LoanGuard::default()
            .negotiation_from_payload(&NegotiatorPayload::with_attempt(4).rate(10.0))
            .expect("range ceiling is enforced by the engine");
        assert_eq!(request.attempt_number, 4);
    }

    #[test]
    fn huge_attempts_are_out_of_range() {
        let mut payload = NegotiatorPayload::with_attempt(1).rate(10.0);
        payload.attempt_number = Some(json!(9.3e18));

        assert_eq!(
            LoanGuard::default().negotiation_from_payload(&payload),
            Err(ValidationError::AttemptOutOfRange { received: 9.3e18 })
        );
    }
}

//! Offline quoting of many applications from a CSV export.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::workflows::lending::evaluation::{self, LoanQuote};
use crate::workflows::lending::{LoanGuard, LoanRequest, ValidationError};

#[derive(Debug)]
pub enum BatchImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for BatchImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchImportError::Io(err) => write!(f, "failed to read loan batch: {}", err),
            BatchImportError::Csv(err) => write!(f, "invalid loan batch CSV: {}", err),
        }
    }
}

impl std::error::Error for BatchImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchImportError::Io(err) => Some(err),
            BatchImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for BatchImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for BatchImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// One CSV row and what became of it.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub line: u64,
    pub outcome: Result<LoanQuote, ValidationError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteBatch {
    pub entries: Vec<BatchEntry>,
}

impl QuoteBatch {
    pub fn quotes(&self) -> impl Iterator<Item = (u64, &LoanQuote)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.outcome.as_ref().ok().map(|quote| (entry.line, quote)))
    }

    pub fn rejections(&self) -> impl Iterator<Item = (u64, &ValidationError)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.outcome.as_ref().err().map(|err| (entry.line, err)))
    }

    pub fn compliant_count(&self) -> usize {
        self.quotes()
            .filter(|(_, quote)| quote.evaluation.meets_requirement)
            .count()
    }
}

/// Quotes every row of a CSV with columns `principal`, `interest_rate`,
/// `credit_score`, `salary`, and optionally `time_in_months`.
///
/// Invalid rows are kept with their validation error; only unreadable CSV aborts.
pub struct QuoteBatchImporter;

impl QuoteBatchImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        guard: &LoanGuard,
    ) -> Result<QuoteBatch, BatchImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, guard)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        guard: &LoanGuard,
    ) -> Result<QuoteBatch, BatchImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut entries = Vec::new();

        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|position| position.line()).unwrap_or_default();
            let row: QuoteRow = record.deserialize(Some(&headers))?;

            let outcome = guard
                .application_from_request(&row.into_request())
                .map(evaluation::quote);
            entries.push(BatchEntry { line, outcome });
        }

        Ok(QuoteBatch { entries })
    }
}

#[derive(Debug, Deserialize)]
struct QuoteRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    principal: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    interest_rate: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    credit_score: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    salary: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    time_in_months: Option<String>,
}

impl QuoteRow {
    fn into_request(self) -> LoanRequest {
        LoanRequest {
            principal: self.principal.map(cell),
            interest_rate: self.interest_rate.map(cell),
            credit_score: self.credit_score.map(cell),
            salary: self.salary.map(cell),
            time_in_months: self.time_in_months.map(cell),
        }
    }
}

/// Numbers become JSON numbers; anything else stays text so the guard can echo it.
fn cell(raw: String) -> Value {
    if let Ok(whole) = raw.parse::<i64>() {
        return Value::from(whole);
    }
    match raw.parse::<f64>() {
        Ok(number) if number.is_finite() => Value::from(number),
        _ => Value::String(raw),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|raw| !raw.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::lending::CreditTier;

    const CSV: &str = "\
principal,interest_rate,credit_score,salary,time_in_months
100000,8,720,600000,12
100000,13,720,600000,
250000,abc,800,900000,24
50000,5,1000,400000,6
75000,7.5,610,300000,18
";

    #[test]
    fn quotes_valid_rows_and_keeps_going_past_bad_ones() {
        let batch = QuoteBatchImporter::from_reader(CSV.as_bytes(), &LoanGuard::default())
            .expect("csv parses");

        assert_eq!(batch.entries.len(), 5);
        assert_eq!(batch.quotes().count(), 3);
        assert_eq!(batch.compliant_count(), 2);

        let rejections: Vec<_> = batch.rejections().collect();
        assert_eq!(rejections.len(), 2);
        assert_eq!(rejections[0].0, 4);
        assert_eq!(rejections[0].1.field(), "interestRate");
        assert!(rejections[0].1.to_string().contains("\"abc\""));
        assert_eq!(
            *rejections[1].1,
            ValidationError::CreditScoreOutOfRange { received: 1000 }
        );
    }

    #[test]
    fn blank_term_uses_the_default() {
        let batch = QuoteBatchImporter::from_reader(CSV.as_bytes(), &LoanGuard::default())
            .expect("csv parses");
        let (line, quote) = batch.quotes().nth(1).expect("second quote");

        assert_eq!(line, 3);
        assert_eq!(quote.application.terms.term_months, 12);
        assert!(quote.evaluation.meets_requirement);
    }

    #[test]
    fn fractional_rates_and_low_tier_are_priced() {
        let batch = QuoteBatchImporter::from_reader(CSV.as_bytes(), &LoanGuard::default())
            .expect("csv parses");
        let (_, quote) = batch.quotes().last().expect("last quote");

        assert_eq!(quote.application.tier, CreditTier::Low);
        assert_eq!(quote.application.terms.annual_rate_percent, 7.5);
        assert!(quote.evaluation.meets_requirement);
    }

    #[test]
    fn ragged_csv_is_an_import_error() {
        let ragged = "principal,interest_rate,credit_score,salary\n100000,8\n";
        let err = QuoteBatchImporter::from_reader(ragged.as_bytes(), &LoanGuard::default())
            .expect_err("ragged rows rejected");
        assert!(matches!(err, BatchImportError::Csv(_)));
    }
}

use loan_desk::workflows::batch::{BatchImportError, QuoteBatchImporter};
use loan_desk::workflows::lending::{CreditTier, LoanGuard, ValidationError};

fn fixture_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/loan_batch.csv")
}

#[test]
fn importer_quotes_every_valid_row_in_the_export() {
    let batch = QuoteBatchImporter::from_path(fixture_path(), &LoanGuard::default())
        .expect("fixture imports");

    assert_eq!(batch.entries.len(), 6);
    assert_eq!(batch.quotes().count(), 4);
    assert_eq!(batch.compliant_count(), 2);

    let tiers: Vec<_> = batch
        .quotes()
        .map(|(_, quote)| quote.application.tier)
        .collect();
    assert_eq!(
        tiers,
        [
            CreditTier::Moderate,
            CreditTier::Moderate,
            CreditTier::High,
            CreditTier::Low
        ]
    );

    let (_, high) = batch
        .quotes()
        .find(|(_, quote)| quote.application.tier == CreditTier::High)
        .expect("high tier row");
    assert!((high.evaluation.profit_gap - 32_000.0).abs() < 1e-6);
    assert!(high.options.is_some());
}

#[test]
fn importer_reports_rejected_rows_by_line() {
    let batch = QuoteBatchImporter::from_path(fixture_path(), &LoanGuard::default())
        .expect("fixture imports");

    let rejections: Vec<_> = batch
        .rejections()
        .map(|(line, err)| (line, err.clone()))
        .collect();
    assert_eq!(
        rejections,
        [
            (6, ValidationError::CreditScoreOutOfRange { received: 1000 }),
            (
                7,
                ValidationError::MissingField {
                    field: "interestRate"
                }
            ),
        ]
    );
}

#[test]
fn importer_honours_the_guard_default_term() {
    let csv = "principal,interest_rate,credit_score,salary\n120000,10,800,900000\n";
    let batch = QuoteBatchImporter::from_reader(csv.as_bytes(), &LoanGuard::with_default_term(24))
        .expect("csv imports");

    let (_, quote) = batch.quotes().next().expect("one quote");
    assert_eq!(quote.application.terms.term_months, 24);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = QuoteBatchImporter::from_path("does/not/exist.csv", &LoanGuard::default())
        .expect_err("missing file");
    assert!(matches!(err, BatchImportError::Io(_)));
}

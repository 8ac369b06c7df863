use clap::Args;
use loan_desk::error::AppError;
use loan_desk::workflows::batch::{QuoteBatch, QuoteBatchImporter};
use loan_desk::workflows::lending::negotiation::CounterOffer;
use loan_desk::workflows::lending::views::format_inr;
use loan_desk::workflows::lending::{
    DisabledAdvisor, LendingService, LendingServiceError, LoanGuard, LoanQuote, LoanRequest,
    NegotiationRound, NegotiationView, NegotiatorPayload, QuoteView, TimeOptions, MAX_ATTEMPTS,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub(crate) struct LoanArgs {
    /// Principal amount in INR
    #[arg(long)]
    pub(crate) principal: f64,
    /// Proposed annual interest rate in percent
    #[arg(long)]
    pub(crate) rate: f64,
    /// Borrower credit score (300-900)
    #[arg(long)]
    pub(crate) credit_score: i64,
    /// Annual salary in INR
    #[arg(long)]
    pub(crate) salary: f64,
    /// Loan duration in months (defaults to 12)
    #[arg(long)]
    pub(crate) months: Option<i64>,
}

impl LoanArgs {
    fn request(&self) -> LoanRequest {
        LoanRequest::new(
            self.principal,
            self.rate,
            self.credit_score,
            self.salary,
            self.months,
        )
    }
}

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    #[command(flatten)]
    pub(crate) loan: LoanArgs,
    /// Print the HTTP response body instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct NegotiateArgs {
    #[command(flatten)]
    pub(crate) loan: LoanArgs,
    /// Counter-proposed principal (P)
    #[arg(long)]
    pub(crate) new_principal: Option<f64>,
    /// Counter-proposed annual rate in percent (R)
    #[arg(long)]
    pub(crate) new_rate: Option<f64>,
    /// Counter-proposed duration in months (T)
    #[arg(long)]
    pub(crate) new_term: Option<i64>,
    /// Negotiation attempt number (1-3)
    #[arg(long, default_value_t = 1)]
    pub(crate) attempt: i64,
    /// Print the HTTP response body instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

impl NegotiateArgs {
    fn payload(&self) -> NegotiatorPayload {
        let mut payload = NegotiatorPayload::with_attempt(self.attempt);
        if let Some(principal) = self.new_principal {
            payload = payload.principal(principal);
        }
        if let Some(rate) = self.new_rate {
            payload = payload.rate(rate);
        }
        if let Some(term) = self.new_term {
            payload = payload.term(term);
        }
        payload
    }
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV with principal, interest_rate, credit_score, salary, time_in_months columns
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Duration applied to rows without time_in_months
    #[arg(long)]
    pub(crate) default_term: Option<u32>,
}

fn offline_service() -> LendingService<DisabledAdvisor> {
    LendingService::new(Arc::new(DisabledAdvisor))
}

pub(crate) async fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let quote = offline_service().quote(&args.loan.request()).await?;

    if args.json {
        return print_json(&QuoteView::from_quote(&quote));
    }
    render_quote(&quote);
    Ok(())
}

pub(crate) async fn run_negotiate(args: NegotiateArgs) -> Result<(), AppError> {
    let round = match offline_service()
        .negotiate(&args.loan.request(), &args.payload())
        .await
    {
        Ok(round) => round,
        Err(LendingServiceError::Negotiation(err)) => {
            println!("Negotiation refused: {err}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if args.json {
        return print_json(&NegotiationView::from_round(&round));
    }
    render_round(&round);
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let guard = match args.default_term {
        Some(months) => LoanGuard::with_default_term(months),
        None => LoanGuard::default(),
    };
    let batch = QuoteBatchImporter::from_path(&args.csv, &guard)?;
    render_batch(&batch);
    Ok(())
}

fn print_json<T: Serialize>(view: &T) -> Result<(), AppError> {
    let body = serde_json::to_string_pretty(view).map_err(|err| AppError::Io(err.into()))?;
    println!("{body}");
    Ok(())
}

fn render_quote(quote: &LoanQuote) {
    let application = &quote.application;
    let evaluation = &quote.evaluation;
    let terms = &evaluation.terms;

    println!(
        "Loan quote ({} credit tier, score {})",
        application.tier.label(),
        application.credit_score
    );
    println!(
        "- {} at {}% for {} months | EMI {}",
        format_inr(terms.principal),
        terms.annual_rate_percent,
        terms.term_months,
        format_inr(evaluation.monthly_installment)
    );
    println!(
        "- Benchmark {} requires {} profit; proposal earns {}",
        application.tier.benchmark_rate_label(),
        format_inr(evaluation.benchmark.total),
        format_inr(evaluation.proposed.total)
    );

    if evaluation.meets_requirement {
        println!("- Meets the benchmark requirement");
        return;
    }
    println!(
        "- Short of the benchmark by {}; negotiation available ({} attempts)",
        format_inr(evaluation.profit_gap),
        MAX_ATTEMPTS
    );

    let Some(menu) = &quote.options else {
        return;
    };
    println!("Options by adjusting rate:");
    for option in &menu.by_adjusting_rate {
        println!(
            "  {}. {:.2}% over {} months -> profit {}",
            option.option_number,
            option.terms.annual_rate_percent,
            option.terms.term_months,
            format_inr(option.profit.total)
        );
    }
    println!("Options by adjusting time:");
    match &menu.by_adjusting_time {
        TimeOptions::Available { options } => {
            for option in options {
                println!(
                    "  {}. {} months at {}% -> profit {}",
                    option.option_number,
                    option.terms.term_months,
                    option.terms.annual_rate_percent,
                    format_inr(option.profit.total)
                );
            }
        }
        TimeOptions::Unavailable { message } => println!("  {message}"),
    }
}

fn render_round(round: &NegotiationRound) {
    let negotiated = &round.negotiated;
    println!(
        "Negotiation attempt {} of {} ({} changed) -> {:?}",
        round.attempt_number,
        MAX_ATTEMPTS,
        round.negotiated_parameter.tag(),
        round.status
    );
    println!(
        "- Proposed {} at {}% for {} months earns {} (benchmark {})",
        format_inr(negotiated.terms.principal),
        negotiated.terms.annual_rate_percent,
        negotiated.terms.term_months,
        format_inr(negotiated.proposed.total),
        format_inr(negotiated.benchmark.total)
    );

    match &round.counter_offer {
        None => println!("- Accepted"),
        Some(CounterOffer::Proposal(proposal)) => println!(
            "- Counter-offer: {} at {:.2}% for {} months -> profit {} | EMI {}",
            format_inr(proposal.terms.principal),
            proposal.terms.annual_rate_percent,
            proposal.terms.term_months,
            format_inr(proposal.profit.total),
            format_inr(proposal.monthly_installment)
        ),
        Some(CounterOffer::Unavailable {
            message,
            suggested_rate_percent,
        }) => println!("- {message} (suggested rate {suggested_rate_percent:.2}%)"),
    }
    println!("- {} attempts remaining", round.remaining_attempts);
}

fn render_batch(batch: &QuoteBatch) {
    println!(
        "Quoted {} of {} rows ({} meet their benchmark)",
        batch.quotes().count(),
        batch.entries.len(),
        batch.compliant_count()
    );
    for (line, quote) in batch.quotes() {
        let evaluation = &quote.evaluation;
        let verdict = if evaluation.meets_requirement {
            "meets benchmark".to_string()
        } else {
            format!("short by {}", format_inr(evaluation.profit_gap))
        };
        println!(
            "  line {line}: {} tier, {} at {}% for {} months -> {verdict}",
            quote.application.tier.label(),
            format_inr(evaluation.terms.principal),
            evaluation.terms.annual_rate_percent,
            evaluation.terms.term_months
        );
    }
    for (line, err) in batch.rejections() {
        println!("  line {line}: rejected ({err})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan() -> LoanArgs {
        LoanArgs {
            principal: 100_000.0,
            rate: 8.0,
            credit_score: 720,
            salary: 600_000.0,
            months: None,
        }
    }

    #[test]
    fn negotiate_args_only_send_what_was_given() {
        let args = NegotiateArgs {
            loan: loan(),
            new_principal: None,
            new_rate: Some(10.0),
            new_term: None,
            attempt: 2,
            json: false,
        };

        assert_eq!(
            args.payload(),
            NegotiatorPayload::with_attempt(2).rate(10.0)
        );
    }

    #[tokio::test]
    async fn offline_service_quotes_with_the_default_term() {
        let quote = offline_service()
            .quote(&loan().request())
            .await
            .expect("quote");

        assert_eq!(quote.evaluation.terms.term_months, 12);
        assert!(quote.negotiable());
    }
}

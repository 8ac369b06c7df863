//! Response payloads. All rounding to cents happens here and nowhere upstream.

use serde::Serialize;
use serde_json::{json, Value};

use super::advisor::ChatMessage;
use super::domain::LoanTerms;
use super::evaluation::{LoanQuote, OfferEvaluation};
use super::negotiation::{
    AdjustedParameter, CounterOffer, NegotiatedParameter, NegotiationPhase, NegotiationRound,
    NegotiationStatus, MAX_ATTEMPTS,
};
use super::options::{OptionMenu, PricedOption, TimeOptions};
use super::tiers::CreditTier;

pub const CURRENCY: &str = "INR";

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rupee amount with Indian digit grouping, e.g. `₹12,34,567.89`.
pub fn format_inr(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let rupees = (cents / 100).to_string();
    let paise = cents % 100;

    let grouped = if rupees.len() > 3 {
        let (head, tail) = rupees.split_at(rupees.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    } else {
        rupees
    };

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}₹{grouped}.{paise:02}")
}

/// Rate as the caller sent it, e.g. `8%` or `10.5%`.
fn rate_as_given(rate_percent: f64) -> String {
    format!("{rate_percent}%")
}

/// Rate derived by the system, fixed to two decimals.
fn rate_fixed(rate_percent: f64) -> String {
    format!("{rate_percent:.2}%")
}

fn years(terms: &LoanTerms) -> f64 {
    round2(terms.term_years())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileView {
    pub credit_score: u16,
    pub category: CreditTier,
    pub category_range: String,
    pub category_description: &'static str,
    pub annual_salary: String,
    pub monthly_salary: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetailsView {
    pub principal: String,
    pub principal_amount: f64,
    pub proposed_interest_rate: String,
    pub time_in_months: u32,
    pub time_in_years: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkView {
    pub required_rate: &'static str,
    pub required_annual_profit: String,
    pub required_monthly_profit: String,
    pub required_total_profit: String,
    pub required_total_profit_amount: f64,
}

impl BenchmarkView {
    fn from_evaluation(evaluation: &OfferEvaluation) -> Self {
        Self {
            required_rate: evaluation.tier.benchmark_rate_label(),
            required_annual_profit: format_inr(evaluation.benchmark.annual),
            required_monthly_profit: format_inr(evaluation.benchmark.monthly),
            required_total_profit: format_inr(evaluation.benchmark.total),
            required_total_profit_amount: round2(evaluation.benchmark.total),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalView {
    pub proposed_rate: String,
    pub proposed_annual_profit: String,
    pub proposed_monthly_profit: String,
    pub proposed_total_profit: String,
    pub proposed_total_profit_amount: f64,
    pub total_amount: String,
    #[serde(rename = "monthlyEMI")]
    pub monthly_emi: String,
}

impl ProposalView {
    fn from_evaluation(evaluation: &OfferEvaluation) -> Self {
        Self {
            proposed_rate: rate_as_given(evaluation.terms.annual_rate_percent),
            proposed_annual_profit: format_inr(evaluation.proposed.annual),
            proposed_monthly_profit: format_inr(evaluation.proposed.monthly),
            proposed_total_profit: format_inr(evaluation.proposed.total),
            proposed_total_profit_amount: round2(evaluation.proposed.total),
            total_amount: format_inr(evaluation.total_repayment()),
            monthly_emi: format_inr(evaluation.monthly_installment),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationView {
    pub meets_requirement: bool,
    pub profit_gap: f64,
    pub profit_gap_formatted: String,
    pub message: &'static str,
}

impl EvaluationView {
    pub fn from_evaluation(evaluation: &OfferEvaluation) -> Self {
        let message = if evaluation.meets_requirement {
            "✓ Proposed interest rate meets or exceeds the benchmark requirement."
        } else {
            "✗ Proposed interest rate is below the benchmark requirement. Please review the recommended options below."
        };
        Self {
            meets_requirement: evaluation.meets_requirement,
            profit_gap: round2(evaluation.profit_gap),
            profit_gap_formatted: format_inr(evaluation.profit_gap),
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedOptionView {
    pub option_number: u8,
    pub option_label: &'static str,
    pub interest_rate: String,
    pub time_in_months: u32,
    pub time_in_years: f64,
    pub annual_profit: String,
    pub monthly_profit: String,
    pub total_profit: String,
    pub total_profit_amount: f64,
    pub total_amount: String,
    #[serde(rename = "monthlyEMI")]
    pub monthly_emi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PricedOptionView {
    fn from_option(option: &PricedOption) -> Self {
        Self {
            option_number: option.option_number,
            option_label: option.label,
            interest_rate: rate_fixed(option.terms.annual_rate_percent),
            time_in_months: option.terms.term_months,
            time_in_years: years(&option.terms),
            annual_profit: format_inr(option.profit.annual),
            monthly_profit: format_inr(option.profit.monthly),
            total_profit: format_inr(option.profit.total),
            total_profit_amount: round2(option.profit.total),
            total_amount: format_inr(option.total_repayment),
            monthly_emi: format_inr(option.monthly_installment),
            note: None,
        }
    }

    fn with_duration_note(mut self) -> Self {
        self.note = Some(format!(
            "Interest rate adjusted to {} to meet benchmark profit for {} months.",
            self.interest_rate, self.time_in_months
        ));
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OptionEntryView {
    Priced(PricedOptionView),
    Notice { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionGroupView {
    pub description: &'static str,
    pub options: Vec<OptionEntryView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedOptionsView {
    pub message: &'static str,
    pub by_adjusting_rate: OptionGroupView,
    pub by_adjusting_time: OptionGroupView,
}

impl RecommendedOptionsView {
    pub fn from_menu(menu: &OptionMenu) -> Self {
        let by_adjusting_rate = menu
            .by_adjusting_rate
            .iter()
            .map(|option| OptionEntryView::Priced(PricedOptionView::from_option(option)))
            .collect();

        let by_adjusting_time = match &menu.by_adjusting_time {
            TimeOptions::Available { options } => options
                .iter()
                .map(|option| {
                    OptionEntryView::Priced(
                        PricedOptionView::from_option(option).with_duration_note(),
                    )
                })
                .collect(),
            TimeOptions::Unavailable { message } => vec![OptionEntryView::Notice {
                message: message.clone(),
            }],
        };

        Self {
            message: "Here are varied options to meet or exceed the profit margin:",
            by_adjusting_rate: OptionGroupView {
                description: "Keep the same time period, adjust interest rate",
                options: by_adjusting_rate,
            },
            by_adjusting_time: OptionGroupView {
                description: "Keep the same interest rate, adjust time period",
                options: by_adjusting_time,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationAvailabilityView {
    pub available: bool,
    pub phase: NegotiationPhase,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl NegotiationAvailabilityView {
    fn for_quote(quote: &LoanQuote) -> Self {
        if quote.negotiable() {
            Self {
                available: true,
                phase: NegotiationPhase::before_first_round(quote),
                message: "Not satisfied with these options? You can negotiate by providing a negotiatorPara object in your next request.",
                max_attempts: Some(MAX_ATTEMPTS),
                instructions: Some(
                    "Include negotiatorPara with your preferred P (principal), R (rate), or T (time) values along with attemptNumber (1-3)",
                ),
                example: Some(json!({ "negotiatorPara": { "R": 11, "attemptNumber": 1 } })),
            }
        } else {
            Self {
                available: false,
                phase: NegotiationPhase::before_first_round(quote),
                message: "Your offer meets the benchmark requirement. No negotiation needed.",
                max_attempts: None,
                instructions: None,
                example: None,
            }
        }
    }
}

/// Initial offer as returned by the quote endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    pub currency: &'static str,
    pub user_profile: UserProfileView,
    pub loan_details: LoanDetailsView,
    pub benchmark_requirement: BenchmarkView,
    pub user_proposal: ProposalView,
    pub evaluation: EvaluationView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_options: Option<RecommendedOptionsView>,
    pub negotiation_available: NegotiationAvailabilityView,
}

impl QuoteView {
    pub fn from_quote(quote: &LoanQuote) -> Self {
        let application = &quote.application;
        let terms = &application.terms;
        let profile = application.tier.profile();

        Self {
            currency: CURRENCY,
            user_profile: UserProfileView {
                credit_score: application.credit_score,
                category: application.tier,
                category_range: profile.range,
                category_description: profile.description,
                annual_salary: format_inr(application.annual_salary),
                monthly_salary: format_inr(application.monthly_salary()),
            },
            loan_details: LoanDetailsView {
                principal: format_inr(terms.principal),
                principal_amount: terms.principal,
                proposed_interest_rate: rate_as_given(terms.annual_rate_percent),
                time_in_months: terms.term_months,
                time_in_years: years(terms),
            },
            benchmark_requirement: BenchmarkView::from_evaluation(&quote.evaluation),
            user_proposal: ProposalView::from_evaluation(&quote.evaluation),
            evaluation: EvaluationView::from_evaluation(&quote.evaluation),
            recommended_options: quote.options.as_ref().map(RecommendedOptionsView::from_menu),
            negotiation_available: NegotiationAvailabilityView::for_quote(quote),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationSummaryView {
    pub attempt_number: u32,
    pub remaining_attempts: u32,
    pub negotiated_parameter: NegotiatedParameter,
    pub status: NegotiationStatus,
    pub phase: NegotiationPhase,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationContextView {
    pub message: &'static str,
    pub initial_options_provided: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalOfferView {
    pub principal: String,
    pub interest_rate: String,
    pub time_in_months: u32,
    pub time_in_years: f64,
    pub total_profit: String,
    pub total_amount: String,
    #[serde(rename = "monthlyEMI")]
    pub monthly_emi: String,
    pub meets_requirement: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiatedOfferView {
    pub principal: String,
    pub principal_amount: f64,
    pub interest_rate: String,
    pub time_in_months: u32,
    pub time_in_years: f64,
    pub total_profit: String,
    pub total_profit_amount: f64,
    pub total_amount: String,
    #[serde(rename = "monthlyEMI")]
    pub monthly_emi: String,
    pub meets_requirement: bool,
    pub evaluation: EvaluationView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterProposalView {
    pub principal: String,
    pub principal_amount: f64,
    pub interest_rate: String,
    pub time_in_months: u32,
    pub time_in_years: f64,
    pub adjusted_parameters: Vec<AdjustedParameter>,
    pub total_profit: String,
    pub total_amount: String,
    #[serde(rename = "monthlyEMI")]
    pub monthly_emi: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CounterOfferEntryView {
    Proposal(CounterProposalView),
    #[serde(rename_all = "camelCase")]
    Notice {
        message: &'static str,
        suggested_rate: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterOfferView {
    pub description: &'static str,
    pub note: &'static str,
    pub offer: CounterOfferEntryView,
}

impl CounterOfferView {
    fn from_counter(counter: &CounterOffer) -> Self {
        let offer = match counter {
            CounterOffer::Proposal(proposal) => {
                let terms = &proposal.terms;
                let interest_rate = match proposal.adjusted {
                    AdjustedParameter::Rate => rate_fixed(terms.annual_rate_percent),
                    AdjustedParameter::Term => rate_as_given(terms.annual_rate_percent),
                };
                CounterOfferEntryView::Proposal(CounterProposalView {
                    principal: format_inr(terms.principal),
                    principal_amount: terms.principal,
                    interest_rate,
                    time_in_months: terms.term_months,
                    time_in_years: years(terms),
                    adjusted_parameters: vec![proposal.adjusted],
                    total_profit: format_inr(proposal.profit.total),
                    total_amount: format_inr(proposal.total_repayment),
                    monthly_emi: format_inr(proposal.monthly_installment),
                })
            }
            CounterOffer::Unavailable {
                message,
                suggested_rate_percent,
            } => CounterOfferEntryView::Notice {
                message: *message,
                suggested_rate: rate_fixed(*suggested_rate_percent),
            },
        };

        Self {
            description: "Our counter-offer to meet the benchmark requirement",
            note: "Principal amount (P) is never modified as per policy",
            offer,
        }
    }
}

/// One negotiation round as returned by the negotiate endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationView {
    pub negotiation: NegotiationSummaryView,
    pub context: NegotiationContextView,
    pub original_offer: OriginalOfferView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_recommended_options: Option<RecommendedOptionsView>,
    pub negotiated_offer: NegotiatedOfferView,
    pub benchmark_requirement: BenchmarkView,
    pub counter_offer: Option<CounterOfferView>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<ChatMessage>>,
}

impl NegotiationView {
    pub fn from_round(round: &NegotiationRound) -> Self {
        let original = &round.original.evaluation;
        let negotiated = &round.negotiated;

        let message = if round.accepted() {
            "✓ Negotiation successful! Your offer meets the benchmark requirement.".to_string()
        } else {
            format!(
                "✗ Your negotiated offer does not meet the benchmark. Please review the counter-offer below or try again ({} attempts remaining).",
                round.remaining_attempts
            )
        };

        Self {
            negotiation: NegotiationSummaryView {
                attempt_number: round.attempt_number,
                remaining_attempts: round.remaining_attempts,
                negotiated_parameter: round.negotiated_parameter,
                status: round.status,
                phase: round.phase,
            },
            context: NegotiationContextView {
                message: "This negotiation is in response to the initial 3 options provided",
                initial_options_provided: round.original.options.is_some(),
            },
            original_offer: OriginalOfferView {
                principal: format_inr(original.terms.principal),
                interest_rate: rate_as_given(original.terms.annual_rate_percent),
                time_in_months: original.terms.term_months,
                time_in_years: years(&original.terms),
                total_profit: format_inr(original.proposed.total),
                total_amount: format_inr(original.total_repayment()),
                monthly_emi: format_inr(original.monthly_installment),
                meets_requirement: original.meets_requirement,
            },
            initial_recommended_options: round
                .original
                .options
                .as_ref()
                .map(RecommendedOptionsView::from_menu),
            negotiated_offer: NegotiatedOfferView {
                principal: format_inr(negotiated.terms.principal),
                principal_amount: negotiated.terms.principal,
                interest_rate: rate_as_given(negotiated.terms.annual_rate_percent),
                time_in_months: negotiated.terms.term_months,
                time_in_years: years(&negotiated.terms),
                total_profit: format_inr(negotiated.proposed.total),
                total_profit_amount: round2(negotiated.proposed.total),
                total_amount: format_inr(negotiated.total_repayment()),
                monthly_emi: format_inr(negotiated.monthly_installment),
                meets_requirement: negotiated.meets_requirement,
                evaluation: EvaluationView::from_evaluation(negotiated),
            },
            benchmark_requirement: BenchmarkView::from_evaluation(negotiated),
            counter_offer: round.counter_offer.as_ref().map(CounterOfferView::from_counter),
            message,
            conversation_history: None,
        }
    }

    pub fn with_conversation(mut self, history: Vec<ChatMessage>) -> Self {
        self.conversation_history = Some(history);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TierDocView {
    pub range: String,
    #[serde(rename = "benchmarkRate")]
    pub benchmark_rate: String,
}

/// Self-description served at the collection root.
pub fn api_docs() -> Value {
    let categories: serde_json::Map<String, Value> = CreditTier::ALL
        .into_iter()
        .map(|tier| {
            let profile = tier.profile();
            let doc = TierDocView {
                range: profile.range,
                benchmark_rate: format!("{} per annum", tier.benchmark_rate_label()),
            };
            (
                tier.label().to_string(),
                serde_json::to_value(doc).unwrap_or(Value::Null),
            )
        })
        .collect();

    json!({
        "service": "Loan Desk - Credit-Based Profit Calculator",
        "currency": "INR (Indian Rupees)",
        "creditScoreCategories": categories,
        "endpoints": {
            "POST /api/v1/loans/quote": {
                "description": "Calculate profit based on credit score category",
                "requestBody": {
                    "principal": "number (required) - Principal amount in INR",
                    "interestRate": "number (required) - Proposed interest rate (%)",
                    "creditScore": "number (required) - Credit score (300-900)",
                    "salary": "number (required) - Annual salary in INR",
                    "timeInMonths": "number (optional) - Time period in months (default: 12)"
                },
                "example": {
                    "principal": 100000,
                    "interestRate": 8,
                    "creditScore": 720,
                    "salary": 600000,
                    "timeInMonths": 12
                }
            },
            "POST /api/v1/loans/negotiate": {
                "description": "Negotiate loan terms (max 3 attempts) - only available when the initial offer does not meet the benchmark",
                "negotiatorPara": {
                    "P": "number (optional) - New principal amount",
                    "R": "number (optional) - New interest rate",
                    "T": "number (optional) - New time in months",
                    "attemptNumber": "number (required) - Current negotiation attempt (1-3)"
                },
                "rules": [
                    "If P is provided: the counter-offer adjusts R at the original term",
                    "If R is provided: the counter-offer keeps P and R and adjusts T",
                    "If T is provided: the counter-offer keeps P and T and adjusts R",
                    "If several of P, R, T are provided: the counter-offer adjusts R at the given P and T",
                    "P (principal) is never manipulated in counter-offers",
                    "Maximum 3 negotiation attempts allowed"
                ],
                "example": {
                    "principal": 100000,
                    "interestRate": 8,
                    "creditScore": 720,
                    "salary": 600000,
                    "timeInMonths": 12,
                    "negotiatorPara": { "R": 10, "attemptNumber": 1 }
                }
            },
            "POST /api/v1/loans/negotiate/chat": {
                "description": "Natural language negotiation mediated by the advisor model",
                "requestBody": {
                    "negotiationMessage": "string (required) - natural language negotiation request",
                    "conversationHistory": "array (optional) - previous {role, content} messages"
                }
            }
        },
        "usage": "Send POST requests with the required fields to get credit-based profit calculations in INR"
    })
}

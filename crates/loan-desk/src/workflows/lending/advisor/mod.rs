//! Language-model collaborator used for application oversight and chat negotiation.
//!
//! Nothing the advisor returns is trusted: oversight replies other than `OK`
//! block the quote, and proposed terms go through the same guard as direct input.

mod openrouter;

pub use openrouter::OpenRouterAdvisor;

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{LoanApplication, NegotiatorPayload};
use super::evaluation::LoanQuote;
use super::views::round2;
use crate::config::AdvisorConfig;

const OVERSIGHT_CLEAR: &str = "OK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OversightVerdict {
    Clear,
    Flagged { message: String },
}

impl OversightVerdict {
    pub fn from_reply(reply: &str) -> Self {
        let reply = reply.trim();
        if reply == OVERSIGHT_CLEAR {
            OversightVerdict::Clear
        } else {
            OversightVerdict::Flagged {
                message: reply.to_string(),
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("advisor is not configured")]
    Unavailable,
    #[error("advisor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("advisor returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("advisor returned an invalid reply: {reason}")]
    MalformedReply { reason: String, reply: String },
}

impl AdvisorError {
    fn malformed(reason: impl Into<String>, reply: &str) -> Self {
        AdvisorError::MalformedReply {
            reason: reason.into(),
            reply: reply.to_string(),
        }
    }
}

/// External model consulted around the engine, never inside it.
pub trait NegotiationAdvisor: Send + Sync {
    fn review(
        &self,
        application: &LoanApplication,
    ) -> impl Future<Output = Result<OversightVerdict, AdvisorError>> + Send;

    /// Raw assistant reply to a negotiation transcript.
    fn propose_terms(
        &self,
        messages: &[ChatMessage],
    ) -> impl Future<Output = Result<String, AdvisorError>> + Send;
}

/// Advisor used when no API key is configured: reviews pass, chat is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAdvisor;

impl NegotiationAdvisor for DisabledAdvisor {
    async fn review(
        &self,
        _application: &LoanApplication,
    ) -> Result<OversightVerdict, AdvisorError> {
        Ok(OversightVerdict::Clear)
    }

    async fn propose_terms(&self, _messages: &[ChatMessage]) -> Result<String, AdvisorError> {
        Err(AdvisorError::Unavailable)
    }
}

/// Advisor selected from configuration at startup.
#[derive(Debug)]
pub enum ConfiguredAdvisor {
    Disabled(DisabledAdvisor),
    OpenRouter(OpenRouterAdvisor),
}

impl ConfiguredAdvisor {
    pub fn from_config(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        if config.is_enabled() {
            Ok(ConfiguredAdvisor::OpenRouter(OpenRouterAdvisor::new(config)?))
        } else {
            Ok(ConfiguredAdvisor::Disabled(DisabledAdvisor))
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ConfiguredAdvisor::OpenRouter(_))
    }
}

impl NegotiationAdvisor for ConfiguredAdvisor {
    async fn review(
        &self,
        application: &LoanApplication,
    ) -> Result<OversightVerdict, AdvisorError> {
        match self {
            ConfiguredAdvisor::Disabled(advisor) => advisor.review(application).await,
            ConfiguredAdvisor::OpenRouter(advisor) => advisor.review(application).await,
        }
    }

    async fn propose_terms(&self, messages: &[ChatMessage]) -> Result<String, AdvisorError> {
        match self {
            ConfiguredAdvisor::Disabled(advisor) => advisor.propose_terms(messages).await,
            ConfiguredAdvisor::OpenRouter(advisor) => advisor.propose_terms(messages).await,
        }
    }
}

pub fn oversight_prompt(application: &LoanApplication) -> String {
    let terms = &application.terms;
    format!(
        "You are a master agent overseeing loan applications. Identify only critical problems and abnormalities \
in the application below that are truly unrealistic or nonsensical, suggesting potential fraud or severe user error. \
Do not flag values that are merely unusual but still plausible.\n\n\
Loan Application Details:\n\
- Principal Amount: {principal} INR\n\
- Proposed Interest Rate: {rate}%\n\
- Credit Score: {score}\n\
- Annual Salary: {salary} INR\n\
- Time Period (in months): {months}\n\n\
Look for extremely unrealistic interest rates, salaries grossly disproportionate to the principal, \
principal amounts beyond any reasonable loan request, and absurdly short or long durations.\n\n\
If you detect a critical problem, reply with a concise warning explaining it. \
If the data is reasonable, reply only with the text \"{clear}\".",
        principal = terms.principal,
        rate = terms.annual_rate_percent,
        score = application.credit_score,
        salary = application.annual_salary,
        months = terms.term_months,
        clear = OVERSIGHT_CLEAR,
    )
}

pub fn negotiation_prompt(quote: &LoanQuote) -> String {
    let terms = &quote.application.terms;
    let evaluation = &quote.evaluation;
    format!(
        "You are a loan negotiator for a finance platform. Adjust the interest rate (R) and time in months (T) \
so the offer meets or exceeds the benchmark profit requirement. The principal (P) cannot be changed.\n\n\
Current Loan Details:\n\
- Principal (P): {principal} INR\n\
- Proposed Interest Rate (R): {rate}%\n\
- Time in Months (T): {months}\n\
- Credit Score: {score}\n\
- Annual Salary: {salary} INR\n\
- Benchmark Rate: {benchmark}\n\
- Required Total Profit: {required} INR\n\
- Proposed Total Profit: {proposed} INR\n\n\
The current offer does not meet the benchmark.\n\n\
Based on the user's message, suggest new values for R (a number between 0 and 100) and T (a positive integer). \
Respond with a JSON object containing \"R\", \"T\" and \"attemptNumber\" (current attempt, starting from 1, max 3), \
for example {{\"R\": 10.5, \"T\": 24, \"attemptNumber\": 1}}. Respond with the JSON object only.",
        principal = terms.principal,
        rate = terms.annual_rate_percent,
        months = terms.term_months,
        score = quote.application.credit_score,
        salary = quote.application.annual_salary,
        benchmark = evaluation.tier.benchmark_rate_label(),
        required = round2(evaluation.benchmark.total),
        proposed = round2(evaluation.proposed.total),
    )
}

/// Prior history, then the negotiation prompt, then the user's new message.
pub fn negotiation_transcript(
    history: Vec<ChatMessage>,
    quote: &LoanQuote,
    message: &str,
) -> Vec<ChatMessage> {
    let mut messages = history;
    messages.push(ChatMessage::system(negotiation_prompt(quote)));
    messages.push(ChatMessage::user(message));
    messages
}

/// Read `{R, T, attemptNumber}` from an advisor reply.
///
/// All three must be JSON numbers. The principal is pinned to the original
/// offer, so the payload always carries P, R and T.
pub fn parse_negotiation_reply(
    reply: &str,
    original_principal: f64,
) -> Result<NegotiatorPayload, AdvisorError> {
    let parsed: Value = serde_json::from_str(reply.trim())
        .map_err(|err| AdvisorError::malformed(format!("reply is not JSON: {err}"), reply))?;
    let object = parsed
        .as_object()
        .ok_or_else(|| AdvisorError::malformed("reply is not a JSON object", reply))?;

    let numeric = |key: &str| -> Result<Value, AdvisorError> {
        match object.get(key) {
            Some(value @ Value::Number(_)) => Ok(value.clone()),
            Some(other) => Err(AdvisorError::malformed(
                format!("`{key}` must be a number (received {other})"),
                reply,
            )),
            None => Err(AdvisorError::malformed(format!("`{key}` is missing"), reply)),
        }
    };

    Ok(NegotiatorPayload {
        principal: Some(Value::from(original_principal)),
        rate: Some(numeric("R")?),
        term: Some(numeric("T")?),
        attempt_number: Some(numeric("attemptNumber")?),
    })
}

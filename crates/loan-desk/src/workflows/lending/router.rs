use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::advisor::{AdvisorError, ChatMessage, NegotiationAdvisor};
use super::domain::{LoanRequest, NegotiatorPayload};
use super::guard::ValidationError;
use super::negotiation::NegotiationError;
use super::service::{LendingService, LendingServiceError};
use super::views::{api_docs, NegotiationView, QuoteView, RecommendedOptionsView};

/// Quote body plus the negotiator's parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NegotiationBody {
    #[serde(flatten)]
    pub loan: LoanRequest,
    #[serde(rename = "negotiatorPara", default)]
    pub negotiator: Option<NegotiatorPayload>,
}

/// Quote body plus a natural-language message for the advisor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatNegotiationBody {
    #[serde(flatten)]
    pub loan: LoanRequest,
    #[serde(default)]
    pub negotiation_message: Option<String>,
    #[serde(default)]
    pub conversation_history: Option<Vec<ChatMessage>>,
}

/// Router builder exposing the quote and negotiation endpoints.
pub fn lending_router<A>(service: Arc<LendingService<A>>) -> Router
where
    A: NegotiationAdvisor + 'static,
{
    Router::new()
        .route("/api/v1/loans", get(docs_handler))
        .route("/api/v1/loans/quote", post(quote_handler::<A>))
        .route("/api/v1/loans/negotiate", post(negotiate_handler::<A>))
        .route("/api/v1/loans/negotiate/chat", post(chat_handler::<A>))
        .with_state(service)
}

pub(crate) async fn docs_handler() -> Response {
    (StatusCode::OK, Json(api_docs())).into_response()
}

pub(crate) async fn quote_handler<A>(
    State(service): State<Arc<LendingService<A>>>,
    body: Result<Json<LoanRequest>, JsonRejection>,
) -> Response
where
    A: NegotiationAdvisor + 'static,
{
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed_body(rejection),
    };

    match service.quote(&request).await {
        Ok(quote) => (StatusCode::OK, Json(QuoteView::from_quote(&quote))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn negotiate_handler<A>(
    State(service): State<Arc<LendingService<A>>>,
    body: Result<Json<NegotiationBody>, JsonRejection>,
) -> Response
where
    A: NegotiationAdvisor + 'static,
{
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed_body(rejection),
    };
    let Some(payload) = body.negotiator else {
        return error_response(
            ValidationError::MissingField {
                field: "negotiatorPara",
            }
            .into(),
        );
    };

    match service.negotiate(&body.loan, &payload).await {
        Ok(round) => (StatusCode::OK, Json(NegotiationView::from_round(&round))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn chat_handler<A>(
    State(service): State<Arc<LendingService<A>>>,
    body: Result<Json<ChatNegotiationBody>, JsonRejection>,
) -> Response
where
    A: NegotiationAdvisor + 'static,
{
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed_body(rejection),
    };
    let Some(message) = body
        .negotiation_message
        .filter(|message| !message.trim().is_empty())
    else {
        return error_response(
            ValidationError::MissingField {
                field: "negotiationMessage",
            }
            .into(),
        );
    };
    let history = body.conversation_history.unwrap_or_default();

    match service
        .negotiate_with_message(&body.loan, &message, history)
        .await
    {
        Ok(chat) => {
            let view =
                NegotiationView::from_round(&chat.round).with_conversation(chat.conversation);
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn malformed_body(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": "Invalid JSON or request format",
        "details": rejection.body_text(),
    });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

pub(crate) fn error_response(error: LendingServiceError) -> Response {
    match error {
        LendingServiceError::Validation(error) => {
            let payload = json!({
                "error": error.to_string(),
                "field": error.field(),
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        LendingServiceError::Negotiation(error) => negotiation_error_response(error),
        LendingServiceError::Oversight { message } => {
            let payload = json!({
                "error": "Oversight warning",
                "message": message,
                "details": "Please review your loan application details.",
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        LendingServiceError::Upstream(AdvisorError::MalformedReply { reason, reply }) => {
            let payload = json!({
                "error": "Advisor returned invalid negotiation parameters.",
                "details": reason,
                "advisorReply": reply,
            });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
        LendingServiceError::Upstream(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

fn negotiation_error_response(error: NegotiationError) -> Response {
    let message = error.to_string();
    let payload = match error {
        NegotiationError::AlreadyCompliant { initial } => json!({
            "error": "Negotiation not needed. Your initial offer already meets the benchmark requirement.",
            "initialOffer": QuoteView::from_quote(&initial),
        }),
        NegotiationError::AttemptsExhausted {
            attempt,
            original_options,
        } => json!({
            "error": message,
            "attemptNumber": attempt,
            "originalOptions": RecommendedOptionsView::from_menu(&original_options),
        }),
    };
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

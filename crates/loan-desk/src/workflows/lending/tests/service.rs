use super::common::*;

use serde_json::json;

use crate::workflows::lending::advisor::{AdvisorError, ChatMessage, ChatRole};
use crate::workflows::lending::domain::{LoanTerms, NegotiatorPayload};
use crate::workflows::lending::guard::ValidationError;
use crate::workflows::lending::negotiation::{NegotiatedParameter, NegotiationError};
use crate::workflows::lending::service::LendingServiceError;

#[tokio::test]
async fn quote_runs_review_then_pricing() {
    let (service, _) = service(ScriptedAdvisor::clear());

    let quote = service.quote(&request()).await.expect("quote");

    assert!(quote.negotiable());
    assert!((quote.evaluation.profit_gap - 5_000.0).abs() < 1e-6);
    assert!(quote.options.is_some());
}

#[tokio::test]
async fn flagged_application_is_rejected() {
    let (service, _) = service(ScriptedAdvisor::flagging(
        "Warning: Annual Salary (88 INR) is critically low",
    ));

    match service.quote(&request()).await {
        Err(LendingServiceError::Oversight { message }) => {
            assert!(message.contains("critically low"))
        }
        other => panic!("expected oversight warning, got {other:?}"),
    }
}

#[tokio::test]
async fn advisor_outage_is_an_upstream_failure() {
    let (service, _) = service(ScriptedAdvisor::failing(503));

    assert!(matches!(
        service.quote(&request()).await,
        Err(LendingServiceError::Upstream(AdvisorError::Status { status: 503, .. }))
    ));
}

#[tokio::test]
async fn invalid_input_is_rejected_before_the_advisor_is_consulted() {
    let (service, _) = service(ScriptedAdvisor::failing(500));
    let mut request = request();
    request.credit_score = Some(json!(250));

    assert!(matches!(
        service.quote(&request).await,
        Err(LendingServiceError::Validation(
            ValidationError::CreditScoreOutOfRange { received: 250 }
        ))
    ));
}

#[tokio::test]
async fn quote_unreviewed_skips_the_advisor() {
    let (service, _) = service(ScriptedAdvisor::failing(500));

    let quote = service.quote_unreviewed(&request()).expect("quote");
    assert_eq!(quote.application.terms, LoanTerms::new(100_000.0, 8.0, 12));
}

#[tokio::test]
async fn negotiation_validates_the_payload() {
    let (service, _) = service(ScriptedAdvisor::clear());

    let err = service
        .negotiate(&request(), &NegotiatorPayload::with_attempt(0).rate(10.0))
        .await
        .expect_err("attempt zero rejected");
    assert!(matches!(
        err,
        LendingServiceError::Validation(ValidationError::AttemptOutOfRange { .. })
    ));

    let round = service
        .negotiate(&request(), &NegotiatorPayload::with_attempt(1).rate(10.0))
        .await
        .expect("round");
    assert_eq!(round.negotiated_parameter, NegotiatedParameter::Rate);
}

#[tokio::test]
async fn negotiation_on_compliant_offer_is_refused() {
    let (service, _) = service(ScriptedAdvisor::clear());

    let err = service
        .negotiate(
            &compliant_request(),
            &NegotiatorPayload::with_attempt(1).rate(10.0),
        )
        .await
        .expect_err("policy violation");
    assert!(matches!(
        err,
        LendingServiceError::Negotiation(NegotiationError::AlreadyCompliant { .. })
    ));
}

#[tokio::test]
async fn chat_reply_is_negotiated_with_the_original_principal() {
    let (service, advisor) = service(ScriptedAdvisor::replying(
        r#"{"R": 10, "T": 24, "attemptNumber": 1}"#,
    ));
    let history = vec![ChatMessage::user("earlier question")];

    let chat = service
        .negotiate_with_message(&request(), "can you extend the term?", history)
        .await
        .expect("chat round");

    assert_eq!(chat.round.negotiated_parameter, NegotiatedParameter::All);
    assert_eq!(
        chat.round.negotiated.terms,
        LoanTerms::new(100_000.0, 10.0, 24)
    );
    assert!(!chat.round.negotiated.meets_requirement);

    let roles: Vec<_> = chat.conversation.iter().map(|message| message.role).collect();
    assert_eq!(
        roles,
        [ChatRole::User, ChatRole::System, ChatRole::User, ChatRole::Assistant]
    );

    let sent = advisor.transcripts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].len(), 3);
    assert_eq!(sent[0][2].content, "can you extend the term?");
}

#[tokio::test]
async fn malformed_chat_reply_rejects_the_round() {
    let (service, _) = service(ScriptedAdvisor::replying("Let's try 10% over two years."));

    match service
        .negotiate_with_message(&request(), "lower please", Vec::new())
        .await
    {
        Err(LendingServiceError::Upstream(AdvisorError::MalformedReply { reply, .. })) => {
            assert_eq!(reply, "Let's try 10% over two years.")
        }
        other => panic!("expected malformed reply, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_reply_is_validated_like_direct_input() {
    let (service, _) = service(ScriptedAdvisor::replying(
        r#"{"R": 10, "T": 0, "attemptNumber": 1}"#,
    ));

    assert!(matches!(
        service
            .negotiate_with_message(&request(), "shorter please", Vec::new())
            .await,
        Err(LendingServiceError::Validation(ValidationError::NotPositive {
            field: "T",
            ..
        }))
    ));
}

#[tokio::test]
async fn chat_on_compliant_offer_never_reaches_the_advisor() {
    let (service, advisor) = service(ScriptedAdvisor::replying(
        r#"{"R": 10, "T": 24, "attemptNumber": 1}"#,
    ));

    assert!(matches!(
        service
            .negotiate_with_message(&compliant_request(), "lower please", Vec::new())
            .await,
        Err(LendingServiceError::Negotiation(
            NegotiationError::AlreadyCompliant { .. }
        ))
    ));
    assert!(advisor.transcripts().is_empty());
}

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use crate::workflows::lending::advisor::{
    AdvisorError, ChatMessage, NegotiationAdvisor, OversightVerdict,
};
use crate::workflows::lending::domain::{LoanApplication, LoanRequest};
use crate::workflows::lending::evaluation::{self, LoanQuote};
use crate::workflows::lending::guard::LoanGuard;
use crate::workflows::lending::{lending_router, LendingService};

/// 100000 INR at 8% for 12 months with a moderate (720) score: 5000 short of the benchmark.
pub(super) fn request() -> LoanRequest {
    LoanRequest::new(100_000.0, 8.0, 720, 600_000.0, Some(12))
}

pub(super) fn compliant_request() -> LoanRequest {
    LoanRequest::new(100_000.0, 13.0, 720, 600_000.0, Some(12))
}

pub(super) fn application() -> LoanApplication {
    LoanGuard::default()
        .application_from_request(&request())
        .expect("valid request")
}

pub(super) fn failing_quote() -> LoanQuote {
    evaluation::quote(application())
}

pub(super) fn compliant_quote() -> LoanQuote {
    let application = LoanGuard::default()
        .application_from_request(&compliant_request())
        .expect("valid request");
    evaluation::quote(application)
}

/// Advisor returning canned oversight verdicts and negotiation replies.
pub(super) struct ScriptedAdvisor {
    verdict: Result<OversightVerdict, u16>,
    replies: Mutex<VecDeque<String>>,
    transcripts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedAdvisor {
    pub(super) fn clear() -> Self {
        Self {
            verdict: Ok(OversightVerdict::Clear),
            replies: Mutex::new(VecDeque::new()),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn flagging(message: &str) -> Self {
        Self {
            verdict: Ok(OversightVerdict::Flagged {
                message: message.to_string(),
            }),
            ..Self::clear()
        }
    }

    /// Oversight calls fail with the given upstream status.
    pub(super) fn failing(status: u16) -> Self {
        Self {
            verdict: Err(status),
            ..Self::clear()
        }
    }

    pub(super) fn replying(reply: &str) -> Self {
        let advisor = Self::clear();
        advisor
            .replies
            .lock()
            .expect("replies lock")
            .push_back(reply.to_string());
        advisor
    }

    pub(super) fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.transcripts.lock().expect("transcripts lock").clone()
    }
}

impl NegotiationAdvisor for ScriptedAdvisor {
    async fn review(
        &self,
        _application: &LoanApplication,
    ) -> Result<OversightVerdict, AdvisorError> {
        match &self.verdict {
            Ok(verdict) => Ok(verdict.clone()),
            Err(status) => Err(AdvisorError::Status {
                status: *status,
                body: "upstream unavailable".to_string(),
            }),
        }
    }

    async fn propose_terms(&self, messages: &[ChatMessage]) -> Result<String, AdvisorError> {
        self.transcripts
            .lock()
            .expect("transcripts lock")
            .push(messages.to_vec());
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .ok_or(AdvisorError::Unavailable)
    }
}

pub(super) fn service(
    advisor: ScriptedAdvisor,
) -> (Arc<LendingService<ScriptedAdvisor>>, Arc<ScriptedAdvisor>) {
    let advisor = Arc::new(advisor);
    let service = Arc::new(LendingService::new(advisor.clone()));
    (service, advisor)
}

pub(super) fn router(advisor: ScriptedAdvisor) -> Router {
    let (service, _) = service(advisor);
    lending_router(service)
}

pub(super) async fn post_json(router: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serializes")))
        .expect("request builds");
    send(router, request).await
}

pub(super) async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

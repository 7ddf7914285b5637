//! Handlers for the four AI endpoints.
//!
//! Each handler takes the raw JSON body and answers with a status code and a
//! JSON body. Several failure paths deliberately answer 200 with a fallback
//! payload; callers should branch on the body's `type`, not on the status.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::ai::{
    fallback_evaluation, fallback_timeline, Adapters, DecisionRequest, PerformanceRequest,
    PlanValidationRequest, TimelineRequest,
};
use crate::config::GameConfig;
use crate::rate_limit::{client_key_from_origin, RateLimiter};
use crate::schema::{AiResponse, REASON_INTERNAL_ERROR, REASON_TOO_MANY_REQUESTS};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Shared by every request the service handles.
pub struct ServiceState {
    pub config: GameConfig,
    pub adapters: Adapters,
    pub limiter: Arc<RateLimiter>,
}

impl ServiceState {
    pub fn new(config: GameConfig, adapters: Adapters) -> Self {
        Self {
            config,
            adapters,
            limiter: Arc::new(RateLimiter::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    pub status: u16,
    pub body: Value,
}

impl CommandResponse {
    fn with_status(status: u16, body: &impl Serialize) -> Self {
        let body = serde_json::to_value(body)
            .unwrap_or_else(|error| json!({ "error": error.to_string() }));
        Self { status, body }
    }

    fn ok(body: &impl Serialize) -> Self {
        Self::with_status(STATUS_OK, body)
    }

    fn bad_request(message: &str) -> Self {
        Self {
            status: STATUS_BAD_REQUEST,
            body: json!({ "error": message }),
        }
    }
}

fn non_blank(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub async fn validate_plan(state: &ServiceState, body: Value) -> CommandResponse {
    let (Some(problem_statement), Some(business_plan)) = (
        non_blank(&body, "problemStatement"),
        non_blank(&body, "businessPlan"),
    ) else {
        return CommandResponse::bad_request("problemStatement and businessPlan are required");
    };

    let response = state
        .adapters
        .plan
        .validate(PlanValidationRequest {
            problem_statement,
            business_plan,
        })
        .await;
    CommandResponse::ok(&response)
}

/// Rate limited per client before anything else, then shape-checked.
pub async fn evaluate_decision(
    state: &ServiceState,
    origin: Option<&str>,
    body: Value,
) -> CommandResponse {
    let config = &state.config;
    let client = client_key_from_origin(origin);
    if !state.limiter.allow(
        &client,
        config.decision_rate_limit,
        config.decision_rate_window(),
    ) {
        return CommandResponse::with_status(
            STATUS_TOO_MANY_REQUESTS,
            &AiResponse::rejected(REASON_TOO_MANY_REQUESTS),
        );
    }

    let request: DecisionRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(error) => {
            return CommandResponse::bad_request(&format!("invalid request body: {error}"));
        }
    };
    if request.messages.is_empty() {
        return CommandResponse::bad_request("messages are required");
    }
    if request.messages.len() > config.max_messages {
        return CommandResponse::bad_request(&format!(
            "at most {} messages are allowed",
            config.max_messages
        ));
    }
    if request
        .messages
        .iter()
        .any(|message| message.content.chars().count() > config.max_message_chars)
    {
        return CommandResponse::bad_request(&format!(
            "message content is limited to {} characters",
            config.max_message_chars
        ));
    }

    if !config.provider.to_view().configured {
        tracing::error!("decision evaluation requested without a configured API key");
        return CommandResponse::with_status(STATUS_INTERNAL_ERROR, &AiResponse::internal_error());
    }

    let response = state.adapters.decision.evaluate(request).await;
    let status = if response.rejection_reason() == Some(REASON_INTERNAL_ERROR) {
        STATUS_INTERNAL_ERROR
    } else {
        STATUS_OK
    };
    CommandResponse::with_status(status, &response)
}

pub async fn evaluate_performance(state: &ServiceState, body: Value) -> CommandResponse {
    let request: PerformanceRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(error) => {
            return CommandResponse::bad_request(&format!("invalid request body: {error}"));
        }
    };
    match state.adapters.performance.evaluate(request).await {
        Ok(result) => CommandResponse::ok(&result),
        Err(error) => {
            tracing::warn!("performance evaluation failed, using fallback: {error}");
            CommandResponse::ok(&fallback_evaluation())
        }
    }
}

pub async fn generate_timeline(state: &ServiceState, body: Value) -> CommandResponse {
    let Some(business_plan) = non_blank(&body, "businessPlan") else {
        return CommandResponse::bad_request("businessPlan is required");
    };
    match state
        .adapters
        .timeline
        .generate(TimelineRequest { business_plan })
        .await
    {
        Ok(timeline) => CommandResponse::ok(&timeline),
        Err(error) => {
            tracing::warn!("timeline generation failed, using fallback: {error}");
            CommandResponse::ok(&fallback_timeline(Utc::now().date_naive()))
        }
    }
}

//! Business-plan validation adapter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ai::client::ChatClient;
use crate::ai::prompts::{clip, plan_validation_prompt};
use crate::ai::traits::PlanValidator;
use crate::ai::types::{ChatMessage, PlanValidationRequest};
use crate::schema::{Department, DepartmentContent, StaticText, ValidationResponse};

const PLAN_MAX_TOKENS: u32 = 2_048;
const PLAN_PROMPT_CHARS: usize = 8_000;

pub const REASON_EMPTY_PROBLEM: &str = "problem statement is missing";
pub const REASON_EMPTY_PLAN: &str = "business plan is empty";
pub const REASON_PLAN_TOO_SHORT: &str = "business plan is too short; write at least a few sentences";

/// Local checks run before any call out. Returns the rejection when the input
/// cannot be a viable plan.
pub fn precheck_plan(
    req: &PlanValidationRequest,
    min_sentences: usize,
) -> Option<ValidationResponse> {
    if req.problem_statement.trim().is_empty() {
        return Some(ValidationResponse::rejected(REASON_EMPTY_PROBLEM));
    }
    let plan = req.business_plan.trim();
    if plan.is_empty() {
        return Some(ValidationResponse::rejected(REASON_EMPTY_PLAN));
    }
    if count_sentences(plan) < min_sentences {
        return Some(ValidationResponse::rejected(REASON_PLAN_TOO_SHORT));
    }
    None
}

/// Sentences are runs of text ending in `.`, `!` or `?`; trailing text without a
/// terminator counts as one more.
pub fn count_sentences(text: &str) -> usize {
    let mut count = 0;
    let mut has_content = false;
    for ch in text.chars() {
        match ch {
            '.' | '!' | '?' => {
                if has_content {
                    count += 1;
                    has_content = false;
                }
            }
            c if c.is_alphanumeric() => has_content = true,
            _ => {}
        }
    }
    if has_content {
        count += 1;
    }
    count
}

/// Optimistic acceptance used when the reasoning service is unavailable.
pub fn fallback_validation(business_plan: &str) -> ValidationResponse {
    let brief = |document: Department, title: &str, text: &str| DepartmentContent {
        document,
        component: StaticText {
            title: title.to_string(),
            text: text.to_string(),
        },
    };

    ValidationResponse::Accepted {
        formalized_plan: business_plan.trim().to_string(),
        content: vec![
            brief(
                Department::Product,
                "Product Roadmap",
                "Define the minimum viable product, validate it with early users, and iterate on feedback.",
            ),
            brief(
                Department::Marketing,
                "Go-to-Market",
                "Identify the first customer segment, pick one acquisition channel, and measure cost per customer.",
            ),
            brief(
                Department::Management,
                "Operations",
                "Keep spending below returns, hire only for bottlenecks, and review progress every week.",
            ),
        ],
    }
}

pub struct LlmPlanValidator {
    client: Arc<ChatClient>,
    min_sentences: usize,
}

impl LlmPlanValidator {
    pub fn new(client: Arc<ChatClient>, min_sentences: usize) -> Self {
        Self {
            client,
            min_sentences,
        }
    }
}

#[async_trait]
impl PlanValidator for LlmPlanValidator {
    async fn validate(&self, req: PlanValidationRequest) -> ValidationResponse {
        if let Some(rejection) = precheck_plan(&req, self.min_sentences) {
            tracing::debug!("plan rejected locally before model call");
            return rejection;
        }

        let user = format!(
            "Problem statement:\n{}\n\nBusiness plan:\n{}",
            clip(req.problem_statement.trim(), PLAN_PROMPT_CHARS),
            clip(req.business_plan.trim(), PLAN_PROMPT_CHARS)
        );

        match self
            .client
            .request_typed::<ValidationResponse>(
                &plan_validation_prompt(),
                &[ChatMessage::user(user)],
                PLAN_MAX_TOKENS,
            )
            .await
        {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!("plan validation failed, accepting with fallback content: {error}");
                fallback_validation(&req.business_plan)
            }
        }
    }
}

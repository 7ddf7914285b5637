//! Adapter traits at the AI boundary.
//!
//! Implementations only translate requests into typed responses; none of them
//! touches game state. Failure policy differs per adapter and is part of the
//! contract documented on each trait.

use async_trait::async_trait;

use crate::ai::types::{
    DecisionRequest, ModelError, PerformanceRequest, PlanValidationRequest, TimelineRequest,
};
use crate::schema::{AiResponse, EvaluationResult, TimelineResponse, ValidationResponse};

/// Judges whether a business plan is viable. Never fails: boundary errors
/// degrade to an optimistic fallback acceptance.
#[async_trait]
pub trait PlanValidator: Send + Sync {
    async fn validate(&self, req: PlanValidationRequest) -> ValidationResponse;
}

/// Turns a free-text decision into a structured game update. Boundary errors
/// become a REJECTED "internal error" response.
#[async_trait]
pub trait DecisionEvaluator: Send + Sync {
    async fn evaluate(&self, req: DecisionRequest) -> AiResponse;
}

/// Scores a finished session. The caller substitutes the fallback result on
/// error.
#[async_trait]
pub trait PerformanceEvaluator: Send + Sync {
    async fn evaluate(&self, req: PerformanceRequest) -> Result<EvaluationResult, ModelError>;
}

/// Builds a schedule for the business plan. The caller substitutes the
/// fallback schedule on error.
#[async_trait]
pub trait TimelineGenerator: Send + Sync {
    async fn generate(&self, req: TimelineRequest) -> Result<TimelineResponse, ModelError>;
}

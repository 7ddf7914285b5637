//! AI boundary adapters.
//!
//! ## Structure
//!
//! - `types`: request types and `ModelError`
//! - `traits`: one trait per adapter (plan, decision, performance, timeline)
//! - `client`: OpenAI-compatible chat client returning validated JSON
//! - `json`: JSON extraction from model text
//! - `prompts`: system prompts with embedded schemas
//! - `plan`, `decision`, `performance`, `timeline`: LLM-backed adapters and
//!   their fallbacks

mod json;
mod prompts;

pub mod client;
pub mod decision;
pub mod performance;
pub mod plan;
pub mod timeline;
pub mod traits;
pub mod types;

use std::sync::Arc;

pub use client::ChatClient;
pub use decision::LlmDecisionEvaluator;
pub use performance::{fallback_evaluation, LlmPerformanceEvaluator};
pub use plan::{fallback_validation, precheck_plan, LlmPlanValidator};
pub use timeline::{fallback_timeline, LlmTimelineGenerator};
pub use traits::{DecisionEvaluator, PerformanceEvaluator, PlanValidator, TimelineGenerator};
pub use types::{
    ChatMessage, DecisionRequest, ModelError, PerformanceRequest, PlanValidationRequest,
    TimelineRequest,
};

use crate::config::GameConfig;

/// The full adapter set a game session talks to.
#[derive(Clone)]
pub struct Adapters {
    pub plan: Arc<dyn PlanValidator>,
    pub decision: Arc<dyn DecisionEvaluator>,
    pub performance: Arc<dyn PerformanceEvaluator>,
    pub timeline: Arc<dyn TimelineGenerator>,
}

impl Adapters {
    /// LLM-backed adapters sharing one HTTP client.
    pub fn from_config(config: &GameConfig) -> Result<Self, ModelError> {
        let client = Arc::new(ChatClient::new(&config.provider)?);
        if !client.has_credentials() {
            tracing::warn!("no model API key configured; AI adapters will use fallbacks");
        }
        tracing::info!(model = %client.model_id(), "AI adapters ready");
        Ok(Self {
            plan: Arc::new(LlmPlanValidator::new(client.clone(), config.min_plan_sentences)),
            decision: Arc::new(LlmDecisionEvaluator::new(client.clone())),
            performance: Arc::new(LlmPerformanceEvaluator::new(client.clone())),
            timeline: Arc::new(LlmTimelineGenerator::new(client)),
        })
    }
}

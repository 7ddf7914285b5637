//! In-process adapter doubles for unit tests.
//!
//! Each double answers from a queue of scripted responses and counts its
//! calls, so tests can assert that a guard kept a request from reaching the
//! AI boundary at all.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ai::{
    fallback_validation, Adapters, DecisionEvaluator, DecisionRequest, ModelError,
    PerformanceEvaluator, PerformanceRequest, PlanValidationRequest, PlanValidator,
    TimelineGenerator, TimelineRequest,
};
use crate::schema::{AiResponse, EvaluationResult, TimelineResponse, ValidationResponse};

#[derive(Default)]
pub(crate) struct ScriptedPlanValidator {
    responses: Mutex<VecDeque<ValidationResponse>>,
    calls: AtomicUsize,
}

impl ScriptedPlanValidator {
    pub fn push(&self, response: ValidationResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanValidator for ScriptedPlanValidator {
    /// Accepts with the fallback content once the script runs out.
    async fn validate(&self, req: PlanValidationRequest) -> ValidationResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| fallback_validation(&req.business_plan))
    }
}

#[derive(Default)]
pub(crate) struct ScriptedDecisionEvaluator {
    responses: Mutex<VecDeque<AiResponse>>,
    requests: Mutex<Vec<DecisionRequest>>,
}

impl ScriptedDecisionEvaluator {
    pub fn push(&self, response: AiResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl DecisionEvaluator for ScriptedDecisionEvaluator {
    async fn evaluate(&self, req: DecisionRequest) -> AiResponse {
        self.requests.lock().unwrap().push(req);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(AiResponse::internal_error)
    }
}

#[derive(Default)]
pub(crate) struct ScriptedPerformanceEvaluator {
    result: Mutex<Option<EvaluationResult>>,
    calls: AtomicUsize,
}

impl ScriptedPerformanceEvaluator {
    pub fn set(&self, result: EvaluationResult) {
        *self.result.lock().unwrap() = Some(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PerformanceEvaluator for ScriptedPerformanceEvaluator {
    async fn evaluate(&self, _req: PerformanceRequest) -> Result<EvaluationResult, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| {
                ModelError::MissingCredentials("no scripted evaluation".to_string())
            })
    }
}

/// Always fails, so callers exercise the fallback schedule.
pub(crate) struct FailingTimelineGenerator;

#[async_trait]
impl TimelineGenerator for FailingTimelineGenerator {
    async fn generate(&self, _req: TimelineRequest) -> Result<TimelineResponse, ModelError> {
        Err(ModelError::Timeout("timeline service unavailable".to_string()))
    }
}

#[derive(Default)]
pub(crate) struct Doubles {
    pub plan: Arc<ScriptedPlanValidator>,
    pub decision: Arc<ScriptedDecisionEvaluator>,
    pub performance: Arc<ScriptedPerformanceEvaluator>,
}

impl Doubles {
    pub fn adapters(&self) -> Adapters {
        Adapters {
            plan: self.plan.clone(),
            decision: self.decision.clone(),
            performance: self.performance.clone(),
            timeline: Arc::new(FailingTimelineGenerator),
        }
    }
}

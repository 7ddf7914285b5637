//! Mock AI adapters for driving `GameEngine` in integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use ventureplay_lib::ai::{
    fallback_validation, precheck_plan, Adapters, DecisionEvaluator, DecisionRequest, ModelError,
    PerformanceEvaluator, PerformanceRequest, PlanValidationRequest, PlanValidator,
    TimelineGenerator, TimelineRequest,
};
use ventureplay_lib::config::GameConfig;
use ventureplay_lib::game::GameEngine;
use ventureplay_lib::schema::{AiResponse, EvaluationResult, TimelineResponse, ValidationResponse};

pub const PLAN: &str = "We sell refurbished laptops to students. Campus ambassadors drive word of mouth. \
                        We earn a margin on each unit and sell extended warranties.";

/// Runs the same local pre-checks as the real validator, then answers from the
/// script, accepting once the script is empty.
#[derive(Default)]
pub struct MockPlanValidator {
    responses: Mutex<VecDeque<ValidationResponse>>,
    calls: AtomicUsize,
}

impl MockPlanValidator {
    pub fn push(&self, response: ValidationResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanValidator for MockPlanValidator {
    async fn validate(&self, req: PlanValidationRequest) -> ValidationResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(rejection) = precheck_plan(&req, 3) {
            return rejection;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| fallback_validation(&req.business_plan))
    }
}

/// Answers decisions from a script. With a gate set, each call waits for a
/// notification before answering.
#[derive(Default)]
pub struct MockDecisionEvaluator {
    responses: Mutex<VecDeque<AiResponse>>,
    requests: Mutex<Vec<DecisionRequest>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockDecisionEvaluator {
    pub fn push(&self, response: AiResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_json(&self, value: serde_json::Value) {
        self.push(serde_json::from_value(value).expect("scripted response must parse"));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<DecisionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl DecisionEvaluator for MockDecisionEvaluator {
    async fn evaluate(&self, req: DecisionRequest) -> AiResponse {
        self.requests.lock().unwrap().push(req);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(AiResponse::internal_error)
    }
}

/// Fails unless a result was scripted.
#[derive(Default)]
pub struct MockPerformanceEvaluator {
    result: Mutex<Option<EvaluationResult>>,
    requests: Mutex<Vec<PerformanceRequest>>,
}

impl MockPerformanceEvaluator {
    pub fn set(&self, result: EvaluationResult) {
        *self.result.lock().unwrap() = Some(result);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<PerformanceRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PerformanceEvaluator for MockPerformanceEvaluator {
    async fn evaluate(&self, req: PerformanceRequest) -> Result<EvaluationResult, ModelError> {
        self.requests.lock().unwrap().push(req);
        self.result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ModelError::InvalidResponse("no scripted evaluation".to_string()))
    }
}

pub struct UnavailableTimeline;

#[async_trait]
impl TimelineGenerator for UnavailableTimeline {
    async fn generate(&self, _req: TimelineRequest) -> Result<TimelineResponse, ModelError> {
        Err(ModelError::Timeout("timeline service unavailable".to_string()))
    }
}

#[derive(Default)]
pub struct Mocks {
    pub plan: Arc<MockPlanValidator>,
    pub decision: Arc<MockDecisionEvaluator>,
    pub performance: Arc<MockPerformanceEvaluator>,
}

impl Mocks {
    pub fn adapters(&self) -> Adapters {
        Adapters {
            plan: self.plan.clone(),
            decision: self.decision.clone(),
            performance: self.performance.clone(),
            timeline: Arc::new(UnavailableTimeline),
        }
    }

    pub fn engine(&self) -> GameEngine {
        GameEngine::new(GameConfig::default(), self.adapters())
    }
}

/// Starts a session and gets the default plan accepted.
pub async fn engine_in_document_phase(mocks: &Mocks) -> GameEngine {
    let engine = mocks.engine();
    engine.start_problem_phase().expect("rules -> problem");
    let outcome = engine.evaluate_solution(PLAN).await.expect("plan submitted");
    assert_eq!(outcome, ventureplay_lib::game::PlanOutcome::Accepted);
    engine
}

pub fn instagram_accepted() -> serde_json::Value {
    json!({
        "type": "ACCEPTED",
        "tone": "neutral",
        "result": {
            "marketing": {
                "type": "CardChoice",
                "title": "Campaign focus",
                "description": "Where should the budget go?",
                "cards": [
                    { "title": "Reels", "description": "Short video", "buttonString": "Fund reels" },
                    { "title": "Influencers", "description": "Paid posts", "buttonString": "Hire influencers" }
                ]
            },
            "product": null,
            "management": null,
            "log": {
                "title": "Instagram Campaign",
                "content": "...",
                "cost": 400,
                "monetary_return": 120
            }
        }
    })
}

//! The reducer. Every `AppState` mutation goes through [`GameEngine`].
//!
//! Locking rules:
//! - the state mutex is never held across an `.await`;
//! - lock order is state, then clocks;
//! - timer handles are never stopped or dropped under the state lock. Timer
//!   callbacks take the state lock while holding their own gate, so handles
//!   that must go are moved out under the lock and dropped after release.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;

use crate::ai::{
    fallback_evaluation, fallback_timeline, fallback_validation, precheck_plan, Adapters,
    ChatMessage, DecisionRequest, PerformanceRequest, PlanValidationRequest, TimelineRequest,
};
use crate::bus::event_types::*;
use crate::bus::{EventBus, GameEvent};
use crate::config::GameConfig;
use crate::game::error::GameError;
use crate::game::problems;
use crate::game::state::{
    AppState, BusinessPlan, DepartmentEntry, LogEntry, LogMetadata, Phase, Problem,
};
use crate::rate_limit::RateLimiter;
use crate::schema::{
    AiResponse, CardData, EvaluationResult, ProgressUpdate, Template, TemplateError,
    TimelineResponse, ValidationResponse, REASON_TOO_MANY_REQUESTS,
};
use crate::timer::{Countdown, CountdownTimer, DEFAULT_TICK_PERIOD};

pub const REASON_EMPTY_DECISION: &str = "decision is empty";
pub const REASON_DECISION_TOO_LONG: &str = "decision is too long";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "lowercase")]
pub enum PlanOutcome {
    Accepted,
    Rejected(String),
    /// The session moved on while the validator was running.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "lowercase")]
pub enum BuildOutcome {
    Accepted {
        #[serde(rename = "logId")]
        log_id: String,
        #[serde(rename = "countdownSecs")]
        countdown_secs: u32,
    },
    Rejected(String),
    Discarded,
}

/// Cheap handle to one game session.
#[derive(Clone)]
pub struct GameEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: GameConfig,
    adapters: Adapters,
    limiter: Arc<RateLimiter>,
    session: Arc<Session>,
    clocks: Mutex<Clocks>,
}

/// State and bus. Timer callbacks hold this rather than the engine, so a
/// ticking timer never keeps the engine (and therefore itself) alive.
struct Session {
    state: Mutex<AppState>,
    bus: Arc<EventBus>,
}

#[derive(Default)]
struct Clocks {
    phase: Option<CountdownTimer>,
    initiatives: HashMap<String, CountdownTimer>,
}

impl Clocks {
    fn take_all(&mut self) -> Vec<CountdownTimer> {
        let mut taken: Vec<CountdownTimer> = self.initiatives.drain().map(|(_, t)| t).collect();
        taken.extend(self.phase.take());
        taken
    }
}

impl Session {
    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().expect("app state mutex poisoned")
    }

    fn set_phase_timer(&self, epoch: u64, phase: Phase, remaining: u32) {
        let mut state = self.lock();
        if state.epoch != epoch || state.current_phase != phase {
            return;
        }
        state.timer = remaining;
        drop(state);
        self.bus.emit(
            CATEGORY_PHASE,
            EVENT_TIMER_TICK,
            json!({ "phase": phase, "remaining": remaining }),
        );
    }

    fn tick_countdown(&self, log_id: &str, remaining: u32) -> bool {
        let mut state = self.lock();
        if state.current_phase != Phase::Document {
            return false;
        }
        let Some(log) = state.find_log_mut(log_id) else {
            return false;
        };
        if log.metadata.return_applied {
            return false;
        }
        log.countdown = Some(remaining);
        drop(state);
        self.bus.emit(
            CATEGORY_LOG,
            EVENT_COUNTDOWN_TICK,
            json!({ "logId": log_id, "remaining": remaining }),
        );
        true
    }

    /// Applies the entry's return once. Later calls, or calls after the
    /// document phase ended, change nothing.
    fn complete_countdown(&self, log_id: &str) -> bool {
        let mut state = self.lock();
        if state.current_phase != Phase::Document {
            tracing::debug!(
                log_id,
                "countdown finished outside the document phase; return discarded"
            );
            return false;
        }
        let Some(log) = state.find_log_mut(log_id) else {
            return false;
        };
        if log.metadata.return_applied {
            return false;
        }
        log.countdown = Some(0);
        log.metadata.return_applied = true;
        let delta = log.metadata.monetary_return;
        state.company_value = state.company_value.saturating_add(delta);
        let company_value = state.company_value;
        drop(state);

        tracing::info!(log_id, delta, company_value, "initiative return applied");
        self.bus.emit(
            CATEGORY_LOG,
            EVENT_COUNTDOWN_COMPLETED,
            json!({ "logId": log_id }),
        );
        self.bus.emit(
            CATEGORY_ECONOMY,
            EVENT_COMPANY_VALUE_CHANGED,
            json!({ "delta": delta, "companyValue": company_value, "source": "return" }),
        );
        true
    }
}

fn expect_phase(state: &AppState, expected: Phase) -> Result<(), GameError> {
    if state.current_phase == expected {
        Ok(())
    } else {
        Err(GameError::WrongPhase {
            expected,
            actual: state.current_phase,
        })
    }
}

/// Advances progress bars addressed by entry id. Unknown ids and entries
/// without a progress bar are skipped. Returns the ids that changed.
fn apply_progress_updates(state: &mut AppState, updates: &[ProgressUpdate]) -> Vec<String> {
    let mut touched = Vec::new();
    for update in updates {
        let Some(entry) = state.find_entry_mut(&update.template_id) else {
            tracing::warn!(
                template_id = %update.template_id,
                "progress update for unknown entry ignored"
            );
            continue;
        };
        let Some(Template::ProgressBar(bar)) = entry.template.as_mut() else {
            tracing::warn!(
                template_id = %update.template_id,
                "progress update targets an entry without a progress bar"
            );
            continue;
        };
        let stored = bar.apply_progress(update.new_checkpoint_index);
        if stored as i64 != update.new_checkpoint_index {
            tracing::debug!(
                requested = update.new_checkpoint_index,
                stored,
                "checkpoint index clamped"
            );
        }
        entry.refresh_content();
        touched.push(entry.id.clone());
    }
    touched
}

impl GameEngine {
    pub fn new(config: GameConfig, adapters: Adapters) -> Self {
        Self::with_parts(
            config,
            adapters,
            Arc::new(RateLimiter::new()),
            Arc::new(EventBus::new()),
        )
    }

    /// Builds an engine around an existing limiter and bus.
    pub fn with_parts(
        config: GameConfig,
        adapters: Adapters,
        limiter: Arc<RateLimiter>,
        bus: Arc<EventBus>,
    ) -> Self {
        let state = AppState::new(config.starting_company_value);
        Self {
            inner: Arc::new(EngineInner {
                config,
                adapters,
                limiter,
                session: Arc::new(Session {
                    state: Mutex::new(state),
                    bus,
                }),
                clocks: Mutex::new(Clocks::default()),
            }),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.inner.session.bus.subscribe()
    }

    pub fn snapshot(&self) -> AppState {
        self.state().clone()
    }

    /// `rules -> problem`. Draws a problem and starts the problem clock.
    /// Must be called from within a tokio runtime.
    pub fn start_problem_phase(&self) -> Result<Problem, GameError> {
        let secs = self.inner.config.problem_phase_secs;
        let mut state = self.state();
        expect_phase(&state, Phase::Rules)?;

        let problem = problems::random_problem();
        state.current_phase = Phase::Problem;
        state.current_problem = Some(problem.clone());
        state.timer = secs;
        state.rejection_reason = None;
        state.draft_solution.clear();
        let stale = self.arm_phase_clock(state.epoch, Phase::Problem, secs);
        drop(state);
        drop(stale);

        tracing::info!(problem = %problem.id, secs, "entered problem phase");
        self.emit_phase(Phase::Problem);
        Ok(problem)
    }

    /// Stores the solution text being drafted so a timeout can submit it.
    pub fn update_draft(&self, text: &str) -> Result<(), GameError> {
        let mut state = self.state();
        expect_phase(&state, Phase::Problem)?;
        state.draft_solution = text.to_string();
        Ok(())
    }

    /// Submits a business plan. Acceptance enters the document phase;
    /// rejection stays in the problem phase and adds grace time to the clock.
    pub async fn evaluate_solution(&self, solution: &str) -> Result<PlanOutcome, GameError> {
        let config = &self.inner.config;
        let (epoch, request) = {
            let mut state = self.state();
            expect_phase(&state, Phase::Problem)?;
            if state.is_loading {
                return Err(GameError::Busy);
            }
            state.is_loading = true;
            state.draft_solution = solution.to_string();
            let problem_statement = state
                .current_problem
                .as_ref()
                .map(Problem::statement)
                .unwrap_or_default();
            (
                state.epoch,
                PlanValidationRequest {
                    problem_statement,
                    business_plan: solution.to_string(),
                },
            )
        };

        let response = self.inner.adapters.plan.validate(request.clone()).await;
        let response = match response.validate() {
            Ok(()) => response,
            Err(error) => {
                tracing::warn!("plan validation response failed schema check: {error}");
                precheck_plan(&request, config.min_plan_sentences)
                    .unwrap_or_else(|| fallback_validation(solution))
            }
        };

        let mut state = self.state();
        if state.epoch != epoch || state.current_phase != Phase::Problem {
            return Ok(PlanOutcome::Discarded);
        }
        state.is_loading = false;

        match response {
            ValidationResponse::Accepted {
                formalized_plan,
                content,
            } => {
                let secs = config.document_phase_secs;
                state.business_plan = Some(BusinessPlan::new(formalized_plan));
                state.logs.clear();
                state.clear_departments();
                state.department_briefs = content;
                state.component_interactions.clear();
                state.rejection_reason = None;
                state.current_phase = Phase::Document;
                state.timer = secs;
                let stale = self.arm_phase_clock(epoch, Phase::Document, secs);
                drop(state);
                drop(stale);

                tracing::info!(secs, "business plan accepted; entered document phase");
                self.emit_phase(Phase::Document);
                Ok(PlanOutcome::Accepted)
            }
            ValidationResponse::Rejected { reason } => {
                let grace = config.rejection_grace_secs;
                state.rejection_reason = Some(reason.clone());
                state.rejected_plans.push(solution.to_string());
                state.timer = state.timer.saturating_add(grace);
                if let Some(clock) = &self.clocks().phase {
                    clock.extend(grace);
                }
                let timer = state.timer;
                drop(state);

                tracing::info!(%reason, timer, "business plan rejected");
                self.bus().emit(
                    CATEGORY_PHASE,
                    EVENT_PLAN_REJECTED,
                    json!({ "reason": reason, "timer": timer }),
                );
                Ok(PlanOutcome::Rejected(reason))
            }
        }
    }

    /// Submits the current draft when the problem clock runs out. Skipped if a
    /// submission is already in flight or the phase has moved on.
    pub async fn auto_submit(&self) -> Option<PlanOutcome> {
        let draft = {
            let state = self.state();
            if state.current_phase != Phase::Problem {
                return None;
            }
            state.draft_solution.clone()
        };
        tracing::info!("problem phase time is up; submitting current draft");
        match self.evaluate_solution(&draft).await {
            Ok(outcome) => Some(outcome),
            Err(error) => {
                tracing::debug!("auto-submit skipped: {error}");
                None
            }
        }
    }

    /// Evaluates a decision in the document phase. Accepted decisions charge
    /// their cost now and schedule their return on a countdown.
    pub async fn build(&self, decision_text: &str) -> Result<BuildOutcome, GameError> {
        let config = &self.inner.config;
        let decision_text = decision_text.trim();
        let (epoch, request) = {
            let mut state = self.state();
            expect_phase(&state, Phase::Document)?;
            if state.is_loading {
                return Err(GameError::Busy);
            }
            let input_rejection = if decision_text.is_empty() {
                Some(REASON_EMPTY_DECISION)
            } else if decision_text.chars().count() > config.max_message_chars {
                Some(REASON_DECISION_TOO_LONG)
            } else {
                None
            };
            if let Some(reason) = input_rejection {
                state.rejection_reason = Some(reason.to_string());
                return Ok(BuildOutcome::Rejected(reason.to_string()));
            }
            if !self.inner.limiter.allow(
                &config.session_client_key,
                config.decision_rate_limit,
                config.decision_rate_window(),
            ) {
                state.rejection_reason = Some(REASON_TOO_MANY_REQUESTS.to_string());
                drop(state);
                self.emit_decision_rejected(REASON_TOO_MANY_REQUESTS);
                return Ok(BuildOutcome::Rejected(REASON_TOO_MANY_REQUESTS.to_string()));
            }

            state.is_loading = true;
            let build_logs = [state.build_log_context(), state.open_progress_context()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>();
            (
                state.epoch,
                DecisionRequest {
                    messages: vec![ChatMessage::user(decision_text)],
                    business_plan: state.business_plan.as_ref().map(|p| p.content.clone()),
                    build_logs: (!build_logs.is_empty()).then(|| build_logs.join("\n\n")),
                    component_interactions: state.interactions_context(),
                },
            )
        };

        let response = self.inner.adapters.decision.evaluate(request).await;
        let response = match response.validate() {
            Ok(()) => response,
            Err(error) => {
                tracing::warn!("decision response failed schema check: {error}");
                AiResponse::internal_error()
            }
        };

        let mut state = self.state();
        if state.epoch != epoch || state.current_phase != Phase::Document {
            tracing::debug!("decision response arrived after the document phase ended");
            return Ok(BuildOutcome::Discarded);
        }
        state.is_loading = false;

        match response {
            AiResponse::Rejected { result, .. } => {
                state.rejection_reason = Some(result.reason.clone());
                drop(state);
                tracing::info!(reason = %result.reason, "decision rejected");
                self.emit_decision_rejected(&result.reason);
                Ok(BuildOutcome::Rejected(result.reason))
            }
            AiResponse::Accepted { tone, result } => {
                let countdown_secs = self.random_countdown_secs();
                let log = LogEntry {
                    id: uuid::Uuid::new_v4().to_string(),
                    title: result.log.title.clone(),
                    content: result.log.content.clone(),
                    created_at: Utc::now(),
                    countdown: Some(countdown_secs),
                    metadata: LogMetadata {
                        effect: tone,
                        accepted: true,
                        cost: result.log.cost.round() as i64,
                        monetary_return: result.log.monetary_return.round() as i64,
                        return_applied: false,
                    },
                };
                let cost = log.metadata.cost;
                state.company_value = state.company_value.saturating_sub(cost);
                state.logs.push(log.clone());

                let mut appended = Vec::new();
                for (department, template) in result.department_payloads() {
                    let entry = DepartmentEntry::from_template(department, template.clone(), tone);
                    appended.push(entry.clone());
                    state.department_mut(department).add(entry);
                }
                let progressed = apply_progress_updates(&mut state, &result.progress_updates);
                state.rejection_reason = None;
                let company_value = state.company_value;

                let countdown = self.spawn_initiative_countdown(&log.id, countdown_secs);
                self.clocks().initiatives.insert(log.id.clone(), countdown);
                drop(state);

                tracing::info!(
                    log_id = %log.id,
                    cost,
                    pending_return = log.metadata.monetary_return,
                    countdown_secs,
                    "decision accepted"
                );
                let bus = self.bus();
                bus.emit(CATEGORY_LOG, EVENT_LOG_APPENDED, json!(log));
                bus.emit(
                    CATEGORY_ECONOMY,
                    EVENT_COMPANY_VALUE_CHANGED,
                    json!({ "delta": -cost, "companyValue": company_value, "source": "cost" }),
                );
                for entry in &appended {
                    bus.emit(CATEGORY_DEPARTMENT, EVENT_DEPARTMENT_APPENDED, json!(entry));
                }
                for entry_id in progressed {
                    bus.emit(
                        CATEGORY_DEPARTMENT,
                        EVENT_DEPARTMENT_UPDATED,
                        json!({ "entryId": entry_id }),
                    );
                }

                Ok(BuildOutcome::Accepted {
                    log_id: log.id,
                    countdown_secs,
                })
            }
        }
    }

    /// Picks a card on a department entry. The first pick locks the choice and
    /// is forwarded to later decision evaluations.
    pub fn select_card(&self, entry_id: &str, card_index: usize) -> Result<CardData, GameError> {
        let mut state = self.state();
        expect_phase(&state, Phase::Document)?;
        let entry = state
            .find_entry_mut(entry_id)
            .ok_or_else(|| GameError::UnknownEntry(entry_id.to_string()))?;
        let Some(Template::CardChoice(choice)) = entry.template.as_mut() else {
            return Err(TemplateError::NotACardChoice.into());
        };
        let card = choice.select(card_index)?.clone();
        let interaction = format!("{}: chose \"{}\"", choice.title, card.title);
        entry.refresh_content();
        state.component_interactions.push(interaction);
        drop(state);

        tracing::debug!(entry_id, card = %card.title, "card selected");
        self.bus().emit(
            CATEGORY_DEPARTMENT,
            EVENT_DEPARTMENT_UPDATED,
            json!({ "entryId": entry_id, "selectedCard": card_index }),
        );
        Ok(card)
    }

    /// `document -> evaluation` at the player's request.
    pub async fn skip_to_evaluation(&self) -> Result<EvaluationResult, GameError> {
        if !self.finish_building() {
            let state = self.state();
            return Err(GameError::WrongPhase {
                expected: Phase::Document,
                actual: state.current_phase,
            });
        }
        self.run_evaluation().await
    }

    /// Closes the document phase: stops every clock and discards returns that
    /// have not been applied yet. Returns false if not in the document phase.
    pub fn finish_building(&self) -> bool {
        let mut state = self.state();
        if state.current_phase != Phase::Document {
            return false;
        }
        state.current_phase = Phase::Evaluation;
        state.timer = 0;
        state.is_loading = false;
        let discarded = state
            .logs
            .iter()
            .filter(|log| !log.metadata.return_applied)
            .count();
        let stopped = self.clocks().take_all();
        drop(state);
        drop(stopped);

        tracing::info!(discarded, "document phase closed");
        self.emit_phase(Phase::Evaluation);
        true
    }

    /// Requests the performance evaluation once per entry into the evaluation
    /// phase. Later calls return the stored result.
    pub async fn run_evaluation(&self) -> Result<EvaluationResult, GameError> {
        let (epoch, request) = {
            let mut state = self.state();
            expect_phase(&state, Phase::Evaluation)?;
            if let Some(existing) = &state.evaluation {
                return Ok(existing.clone());
            }
            if state.evaluation_requested {
                return Err(GameError::Busy);
            }
            state.evaluation_requested = true;
            state.is_loading = true;
            (
                state.epoch,
                PerformanceRequest {
                    business_plan: state.business_plan.as_ref().map(|p| p.content.clone()),
                    build_logs: state.build_log_context(),
                    company_value: Some(state.company_value),
                    rejected_plans: state.rejected_plans.clone(),
                    problem_statement: state.current_problem.as_ref().map(Problem::statement),
                },
            )
        };

        let result = match self.inner.adapters.performance.evaluate(request).await {
            Ok(result) => match result.validate() {
                Ok(()) => result,
                Err(error) => {
                    tracing::warn!("evaluation failed schema check, using fallback: {error}");
                    fallback_evaluation()
                }
            },
            Err(error) => {
                tracing::warn!("performance evaluation failed, using fallback: {error}");
                fallback_evaluation()
            }
        };

        let mut state = self.state();
        if state.epoch != epoch || state.current_phase != Phase::Evaluation {
            return Ok(result);
        }
        state.is_loading = false;
        state.evaluation = Some(result.clone());
        drop(state);

        tracing::info!(overall = result.overall_score, "evaluation ready");
        self.bus()
            .emit(CATEGORY_EVALUATION, EVENT_EVALUATION_READY, json!(result));
        Ok(result)
    }

    /// Schedule for the accepted business plan, or the fixed fallback.
    pub async fn plan_timeline(&self) -> Result<TimelineResponse, GameError> {
        let business_plan = {
            let state = self.state();
            state
                .business_plan
                .as_ref()
                .map(|plan| plan.content.clone())
                .ok_or_else(|| GameError::InvalidInput("no business plan yet".to_string()))?
        };
        match self
            .inner
            .adapters
            .timeline
            .generate(TimelineRequest { business_plan })
            .await
        {
            Ok(timeline) => Ok(timeline),
            Err(error) => {
                tracing::warn!("timeline generation failed, using fallback: {error}");
                Ok(fallback_timeline(Utc::now().date_naive()))
            }
        }
    }

    /// Applies a log entry's return now. Idempotent.
    pub fn complete_countdown(&self, log_id: &str) -> bool {
        self.inner.session.complete_countdown(log_id)
    }

    pub fn tick_countdown(&self, log_id: &str, remaining: u32) -> bool {
        self.inner.session.tick_countdown(log_id, remaining)
    }

    /// Back to `rules` with fresh defaults. Results still in flight from the
    /// previous run are dropped when they arrive.
    pub fn restart(&self) {
        let mut state = self.state();
        let epoch = state.epoch.wrapping_add(1);
        *state = AppState::new(self.inner.config.starting_company_value);
        state.epoch = epoch;
        let stopped = self.clocks().take_all();
        drop(state);
        drop(stopped);

        tracing::info!("session restarted");
        self.emit_phase(Phase::Rules);
    }

    fn arm_phase_clock(&self, epoch: u64, phase: Phase, secs: u32) -> Option<CountdownTimer> {
        let session = self.inner.session.clone();
        let engine = Arc::downgrade(&self.inner);
        let clock = CountdownTimer::spawn(
            Countdown::new(secs, true),
            DEFAULT_TICK_PERIOD,
            move |remaining| session.set_phase_timer(epoch, phase, remaining),
            move || {
                let Some(inner) = engine.upgrade() else {
                    return;
                };
                let engine = GameEngine { inner };
                tokio::spawn(async move { engine.on_phase_clock_expired(epoch, phase).await });
            },
        );
        self.clocks().phase.replace(clock)
    }

    async fn on_phase_clock_expired(&self, epoch: u64, phase: Phase) {
        {
            let state = self.state();
            if state.epoch != epoch || state.current_phase != phase {
                return;
            }
        }
        match phase {
            Phase::Problem => {
                self.auto_submit().await;
            }
            Phase::Document => {
                tracing::info!("document phase time is up");
                if self.finish_building() {
                    if let Err(error) = self.run_evaluation().await {
                        tracing::debug!("evaluation after timeout skipped: {error}");
                    }
                }
            }
            Phase::Rules | Phase::Evaluation => {}
        }
    }

    fn spawn_initiative_countdown(&self, log_id: &str, secs: u32) -> CountdownTimer {
        let tick_session = self.inner.session.clone();
        let done_session = self.inner.session.clone();
        let tick_id = log_id.to_string();
        let done_id = log_id.to_string();
        CountdownTimer::spawn(
            Countdown::new(secs, true),
            DEFAULT_TICK_PERIOD,
            move |remaining| {
                if remaining > 0 {
                    tick_session.tick_countdown(&tick_id, remaining);
                }
            },
            move || {
                done_session.complete_countdown(&done_id);
            },
        )
    }

    fn random_countdown_secs(&self) -> u32 {
        let config = &self.inner.config;
        let low = config.countdown_min_secs.min(config.countdown_max_secs).max(1);
        let high = config.countdown_max_secs.max(low);
        rand::thread_rng().gen_range(low..=high)
    }

    fn emit_phase(&self, phase: Phase) {
        self.bus()
            .emit(CATEGORY_PHASE, EVENT_PHASE_CHANGED, json!({ "phase": phase }));
    }

    fn emit_decision_rejected(&self, reason: &str) {
        self.bus()
            .emit(CATEGORY_LOG, EVENT_DECISION_REJECTED, json!({ "reason": reason }));
    }

    fn bus(&self) -> &EventBus {
        &self.inner.session.bus
    }

    fn state(&self) -> MutexGuard<'_, AppState> {
        self.inner.session.lock()
    }

    fn clocks(&self) -> MutexGuard<'_, Clocks> {
        self.inner.clocks.lock().expect("clock registry mutex poisoned")
    }
}

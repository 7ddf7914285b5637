//! Event category and type names.

pub const CATEGORY_PHASE: &str = "phase";
pub const CATEGORY_LOG: &str = "log";
pub const CATEGORY_ECONOMY: &str = "economy";
pub const CATEGORY_DEPARTMENT: &str = "department";
pub const CATEGORY_EVALUATION: &str = "evaluation";

pub const EVENT_PHASE_CHANGED: &str = "phase.changed";
pub const EVENT_PLAN_REJECTED: &str = "plan.rejected";
pub const EVENT_DECISION_REJECTED: &str = "decision.rejected";
pub const EVENT_TIMER_TICK: &str = "timer.tick";
pub const EVENT_LOG_APPENDED: &str = "log.appended";
pub const EVENT_COUNTDOWN_TICK: &str = "countdown.tick";
pub const EVENT_COUNTDOWN_COMPLETED: &str = "countdown.completed";
pub const EVENT_COMPANY_VALUE_CHANGED: &str = "company_value.changed";
pub const EVENT_DEPARTMENT_APPENDED: &str = "department.appended";
pub const EVENT_DEPARTMENT_UPDATED: &str = "department.updated";
pub const EVENT_EVALUATION_READY: &str = "evaluation.ready";

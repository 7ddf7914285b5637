//! Session state and the reducer that owns it.
//!
//! `GameEngine` is the single writer of `AppState`. Adapters, timers and the
//! presentation layer only ever see snapshots or events.

mod engine;
mod error;

pub mod departments;
pub mod problems;
pub mod state;

pub use departments::{DepartmentDocument, DepartmentStats};
pub use engine::{
    BuildOutcome, GameEngine, PlanOutcome, REASON_DECISION_TOO_LONG, REASON_EMPTY_DECISION,
};
pub use error::GameError;
pub use state::{
    AppState, BusinessPlan, DepartmentEntry, EntryTag, LogEntry, LogMetadata, Phase, Problem,
    BUSINESS_PLAN_ID,
};

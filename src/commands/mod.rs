//! Entry points used by a presentation layer.
//!
//! - `ai`: the JSON endpoints in front of the AI adapters, with status codes
//! - `session`: line commands that drive a local `GameEngine`

pub mod ai;
pub mod session;

pub use ai::{
    evaluate_decision, evaluate_performance, generate_timeline, validate_plan, CommandResponse,
    ServiceState,
};
pub use session::{dispatch, SessionCommand};

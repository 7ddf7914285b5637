//! Business-simulation game backend.
//!
//! A player reads a problem, drafts a business plan against the clock, then
//! spends the document phase making decisions that an AI evaluator turns into
//! costs, delayed returns and department updates. The session ends with a
//! performance evaluation.
//!
//! # Architecture
//!
//! - `game`: `AppState` and `GameEngine`, the single writer of that state
//! - `ai`: chat client and the plan/decision/performance/timeline adapters
//! - `schema`: tagged unions for everything the AI returns, with validation
//! - `timer`: drift-correcting countdowns on the tokio runtime
//! - `rate_limit`: per-client sliding window in front of decision evaluation
//! - `bus`: broadcast of game events for a presentation layer
//! - `commands`: JSON endpoints and terminal session commands
//! - `config`: timings, economy constants and model endpoint

pub mod ai;
pub mod bus;
pub mod commands;
pub mod config;
pub mod game;
pub mod rate_limit;
pub mod schema;
pub mod timer;

#[cfg(test)]
mod testing;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Game(#[from] game::GameError),
    #[error("{0}")]
    Model(#[from] ai::ModelError),
    #[error("{0}")]
    Schema(#[from] schema::SchemaError),
    #[error("{0}")]
    Config(#[from] config::ConfigError),
    #[error("{0}")]
    Other(String),
}

impl Serialize for AppError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
/// Calling it twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ventureplay=debug,info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_serialises_as_its_message() {
        let error = AppError::from(game::GameError::Busy);
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!("a request is already in progress")
        );
    }
}

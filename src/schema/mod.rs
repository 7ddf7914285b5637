//! Typed contract for everything the reasoning service returns.
//!
//! Raw JSON never reaches game state directly: it is deserialised into the
//! tagged unions defined here and then checked with [`Validate`]. Any failure
//! is a [`SchemaError`], which callers treat as a boundary failure.

pub mod evaluation;
pub mod response;
pub mod template;

use serde::de::DeserializeOwned;

pub use evaluation::{CategoryScores, EvaluationResult, Feedback, TimelineResponse, TimelineTask};
pub use response::{
    AcceptedResult, AiResponse, DepartmentContent, LogPayload, ProgressUpdate, RejectedResult,
    Tone, ValidationResponse, MAX_MONEY, REASON_INTERNAL_ERROR, REASON_TOO_MANY_REQUESTS,
};
pub use template::{
    CardChoice, CardData, Department, ProgressBar, StaticText, Template, TemplateError,
    TemplateKind,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchemaError {
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("missing or empty field: {0}")]
    MissingField(String),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: String, value: String },
}

pub trait Validate {
    fn validate(&self) -> Result<(), SchemaError>;
}

impl Validate for AiResponse {
    fn validate(&self) -> Result<(), SchemaError> {
        AiResponse::validate(self)
    }
}

impl Validate for ValidationResponse {
    fn validate(&self) -> Result<(), SchemaError> {
        ValidationResponse::validate(self)
    }
}

impl Validate for EvaluationResult {
    fn validate(&self) -> Result<(), SchemaError> {
        EvaluationResult::validate(self)
    }
}

impl Validate for TimelineResponse {
    fn validate(&self) -> Result<(), SchemaError> {
        TimelineResponse::validate(self)
    }
}

impl Validate for Template {
    fn validate(&self) -> Result<(), SchemaError> {
        Template::validate(self)
    }
}

/// Deserialises and validates a payload in one step.
pub fn parse_payload<T>(value: serde_json::Value) -> Result<T, SchemaError>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T =
        serde_json::from_value(value).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

/// Pretty JSON schema for `T`, embedded in prompts to constrain model output.
pub fn json_schema_for<T: schemars::JsonSchema>() -> String {
    let schema = schemars::schema_for!(T);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
}

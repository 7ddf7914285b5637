//! Request types and errors for the AI boundary.

use serde::{Deserialize, Serialize};

use crate::schema::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timeout: {0}")]
    Timeout(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("missing credentials: {0}")]
    MissingCredentials(String),
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),
}

impl From<reqwest::Error> for ModelError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Self::Timeout(value.to_string());
        }
        Self::Request(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanValidationRequest {
    #[serde(default)]
    pub problem_statement: String,
    #[serde(default)]
    pub business_plan: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub business_plan: Option<String>,
    #[serde(default)]
    pub build_logs: Option<String>,
    #[serde(default)]
    pub component_interactions: Option<String>,
}

impl DecisionRequest {
    /// Text of the latest user message, i.e. the decision being evaluated.
    pub fn decision_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRequest {
    #[serde(default)]
    pub business_plan: Option<String>,
    #[serde(default)]
    pub build_logs: Option<String>,
    #[serde(default)]
    pub company_value: Option<i64>,
    #[serde(default)]
    pub rejected_plans: Vec<String>,
    #[serde(default)]
    pub problem_statement: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRequest {
    #[serde(default)]
    pub business_plan: String,
}

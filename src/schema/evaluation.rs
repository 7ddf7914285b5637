//! Performance evaluation and timeline payloads.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::SchemaError;

pub const MAX_OVERALL_SCORE: f64 = 100.0;
pub const MAX_CATEGORY_SCORE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub overall_score: f64,
    pub category_scores: CategoryScores,
    pub feedback: Feedback,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScores {
    pub strategic_thinking: f64,
    pub financial_management: f64,
    pub market_understanding: f64,
    pub execution: f64,
    pub adaptability: f64,
    pub innovation: f64,
}

impl CategoryScores {
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("strategicThinking", self.strategic_thinking),
            ("financialManagement", self.financial_management),
            ("marketUnderstanding", self.market_understanding),
            ("execution", self.execution),
            ("adaptability", self.adaptability),
            ("innovation", self.innovation),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl EvaluationResult {
    pub fn validate(&self) -> Result<(), SchemaError> {
        check_range("overallScore", self.overall_score, MAX_OVERALL_SCORE)?;
        for (name, score) in self.category_scores.entries() {
            check_range(name, score, MAX_CATEGORY_SCORE)?;
        }
        if self.summary.trim().is_empty() {
            return Err(SchemaError::MissingField("summary".to_string()));
        }
        Ok(())
    }
}

fn check_range(field: &str, value: f64, max: f64) -> Result<(), SchemaError> {
    if !value.is_finite() || !(0.0..=max).contains(&value) {
        return Err(SchemaError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineResponse {
    pub tasks: Vec<TimelineTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimelineTask {
    pub id: String,
    pub name: String,
    /// ISO date, `YYYY-MM-DD`.
    pub start: String,
    pub end: String,
    pub progress: f64,
    /// Comma-joined task ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_class: Option<String>,
}

impl TimelineResponse {
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.tasks.is_empty() {
            return Err(SchemaError::MissingField("tasks".to_string()));
        }
        for task in &self.tasks {
            if task.id.trim().is_empty() || task.name.trim().is_empty() {
                return Err(SchemaError::MissingField("tasks.id/name".to_string()));
            }
            let start = parse_date("tasks.start", &task.start)?;
            let end = parse_date("tasks.end", &task.end)?;
            if end < start {
                return Err(SchemaError::OutOfRange {
                    field: format!("tasks[{}].end", task.id),
                    value: task.end.clone(),
                });
            }
            check_range("tasks.progress", task.progress, 100.0)?;
        }
        Ok(())
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, SchemaError> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| SchemaError::OutOfRange {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

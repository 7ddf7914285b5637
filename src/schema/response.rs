//! Decision and plan-validation envelopes returned by the reasoning service.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::template::{Department, StaticText, Template};
use super::SchemaError;

pub const REASON_INTERNAL_ERROR: &str = "internal error";
pub const REASON_TOO_MANY_REQUESTS: &str = "too many requests";

/// Largest cost or return, in either direction, a decision may carry.
pub const MAX_MONEY: f64 = 1e12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    #[default]
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum AiResponse {
    #[serde(rename = "ACCEPTED")]
    Accepted {
        #[serde(default)]
        tone: Tone,
        result: AcceptedResult,
    },
    #[serde(rename = "REJECTED")]
    Rejected {
        #[serde(default)]
        tone: Tone,
        result: RejectedResult,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AcceptedResult {
    #[serde(default)]
    pub marketing: Option<Template>,
    #[serde(default)]
    pub product: Option<Template>,
    #[serde(default)]
    pub management: Option<Template>,
    pub log: LogPayload,
    #[serde(default, rename = "progressUpdates", skip_serializing_if = "Vec::is_empty")]
    pub progress_updates: Vec<ProgressUpdate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogPayload {
    pub title: String,
    pub content: String,
    pub cost: f64,
    pub monetary_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub template_id: String,
    pub new_checkpoint_index: i64,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RejectedResult {
    pub reason: String,
}

impl AiResponse {
    pub fn rejected(reason: impl Into<String>) -> Self {
        AiResponse::Rejected {
            tone: Tone::Neutral,
            result: RejectedResult {
                reason: reason.into(),
            },
        }
    }

    pub fn internal_error() -> Self {
        Self::rejected(REASON_INTERNAL_ERROR)
    }

    pub fn tone(&self) -> Tone {
        match self {
            AiResponse::Accepted { tone, .. } | AiResponse::Rejected { tone, .. } => *tone,
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            AiResponse::Rejected { result, .. } => Some(&result.reason),
            AiResponse::Accepted { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        match self {
            AiResponse::Rejected { result, .. } => {
                if result.reason.trim().is_empty() {
                    return Err(SchemaError::MissingField("result.reason".to_string()));
                }
            }
            AiResponse::Accepted { result, .. } => {
                let log = &result.log;
                if log.title.trim().is_empty() {
                    return Err(SchemaError::MissingField("result.log.title".to_string()));
                }
                // Stored rounded to whole units, which must stay positive.
                if !log.cost.is_finite() || log.cost.round() < 1.0 || log.cost > MAX_MONEY {
                    return Err(SchemaError::OutOfRange {
                        field: "result.log.cost".to_string(),
                        value: log.cost.to_string(),
                    });
                }
                if !log.monetary_return.is_finite() || log.monetary_return.abs() > MAX_MONEY {
                    return Err(SchemaError::OutOfRange {
                        field: "result.log.monetary_return".to_string(),
                        value: log.monetary_return.to_string(),
                    });
                }
                for template in result.department_payloads().map(|(_, t)| t) {
                    template.validate()?;
                }
                for update in &result.progress_updates {
                    if update.template_id.trim().is_empty() {
                        return Err(SchemaError::MissingField(
                            "progressUpdates.templateId".to_string(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

impl AcceptedResult {
    /// Non-null department payloads in a fixed department order.
    pub fn department_payloads(&self) -> impl Iterator<Item = (Department, &Template)> {
        [
            (Department::Product, self.product.as_ref()),
            (Department::Marketing, self.marketing.as_ref()),
            (Department::Management, self.management.as_ref()),
        ]
        .into_iter()
        .filter_map(|(department, template)| template.map(|t| (department, t)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValidationResponse {
    Accepted {
        #[serde(rename = "formalizedPlan")]
        formalized_plan: String,
        #[serde(default)]
        content: Vec<DepartmentContent>,
    },
    Rejected {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DepartmentContent {
    pub document: Department,
    pub component: StaticText,
}

impl ValidationResponse {
    pub fn rejected(reason: impl Into<String>) -> Self {
        ValidationResponse::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResponse::Accepted { .. })
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        match self {
            ValidationResponse::Accepted {
                formalized_plan,
                content,
            } => {
                if formalized_plan.trim().is_empty() {
                    return Err(SchemaError::MissingField("formalizedPlan".to_string()));
                }
                for item in content {
                    if item.component.title.trim().is_empty() {
                        return Err(SchemaError::MissingField(
                            "content.component.title".to_string(),
                        ));
                    }
                }
            }
            ValidationResponse::Rejected { reason } => {
                if reason.trim().is_empty() {
                    return Err(SchemaError::MissingField("reason".to_string()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_payload;
    use serde_json::json;

    fn accepted_json(cost: f64) -> serde_json::Value {
        json!({
            "type": "ACCEPTED",
            "tone": "neutral",
            "result": {
                "marketing": {
                    "type": "CardChoice",
                    "title": "Campaign focus",
                    "description": "Where should the budget go?",
                    "cards": [
                        { "title": "Reels", "description": "Video", "buttonString": "Fund reels" }
                    ]
                },
                "product": null,
                "management": null,
                "log": {
                    "title": "Instagram Campaign",
                    "content": "Ran a paid campaign.",
                    "cost": cost,
                    "monetary_return": -20
                }
            }
        })
    }

    #[test]
    fn accepted_response_parses_and_lists_payloads() {
        let response: AiResponse = parse_payload(accepted_json(400.0)).unwrap();
        let AiResponse::Accepted { result, tone } = response else {
            panic!("expected accepted");
        };
        assert_eq!(tone, Tone::Neutral);
        assert_eq!(result.log.monetary_return, -20.0);
        let departments: Vec<Department> = result.department_payloads().map(|(d, _)| d).collect();
        assert_eq!(departments, vec![Department::Marketing]);
    }

    #[test]
    fn non_positive_cost_is_a_schema_violation() {
        let err = parse_payload::<AiResponse>(accepted_json(0.0)).unwrap_err();
        assert!(matches!(err, SchemaError::OutOfRange { .. }));
    }

    #[test]
    fn cost_that_rounds_to_zero_is_a_schema_violation() {
        let err = parse_payload::<AiResponse>(accepted_json(0.4)).unwrap_err();
        assert!(matches!(err, SchemaError::OutOfRange { .. }));
        assert!(parse_payload::<AiResponse>(accepted_json(0.6)).is_ok());
    }

    #[test]
    fn money_beyond_the_bound_is_a_schema_violation() {
        let err = parse_payload::<AiResponse>(accepted_json(1e30)).unwrap_err();
        assert!(matches!(err, SchemaError::OutOfRange { .. }));

        let mut huge_return = accepted_json(400.0);
        huge_return["result"]["log"]["monetary_return"] = json!(-1e30);
        let err = parse_payload::<AiResponse>(huge_return).unwrap_err();
        assert!(matches!(err, SchemaError::OutOfRange { .. }));
    }

    #[test]
    fn rejected_without_tone_defaults_to_neutral() {
        let response: AiResponse =
            parse_payload(json!({ "type": "REJECTED", "result": { "reason": "Too vague" } }))
                .unwrap();
        assert_eq!(response.tone(), Tone::Neutral);
        assert_eq!(response.rejection_reason(), Some("Too vague"));
    }

    #[test]
    fn lowercase_discriminant_is_rejected() {
        let err = parse_payload::<AiResponse>(json!({ "type": "accepted", "result": {} }))
            .unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(_)));
    }

    #[test]
    fn validation_response_shapes() {
        let accepted: ValidationResponse = parse_payload(json!({
            "type": "accepted",
            "formalizedPlan": "## Plan",
            "content": [{
                "document": "Product",
                "component": { "type": "StaticText", "title": "Roadmap", "text": "MVP first" }
            }]
        }))
        .unwrap();
        assert!(accepted.is_accepted());

        let rejected: ValidationResponse =
            parse_payload(json!({ "type": "rejected", "reason": "No revenue model" })).unwrap();
        assert!(!rejected.is_accepted());

        assert!(parse_payload::<ValidationResponse>(json!({ "type": "rejected", "reason": " " }))
            .is_err());
    }
}

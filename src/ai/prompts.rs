//! System prompts for the reasoning service. Each embeds the JSON schema of
//! the payload it expects back.

use crate::schema::{
    json_schema_for, AiResponse, EvaluationResult, TimelineResponse, ValidationResponse,
};

fn output_contract(schema: &str) -> String {
    format!(
        "## Output Contract\n\nRespond with a single JSON object and nothing else. \
         It must validate against this JSON schema:\n\n```json\n{schema}\n```\n"
    )
}

pub fn plan_validation_prompt() -> String {
    format!(
        r#"You are a pragmatic venture investor reviewing a founder's business plan for the problem statement you are given.

## Rules

- Accept the plan if it names a customer, a product or service that addresses the problem, and a way to make money.
- Reject plans that ignore the problem, are incoherent, or have no revenue model. Keep the rejection reason to one short sentence.
- When accepting, rewrite the plan as a clean markdown document in `formalizedPlan` and give each department (Product, Marketing, Management) one StaticText component with its starting brief.

{}"#,
        output_contract(&json_schema_for::<ValidationResponse>())
    )
}

pub fn decision_prompt() -> String {
    format!(
        r#"You are the simulation engine of a startup-building game. The player runs a young company and submits one decision at a time.

## Rules

- Reject decisions that are vague, impossible, unethical, or unrelated to the business plan. Put a short reason in `result.reason`.
- When accepting, write a log entry with a title, a short narrative, a strictly positive `cost`, and a realistic `monetary_return` (which may be negative).
- Fill `marketing`, `product` and `management` only for departments the decision actually affects; use null otherwise.
- Use StaticText for plain updates, ProgressBar for multi-step initiatives, and CardChoice when the player should pick a follow-up.
- To advance an existing ProgressBar, add a `progressUpdates` entry with its `templateId`.
- `tone` reflects how well the decision fits the plan: positive, neutral, or negative.

{}"#,
        output_contract(&json_schema_for::<AiResponse>())
    )
}

pub fn performance_prompt() -> String {
    format!(
        r#"You are a startup accelerator partner writing the final evaluation of a founder's simulated run.

## Rules

- `overallScore` is 0-100. Each category score is 0-10.
- Weigh the quality of the plan, how decisions followed it, and the final company value against the starting value of 5000.
- Rejected plan drafts show how the founder iterated; mention them only if they are informative.
- Feedback lists hold short bullet sentences. `summary` is two or three sentences.

{}"#,
        output_contract(&json_schema_for::<EvaluationResult>())
    )
}

pub fn timeline_prompt() -> String {
    format!(
        r#"You are a project manager turning a business plan into a launch schedule.

## Rules

- Produce 6 to 12 tasks starting today. Dates are ISO `YYYY-MM-DD`.
- `progress` is 0 for tasks that have not started.
- `dependencies` is a comma-joined list of earlier task ids.

{}"#,
        output_contract(&json_schema_for::<TimelineResponse>())
    )
}

/// Bounds free text pasted into a prompt.
pub fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars).collect();
    clipped.push_str("\n[truncated]");
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_embed_their_schema() {
        assert!(plan_validation_prompt().contains("formalizedPlan"));
        assert!(decision_prompt().contains("monetary_return"));
        assert!(performance_prompt().contains("categoryScores"));
        assert!(timeline_prompt().contains("tasks"));
    }

    #[test]
    fn clip_respects_char_boundaries() {
        assert_eq!(clip("héllo", 10), "héllo");
        assert_eq!(clip("héllo", 2), "hé\n[truncated]");
    }
}

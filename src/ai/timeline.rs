//! Launch-schedule generation for the plan's Gantt view.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

use crate::ai::client::ChatClient;
use crate::ai::prompts::{clip, timeline_prompt};
use crate::ai::traits::TimelineGenerator;
use crate::ai::types::{ChatMessage, ModelError, TimelineRequest};
use crate::schema::{TimelineResponse, TimelineTask};

const TIMELINE_MAX_TOKENS: u32 = 2_048;
const PLAN_CHARS: usize = 8_000;

/// (name, duration in days, progress) for the fixed fallback schedule.
const FALLBACK_TASKS: [(&str, i64, f64); 8] = [
    ("Market Research", 7, 100.0),
    ("Business Plan Refinement", 5, 80.0),
    ("Product Design", 10, 40.0),
    ("MVP Development", 21, 10.0),
    ("Marketing Strategy", 7, 0.0),
    ("Beta Testing", 14, 0.0),
    ("Launch Preparation", 7, 0.0),
    ("Public Launch", 3, 0.0),
];

/// Eight sequential tasks starting at `today`, each depending on the previous.
pub fn fallback_timeline(today: NaiveDate) -> TimelineResponse {
    let mut start = today;
    let mut tasks = Vec::with_capacity(FALLBACK_TASKS.len());
    for (index, (name, days, progress)) in FALLBACK_TASKS.iter().enumerate() {
        let end = start + Duration::days(*days);
        tasks.push(TimelineTask {
            id: format!("task-{}", index + 1),
            name: name.to_string(),
            start: start.format("%Y-%m-%d").to_string(),
            end: end.format("%Y-%m-%d").to_string(),
            progress: *progress,
            dependencies: (index > 0).then(|| format!("task-{index}")),
            custom_class: None,
        });
        start = end;
    }
    TimelineResponse { tasks }
}

pub struct LlmTimelineGenerator {
    client: Arc<ChatClient>,
}

impl LlmTimelineGenerator {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TimelineGenerator for LlmTimelineGenerator {
    async fn generate(&self, req: TimelineRequest) -> Result<TimelineResponse, ModelError> {
        let today = chrono::Local::now().date_naive();
        let user = format!(
            "Today is {}.\n\nBusiness plan:\n{}",
            today.format("%Y-%m-%d"),
            clip(req.business_plan.trim(), PLAN_CHARS)
        );
        self.client
            .request_typed::<TimelineResponse>(
                &timeline_prompt(),
                &[ChatMessage::user(user)],
                TIMELINE_MAX_TOKENS,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_has_eight_chained_tasks() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let timeline = fallback_timeline(today);
        assert!(timeline.validate().is_ok());
        assert_eq!(timeline.tasks.len(), 8);
        assert_eq!(timeline.tasks[0].start, "2026-10-18");
        assert_eq!(timeline.tasks[0].dependencies, None);
        assert_eq!(timeline.tasks[3].dependencies.as_deref(), Some("task-3"));
        for pair in timeline.tasks.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}

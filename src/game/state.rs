//! Session state: the aggregate root and the entities it owns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::departments::DepartmentDocument;
use crate::schema::{Department, DepartmentContent, EvaluationResult, Template, Tone};

pub const BUSINESS_PLAN_ID: &str = "business-plan";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Rules,
    Problem,
    Document,
    Evaluation,
}

impl Phase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Phase::Rules => "rules",
            Phase::Problem => "problem",
            Phase::Document => "document",
            Phase::Evaluation => "evaluation",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub market_analysis: String,
}

impl Problem {
    /// Text handed to the plan validator as the problem statement.
    pub fn statement(&self) -> String {
        format!(
            "{}\n\n{}\n\nMarket analysis: {}",
            self.title, self.description, self.market_analysis
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessPlan {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl BusinessPlan {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: BUSINESS_PLAN_ID.to_string(),
            title: "Business Plan".to_string(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMetadata {
    pub effect: Tone,
    pub accepted: bool,
    pub cost: i64,
    #[serde(rename = "return")]
    pub monetary_return: i64,
    /// Set once the return has been added to company value.
    pub return_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown: Option<u32>,
    pub metadata: LogMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryTag {
    Milestone,
    Update,
    Risk,
}

impl EntryTag {
    /// Progress bars are milestones, card choices are risks, text is an
    /// update. A negative response marks everything as a risk.
    pub fn for_template(template: &Template, tone: Tone) -> Self {
        if tone == Tone::Negative {
            return EntryTag::Risk;
        }
        match template {
            Template::ProgressBar(_) => EntryTag::Milestone,
            Template::CardChoice(_) => EntryTag::Risk,
            Template::StaticText(_) => EntryTag::Update,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub tag: EntryTag,
    pub department: Department,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
}

impl DepartmentEntry {
    pub fn from_template(department: Department, template: Template, tone: Tone) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: template.title().to_string(),
            content: template.summary(),
            timestamp: Utc::now(),
            tag: EntryTag::for_template(&template, tone),
            department,
            template: Some(template),
        }
    }

    /// Re-derives `content` after the template changed.
    pub fn refresh_content(&mut self) {
        if let Some(template) = &self.template {
            self.content = template.summary();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub current_phase: Phase,
    pub current_problem: Option<Problem>,
    pub business_plan: Option<BusinessPlan>,
    /// Solution text being drafted in the problem phase.
    pub draft_solution: String,
    pub logs: Vec<LogEntry>,
    pub product: DepartmentDocument,
    pub marketing: DepartmentDocument,
    pub management: DepartmentDocument,
    pub company_value: i64,
    /// Seconds left on the phase clock.
    pub timer: u32,
    pub rejection_reason: Option<String>,
    pub is_loading: bool,
    pub rejected_plans: Vec<String>,
    pub department_briefs: Vec<DepartmentContent>,
    pub component_interactions: Vec<String>,
    pub evaluation: Option<EvaluationResult>,
    #[serde(skip)]
    pub(crate) evaluation_requested: bool,
    /// Bumped on restart so late async results from a previous run are dropped.
    #[serde(skip)]
    pub(crate) epoch: u64,
}

impl AppState {
    pub fn new(starting_company_value: i64) -> Self {
        Self {
            current_phase: Phase::Rules,
            current_problem: None,
            business_plan: None,
            draft_solution: String::new(),
            logs: Vec::new(),
            product: DepartmentDocument::new(Department::Product),
            marketing: DepartmentDocument::new(Department::Marketing),
            management: DepartmentDocument::new(Department::Management),
            company_value: starting_company_value,
            timer: 0,
            rejection_reason: None,
            is_loading: false,
            rejected_plans: Vec::new(),
            department_briefs: Vec::new(),
            component_interactions: Vec::new(),
            evaluation: None,
            evaluation_requested: false,
            epoch: 0,
        }
    }

    pub fn department(&self, department: Department) -> &DepartmentDocument {
        match department {
            Department::Product => &self.product,
            Department::Marketing => &self.marketing,
            Department::Management => &self.management,
        }
    }

    pub fn department_mut(&mut self, department: Department) -> &mut DepartmentDocument {
        match department {
            Department::Product => &mut self.product,
            Department::Marketing => &mut self.marketing,
            Department::Management => &mut self.management,
        }
    }

    pub fn find_entry_mut(&mut self, entry_id: &str) -> Option<&mut DepartmentEntry> {
        [&mut self.product, &mut self.marketing, &mut self.management]
            .into_iter()
            .find_map(|doc| doc.find_mut(entry_id))
    }

    pub fn clear_departments(&mut self) {
        for department in Department::all() {
            self.department_mut(*department).clear();
        }
    }

    pub fn find_log_mut(&mut self, log_id: &str) -> Option<&mut LogEntry> {
        self.logs.iter_mut().find(|log| log.id == log_id)
    }

    /// Compact history of accepted decisions for the decision and performance
    /// evaluators.
    pub fn build_log_context(&self) -> Option<String> {
        if self.logs.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .logs
            .iter()
            .map(|log| {
                format!(
                    "- {} (cost {}, return {}): {}",
                    log.title, log.metadata.cost, log.metadata.monetary_return, log.content
                )
            })
            .collect();
        Some(lines.join("\n"))
    }

    /// Progress bars still short of completion, addressed by entry id so a
    /// decision response can advance them.
    pub fn open_progress_context(&self) -> Option<String> {
        let lines: Vec<String> = Department::all()
            .iter()
            .flat_map(|department| self.department(*department).entries())
            .filter_map(|entry| match &entry.template {
                Some(Template::ProgressBar(bar)) if !bar.is_complete() => Some(format!(
                    "- [{}] {}: {}/{} checkpoints",
                    entry.id,
                    entry.title,
                    bar.current_checkpoint_index,
                    bar.checkpoint_data.len()
                )),
                _ => None,
            })
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(format!("Open initiatives:\n{}", lines.join("\n")))
        }
    }

    pub fn interactions_context(&self) -> Option<String> {
        if self.component_interactions.is_empty() {
            None
        } else {
            Some(self.component_interactions.join("\n"))
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_STARTING_COMPANY_VALUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CardChoice, CardData, ProgressBar, StaticText};

    fn card_choice() -> Template {
        Template::CardChoice(CardChoice {
            title: "Channel".to_string(),
            description: "Pick one.".to_string(),
            cards: vec![CardData {
                title: "Reels".to_string(),
                description: "Short video".to_string(),
                button_string: "Go".to_string(),
            }],
            selected_card: None,
        })
    }

    #[test]
    fn initial_state_starts_in_rules() {
        let state = AppState::default();
        assert_eq!(state.current_phase, Phase::Rules);
        assert_eq!(state.company_value, 5000);
        assert!(state.logs.is_empty());
        assert!(!state.is_loading);
    }

    #[test]
    fn tags_follow_template_kind_and_tone() {
        let text = Template::StaticText(StaticText {
            title: "Note".to_string(),
            text: "Hi".to_string(),
        });
        let bar = Template::ProgressBar(ProgressBar {
            title: "Launch".to_string(),
            checkpoint_data: vec!["a".to_string()],
            current_checkpoint_index: 0,
            reward: 0.0,
        });
        assert_eq!(EntryTag::for_template(&text, Tone::Positive), EntryTag::Update);
        assert_eq!(EntryTag::for_template(&bar, Tone::Neutral), EntryTag::Milestone);
        assert_eq!(EntryTag::for_template(&card_choice(), Tone::Neutral), EntryTag::Risk);
        assert_eq!(EntryTag::for_template(&bar, Tone::Negative), EntryTag::Risk);
    }

    #[test]
    fn snapshot_serialises_with_wire_names() {
        let mut state = AppState::default();
        state.logs.push(LogEntry {
            id: "l1".to_string(),
            title: "Ads".to_string(),
            content: "".to_string(),
            created_at: Utc::now(),
            countdown: Some(20),
            metadata: LogMetadata {
                effect: Tone::Neutral,
                accepted: true,
                cost: 400,
                monetary_return: 120,
                return_applied: false,
            },
        });
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["currentPhase"], "rules");
        assert_eq!(json["companyValue"], 5000);
        assert_eq!(json["logs"][0]["metadata"]["return"], 120);
        assert!(json.get("epoch").is_none());
    }

    #[test]
    fn log_context_lists_costs_and_returns() {
        let mut state = AppState::default();
        assert_eq!(state.build_log_context(), None);
        state.logs.push(LogEntry {
            id: "l1".to_string(),
            title: "Ads".to_string(),
            content: "Ran ads".to_string(),
            created_at: Utc::now(),
            countdown: None,
            metadata: LogMetadata {
                effect: Tone::Positive,
                accepted: true,
                cost: 100,
                monetary_return: -5,
                return_applied: true,
            },
        });
        assert_eq!(
            state.build_log_context().as_deref(),
            Some("- Ads (cost 100, return -5): Ran ads")
        );
    }

    #[test]
    fn entries_are_found_across_departments() {
        let mut state = AppState::default();
        let entry =
            DepartmentEntry::from_template(Department::Management, card_choice(), Tone::Neutral);
        let id = entry.id.clone();
        state.management.add(entry);
        assert!(state.find_entry_mut(&id).is_some());
        assert!(state.find_entry_mut("missing").is_none());
    }
}

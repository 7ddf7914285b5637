//! Department update templates: static text, progress bar and card choice.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Department {
    Product,
    Marketing,
    Management,
}

impl Department {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Department::Product => "product",
            Department::Marketing => "marketing",
            Department::Management => "management",
        }
    }

    pub const fn all() -> &'static [Department] {
        &[
            Department::Product,
            Department::Marketing,
            Department::Management,
        ]
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    StaticText,
    ProgressBar,
    CardChoice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Template {
    StaticText(StaticText),
    ProgressBar(ProgressBar),
    CardChoice(CardChoice),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StaticText {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressBar {
    pub title: String,
    pub checkpoint_data: Vec<String>,
    #[serde(default)]
    pub current_checkpoint_index: usize,
    #[serde(default)]
    pub reward: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardData {
    pub title: String,
    pub description: String,
    pub button_string: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardChoice {
    pub title: String,
    pub description: String,
    pub cards: Vec<CardData>,
    /// Set once by the player; never part of model output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub selected_card: Option<usize>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TemplateError {
    #[error("a card has already been chosen for \"{0}\"")]
    CardAlreadyChosen(String),
    #[error("card index {index} out of range ({available} cards)")]
    CardOutOfRange { index: usize, available: usize },
    #[error("entry does not hold a card choice")]
    NotACardChoice,
}

impl Template {
    pub fn kind(&self) -> TemplateKind {
        match self {
            Template::StaticText(_) => TemplateKind::StaticText,
            Template::ProgressBar(_) => TemplateKind::ProgressBar,
            Template::CardChoice(_) => TemplateKind::CardChoice,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Template::StaticText(t) => &t.title,
            Template::ProgressBar(t) => &t.title,
            Template::CardChoice(t) => &t.title,
        }
    }

    /// Plain-text rendering used as a department entry's content.
    pub fn summary(&self) -> String {
        match self {
            Template::StaticText(t) => t.text.clone(),
            Template::ProgressBar(bar) => {
                let total = bar.checkpoint_data.len();
                let current = bar
                    .checkpoint_data
                    .get(bar.current_checkpoint_index)
                    .map(String::as_str)
                    .unwrap_or("complete");
                format!(
                    "{}/{} checkpoints reached (next: {current})",
                    bar.current_checkpoint_index, total
                )
            }
            Template::CardChoice(choice) => {
                let titles: Vec<&str> = choice.cards.iter().map(|c| c.title.as_str()).collect();
                match choice.selected_card.and_then(|i| choice.cards.get(i)) {
                    Some(card) => format!("{} Chosen: {}", choice.description, card.title),
                    None => format!("{} Options: {}", choice.description, titles.join(", ")),
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.title().trim().is_empty() {
            return Err(SchemaError::MissingField("template.title".to_string()));
        }
        match self {
            Template::StaticText(t) => {
                if t.text.trim().is_empty() {
                    return Err(SchemaError::MissingField("StaticText.text".to_string()));
                }
            }
            Template::ProgressBar(bar) => {
                if bar.checkpoint_data.is_empty() {
                    return Err(SchemaError::MissingField(
                        "ProgressBar.checkpointData".to_string(),
                    ));
                }
                if bar.current_checkpoint_index > bar.checkpoint_data.len() {
                    return Err(SchemaError::OutOfRange {
                        field: "ProgressBar.currentCheckpointIndex".to_string(),
                        value: bar.current_checkpoint_index.to_string(),
                    });
                }
                if !bar.reward.is_finite() {
                    return Err(SchemaError::OutOfRange {
                        field: "ProgressBar.reward".to_string(),
                        value: bar.reward.to_string(),
                    });
                }
            }
            Template::CardChoice(choice) => {
                if choice.cards.is_empty() {
                    return Err(SchemaError::MissingField("CardChoice.cards".to_string()));
                }
                if choice.cards.iter().any(|card| card.title.trim().is_empty()) {
                    return Err(SchemaError::MissingField("CardData.title".to_string()));
                }
            }
        }
        Ok(())
    }
}

impl ProgressBar {
    /// Moves to `new_index`, clamped into `[0, checkpoint_data.len()]`.
    /// Returns the stored index.
    pub fn apply_progress(&mut self, new_index: i64) -> usize {
        let max = self.checkpoint_data.len();
        let clamped = new_index.clamp(0, max as i64) as usize;
        self.current_checkpoint_index = clamped;
        clamped
    }

    pub fn is_complete(&self) -> bool {
        self.current_checkpoint_index >= self.checkpoint_data.len()
    }
}

impl CardChoice {
    /// Locks the choice on first selection; later selections fail without
    /// changing anything.
    pub fn select(&mut self, index: usize) -> Result<&CardData, TemplateError> {
        if self.selected_card.is_some() {
            return Err(TemplateError::CardAlreadyChosen(self.title.clone()));
        }
        if index >= self.cards.len() {
            return Err(TemplateError::CardOutOfRange {
                index,
                available: self.cards.len(),
            });
        }
        self.selected_card = Some(index);
        Ok(&self.cards[index])
    }

    pub fn is_locked(&self) -> bool {
        self.selected_card.is_some()
    }
}

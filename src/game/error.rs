use crate::game::state::Phase;
use crate::schema::TemplateError;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GameError {
    #[error("action requires the {expected} phase (current phase: {actual})")]
    WrongPhase { expected: Phase, actual: Phase },
    #[error("a request is already in progress")]
    Busy,
    #[error("unknown entry: {0}")]
    UnknownEntry(String),
    #[error("a card has already been chosen for \"{0}\"")]
    CardAlreadyChosen(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<TemplateError> for GameError {
    fn from(value: TemplateError) -> Self {
        match value {
            TemplateError::CardAlreadyChosen(title) => GameError::CardAlreadyChosen(title),
            other => GameError::InvalidInput(other.to_string()),
        }
    }
}

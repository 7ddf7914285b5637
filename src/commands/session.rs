//! Line commands that drive a local game session.

use serde_json::{json, Value};

use crate::game::{GameEngine, GameError};
use crate::AppError;

pub const HELP: &str = "\
commands:
  start                  leave the rules and draw a problem
  draft <text>           replace the solution draft
  submit [text]          submit the draft (or the given text) as the business plan
  build <text>           submit a decision during the document phase
  choose <entry> <card>  pick a card (0-based) on a department entry
  skip                   end the document phase and get evaluated
  timeline               show the launch schedule for the plan
  state                  print the full session state
  restart                start over
  quit                   exit";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start,
    Draft(String),
    Submit(Option<String>),
    Build(String),
    Choose { entry_id: String, card: usize },
    Skip,
    Timeline,
    State,
    Restart,
    Help,
    Quit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Self, GameError> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let text = |usage: &str| {
            if rest.is_empty() {
                Err(GameError::InvalidInput(format!("usage: {usage}")))
            } else {
                Ok(rest.to_string())
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "start" => Ok(SessionCommand::Start),
            "draft" => Ok(SessionCommand::Draft(text("draft <text>")?)),
            "submit" => Ok(SessionCommand::Submit(
                (!rest.is_empty()).then(|| rest.to_string()),
            )),
            "build" => Ok(SessionCommand::Build(text("build <text>")?)),
            "choose" => {
                let mut parts = rest.split_whitespace();
                let (Some(entry_id), Some(card), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(GameError::InvalidInput(
                        "usage: choose <entry> <card>".to_string(),
                    ));
                };
                let card = card.parse::<usize>().map_err(|_| {
                    GameError::InvalidInput(format!("card must be a number, got {card}"))
                })?;
                Ok(SessionCommand::Choose {
                    entry_id: entry_id.to_string(),
                    card,
                })
            }
            "skip" => Ok(SessionCommand::Skip),
            "timeline" => Ok(SessionCommand::Timeline),
            "state" => Ok(SessionCommand::State),
            "restart" => Ok(SessionCommand::Restart),
            "help" | "?" => Ok(SessionCommand::Help),
            "quit" | "exit" => Ok(SessionCommand::Quit),
            other => Err(GameError::InvalidInput(format!(
                "unknown command: {other} (try help)"
            ))),
        }
    }
}

/// Runs one command against the engine and returns what to show the player.
pub async fn dispatch(engine: &GameEngine, command: SessionCommand) -> Result<Value, AppError> {
    let value = match command {
        SessionCommand::Start => json!(engine.start_problem_phase()?),
        SessionCommand::Draft(text) => {
            engine.update_draft(&text)?;
            json!({ "draftChars": text.chars().count() })
        }
        SessionCommand::Submit(text) => {
            let solution = match text {
                Some(text) => text,
                None => engine.snapshot().draft_solution,
            };
            json!(engine.evaluate_solution(&solution).await?)
        }
        SessionCommand::Build(text) => json!(engine.build(&text).await?),
        SessionCommand::Choose { entry_id, card } => json!(engine.select_card(&entry_id, card)?),
        SessionCommand::Skip => json!(engine.skip_to_evaluation().await?),
        SessionCommand::Timeline => json!(engine.plan_timeline().await?),
        SessionCommand::State => json!(engine.snapshot()),
        SessionCommand::Restart => {
            engine.restart();
            json!({ "phase": "rules" })
        }
        SessionCommand::Help => Value::String(HELP.to_string()),
        SessionCommand::Quit => Value::Null,
    };
    Ok(value)
}

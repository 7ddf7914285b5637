//! Game configuration: phase timings, economy constants, rate-limit policy and
//! the model endpoint used by the AI adapters.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_STARTING_COMPANY_VALUE: i64 = 5000;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("config error: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ProviderConfig {
    /// Returns the API key when one is set and non-blank.
    pub fn effective_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn to_view(&self) -> ProviderConfigView {
        ProviderConfigView {
            configured: self.effective_api_key().is_some(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            timeout_ms: self.timeout_ms,
        }
    }
}

/// Redacted provider settings, safe to hand to a presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderConfigView {
    pub configured: bool,
    pub model: String,
    pub base_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub problem_phase_secs: u32,
    pub document_phase_secs: u32,
    pub rejection_grace_secs: u32,
    pub starting_company_value: i64,
    pub decision_rate_limit: u32,
    pub decision_rate_window_ms: u64,
    pub countdown_min_secs: u32,
    pub countdown_max_secs: u32,
    pub min_plan_sentences: usize,
    pub max_messages: usize,
    pub max_message_chars: usize,
    /// Rate-limit key used for builds issued by the local session.
    pub session_client_key: String,
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            problem_phase_secs: 300,
            document_phase_secs: 1200,
            rejection_grace_secs: 60,
            starting_company_value: DEFAULT_STARTING_COMPANY_VALUE,
            decision_rate_limit: 5,
            decision_rate_window_ms: 60_000,
            countdown_min_secs: 15,
            countdown_max_secs: 45,
            min_plan_sentences: 3,
            max_messages: 10,
            max_message_chars: 2000,
            session_client_key: "local-session".to_string(),
            provider: ProviderConfig::default(),
        }
    }
}

impl GameConfig {
    /// Loads `.env` (if present) and applies `VENTUREPLAY_*` overrides on top of
    /// the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(error) = dotenvy::dotenv() {
            if !error.not_found() {
                tracing::warn!("failed to load .env file: {error}");
            }
        }
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides from an arbitrary key lookup. Split out from
    /// `from_env` so tests don't touch the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(key) = get("VENTUREPLAY_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(model) = get("VENTUREPLAY_MODEL") {
            self.provider.model = model;
        }
        if let Some(base_url) = get("VENTUREPLAY_BASE_URL") {
            self.provider.base_url = base_url;
        }
        if let Some(raw) = get("VENTUREPLAY_TIMEOUT_MS") {
            self.provider.timeout_ms = parse_number("VENTUREPLAY_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = get("VENTUREPLAY_PROBLEM_SECS") {
            self.problem_phase_secs = parse_number("VENTUREPLAY_PROBLEM_SECS", &raw)?;
        }
        if let Some(raw) = get("VENTUREPLAY_DOCUMENT_SECS") {
            self.document_phase_secs = parse_number("VENTUREPLAY_DOCUMENT_SECS", &raw)?;
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.problem_phase_secs == 0 || self.document_phase_secs == 0 {
            return Err(ConfigError::Invalid(
                "phase durations must be greater than 0".to_string(),
            ));
        }
        if self.provider.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "provider timeout must be greater than 0".to_string(),
            ));
        }
        if self.countdown_min_secs == 0 || self.countdown_min_secs > self.countdown_max_secs {
            return Err(ConfigError::Invalid(format!(
                "countdown range {}..={} is empty",
                self.countdown_min_secs, self.countdown_max_secs
            )));
        }
        if self.decision_rate_limit == 0 || self.decision_rate_window_ms == 0 {
            return Err(ConfigError::Invalid(
                "rate limit and window must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn decision_rate_window(&self) -> Duration {
        Duration::from_millis(self.decision_rate_window_ms)
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_game_rules() {
        let config = GameConfig::default();
        assert_eq!(config.problem_phase_secs, 300);
        assert_eq!(config.document_phase_secs, 1200);
        assert_eq!(config.rejection_grace_secs, 60);
        assert_eq!(config.starting_company_value, 5000);
        assert_eq!(config.decision_rate_limit, 5);
        assert_eq!(config.decision_rate_window(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_apply_and_blank_values_are_ignored() {
        let mut config = GameConfig::default();
        config
            .apply_overrides(lookup(&[
                ("VENTUREPLAY_API_KEY", " sk-test "),
                ("VENTUREPLAY_MODEL", ""),
                ("VENTUREPLAY_PROBLEM_SECS", "120"),
            ]))
            .unwrap();
        assert_eq!(config.provider.effective_api_key().as_deref(), Some("sk-test"));
        assert_eq!(config.provider.model, DEFAULT_MODEL);
        assert_eq!(config.problem_phase_secs, 120);
    }

    #[test]
    fn invalid_numeric_override_is_reported() {
        let mut config = GameConfig::default();
        let err = config
            .apply_overrides(lookup(&[("VENTUREPLAY_DOCUMENT_SECS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "VENTUREPLAY_DOCUMENT_SECS".to_string(),
                value: "soon".to_string(),
            }
        );
    }

    #[test]
    fn zero_phase_duration_is_rejected() {
        let mut config = GameConfig::default();
        let err = config
            .apply_overrides(lookup(&[("VENTUREPLAY_PROBLEM_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = GameConfig {
            document_phase_secs: 0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn view_redacts_key() {
        let provider = ProviderConfig {
            api_key: Some("secret".to_string()),
            ..ProviderConfig::default()
        };
        let view = serde_json::to_value(provider.to_view()).unwrap();
        assert_eq!(view["configured"], true);
        assert!(!view.to_string().contains("secret"));
    }
}

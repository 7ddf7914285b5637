use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ai::json::extract_json_object;
use crate::ai::types::{ChatMessage, ModelError};
use crate::config::ProviderConfig;
use crate::schema::{parse_payload, Validate};

const TEMPERATURE: f32 = 0.4;

/// OpenAI-compatible chat-completions client that always asks for a JSON
/// object back.
pub struct ChatClient {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout_ms: u64,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ModelError> {
        if config.timeout_ms == 0 {
            return Err(ModelError::Request(
                "provider timeout must be greater than 0".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ModelError::Request(e.to_string()))?;

        Ok(Self {
            api_key: config.effective_api_key(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_ms,
            client,
        })
    }

    pub fn model_id(&self) -> String {
        self.model.clone()
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends `system` + `messages` and returns the parsed JSON object from the
    /// first choice.
    pub async fn complete_json(
        &self,
        system: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<serde_json::Value, ModelError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ModelError::MissingCredentials(
                "set VENTUREPLAY_API_KEY to enable AI evaluation".to_string(),
            ));
        };

        let endpoint = format!("{}/chat/completions", self.base_url);
        let mut all_messages = Vec::with_capacity(messages.len() + 1);
        all_messages.push(ChatMessage::system(system));
        all_messages.extend(messages.iter().cloned());

        let body = ChatRequest {
            model: &self.model,
            messages: all_messages,
            temperature: TEMPERATURE,
            max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    ModelError::Timeout(format!(
                        "model request timed out after {} ms",
                        self.timeout_ms
                    ))
                } else {
                    ModelError::from(error)
                }
            })?;

        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(
            model = %self.model,
            %status,
            bytes = text.len(),
            "chat completion response"
        );

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ModelError::Auth(format!(
                "model provider auth failed ({status}). Check API key and account access."
            )));
        }
        if !status.is_success() {
            return Err(ModelError::Request(format!("model provider error {status}: {text}")));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::InvalidResponse(format!("completion parse failed: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ModelError::InvalidResponse("missing choices[0].message.content".to_string())
            })?;

        extract_json_object(&content)
    }

    /// `complete_json` followed by schema validation into `T`.
    pub async fn request_typed<T>(
        &self,
        system: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<T, ModelError>
    where
        T: DeserializeOwned + Validate,
    {
        let value = self.complete_json(system, messages, max_tokens).await?;
        Ok(parse_payload(value)?)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

//! Decision evaluation adapter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ai::client::ChatClient;
use crate::ai::prompts::{clip, decision_prompt};
use crate::ai::traits::DecisionEvaluator;
use crate::ai::types::{ChatMessage, DecisionRequest};
use crate::schema::AiResponse;

const DECISION_MAX_TOKENS: u32 = 2_048;
const CONTEXT_CHARS: usize = 6_000;

pub struct LlmDecisionEvaluator {
    client: Arc<ChatClient>,
}

impl LlmDecisionEvaluator {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

/// Context block sent ahead of the player's messages.
fn context_message(req: &DecisionRequest) -> Option<ChatMessage> {
    let mut sections = Vec::new();
    if let Some(plan) = req.business_plan.as_deref().filter(|s| !s.trim().is_empty()) {
        sections.push(format!("Business plan:\n{}", clip(plan, CONTEXT_CHARS)));
    }
    if let Some(logs) = req.build_logs.as_deref().filter(|s| !s.trim().is_empty()) {
        sections.push(format!("Decisions so far:\n{}", clip(logs, CONTEXT_CHARS)));
    }
    if let Some(interactions) = req
        .component_interactions
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        sections.push(format!(
            "Player choices on department cards:\n{}",
            clip(interactions, CONTEXT_CHARS)
        ));
    }
    if sections.is_empty() {
        None
    } else {
        Some(ChatMessage::user(sections.join("\n\n")))
    }
}

#[async_trait]
impl DecisionEvaluator for LlmDecisionEvaluator {
    async fn evaluate(&self, req: DecisionRequest) -> AiResponse {
        let mut messages = Vec::with_capacity(req.messages.len() + 1);
        if let Some(context) = context_message(&req) {
            messages.push(context);
        }
        messages.extend(req.messages.iter().cloned());

        match self
            .client
            .request_typed::<AiResponse>(&decision_prompt(), &messages, DECISION_MAX_TOKENS)
            .await
        {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!("decision evaluation failed: {error}");
                AiResponse::internal_error()
            }
        }
    }
}

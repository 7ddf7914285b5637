use crate::ai::types::ModelError;

/// Pulls the JSON object out of model text. Models often wrap the object in a
/// markdown fence or add a sentence before it.
pub fn extract_json_object(text: &str) -> Result<serde_json::Value, ModelError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ModelError::InvalidResponse(
            "model returned empty content".to_string(),
        ));
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if value.is_object() {
            return Ok(value);
        }
    }

    let unfenced = strip_code_fence(trimmed);
    let start = unfenced.find('{');
    let end = unfenced.rfind('}');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(ModelError::InvalidResponse(
            "no JSON object found in model output".to_string(),
        ));
    };
    if end < start {
        return Err(ModelError::InvalidResponse(
            "no JSON object found in model output".to_string(),
        ));
    }

    let candidate = &unfenced[start..=end];
    let value: serde_json::Value = serde_json::from_str(candidate)
        .map_err(|e| ModelError::InvalidResponse(format!("model JSON parse failed: {e}")))?;
    if !value.is_object() {
        return Err(ModelError::InvalidResponse(
            "model output is not a JSON object".to_string(),
        ));
    }
    Ok(value)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

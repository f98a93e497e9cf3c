use codeguard_core::extract::{decode_validation, fenced_json};
use codeguard_core::{Error, Result, RuleSuggestion, ValidationOutcome};

/// Extract the JSON object substring from raw LLM output.
fn extract_json_object(raw: &str) -> Option<&str> {
    if let Some(fenced) = fenced_json(raw) {
        return Some(fenced);
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Decode a rule suggestion. Anything that does not fit the schema is a hard
/// failure; there is no partial suggestion.
pub fn parse_suggestion(raw: &str) -> Result<RuleSuggestion> {
    let json = extract_json_object(raw)
        .ok_or_else(|| Error::Ai("model output contains no JSON object".to_string()))?;
    let suggestion: RuleSuggestion = serde_json::from_str(json)
        .map_err(|e| Error::Ai(format!("model output does not match the rule schema: {e}")))?;
    if suggestion.title.trim().is_empty() || suggestion.description.trim().is_empty() {
        return Err(Error::Ai(
            "model returned an empty title or description".to_string(),
        ));
    }
    Ok(suggestion)
}

/// Decode model validation output, keeping the raw text when the model did
/// not echo one itself.
pub fn parse_validation(raw: &str) -> Result<ValidationOutcome> {
    let mut outcome = decode_validation(raw).into_result()?;
    if outcome.result.raw_output.is_none() {
        outcome.result.raw_output = Some(raw.to_string());
    }
    Ok(outcome)
}

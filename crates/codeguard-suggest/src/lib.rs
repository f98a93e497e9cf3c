pub mod engine;
mod parse;
mod prompt;

use codeguard_core::{Result, RuleSuggestion, SuggestRuleInput, ValidationOutcome, ValidationRequest};

pub use engine::{Engine, LlmEngine};

/// Ask the model for a rule title, description and severity.
pub async fn suggest_rule(engine: &dyn Engine, input: &SuggestRuleInput) -> Result<RuleSuggestion> {
    input.check()?;
    let system = prompt::suggestion_system_prompt();
    let user_msg = prompt::suggestion_user_message(input);

    tracing::info!(language = %input.language, category = %input.category, "requesting rule suggestion");

    let raw = engine.generate(&system, &user_msg).await.inspect_err(|e| {
        tracing::warn!(error = %e, "rule suggestion failed");
    })?;
    tracing::debug!(%raw, "raw LLM output");
    parse::parse_suggestion(&raw)
}

/// Validate a snippet with the model directly instead of the remote validator.
pub async fn validate_code(engine: &dyn Engine, request: &ValidationRequest) -> Result<ValidationOutcome> {
    request.check()?;
    let system = prompt::validation_system_prompt();
    let user_msg = prompt::validation_user_message(request);

    tracing::info!(language = %request.language, category = %request.category, "requesting validation");

    let raw = engine.generate(&system, &user_msg).await.inspect_err(|e| {
        tracing::warn!(error = %e, "validation call failed");
    })?;
    tracing::debug!(%raw, "raw LLM output");
    let outcome = parse::parse_validation(&raw)?;
    tracing::info!(violations = outcome.result.violations.len(), "validation parsed");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codeguard_core::{Error, Severity};
    use std::sync::Mutex;

    /// Returns one canned reply and remembers the prompts it was given.
    struct ScriptedEngine {
        reply: Result<String>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedEngine {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(vec![]),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(Error::Ai(message.to_string())),
                prompts: Mutex::new(vec![]),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Engine for ScriptedEngine {
        async fn generate(&self, system: &str, user_msg: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_string(), user_msg.to_string()));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::Ai(e.to_string())),
            }
        }
    }

    fn comprehension_input() -> SuggestRuleInput {
        SuggestRuleInput {
            language: "Python".into(),
            category: "Best Practices".into(),
            subcategory: None,
            code_example: "for x in range(10): squares.append(x**2)".into(),
            description: "prefer comprehensions".into(),
        }
    }

    #[tokio::test]
    async fn suggests_rule_from_model_reply() {
        let engine = ScriptedEngine::replying(
            r#"{"title":"Prefer list comprehensions","description":"Building a list with append inside a for loop is slower and less idiomatic than a comprehension.","severity":"LOW"}"#,
        );
        let suggestion = suggest_rule(&engine, &comprehension_input()).await.unwrap();
        assert!(!suggestion.title.is_empty());
        assert!(!suggestion.description.is_empty());
        assert!(matches!(
            suggestion.severity,
            Severity::High | Severity::Medium | Severity::Low
        ));

        let prompts = engine.prompts.lock().unwrap();
        assert!(prompts[0].1.contains("Language: Python"));
        assert!(prompts[0].1.contains("prefer comprehensions"));
    }

    #[tokio::test]
    async fn incomplete_input_skips_the_model() {
        let engine = ScriptedEngine::replying("{}");
        let mut input = comprehension_input();
        input.code_example.clear();
        let err = suggest_rule(&engine, &input).await.unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn model_failure_surfaces_as_ai_error() {
        let engine = ScriptedEngine::failing("chat: 401 Unauthorized");
        let err = suggest_rule(&engine, &comprehension_input()).await.unwrap_err();
        assert_eq!(err.to_string(), "chat: 401 Unauthorized");
    }

    #[tokio::test]
    async fn direct_validation_accepts_bare_schema_output() {
        let engine = ScriptedEngine::replying(
            r#"{"summary":"1 issue found","violations":[{"rule":"HardcodedCredential","description":"Password literal in source.","suggestion":"Use env vars","lineNumbers":[1]}]}"#,
        );
        let request = ValidationRequest::new("JavaScript", "Security", "const password='123456';");
        let outcome = validate_code(&engine, &request).await.unwrap();
        assert_eq!(outcome.result.violations.len(), 1);
        assert_eq!(outcome.result.violations[0].line_numbers, Some(vec![1]));
        assert!(outcome.result.raw_output.is_some());
    }

    #[tokio::test]
    async fn direct_validation_accepts_fenced_output() {
        let engine = ScriptedEngine::replying(
            "Summary below.\n```json\n{\"summary\":\"No issues\",\"passed\":true,\"violations\":[]}\n```",
        );
        let request = ValidationRequest::new("Python", "Style", "x = 1");
        let outcome = validate_code(&engine, &request).await.unwrap();
        assert_eq!(outcome.headline(), "Code Passed Validation");
        assert!(outcome.result.violations.is_empty());
    }
}

use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;

use codeguard_core::{AiSettings, Error, Result};

/// Something that turns a system prompt plus one user message into text.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn generate(&self, system: &str, user_msg: &str) -> Result<String>;
}

fn map_backend(provider: &str) -> Result<LLMBackend> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(Error::Config(format!("unknown provider: {other}"))),
    }
}

/// Engine backed by the provider named in the AI settings.
pub struct LlmEngine {
    settings: AiSettings,
}

impl LlmEngine {
    pub fn new(settings: AiSettings) -> Result<Self> {
        if !codeguard_core::ai_configured(&settings) {
            return Err(Error::Config(
                "AI provider is not configured; run `codeguard config set-ai`".to_string(),
            ));
        }
        map_backend(&settings.provider)?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &AiSettings {
        &self.settings
    }
}

#[async_trait]
impl Engine for LlmEngine {
    async fn generate(&self, system: &str, user_msg: &str) -> Result<String> {
        let backend = map_backend(&self.settings.provider)?;

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .model(&self.settings.model)
            .system(system);

        if !self.settings.api_key.is_empty() {
            builder = builder.api_key(&self.settings.api_key);
        }

        let llm = builder
            .build()
            .map_err(|e| Error::Config(format!("build LLM: {e}")))?;

        let messages = vec![ChatMessage::user().content(user_msg).build()];

        let response = llm
            .chat(&messages)
            .await
            .map_err(|e| Error::Ai(format!("chat: {e}")))?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(Error::Ai("LLM returned empty text".to_string())),
            None => Err(Error::Ai("LLM returned no text".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_a_config_error() {
        let settings = AiSettings {
            provider: "watsonx".into(),
            api_key: "k".into(),
            model: "m".into(),
        };
        assert!(matches!(LlmEngine::new(settings), Err(Error::Config(_))));
    }

    #[test]
    fn unconfigured_settings_are_refused() {
        assert!(matches!(
            LlmEngine::new(AiSettings::default()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn ollama_builds_without_key() {
        let settings = AiSettings {
            provider: "ollama".into(),
            api_key: String::new(),
            model: "llama3".into(),
        };
        assert_eq!(LlmEngine::new(settings).unwrap().settings().model, "llama3");
    }
}

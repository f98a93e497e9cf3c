pub mod draft;
pub mod error;
pub mod extract;
pub mod taxonomy;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use error::{Action, Error, ParseError, Result};
pub use extract::{Extraction, ValidationOutcome};
pub use taxonomy::{RuleFilter, Taxonomy};

// --- Taxonomy records (wire shapes of the rules backend) ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub language_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    pub name: String,
    pub category_id: String,
}

/// Rule importance. `Error`/`Warning`/`Info` are the older spellings and are
/// read as `HIGH`/`MEDIUM`/`LOW`; only the upper-case form is ever written.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[serde(alias = "Error", alias = "error")]
    High,
    #[default]
    #[serde(alias = "Warning", alias = "warning")]
    Medium,
    #[serde(alias = "Info", alias = "info")]
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "error" => Ok(Severity::High),
            "medium" | "warning" => Ok(Severity::Medium),
            "low" | "info" => Ok(Severity::Low),
            other => Err(Error::Input(format!(
                "unknown severity '{other}' (expected HIGH, MEDIUM or LOW)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub language_id: String,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_example: Option<String>,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_value: Option<String>,
}

/// Body of a rule create: a rule before the backend has assigned its id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewRule {
    pub language_id: String,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_example: Option<String>,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_value: Option<String>,
}

impl NewRule {
    pub fn with_id(self, id: impl Into<String>) -> Rule {
        Rule {
            id: id.into(),
            language_id: self.language_id,
            category_id: self.category_id,
            subcategory_id: self.subcategory_id,
            title: self.title,
            description: self.description,
            code_example: self.code_example,
            severity: self.severity,
            validation_type: self.validation_type,
            validation_value: self.validation_value,
        }
    }
}

// --- Validation exchange ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub language: String,
    pub category: String,
    pub code: String,
}

impl ValidationRequest {
    pub fn new(
        language: impl Into<String>,
        category: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            category: category.into(),
            code: code.into(),
        }
    }

    /// Reject the request before it reaches the network when a field is blank.
    pub fn check(&self) -> Result<()> {
        if self.language.trim().is_empty()
            || self.category.trim().is_empty()
            || self.code.trim().is_empty()
        {
            return Err(Error::Input(
                "Please select a language, category, and provide code.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// The rule that was violated.
    pub rule: String,
    /// A description of the violation.
    #[serde(default)]
    pub description: String,
    /// A suggestion for fixing the violation.
    #[serde(default)]
    pub suggestion: String,
    /// The line numbers where the violation occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_numbers: Option<Vec<u32>>,
}

/// How a violation is flagged when shown. Derived from the rule text on every
/// render and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationLevel {
    High,
    Medium,
    Info,
}

impl Violation {
    pub fn level(&self) -> ViolationLevel {
        let rule = self.rule.to_lowercase();
        if rule.contains("error") {
            ViolationLevel::High
        } else if rule.contains("warning") {
            ViolationLevel::Medium
        } else {
            ViolationLevel::Info
        }
    }

    /// Rule name with a " (Line: 1, 2)" suffix when line numbers are known.
    pub fn heading(&self) -> String {
        match self.line_numbers.as_deref() {
            Some(lines) if !lines.is_empty() => {
                let joined: Vec<String> = lines.iter().map(|n| n.to_string()).collect();
                format!("{} (Line: {})", self.rule, joined.join(", "))
            }
            _ => self.rule.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// A summary of the validation results.
    #[serde(default)]
    pub summary: String,
    /// A list of violations found in the code snippet.
    pub violations: Vec<Violation>,
    /// The raw output from the language model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

// --- Rule suggestion exchange ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRuleInput {
    pub language: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub code_example: String,
    pub description: String,
}

impl SuggestRuleInput {
    pub fn check(&self) -> Result<()> {
        if self.language.trim().is_empty()
            || self.category.trim().is_empty()
            || self.code_example.trim().is_empty()
            || self.description.trim().is_empty()
        {
            return Err(Error::Input(
                "Please provide Language, Category, Code Example, and Description for AI suggestions."
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleSuggestion {
    /// The suggested title for the rule.
    pub title: String,
    /// The suggested detailed description for the rule.
    pub description: String,
    /// The severity level of the rule.
    pub severity: Severity,
}

// --- Configuration ---

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";

/// Resolve the rules backend URL: explicit value first, then the environment,
/// then the local default.
pub fn resolve_base_url(explicit: Option<&str>) -> String {
    let from_env = || {
        ["CODEGUARD_BASE_URL", "NEXT_PUBLIC_BASEURL"]
            .iter()
            .find_map(|key| std::env::var(key).ok())
    };
    let url = explicit
        .filter(|u| !u.trim().is_empty())
        .map(str::to_string)
        .or_else(from_env)
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    url.trim().trim_end_matches('/').to_string()
}

/// Resolve the global config directory (~/.codeguard/).
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".codeguard")
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

impl AiSettings {
    /// Overlay `CODEGUARD_AI_*` variables on top of the stored settings.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(provider) = std::env::var("CODEGUARD_AI_PROVIDER") {
            self.provider = provider;
        }
        if let Ok(model) = std::env::var("CODEGUARD_AI_MODEL") {
            self.model = model;
        }
        if let Ok(key) = std::env::var("CODEGUARD_AI_KEY") {
            self.api_key = key;
        }
        self
    }
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Stored AI settings; defaults when nothing has been saved yet.
pub fn read_settings() -> Result<AiSettings> {
    read_settings_from(&settings_path())
}

fn read_settings_from(path: &Path) -> Result<AiSettings> {
    if !path.exists() {
        return Ok(AiSettings::default());
    }
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| Error::Config(format!("parse {}: {e}", path.display())))
}

pub fn write_settings(settings: &AiSettings) -> Result<()> {
    let dir = config_dir();
    fs::create_dir_all(&dir).map_err(|e| Error::Config(e.to_string()))?;
    let json = serde_json::to_string_pretty(settings).map_err(|e| Error::Config(e.to_string()))?;
    fs::write(settings_path(), json).map_err(|e| Error::Config(e.to_string()))
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}

//! codeguard: validate code snippets against AI-reviewed rules and manage the
//! language / category / rule taxonomy on the rules backend.
//!
//! Usage:
//!   codeguard languages list
//!   codeguard categories add --language lang_js Security
//!   codeguard rules list --language lang_py --search comprehension
//!   codeguard validate --language JavaScript --category Security --file app.js
//!   codeguard suggest --language Python --category "Best Practices" \
//!       --example "for x in xs: out.append(x)" --description "prefer comprehensions"

mod output;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use codeguard_client::{ApiClient, HttpTransport, Session};
use codeguard_core::draft::RuleDraft;
use codeguard_core::{
    Action, AiSettings, Error, RuleFilter, Severity, SuggestRuleInput, Taxonomy, ValidationRequest,
};
use codeguard_suggest::LlmEngine;

use output::Notice;

#[derive(Parser)]
#[command(name = "codeguard", version)]
#[command(about = "AI-assisted code validation and rule management")]
struct Cli {
    /// Rules backend base URL
    #[arg(long, global = true, env = "CODEGUARD_BASE_URL")]
    base_url: Option<String>,

    /// Use the built-in sample taxonomy instead of loading from the backend
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage programming languages
    #[command(subcommand)]
    Languages(LanguageCommand),
    /// Manage categories of a language
    #[command(subcommand)]
    Categories(CategoryCommand),
    /// Manage validation rules
    #[command(subcommand)]
    Rules(RuleCommand),
    /// Validate a code snippet
    Validate(ValidateArgs),
    /// Ask the model to suggest a rule title, description and severity
    Suggest(SuggestArgs),
    /// Show or change AI provider settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum LanguageCommand {
    List,
    /// Languages with the names of their categories
    Tree,
    Add { name: String },
    Delete { id: String },
}

#[derive(Subcommand)]
enum CategoryCommand {
    List {
        #[arg(long)]
        language: Option<String>,
    },
    Add {
        /// Language id the category belongs to
        #[arg(long)]
        language: String,
        name: String,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
enum RuleCommand {
    List {
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Case-insensitive match on title, description and validation fields
        #[arg(long)]
        search: Option<String>,
    },
    Show { id: String },
    Create {
        #[command(flatten)]
        fields: RuleFields,
        /// Fill title, description and severity from an AI suggestion first
        #[arg(long)]
        suggest: bool,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: RuleFields,
        #[arg(long)]
        suggest: bool,
    },
    Delete { id: String },
}

#[derive(Args)]
struct RuleFields {
    #[arg(long)]
    language_id: Option<String>,
    #[arg(long)]
    category_id: Option<String>,
    #[arg(long)]
    subcategory_id: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    example: Option<String>,
    /// HIGH, MEDIUM or LOW
    #[arg(long)]
    severity: Option<Severity>,
    #[arg(long)]
    validation_type: Option<String>,
    #[arg(long)]
    validation_value: Option<String>,
}

#[derive(Args)]
struct ValidateArgs {
    /// Language name, e.g. JavaScript
    #[arg(long)]
    language: String,
    /// Category name, e.g. Security
    #[arg(long)]
    category: String,
    /// File with the code to validate
    #[arg(long, conflicts_with = "code")]
    file: Option<PathBuf>,
    /// Code to validate, inline
    #[arg(long)]
    code: Option<String>,
    /// Ask the model directly instead of the backend's /code/validate
    #[arg(long)]
    direct: bool,
    /// Also print the raw model output
    #[arg(long)]
    raw: bool,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SuggestArgs {
    #[arg(long)]
    language: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    subcategory: Option<String>,
    /// Code that violates the rule
    #[arg(long)]
    example: String,
    /// The desired behaviour or coding practice
    #[arg(long)]
    description: String,
}

#[derive(Subcommand)]
enum ConfigCommand {
    Show,
    SetAi {
        /// openai, anthropic, google, ollama, groq, mistral or deepseek
        #[arg(long)]
        provider: String,
        #[arg(long)]
        model: String,
        #[arg(long, default_value = "")]
        api_key: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<Failed>() {
                Some(failed) => Notice::failure(failed.action, &failed.error).print(),
                None => eprintln!("✗ Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// A library error tagged with the action that produced it.
#[derive(Debug)]
struct Failed {
    action: Action,
    error: Error,
}

impl std::fmt::Display for Failed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for Failed {}

trait Tag<T> {
    fn during(self, action: Action) -> anyhow::Result<T>;
}

impl<T> Tag<T> for codeguard_core::Result<T> {
    fn during(self, action: Action) -> anyhow::Result<T> {
        self.map_err(|error| Failed { action, error }.into())
    }
}

type Client = Session<HttpTransport>;

async fn run(cli: Cli) -> anyhow::Result<()> {
    let base_url = codeguard_core::resolve_base_url(cli.base_url.as_deref());
    let offline = cli.offline;
    tracing::debug!(%base_url, offline, "starting");
    let session = if offline {
        let transport = HttpTransport::new(&base_url).during(Action::Load)?;
        Session::with_taxonomy(ApiClient::new(transport), Taxonomy::sample())
    } else {
        codeguard_client::connect(&base_url).during(Action::Load)?
    };

    match cli.command {
        Command::Languages(cmd) => languages(&session, offline, cmd).await,
        Command::Categories(cmd) => categories(&session, offline, cmd).await,
        Command::Rules(cmd) => rules(&session, offline, cmd).await,
        Command::Validate(args) => validate(&session, args).await,
        Command::Suggest(args) => suggest(args).await,
        Command::Config(cmd) => config(cmd, &base_url),
    }
}

async fn refresh(session: &Client, offline: bool) -> anyhow::Result<()> {
    if !offline {
        session.load().await.during(Action::Load)?;
    }
    Ok(())
}

async fn languages(session: &Client, offline: bool, cmd: LanguageCommand) -> anyhow::Result<()> {
    match cmd {
        LanguageCommand::List => {
            refresh(session, offline).await?;
            output::print_languages(session.taxonomy().languages());
        }
        LanguageCommand::Tree => {
            refresh(session, offline).await?;
            output::print_tree(&session.taxonomy().languages_with_categories());
        }
        LanguageCommand::Add { name } => {
            let lang = session.add_language(&name).await.during(Action::AddLanguage)?;
            Notice::success("Success", format!("Language \"{}\" added.", lang.name)).print();
            println!("{}", lang.id);
        }
        LanguageCommand::Delete { id } => {
            refresh(session, offline).await?;
            let removed = session
                .delete_language(&id)
                .await
                .during(Action::DeleteLanguage)?;
            Notice::success("Deleted", output::removed_summary("Language", &removed)).print();
        }
    }
    Ok(())
}

async fn categories(session: &Client, offline: bool, cmd: CategoryCommand) -> anyhow::Result<()> {
    match cmd {
        CategoryCommand::List { language } => {
            refresh(session, offline).await?;
            let taxonomy = session.taxonomy();
            match language.as_deref() {
                Some(lang) => output::print_categories(taxonomy.categories_of(lang), &taxonomy),
                None => output::print_categories(taxonomy.categories().iter(), &taxonomy),
            }
        }
        CategoryCommand::Add { language, name } => {
            let cat = session
                .add_category(&language, &name)
                .await
                .during(Action::AddCategory)?;
            Notice::success("Success", format!("Category \"{}\" added.", cat.name)).print();
            println!("{}", cat.id);
        }
        CategoryCommand::Delete { id } => {
            refresh(session, offline).await?;
            let removed = session
                .delete_category(&id)
                .await
                .during(Action::DeleteCategory)?;
            Notice::success("Deleted", output::removed_summary("Category", &removed)).print();
        }
    }
    Ok(())
}

impl RuleFields {
    fn apply(self, draft: &mut RuleDraft, taxonomy: &Taxonomy) {
        if let Some(lang) = self.language_id {
            draft.set_language(&lang, taxonomy);
        }
        if let Some(cat) = self.category_id {
            draft.category_id = cat;
        }
        if let Some(sub) = self.subcategory_id {
            draft.subcategory_id = Some(sub);
        }
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(example) = self.example {
            draft.code_example = example;
        }
        if let Some(severity) = self.severity {
            draft.severity = severity;
        }
        if let Some(kind) = self.validation_type {
            draft.validation_type = kind;
        }
        if let Some(value) = self.validation_value {
            draft.validation_value = value;
        }
    }
}

async fn apply_ai_suggestion(draft: &mut RuleDraft, taxonomy: &Taxonomy) -> anyhow::Result<()> {
    let input = draft.suggestion_input(taxonomy).during(Action::Suggest)?;
    let engine = ai_settings().and_then(LlmEngine::new).during(Action::Suggest)?;
    let suggestion = codeguard_suggest::suggest_rule(&engine, &input)
        .await
        .during(Action::Suggest)?;
    draft.apply_suggestion(&suggestion);
    Notice::success(
        "AI Suggestion Applied",
        "Rule details have been updated with AI suggestions.",
    )
    .print();
    Ok(())
}

async fn rules(session: &Client, offline: bool, cmd: RuleCommand) -> anyhow::Result<()> {
    match cmd {
        RuleCommand::List {
            language,
            category,
            search,
        } => {
            refresh(session, offline).await?;
            let taxonomy = session.taxonomy();
            let filter = RuleFilter {
                language_id: language,
                category_id: category,
                search,
            };
            output::print_rules(taxonomy.filter_rules(&filter), &taxonomy);
        }
        RuleCommand::Show { id } => {
            refresh(session, offline).await?;
            let taxonomy = session.taxonomy();
            let rule = taxonomy
                .rule(&id)
                .ok_or_else(|| anyhow::anyhow!("no rule with id {id}"))?;
            output::print_rule(rule, &taxonomy);
        }
        RuleCommand::Create { fields, suggest } => {
            refresh(session, offline).await?;
            let taxonomy = session.taxonomy();
            let mut draft = RuleDraft::default();
            fields.apply(&mut draft, &taxonomy);
            if suggest {
                apply_ai_suggestion(&mut draft, &taxonomy).await?;
            }
            let rule = session.create_rule(&draft).await.during(Action::CreateRule)?;
            Notice::success("Success", "Rule created successfully.").print();
            println!("{}", rule.id);
        }
        RuleCommand::Update {
            id,
            fields,
            suggest,
        } => {
            refresh(session, offline).await?;
            let taxonomy = session.taxonomy();
            let existing = taxonomy
                .rule(&id)
                .ok_or_else(|| anyhow::anyhow!("no rule with id {id}"))?;
            let mut draft = RuleDraft::from(existing);
            fields.apply(&mut draft, &taxonomy);
            if suggest {
                apply_ai_suggestion(&mut draft, &taxonomy).await?;
            }
            session.update_rule(&draft).await.during(Action::UpdateRule)?;
            Notice::success("Success", "Rule updated successfully.").print();
        }
        RuleCommand::Delete { id } => {
            session.delete_rule(&id).await.during(Action::DeleteRule)?;
            Notice::success("Deleted", "Rule deleted successfully.").print();
        }
    }
    Ok(())
}

async fn validate(session: &Client, args: ValidateArgs) -> anyhow::Result<()> {
    let code = match (&args.file, args.code) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?,
        (None, Some(code)) => code,
        (None, None) => String::new(),
    };
    let request = ValidationRequest::new(args.language, args.category, code);

    let outcome = if args.direct {
        request.check().during(Action::Validate)?;
        let engine = ai_settings().and_then(LlmEngine::new).during(Action::Validate)?;
        let outcome = codeguard_suggest::validate_code(&engine, &request)
            .await
            .during(Action::Validate)?;
        session.record_validation(outcome.clone());
        outcome
    } else {
        session.validate(&request).await.during(Action::Validate)?
    };

    Notice::success(outcome.headline(), outcome.detail()).print();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    } else {
        output::print_outcome(&outcome, args.raw);
    }
    Ok(())
}

async fn suggest(args: SuggestArgs) -> anyhow::Result<()> {
    let input = SuggestRuleInput {
        language: args.language,
        category: args.category,
        subcategory: args.subcategory,
        code_example: args.example,
        description: args.description,
    };
    input.check().during(Action::Suggest)?;
    let engine = ai_settings().and_then(LlmEngine::new).during(Action::Suggest)?;
    let suggestion = codeguard_suggest::suggest_rule(&engine, &input)
        .await
        .during(Action::Suggest)?;
    println!("{}", serde_json::to_string_pretty(&suggestion)?);
    Ok(())
}

fn ai_settings() -> codeguard_core::Result<AiSettings> {
    Ok(codeguard_core::read_settings()?.with_env_overrides())
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

/// Effective configuration as printed by `config show`, key masked.
fn config_report(settings: &AiSettings, base_url: &str) -> serde_json::Value {
    serde_json::json!({
        "provider": settings.provider,
        "model": settings.model,
        "apiKey": mask(&settings.api_key),
        "configured": codeguard_core::ai_configured(settings),
        "baseUrl": base_url,
        "settingsDir": codeguard_core::config_dir(),
    })
}

fn config(cmd: ConfigCommand, base_url: &str) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let settings = ai_settings().during(Action::Load)?;
            let report = config_report(&settings, base_url);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        ConfigCommand::SetAi {
            provider,
            model,
            api_key,
        } => {
            let settings = AiSettings {
                provider,
                api_key,
                model,
            };
            LlmEngine::new(settings.clone()).during(Action::Load)?;
            codeguard_core::write_settings(&settings)
                .context("save AI settings")?;
            Notice::success("Success", "AI settings saved.").print();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_masked() {
        assert_eq!(mask(""), "");
        assert_eq!(mask("short"), "*****");
        assert_eq!(mask("sk-abcdefghijkl"), "****ijkl");
    }

    #[test]
    fn config_report_shows_resolved_base_url() {
        let cli = Cli::try_parse_from([
            "codeguard", "--base-url", "http://rules.internal:9000/v1/", "config", "show",
        ])
        .unwrap();
        let base_url = codeguard_core::resolve_base_url(cli.base_url.as_deref());
        let settings = AiSettings {
            provider: "openai".into(),
            api_key: "sk-abcdefghijkl".into(),
            model: "gpt-4o".into(),
        };
        let report = config_report(&settings, &base_url);
        assert_eq!(report["baseUrl"], "http://rules.internal:9000/v1");
        assert_eq!(report["apiKey"], "****ijkl");
        assert_eq!(report["configured"], true);
    }

    #[test]
    fn rule_create_parses_severity() {
        let cli = Cli::try_parse_from([
            "codeguard", "rules", "create", "--language-id", "lang_py", "--severity", "Warning",
        ])
        .unwrap();
        match cli.command {
            Command::Rules(RuleCommand::Create { fields, suggest }) => {
                assert_eq!(fields.severity, Some(Severity::Medium));
                assert!(!suggest);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn file_and_inline_code_conflict() {
        let parsed = Cli::try_parse_from([
            "codeguard", "validate", "--language", "Python", "--category", "Style",
            "--file", "a.py", "--code", "x = 1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn fields_apply_in_form_order() {
        let taxonomy = Taxonomy::sample();
        let mut draft = RuleDraft::default();
        RuleFields {
            language_id: Some("lang_js".into()),
            category_id: Some("cat_sec_js".into()),
            subcategory_id: None,
            title: Some("No eval".into()),
            description: None,
            example: None,
            severity: Some(Severity::High),
            validation_type: None,
            validation_value: None,
        }
        .apply(&mut draft, &taxonomy);
        assert_eq!(draft.language_id, "lang_js");
        assert_eq!(draft.category_id, "cat_sec_js");
        assert_eq!(draft.severity, Severity::High);
    }
}

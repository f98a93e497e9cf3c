//! Terminal rendering: notices on stderr, data on stdout.

use codeguard_core::taxonomy::{LanguageOption, Removed};
use codeguard_core::{Action, Category, Error, Language, Rule, Taxonomy, ValidationOutcome, ViolationLevel};

/// Short-lived status message for the operator.
pub struct Notice {
    pub title: String,
    pub description: String,
    pub destructive: bool,
}

impl Notice {
    pub fn success(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            destructive: false,
        }
    }

    pub fn failure(action: Action, err: &Error) -> Self {
        let title = match (action, err) {
            (Action::Validate, Error::Input(_)) => "Validation Error",
            (Action::Validate, _) => "Validation Failed",
            (Action::Suggest, Error::Input(_)) => "Missing Information",
            (Action::Suggest, _) => "AI Suggestion Error",
            _ => "Error",
        };
        Self {
            title: title.to_string(),
            description: err.to_string(),
            destructive: true,
        }
    }

    pub fn print(&self) {
        let marker = if self.destructive { "✗" } else { "✓" };
        eprintln!("{marker} {}: {}", self.title, self.description);
    }
}

pub fn removed_summary(what: &str, removed: &Removed) -> String {
    format!(
        "{what} deleted ({} categories, {} subcategories, {} rules removed locally).",
        removed.categories, removed.subcategories, removed.rules
    )
}

pub fn print_languages(languages: &[Language]) {
    for lang in languages {
        println!("{:<16} {}", lang.id, lang.name);
    }
}

pub fn print_tree(options: &[LanguageOption]) {
    for opt in options {
        println!("{}", opt.name);
        for cat in &opt.categories {
            println!("  - {cat}");
        }
    }
}

pub fn print_categories<'a>(categories: impl Iterator<Item = &'a Category>, taxonomy: &Taxonomy) {
    for cat in categories {
        let language = taxonomy
            .language(&cat.language_id)
            .map(|l| l.name.as_str())
            .unwrap_or("?");
        println!("{:<16} {} ({language})", cat.id, cat.name);
    }
}

pub fn print_rules<'a>(rules: impl Iterator<Item = &'a Rule>, taxonomy: &Taxonomy) {
    let mut shown = 0;
    for rule in rules {
        let language = taxonomy
            .language(&rule.language_id)
            .map(|l| l.name.as_str())
            .unwrap_or("N/A");
        let category = taxonomy
            .category(&rule.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("N/A");
        println!(
            "{:<12} {:<7} {:<12} {:<16} {}",
            rule.id, rule.severity, language, category, rule.title
        );
        shown += 1;
    }
    if shown == 0 {
        println!("No rules found.");
    }
}

pub fn print_rule(rule: &Rule, taxonomy: &Taxonomy) {
    let name_or_id = |name: Option<&str>, id: &str| name.unwrap_or(id).to_string();
    println!("id:          {}", rule.id);
    println!(
        "language:    {}",
        name_or_id(taxonomy.language(&rule.language_id).map(|l| l.name.as_str()), &rule.language_id)
    );
    println!(
        "category:    {}",
        name_or_id(taxonomy.category(&rule.category_id).map(|c| c.name.as_str()), &rule.category_id)
    );
    if let Some(sub) = &rule.subcategory_id {
        println!(
            "subcategory: {}",
            name_or_id(taxonomy.subcategory(sub).map(|s| s.name.as_str()), sub)
        );
    }
    println!("severity:    {}", rule.severity);
    println!("title:       {}", rule.title);
    println!("description: {}", rule.description);
    if let Some(example) = &rule.code_example {
        println!("example:\n{example}");
    }
    if let Some(kind) = &rule.validation_type {
        println!("validation:  {kind} {}", rule.validation_value.as_deref().unwrap_or(""));
    }
}

pub fn print_outcome(outcome: &ValidationOutcome, show_raw: bool) {
    let result = &outcome.result;
    println!("Validation Results");
    if !result.summary.trim().is_empty() {
        println!("{}", result.summary);
    }
    println!();
    if result.violations.is_empty() {
        println!("No violations found. Great job!");
    }
    for violation in &result.violations {
        let marker = match violation.level() {
            ViolationLevel::High => "[error]",
            ViolationLevel::Medium => "[warn] ",
            ViolationLevel::Info => "[info] ",
        };
        println!("{marker} {}", violation.heading());
        if !violation.description.trim().is_empty() {
            println!("        Description: {}", violation.description);
        }
        if !violation.suggestion.trim().is_empty() {
            println!("        Suggestion: {}", violation.suggestion);
        }
    }
    if show_raw {
        if let Some(raw) = &result.raw_output {
            println!("\nRaw AI Output\n{raw}");
        }
    }
}

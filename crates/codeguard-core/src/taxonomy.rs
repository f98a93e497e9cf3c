//! In-memory view of languages, categories, subcategories and rules.
//!
//! The backend owns these records. `Taxonomy` only ever absorbs what the
//! backend returned; it never invents an id or keeps a record the backend
//! rejected.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{Category, Language, Rule, Severity, Subcategory};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    languages: Vec<Language>,
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
    rules: Vec<Rule>,
}

/// Counts of records dropped by a cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Removed {
    pub languages: usize,
    pub categories: usize,
    pub subcategories: usize,
    pub rules: usize,
}

/// A language name with the names of its categories, as offered to the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageOption {
    pub name: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFilter {
    pub language_id: Option<String>,
    pub category_id: Option<String>,
    pub search: Option<String>,
}

impl RuleFilter {
    pub fn matches(&self, rule: &Rule) -> bool {
        if let Some(lang) = self.language_id.as_deref() {
            if rule.language_id != lang {
                return false;
            }
        }
        if let Some(cat) = self.category_id.as_deref() {
            if rule.category_id != cat {
                return false;
            }
        }
        match self.search.as_deref().map(str::to_lowercase) {
            Some(term) if !term.is_empty() => [
                Some(rule.title.as_str()),
                Some(rule.description.as_str()),
                rule.validation_type.as_deref(),
                rule.validation_value.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term)),
            _ => true,
        }
    }
}

impl Taxonomy {
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn subcategories(&self) -> &[Subcategory] {
        &self.subcategories
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn language(&self, id: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn subcategory(&self, id: &str) -> Option<&Subcategory> {
        self.subcategories.iter().find(|s| s.id == id)
    }

    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn categories_of<'a>(&'a self, language_id: &'a str) -> impl Iterator<Item = &'a Category> {
        self.categories
            .iter()
            .filter(move |c| c.language_id == language_id)
    }

    pub fn subcategories_of<'a>(
        &'a self,
        category_id: &'a str,
    ) -> impl Iterator<Item = &'a Subcategory> {
        self.subcategories
            .iter()
            .filter(move |s| s.category_id == category_id)
    }

    pub fn set_languages(&mut self, languages: Vec<Language>) {
        self.languages = languages;
    }

    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories;
    }

    pub fn set_subcategories(&mut self, subcategories: Vec<Subcategory>) {
        self.subcategories = subcategories;
    }

    pub fn set_rules(&mut self, rules: Vec<Rule>) {
        self.rules = rules;
    }

    /// Insert or replace by id.
    pub fn put_language(&mut self, language: Language) {
        upsert(&mut self.languages, language, |l| &l.id);
    }

    pub fn put_category(&mut self, category: Category) {
        upsert(&mut self.categories, category, |c| &c.id);
    }

    pub fn put_subcategory(&mut self, subcategory: Subcategory) {
        upsert(&mut self.subcategories, subcategory, |s| &s.id);
    }

    pub fn put_rule(&mut self, rule: Rule) {
        upsert(&mut self.rules, rule, |r| &r.id);
    }

    /// Drop a language together with its categories, their subcategories and
    /// every rule scoped to any of them.
    pub fn remove_language(&mut self, id: &str) -> Removed {
        let before = self.languages.len();
        self.languages.retain(|l| l.id != id);
        let category_ids: HashSet<String> = self
            .categories_of(id)
            .map(|c| c.id.clone())
            .collect();
        let mut removed = self.remove_categories(&category_ids);
        let rules_before = self.rules.len();
        self.rules.retain(|r| r.language_id != id);
        removed.rules += rules_before - self.rules.len();
        removed.languages = before - self.languages.len();
        removed
    }

    /// Drop a category with its subcategories and rules.
    pub fn remove_category(&mut self, id: &str) -> Removed {
        let ids = HashSet::from([id.to_string()]);
        self.remove_categories(&ids)
    }

    pub fn remove_rule(&mut self, id: &str) -> Option<Rule> {
        let idx = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(idx))
    }

    fn remove_categories(&mut self, ids: &HashSet<String>) -> Removed {
        let categories = self.categories.len();
        let subcategories = self.subcategories.len();
        let rules = self.rules.len();
        self.categories.retain(|c| !ids.contains(&c.id));
        self.subcategories.retain(|s| !ids.contains(&s.category_id));
        self.rules.retain(|r| !ids.contains(&r.category_id));
        Removed {
            languages: 0,
            categories: categories - self.categories.len(),
            subcategories: subcategories - self.subcategories.len(),
            rules: rules - self.rules.len(),
        }
    }

    pub fn languages_with_categories(&self) -> Vec<LanguageOption> {
        self.languages
            .iter()
            .map(|l| LanguageOption {
                name: l.name.clone(),
                categories: self.categories_of(&l.id).map(|c| c.name.clone()).collect(),
            })
            .collect()
    }

    pub fn filter_rules<'a>(&'a self, filter: &'a RuleFilter) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(move |r| filter.matches(r))
    }

    /// Seed data: three languages with a handful of categories and rules.
    pub fn sample() -> Self {
        let lang = |id: &str, name: &str| Language {
            id: id.into(),
            name: name.into(),
        };
        let cat = |id: &str, name: &str, language_id: &str| Category {
            id: id.into(),
            name: name.into(),
            language_id: language_id.into(),
        };
        let sub = |id: &str, name: &str, category_id: &str| Subcategory {
            id: id.into(),
            name: name.into(),
            category_id: category_id.into(),
        };
        Taxonomy {
            languages: vec![
                lang("lang_js", "JavaScript"),
                lang("lang_py", "Python"),
                lang("lang_java", "Java"),
            ],
            categories: vec![
                cat("cat_sec_js", "Security", "lang_js"),
                cat("cat_perf_js", "Performance", "lang_js"),
                cat("cat_style_js", "Style", "lang_js"),
                cat("cat_sec_py", "Security", "lang_py"),
                cat("cat_bp_py", "Best Practices", "lang_py"),
            ],
            subcategories: vec![
                sub("subcat_auth_js", "Authentication", "cat_sec_js"),
                sub("subcat_xss_js", "XSS Prevention", "cat_sec_js"),
                sub("subcat_loops_py", "Loop Optimization", "cat_bp_py"),
            ],
            rules: vec![
                Rule {
                    id: "rule_001".into(),
                    language_id: "lang_js".into(),
                    category_id: "cat_sec_js".into(),
                    subcategory_id: Some("subcat_auth_js".into()),
                    title: "Avoid hardcoded credentials".into(),
                    description: "Hardcoding credentials in code can lead to serious security breaches. Use environment variables instead.".into(),
                    code_example: Some("const password = '123456';".into()),
                    severity: Severity::High,
                    validation_type: Some("Regex".into()),
                    validation_value: Some(
                        r#"password\s*=\s*['\"](?!{{|process.env|config.)"#.into(),
                    ),
                },
                Rule {
                    id: "rule_002".into(),
                    language_id: "lang_js".into(),
                    category_id: "cat_perf_js".into(),
                    subcategory_id: None,
                    title: "Minimize DOM manipulations".into(),
                    description: "Frequent DOM manipulations can slow down web page performance. Batch updates or use virtual DOM libraries.".into(),
                    code_example: Some(
                        "for (let i = 0; i < 1000; i++) { document.getElementById('el').innerHTML += i; }".into(),
                    ),
                    severity: Severity::Medium,
                    validation_type: Some("Manual".into()),
                    validation_value: None,
                },
                Rule {
                    id: "rule_003".into(),
                    language_id: "lang_py".into(),
                    category_id: "cat_bp_py".into(),
                    subcategory_id: None,
                    title: "Use list comprehensions for clarity".into(),
                    description: "List comprehensions are often more readable and efficient than explicit for loops for creating lists.".into(),
                    code_example: Some("squares = []\nfor x in range(10):\n  squares.append(x**2)".into()),
                    severity: Severity::Low,
                    validation_type: None,
                    validation_value: None,
                },
            ],
        }
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> &String) {
    match items.iter().position(|existing| key(existing) == key(&item)) {
        Some(idx) => items[idx] = item,
        None => items.push(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleting_language_cascades_to_categories_and_subcategories() {
        let mut t = Taxonomy::sample();
        let removed = t.remove_language("lang_js");

        assert_eq!(removed.languages, 1);
        assert_eq!(removed.categories, 3);
        assert_eq!(removed.subcategories, 2);
        assert_eq!(removed.rules, 2);
        assert!(t.categories().iter().all(|c| c.language_id != "lang_js"));
        assert!(t
            .subcategories()
            .iter()
            .all(|s| t.category(&s.category_id).is_some()));
        assert_eq!(t.subcategories().len(), 1);
        assert_eq!(t.rules().len(), 1);
    }

    #[test]
    fn deleting_category_drops_its_subcategories_only() {
        let mut t = Taxonomy::sample();
        let removed = t.remove_category("cat_bp_py");
        assert_eq!(removed.categories, 1);
        assert_eq!(removed.subcategories, 1);
        assert_eq!(removed.rules, 1);
        assert!(t.language("lang_py").is_some());
        assert!(t.category("cat_sec_py").is_some());
    }

    #[test]
    fn unknown_ids_remove_nothing() {
        let mut t = Taxonomy::sample();
        assert_eq!(t.remove_language("lang_go"), Removed::default());
        assert!(t.remove_rule("rule_999").is_none());
        assert_eq!(t, Taxonomy::sample());
    }

    #[test]
    fn put_replaces_by_id() {
        let mut t = Taxonomy::sample();
        let mut rule = t.rule("rule_003").cloned().unwrap();
        rule.severity = Severity::High;
        t.put_rule(rule);
        assert_eq!(t.rules().len(), 3);
        assert_eq!(t.rule("rule_003").unwrap().severity, Severity::High);

        t.put_language(Language {
            id: "lang_rs".into(),
            name: "Rust".into(),
        });
        assert_eq!(t.languages().len(), 4);
    }

    #[test]
    fn dropdown_groups_category_names_by_language() {
        let options = Taxonomy::sample().languages_with_categories();
        assert_eq!(options[0].name, "JavaScript");
        assert_eq!(options[0].categories, vec!["Security", "Performance", "Style"]);
        assert!(options[2].categories.is_empty());
    }

    #[test]
    fn filter_combines_ids_and_search() {
        let t = Taxonomy::sample();
        let by_lang = RuleFilter {
            language_id: Some("lang_js".into()),
            ..Default::default()
        };
        assert_eq!(t.filter_rules(&by_lang).count(), 2);

        let by_search = RuleFilter {
            search: Some("REGEX".into()),
            ..Default::default()
        };
        let hits: Vec<_> = t.filter_rules(&by_search).map(|r| r.id.as_str()).collect();
        assert_eq!(hits, vec!["rule_001"]);

        let narrowed = RuleFilter {
            language_id: Some("lang_py".into()),
            category_id: Some("cat_bp_py".into()),
            search: Some("comprehension".into()),
        };
        assert_eq!(t.filter_rules(&narrowed).count(), 1);

        let none = RuleFilter {
            search: Some("kotlin".into()),
            ..Default::default()
        };
        assert_eq!(t.filter_rules(&none).count(), 0);
    }
}

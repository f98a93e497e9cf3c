use crate::{Error, NewRule, Result, Rule, RuleSuggestion, Severity, SuggestRuleInput, Taxonomy};

/// Editable rule fields before they are sent to the backend. `id` is set
/// when editing an existing rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleDraft {
    pub id: Option<String>,
    pub language_id: String,
    pub category_id: String,
    pub subcategory_id: Option<String>,
    pub title: String,
    pub description: String,
    pub code_example: String,
    pub severity: Severity,
    pub validation_type: String,
    pub validation_value: String,
}

impl From<&Rule> for RuleDraft {
    fn from(rule: &Rule) -> Self {
        RuleDraft {
            id: Some(rule.id.clone()),
            language_id: rule.language_id.clone(),
            category_id: rule.category_id.clone(),
            subcategory_id: rule.subcategory_id.clone(),
            title: rule.title.clone(),
            description: rule.description.clone(),
            code_example: rule.code_example.clone().unwrap_or_default(),
            severity: rule.severity,
            validation_type: rule.validation_type.clone().unwrap_or_default(),
            validation_value: rule.validation_value.clone().unwrap_or_default(),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

impl RuleDraft {
    /// Change the language; a category from another language is cleared.
    pub fn set_language(&mut self, language_id: &str, taxonomy: &Taxonomy) {
        self.language_id = language_id.to_string();
        let keeps_category = taxonomy
            .category(&self.category_id)
            .is_some_and(|c| c.language_id == self.language_id);
        if !keeps_category {
            self.category_id.clear();
            self.subcategory_id = None;
        }
    }

    pub fn check(&self) -> Result<()> {
        if self.language_id.is_empty()
            || self.category_id.is_empty()
            || self.title.trim().is_empty()
            || self.description.trim().is_empty()
        {
            return Err(Error::Input("Please fill in all required fields.".to_string()));
        }
        Ok(())
    }

    /// Build the suggestion prompt input, resolving ids to display names.
    pub fn suggestion_input(&self, taxonomy: &Taxonomy) -> Result<SuggestRuleInput> {
        if self.language_id.is_empty()
            || self.category_id.is_empty()
            || self.code_example.trim().is_empty()
            || self.description.trim().is_empty()
        {
            return Err(Error::Input(
                "Please provide Language, Category, Code Example, and Description for AI suggestions."
                    .to_string(),
            ));
        }
        let (Some(language), Some(category)) = (
            taxonomy.language(&self.language_id),
            taxonomy.category(&self.category_id),
        ) else {
            return Err(Error::Input(
                "Selected language or category not found.".to_string(),
            ));
        };
        Ok(SuggestRuleInput {
            language: language.name.clone(),
            category: category.name.clone(),
            subcategory: self
                .subcategory_id
                .as_deref()
                .and_then(|id| taxonomy.subcategory(id))
                .map(|s| s.name.clone()),
            code_example: self.code_example.clone(),
            description: self.description.clone(),
        })
    }

    /// Take title, description and severity from the model; empty suggested
    /// text keeps what was already typed.
    pub fn apply_suggestion(&mut self, suggestion: &RuleSuggestion) {
        if !suggestion.title.is_empty() {
            self.title = suggestion.title.clone();
        }
        if !suggestion.description.is_empty() {
            self.description = suggestion.description.clone();
        }
        self.severity = suggestion.severity;
    }

    pub fn to_new_rule(&self) -> NewRule {
        NewRule {
            language_id: self.language_id.clone(),
            category_id: self.category_id.clone(),
            subcategory_id: self.subcategory_id.clone().filter(|s| !s.is_empty()),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            code_example: non_empty(&self.code_example),
            severity: self.severity,
            validation_type: non_empty(&self.validation_type),
            validation_value: non_empty(&self.validation_value),
        }
    }

    /// Full record for an update; `None` for a draft that was never saved.
    pub fn to_rule(&self) -> Option<Rule> {
        let id = self.id.clone()?;
        Some(self.to_new_rule().with_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_draft() -> RuleDraft {
        RuleDraft {
            language_id: "lang_py".into(),
            category_id: "cat_bp_py".into(),
            code_example: "for x in range(10): squares.append(x**2)".into(),
            description: "prefer comprehensions".into(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_to_medium() {
        assert_eq!(RuleDraft::default().severity, Severity::Medium);
    }

    #[test]
    fn check_requires_core_fields() {
        let mut draft = python_draft();
        assert_eq!(
            draft.check().unwrap_err().to_string(),
            "Please fill in all required fields."
        );
        draft.title = "Use comprehensions".into();
        assert!(draft.check().is_ok());
    }

    #[test]
    fn suggestion_input_uses_names() {
        let t = Taxonomy::sample();
        let input = python_draft().suggestion_input(&t).unwrap();
        assert_eq!(input.language, "Python");
        assert_eq!(input.category, "Best Practices");
        assert_eq!(input.subcategory, None);
        assert_eq!(input.description, "prefer comprehensions");
    }

    #[test]
    fn suggestion_input_requires_example_and_description() {
        let t = Taxonomy::sample();
        let mut draft = python_draft();
        draft.code_example.clear();
        let err = draft.suggestion_input(&t).unwrap_err();
        assert!(err.to_string().starts_with("Please provide Language, Category"));

        let mut draft = python_draft();
        draft.category_id = "cat_missing".into();
        assert_eq!(
            draft.suggestion_input(&t).unwrap_err().to_string(),
            "Selected language or category not found."
        );
    }

    #[test]
    fn applying_suggestion_leaves_other_fields() {
        let mut draft = python_draft();
        draft.validation_type = "Manual".into();
        let before = draft.clone();
        draft.apply_suggestion(&RuleSuggestion {
            title: "Prefer list comprehensions".into(),
            description: "Building lists with append in a loop is slower and noisier.".into(),
            severity: Severity::Low,
        });
        assert_eq!(draft.title, "Prefer list comprehensions");
        assert_eq!(draft.severity, Severity::Low);
        assert_eq!(draft.language_id, before.language_id);
        assert_eq!(draft.category_id, before.category_id);
        assert_eq!(draft.code_example, before.code_example);
        assert_eq!(draft.validation_type, before.validation_type);
    }

    #[test]
    fn empty_suggested_text_keeps_typed_text() {
        let mut draft = python_draft();
        draft.apply_suggestion(&RuleSuggestion {
            title: String::new(),
            description: String::new(),
            severity: Severity::High,
        });
        assert_eq!(draft.description, "prefer comprehensions");
        assert_eq!(draft.severity, Severity::High);
    }

    #[test]
    fn switching_language_clears_foreign_category() {
        let t = Taxonomy::sample();
        let mut draft = python_draft();
        draft.set_language("lang_py", &t);
        assert_eq!(draft.category_id, "cat_bp_py");
        draft.set_language("lang_js", &t);
        assert!(draft.category_id.is_empty());
    }

    #[test]
    fn round_trips_through_rule() {
        let rule = Taxonomy::sample().rule("rule_002").cloned().unwrap();
        let draft = RuleDraft::from(&rule);
        assert_eq!(draft.to_rule(), Some(rule));
        assert_eq!(python_draft().to_rule(), None);
    }
}

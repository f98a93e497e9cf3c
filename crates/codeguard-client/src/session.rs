//! Session state for one operator: the taxonomy as last seen from the
//! backend, the last validation outcome, and which actions are in flight.
//!
//! Mutations go to the backend first. Only the backend's answer is applied to
//! the local taxonomy, so a failed call leaves it exactly as it was.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use codeguard_core::draft::RuleDraft;
use codeguard_core::taxonomy::Removed;
use codeguard_core::{
    Action, Category, Error, Language, Result, Rule, Taxonomy, ValidationOutcome,
    ValidationRequest,
};

use crate::api::ApiClient;
use crate::transport::Transport;

pub struct Session<T: Transport> {
    api: ApiClient<T>,
    taxonomy: Mutex<Taxonomy>,
    last_validation: Mutex<Option<ValidationOutcome>>,
    in_flight: Mutex<HashSet<Action>>,
}

/// Marks an action as running until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<Action>>,
    action: Action,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.action);
    }
}

fn lock<V>(m: &Mutex<V>) -> MutexGuard<'_, V> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Transport> Session<T> {
    pub fn new(api: ApiClient<T>) -> Self {
        Self::with_taxonomy(api, Taxonomy::default())
    }

    pub fn with_taxonomy(api: ApiClient<T>, taxonomy: Taxonomy) -> Self {
        Self {
            api,
            taxonomy: Mutex::new(taxonomy),
            last_validation: Mutex::new(None),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    /// Snapshot of the current taxonomy.
    pub fn taxonomy(&self) -> Taxonomy {
        lock(&self.taxonomy).clone()
    }

    pub fn last_validation(&self) -> Option<ValidationOutcome> {
        lock(&self.last_validation).clone()
    }

    pub fn clear_validation(&self) {
        *lock(&self.last_validation) = None;
    }

    pub fn is_busy(&self, action: Action) -> bool {
        lock(&self.in_flight).contains(&action)
    }

    fn begin(&self, action: Action) -> Result<InFlight<'_>> {
        if !lock(&self.in_flight).insert(action) {
            tracing::debug!(%action, "ignored duplicate submission");
            return Err(Error::Busy(action));
        }
        Ok(InFlight {
            set: &self.in_flight,
            action,
        })
    }

    /// Fetch languages, categories and rules together. Nothing is replaced
    /// unless all three succeed.
    pub async fn load(&self) -> Result<()> {
        let _guard = self.begin(Action::Load)?;
        let (languages, categories, rules) = tokio::try_join!(
            self.api.list_languages(),
            self.api.list_categories(),
            self.api.list_rules(),
        )?;
        tracing::info!(
            languages = languages.len(),
            categories = categories.len(),
            rules = rules.len(),
            "taxonomy loaded"
        );
        let mut taxonomy = lock(&self.taxonomy);
        taxonomy.set_languages(languages);
        taxonomy.set_categories(categories);
        taxonomy.set_rules(rules);
        Ok(())
    }

    pub async fn add_language(&self, name: &str) -> Result<Language> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Input("Language name cannot be empty.".to_string()));
        }
        let _guard = self.begin(Action::AddLanguage)?;
        let language = self.api.create_language(name).await?;
        tracing::info!(id = %language.id, name = %language.name, "language added");
        lock(&self.taxonomy).put_language(language.clone());
        Ok(language)
    }

    /// Delete a language; its categories, subcategories and rules go with it.
    pub async fn delete_language(&self, id: &str) -> Result<Removed> {
        let _guard = self.begin(Action::DeleteLanguage)?;
        self.api.delete_language(id).await?;
        let removed = lock(&self.taxonomy).remove_language(id);
        tracing::info!(
            id,
            categories = removed.categories,
            subcategories = removed.subcategories,
            "language and related data deleted"
        );
        Ok(removed)
    }

    pub async fn add_category(&self, language_id: &str, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() || language_id.is_empty() {
            return Err(Error::Input(
                "Category name and language are required.".to_string(),
            ));
        }
        let _guard = self.begin(Action::AddCategory)?;
        let category = self.api.create_category(language_id, name).await?;
        tracing::info!(id = %category.id, language_id, "category added");
        lock(&self.taxonomy).put_category(category.clone());
        Ok(category)
    }

    pub async fn delete_category(&self, id: &str) -> Result<Removed> {
        let _guard = self.begin(Action::DeleteCategory)?;
        self.api.delete_category(id).await?;
        let removed = lock(&self.taxonomy).remove_category(id);
        tracing::info!(id, subcategories = removed.subcategories, "category deleted");
        Ok(removed)
    }

    pub async fn create_rule(&self, draft: &RuleDraft) -> Result<Rule> {
        draft.check()?;
        let _guard = self.begin(Action::CreateRule)?;
        let rule = self.api.create_rule(&draft.to_new_rule()).await?;
        tracing::info!(id = %rule.id, "rule created");
        lock(&self.taxonomy).put_rule(rule.clone());
        Ok(rule)
    }

    /// Send the full record; the saved copy replaces the local one.
    pub async fn update_rule(&self, draft: &RuleDraft) -> Result<Rule> {
        draft.check()?;
        let rule = draft
            .to_rule()
            .ok_or_else(|| Error::Input("Only saved rules can be updated.".to_string()))?;
        let _guard = self.begin(Action::UpdateRule)?;
        let saved = self.api.update_rule(&rule).await?;
        tracing::info!(id = %saved.id, "rule updated");
        lock(&self.taxonomy).put_rule(saved.clone());
        Ok(saved)
    }

    pub async fn delete_rule(&self, id: &str) -> Result<()> {
        let _guard = self.begin(Action::DeleteRule)?;
        self.api.delete_rule(id).await?;
        lock(&self.taxonomy).remove_rule(id);
        tracing::info!(id, "rule deleted");
        Ok(())
    }

    /// Validate against the remote backend. The previous outcome is dropped
    /// as soon as the request starts.
    pub async fn validate(&self, request: &ValidationRequest) -> Result<ValidationOutcome> {
        request.check()?;
        let _guard = self.begin(Action::Validate)?;
        self.clear_validation();
        let outcome = self.api.validate(request).await?;
        tracing::info!(
            violations = outcome.result.violations.len(),
            "validation complete"
        );
        self.record_validation(outcome.clone());
        Ok(outcome)
    }

    /// Store an outcome produced elsewhere, e.g. by a direct model call.
    pub fn record_validation(&self, outcome: ValidationOutcome) {
        *lock(&self.last_validation) = Some(outcome);
    }
}

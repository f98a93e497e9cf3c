//! Typed calls against the rules backend.
//!
//! Every call is a single attempt. A status the operation does not accept
//! becomes `Error::Request`, carrying the body's `message` when it has one.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use codeguard_core::extract::extract_validation;
use codeguard_core::{
    Category, Error, Language, NewRule, ParseError, Result, Rule, ValidationOutcome,
    ValidationRequest,
};

use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

/// Which statuses count as success for a call.
#[derive(Debug, Clone, Copy)]
enum Expect {
    Success,
    Exactly(u16),
}

impl Expect {
    fn accepts(self, response: &ApiResponse) -> bool {
        match self {
            Expect::Success => response.is_success(),
            Expect::Exactly(status) => response.status == status,
        }
    }
}

pub struct ApiClient<T: Transport> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // --- Languages ---

    pub async fn list_languages(&self) -> Result<Vec<Language>> {
        let resp = self
            .call(Method::Get, "/language".into(), None, Expect::Success, "Failed to load languages.")
            .await?;
        decode(&resp)
    }

    pub async fn create_language(&self, name: &str) -> Result<Language> {
        let resp = self
            .call(
                Method::Post,
                "/language".into(),
                Some(json!({ "name": name })),
                Expect::Exactly(201),
                "Failed to create language.",
            )
            .await?;
        decode(&resp)
    }

    pub async fn delete_language(&self, id: &str) -> Result<()> {
        self.call(
            Method::Delete,
            format!("/language/{id}"),
            None,
            Expect::Exactly(204),
            "Failed to delete language.",
        )
        .await
        .map(drop)
    }

    // --- Categories ---

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let resp = self
            .call(Method::Get, "/categories".into(), None, Expect::Success, "Failed to load categories.")
            .await?;
        decode(&resp)
    }

    pub async fn create_category(&self, language_id: &str, name: &str) -> Result<Category> {
        let resp = self
            .call(
                Method::Post,
                "/categories".into(),
                Some(json!({ "languageId": language_id, "name": name })),
                Expect::Exactly(201),
                "Failed to create category.",
            )
            .await?;
        decode(&resp)
    }

    pub async fn delete_category(&self, id: &str) -> Result<()> {
        self.call(
            Method::Delete,
            format!("/categories/{id}"),
            None,
            Expect::Exactly(204),
            "Failed to delete category.",
        )
        .await
        .map(drop)
    }

    // --- Rules ---

    pub async fn list_rules(&self) -> Result<Vec<Rule>> {
        let resp = self
            .call(Method::Get, "/rules".into(), None, Expect::Success, "Failed to load rules.")
            .await?;
        decode(&resp)
    }

    pub async fn create_rule(&self, rule: &NewRule) -> Result<Rule> {
        let resp = self
            .call(
                Method::Post,
                "/rules".into(),
                Some(to_body(rule)?),
                Expect::Success,
                "Failed to create rule.",
            )
            .await?;
        decode(&resp)
    }

    /// Full replace: the whole record is sent.
    pub async fn update_rule(&self, rule: &Rule) -> Result<Rule> {
        let resp = self
            .call(
                Method::Put,
                format!("/rules/{}", rule.id),
                Some(to_body(rule)?),
                Expect::Success,
                "Failed to update rule.",
            )
            .await?;
        decode(&resp)
    }

    pub async fn delete_rule(&self, id: &str) -> Result<()> {
        self.call(
            Method::Delete,
            format!("/rules/{id}"),
            None,
            Expect::Success,
            "Failed to delete rule.",
        )
        .await
        .map(drop)
    }

    // --- Validation ---

    /// POST the snippet to the remote validator and extract the fenced result.
    pub async fn validate(&self, request: &ValidationRequest) -> Result<ValidationOutcome> {
        let resp = self
            .call(
                Method::Post,
                "/code/validate".into(),
                Some(to_body(request)?),
                Expect::Success,
                "Validation failed.",
            )
            .await?;
        extract_validation(&resp.body).into_result()
    }

    async fn call(
        &self,
        method: Method,
        path: String,
        body: Option<Value>,
        expect: Expect,
        fallback: &str,
    ) -> Result<ApiResponse> {
        let response = self.transport.send(ApiRequest { method, path, body }).await?;
        if expect.accepts(&response) {
            Ok(response)
        } else {
            let err = request_error(&response, fallback);
            tracing::warn!(status = response.status, error = %err, "backend rejected request");
            Err(err)
        }
    }
}

fn request_error(response: &ApiResponse, fallback: &str) -> Error {
    let message = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    Error::Request {
        status: response.status,
        message,
    }
}

fn decode<D: DeserializeOwned>(response: &ApiResponse) -> Result<D> {
    serde_json::from_str(&response.body).map_err(|e| Error::Parse(ParseError::Json(e.to_string())))
}

fn to_body<S: Serialize>(value: &S) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::Parse(ParseError::Json(e.to_string())))
}

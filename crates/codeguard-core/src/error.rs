use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// User-triggered operations. At most one of each kind is in flight at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Load,
    AddLanguage,
    DeleteLanguage,
    AddCategory,
    DeleteCategory,
    CreateRule,
    UpdateRule,
    DeleteRule,
    Validate,
    Suggest,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Load => "load",
            Action::AddLanguage => "add language",
            Action::DeleteLanguage => "delete language",
            Action::AddCategory => "add category",
            Action::DeleteCategory => "delete category",
            Action::CreateRule => "create rule",
            Action::UpdateRule => "update rule",
            Action::DeleteRule => "delete rule",
            Action::Validate => "validate",
            Action::Suggest => "suggest",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend answered with a status the operation does not accept.
    #[error("{message}")]
    Request { status: u16, message: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Model call failed or its output could not be coerced to the schema.
    #[error("{0}")]
    Ai(String),

    /// Required input missing; raised before any network call.
    #[error("{0}")]
    Input(String),

    /// No HTTP status was received.
    #[error("request failed: {0}")]
    Transport(String),

    #[error("{0} is already in progress")]
    Busy(Action),

    #[error("configuration: {0}")]
    Config(String),
}

/// Failure to turn a validator response into a `ValidationResult`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Could not parse validator response. Invalid format.")]
    MissingFence,

    #[error("{0}")]
    Json(String),

    #[error("validator response does not match the result schema: {0}")]
    Shape(String),
}

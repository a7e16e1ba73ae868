use crate::owner::TypeNameError;
use crate::signature::Visibility;
use thiserror::Error;

/// Failure reported by a user-supplied handler (coercion, check, observer,
/// default generator or owner method).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A handler failure tagged with the label of the handler that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{handler}`: {source}")]
pub struct HandlerFailure {
    pub handler: String,
    #[source]
    pub source: HandlerError,
}

/// Invalid declaration options. Never retried: these surface while a type is
/// being declared.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("missing required option `{0}`")]
    MissingOption(&'static str),

    #[error("`{value}` is not a valid owner type: {source}")]
    InvalidOwner {
        value: String,
        #[source]
        source: TypeNameError,
    },

    #[error("`{0}` is not a valid attribute name")]
    InvalidName(String),

    #[error("unsupported kind `{0}`, expected `positional` or `named`")]
    InvalidKind(String),

    #[error("position must be a non-negative integer or nil, got `{0}`")]
    InvalidPosition(String),

    #[error("`{key}` must be one of `public`, `protected`, `private`, got `{value}`")]
    InvalidVisibility { key: String, value: String },

    #[error("`{key}` must be a boolean, got `{value}`")]
    NotBoolean { key: String, value: String },

    #[error("unknown option `{0}`")]
    UnknownOption(String),

    #[error("`{0}` is not a valid method reference")]
    InvalidMethod(String),

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("cannot merge attribute `{left}` with attribute `{right}`")]
    NameMismatch { left: String, right: String },

    #[error("type `{0}` is already declared")]
    DuplicateType(String),

    #[error("type `{0}` is not declared")]
    UnknownType(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{context}: {source}")]
    Configuration {
        context: String,
        #[source]
        source: ConfigurationError,
    },

    #[error("{owner}#{attribute}: coercion `{handler}` failed: {source}")]
    Coercion {
        owner: String,
        attribute: String,
        handler: String,
        #[source]
        source: HandlerError,
    },

    #[error("{owner}#{attribute}: {} validation error(s): {}", .errors.len(), join_failures(.errors))]
    Validation {
        owner: String,
        attribute: String,
        errors: Vec<HandlerFailure>,
    },

    #[error("{owner}#{attribute} {reason}")]
    Rejected {
        owner: String,
        attribute: String,
        reason: String,
    },

    #[error("{owner}#{attribute}: {} callback error(s): {}", .errors.len(), join_failures(.errors))]
    Callback {
        owner: String,
        attribute: String,
        errors: Vec<HandlerFailure>,
    },

    #[error("{owner}#{attribute}: default generator failed: {source}")]
    Default {
        owner: String,
        attribute: String,
        #[source]
        source: HandlerError,
    },

    #[error("wrong number of arguments for {owner} (given {given}, expected {})", expected_arity(.min, .max))]
    Arity {
        owner: String,
        given: usize,
        min: usize,
        max: usize,
    },

    #[error("unknown keywords for {owner}: {}", .keys.join(", "))]
    UnknownKeys { owner: String, keys: Vec<String> },

    #[error("undefined attribute `{name}` for {owner}")]
    UnknownAttribute { owner: String, name: String },

    #[error("{visibility} method `{method}` called for {owner}")]
    Visibility {
        owner: String,
        method: String,
        visibility: Visibility,
    },

    #[error("failed to load configuration: {0}")]
    Settings(#[from] confique::Error),
}

impl Error {
    pub(crate) fn configuration(context: impl Into<String>, source: ConfigurationError) -> Self {
        Error::Configuration {
            context: context.into(),
            source,
        }
    }

    /// Handler failures carried by aggregate errors, in handler order.
    pub fn failures(&self) -> &[HandlerFailure] {
        match self {
            Error::Validation { errors, .. } | Error::Callback { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn join_failures(errors: &[HandlerFailure]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn expected_arity(min: &usize, max: &usize) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{}..{}", min, max)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by handlers.
pub type HandlerResult<T> = std::result::Result<T, HandlerError>;

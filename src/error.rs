use crate::parameters::bounds::BoundsError;
use crate::parameters::expression::ExpressionError;
use thiserror::Error;

/// Error types for the simparams-rs library.
///
/// Every variant that concerns a specific field carries the dotted path of
/// that field (empty for the tree root).
#[derive(Error, Debug)]
pub enum SimParamsError {
    /// A value was rejected: wrong type, outside its range or choice set,
    /// not a registered switch option, or a structurally invalid request.
    #[error("Bad parameter '{path}': {message}")]
    BadParameter { path: String, message: String },

    /// A concrete value was requested but neither a value nor a default is set.
    #[error("Parameter '{path}' is not set and has no default")]
    NotSet { path: String },

    /// The addressed field does not exist in the schema.
    #[error("Field '{path}' does not exist")]
    InexistentField { path: String },

    /// A vector element was addressed outside `[0, len)`.
    #[error("Index {index} out of range for '{path}' of length {len}")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// Derived parameters reference each other in a cycle.
    #[error("Circular dependency in function of parameter '{path}'")]
    CircularDependency { path: String },

    /// A field path could not be parsed.
    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// Error parsing or evaluating a derived-parameter expression.
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// Error in range bounds.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[cfg(feature = "yaml")]
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SimParamsError {
    pub(crate) fn bad(path: impl ToString, message: impl Into<String>) -> Self {
        SimParamsError::BadParameter {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn inexistent(path: impl ToString) -> Self {
        SimParamsError::InexistentField {
            path: path.to_string(),
        }
    }

    pub(crate) fn not_set(path: impl ToString) -> Self {
        SimParamsError::NotSet {
            path: path.to_string(),
        }
    }

    /// Rewrites the path carried by a field-level error so it is relative
    /// to an enclosing container. Used while walking down the tree, where
    /// leaves only know their own name.
    pub(crate) fn within(self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self;
        }
        let join = |path: String| {
            if path.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix}.{path}")
            }
        };
        match self {
            SimParamsError::BadParameter { path, message } => SimParamsError::BadParameter {
                path: join(path),
                message,
            },
            SimParamsError::NotSet { path } => SimParamsError::NotSet { path: join(path) },
            SimParamsError::InexistentField { path } => {
                SimParamsError::InexistentField { path: join(path) }
            }
            SimParamsError::IndexOutOfRange { path, index, len } => {
                SimParamsError::IndexOutOfRange {
                    path: join(path),
                    index,
                    len,
                }
            }
            SimParamsError::CircularDependency { path } => {
                SimParamsError::CircularDependency { path: join(path) }
            }
            other => other,
        }
    }
}

/// Result type alias for simparams-rs operations.
pub type Result<T> = std::result::Result<T, SimParamsError>;

//! Error types for rule compilation and execution

use std::time::Duration;
use thiserror::Error;

/// Result type for compiling rule sets
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Boxed cause reported by a validator's collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Syntax errors in the path language.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,

    #[error("path cannot start with a dot")]
    LeadingDot,

    #[error("path cannot end with a dot")]
    TrailingDot,

    #[error("consecutive dots at position {position}")]
    ConsecutiveDots { position: usize },

    #[error("unclosed bracket at position {position}")]
    UnclosedBracket { position: usize },

    #[error("unopened bracket at position {position}")]
    UnopenedBracket { position: usize },

    #[error("non-empty bracket at position {position}")]
    NonEmptyBracket { position: usize },

    #[error("unexpected '{character}' at position {position}, expected a separator")]
    UnexpectedCharacter { character: char, position: usize },
}

/// Configuration errors: bugs in a rule set, raised while compiling and
/// never at validation time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A declared path does not parse
    #[error("invalid path \"{path}\": {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: PathError,
    },

    /// Two declarations normalize to the same path
    #[error("duplicate field path \"{0}\"")]
    DuplicatePath(String),

    /// A declaration names a validator the registry does not know
    #[error("unknown validator \"{0}\"")]
    UnknownValidator(String),

    /// A registered validator rejected its arguments
    #[error("invalid arguments for validator \"{rule}\": {reason}")]
    InvalidArguments { rule: String, reason: String },

    /// A declaration document has the wrong shape
    #[error("malformed rule declaration: {0}")]
    MalformedDeclaration(String),

    /// Engine configuration could not be loaded
    #[error("invalid engine configuration: {0}")]
    InvalidEngineConfig(String),
}

impl ConfigError {
    /// Create an invalid arguments error
    pub fn arguments(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed declaration error
    pub fn declaration<S: Into<String>>(msg: S) -> Self {
        Self::MalformedDeclaration(msg.into())
    }
}

/// A failure of something a validator depends on (database, remote
/// service, ...). Counted as a validation failure and reported alongside
/// the error tree.
#[derive(Debug, Error)]
#[error("validator \"{validator}\" failed on \"{path}\": {source}")]
pub struct CollaboratorError {
    /// Name of the validator that raised the error
    pub validator: String,
    /// Resolved path of the value being validated
    pub path: String,
    #[source]
    pub source: BoxError,
}

/// Errors raised by collaborators themselves, such as lookups.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("lookup unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] BoxError),
}

/// Errors of the asynchronous entrypoint.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("validation did not finish within {0:?}")]
    Timeout(Duration),

    #[error("validation task failed: {0}")]
    Join(String),
}

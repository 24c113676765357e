//! Error types for mufem operations.

use thiserror::Error;

/// Result type alias using the mufem Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during mufem operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Variable registry errors (unknown names, kind mismatches).
    #[error("variable error: {0}")]
    Variable(String),

    /// Model part errors (duplicate or missing nodes).
    #[error("model error: {0}")]
    Model(String),

    /// Element or condition errors (malformed geometry, bad properties).
    #[error("element error: {0}")]
    Element(String),

    /// Assembly errors.
    #[error("assembly error: {0}")]
    Assembly(String),

    /// Linear solver errors.
    #[error("solver error: {0}")]
    Solver(String),

    /// Matrix singularity or conditioning issues.
    #[error("singular system: {0}")]
    SingularSystem(String),

    /// Malformed settings input.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

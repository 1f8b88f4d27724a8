//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.
//!
//! Only structural failures are errors. Conditions the generator recovers from
//! (unrouted actions, malformed route lines, conflicting bindings) are reported
//! as [`crate::diagnostics::Diagnostic`] values instead.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors (output directories, document files, stubs).
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Wrapper for YAML (de)serialization errors.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// Invalid or incomplete generator configuration, unknown document names.
    #[from(ignore)]
    #[display("Config Error: {_0}")]
    Config(String),

    /// An `ActionSpec` was driven through its lifecycle out of order.
    #[from(ignore)]
    #[display("State Error: {_0}")]
    State(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

//! Error types for prompt operations

use thiserror::Error;

/// Result type for prompt operations
pub type Result<T> = std::result::Result<T, PromptError>;

/// Errors that can occur during prompt operations
#[derive(Error, Debug)]
pub enum PromptError {
    /// No document stored under `{name}/{version}`
    #[error("Template '{name}' not found for version '{version}': {detail}")]
    TemplateNotFound {
        name: String,
        version: String,
        detail: String,
    },

    /// Template syntax or rendering failed
    #[error("Failed to render template '{name}': {detail}")]
    RenderError { name: String, detail: String },

    /// A template file exists but could not be read
    #[error("Failed to load template file '{path}': {detail}")]
    FileLoadError { path: String, detail: String },
}

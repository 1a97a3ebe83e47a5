//! Error types for rustible-tags.
//!
//! This module defines the error types used throughout the crate: tag
//! loading and template resolution failures, variable store misuse, and
//! the playbook/configuration errors surfaced by the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rustible-tags operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for rustible-tags.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Variable Store Errors
    // ========================================================================
    /// Attempted to store a variable under one of the store's own names.
    #[error("Name '{0}' is reserved")]
    ReservedName(String),

    /// Variable was never set.
    #[error("Variable '{0}' not found")]
    VariableNotFound(String),

    /// Verbosity outside of 0..=4.
    #[error("Invalid verbosity {0}: must be between 0 and 4")]
    InvalidVerbosity(u8),

    // ========================================================================
    // Tag Errors
    // ========================================================================
    /// Tag declaration is neither a scalar nor a list.
    #[error("Invalid tags for '{context}': {message}")]
    InvalidTags {
        /// Where the declaration was found (play, block or task name)
        context: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Template Errors
    // ========================================================================
    /// Template rendering error.
    #[error("Template rendering failed for '{template}': {message}")]
    TemplateRender {
        /// Template source
        template: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Playbook Errors
    // ========================================================================
    /// Error parsing a playbook file.
    #[error("Failed to parse playbook '{path}': {message}")]
    PlaybookParse {
        /// Path to the playbook file
        path: PathBuf,
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error validating playbook structure.
    #[error("Playbook validation failed: {0}")]
    PlaybookValidation(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // IO / Serialization Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new playbook parse error.
    pub fn playbook_parse(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::PlaybookParse {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Creates a new invalid tags error.
    pub fn invalid_tags(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTags {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Creates a new template render error.
    pub fn template_render(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateRender {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::PlaybookParse { .. } | Error::PlaybookValidation(_) => 4,
            Error::InvalidTags { .. } => 4,
            Error::TemplateRender { .. } => 2,
            Error::Config(_) | Error::InvalidConfig { .. } => 5,
            _ => 1,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}

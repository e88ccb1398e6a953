//! Error types for Maskforge

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Maskforge operations
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("Metadata not found for {}", .0.display())]
    MetadataNotFound(PathBuf),

    #[error("Failed to access {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Identity error: {0}")]
    Identity(String),

    #[error("Combo already references {max} masks")]
    ComboCapacity { max: usize },

    #[error("Build tool not found: {}", .0.display())]
    ToolMissing(PathBuf),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Version control error: {0}")]
    Vcs(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),

    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Result type alias for Maskforge operations
pub type Result<T> = std::result::Result<T, ForgeError>;

impl ForgeError {
    /// Wrap an I/O error with the path it happened on
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ForgeError::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Shorthand for a schema-directed parse failure
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        ForgeError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for ForgeError {
    fn from(err: toml::de::Error) -> Self {
        ForgeError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for ForgeError {
    fn from(err: toml::ser::Error) -> Self {
        ForgeError::TomlSerError(err.to_string())
    }
}

impl From<serde_json::Error> for ForgeError {
    fn from(err: serde_json::Error) -> Self {
        ForgeError::JsonError(err.to_string())
    }
}

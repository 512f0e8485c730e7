//! Error types for the bookplate pipeline
//!
//! Each variant maps to one failure class of a run. The orchestrator decides
//! per variant whether a failure skips a record, skips an archive, or ends the
//! run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bookplate operations
pub type Result<T> = std::result::Result<T, BookplateError>;

/// Main error type for the bookplate pipeline
#[derive(Error, Debug)]
pub enum BookplateError {
    /// Source directory missing or unreadable
    #[error("Cannot scan source directory '{}': {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive corrupt, unreadable, or missing its expected output file
    #[error("Failed to extract '{}': {message}", archive.display())]
    Extraction { archive: PathBuf, message: String },

    /// MARC-XML file could not be deserialized
    #[error("Failed to parse MARC-XML '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A record carried bookplate data but no usable 001 identifier
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Persisted bookplate JSON is neither an object nor a list of objects
    #[error("Corrupt bookplate store file '{}': {message}", path.display())]
    CorruptStore { path: PathBuf, message: String },

    /// The external confirmation check failed
    #[error("Confirmation check failed: {0}")]
    Confirmation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BookplateError {
    /// Create an extraction error for an archive
    pub fn extraction(archive: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Extraction {
            archive: archive.into(),
            message: message.into(),
        }
    }

    /// Create a parse error for a MARC-XML file
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a corrupt-store error for a bookplate JSON file
    pub fn corrupt_store(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptStore {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn malformed_record(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    pub fn confirmation(msg: impl Into<String>) -> Self {
        Self::Confirmation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this failure is confined to a single archive
    ///
    /// The orchestrator skips the archive and continues for these.
    pub fn is_archive_local(&self) -> bool {
        matches!(self, Self::Extraction { .. } | Self::Parse { .. })
    }
}

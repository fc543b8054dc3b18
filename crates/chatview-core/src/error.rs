//! Error types for Chatview Core

use thiserror::Error;

/// Main error type for Chatview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Attachment decoding errors
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("Invalid base64 content in {name}: {reason}")]
    InvalidBase64 { name: String, reason: String },

    #[error("Content of {0} is not valid UTF-8")]
    NotUtf8(String),

    #[error("Object URL not found: {0}")]
    UnknownObjectUrl(String),
}

/// Authentication exchange errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No temporary code provided")]
    MissingCode,

    /// Message taken verbatim from the server's `error` field, or the generic fallback
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to fetch CSRF token: {0}")]
    Csrf(String),

    #[error("{0}")]
    Transport(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Storage(StorageError::Pool(err.to_string()))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Auth(AuthError::Transport(err.to_string()))
    }
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

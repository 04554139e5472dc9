use std::path::PathBuf;

use crate::models::Entity;
use crate::validation::ValidationErrors;

/// When things go awry
#[derive(Debug, thiserror::Error)]
pub enum ZipApiError {
    /// The referenced id doesn't exist
    #[error("{0} with id not found")]
    NotFound(Entity),
    /// One or more field rules failed, every failure is carried
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    /// Refused to delete a county that cities still point at
    #[error("County with id still has cities")]
    CountyInUse,
    /// A bulk-load source file isn't there
    #[error("CSV file not found: {}", .0.display())]
    MissingResourceFile(PathBuf),
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    /// Something failed in the start up of the platform
    #[error("Startup error: {0}")]
    StartupError(String),
}

impl From<config::ConfigError> for ZipApiError {
    fn from(error: config::ConfigError) -> Self {
        ZipApiError::Config(error.to_string())
    }
}

impl ZipApiError {
    /// True when the database refused a write because of a UNIQUE index.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            ZipApiError::Sqlx(sqlx::Error::Database(err)) => err.is_unique_violation(),
            _ => false,
        }
    }
}

// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid {metric} threshold: {value} (expected 0-100)")]
    InvalidThreshold { metric: String, value: f32 },

    #[error("Cannot determine base name of source directory: {0}")]
    MissingBaseName(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

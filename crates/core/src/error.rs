//! Error types for the core data model.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing core types.
#[derive(Error, Debug)]
pub enum Error {
    /// A required image reference field was empty.
    #[error("Image reference field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// The variant string was not a recognized SOCI index version.
    #[error("Invalid SOCI index version '{0}': must be 'V1' or 'V2'")]
    InvalidVariant(String),
}

impl Error {
    /// Create an empty-field error for the named field.
    #[must_use]
    pub fn empty_field(field: &'static str) -> Self {
        Self::EmptyField(field)
    }
}

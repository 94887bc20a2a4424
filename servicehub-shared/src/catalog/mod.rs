/// Service catalog: the business rules on top of the models
///
/// # Modules
///
/// - [`filters`]: parsing of listing query parameters
/// - [`query`]: owner-scoped, filtered listing and detail reads
/// - [`compose`]: create/update of services with their tag and component links
/// - [`image`]: validation and attachment of service images
///
/// Every entry point takes the caller's user id as an explicit argument and
/// scopes all reads and writes by it.

pub mod compose;
pub mod filters;
pub mod image;
pub mod query;

use serde::{Deserialize, Serialize};

use crate::storage::StorageError;

/// A problem with one input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field or query parameter name
    pub field: String,

    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error type for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Input rejected before anything was written
    #[error("Validation failed: {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Missing, or owned by someone else
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Image storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Blocking work (image decoding) panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CatalogError {
    /// Validation failure for a single field
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::Validation(vec![FieldError::new(field, message)])
    }
}

/// Whether a service may link labels owned by other users
///
/// Listing is always owner-scoped; this only governs what a create/update may
/// attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOwnership {
    /// Any existing label id is accepted
    #[default]
    AnyOwner,

    /// Only the caller's own labels are accepted
    CallerOnly,
}

pub type CatalogResult<T> = Result<T, CatalogError>;

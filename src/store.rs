//! Transactional store operations over the four entities.
//!
//! Handlers call into this layer for anything that is more than a single
//! row read: uniqueness-checked creation, the collection cascade delete,
//! and every card save (which recomputes the cached SGD valuation).
//! Multi-row mutations run inside one transaction; a failure rolls the
//! whole operation back and surfaces a typed [`StoreError`].

pub mod cards;
pub mod collections;

use axum::http::StatusCode;
use sea_orm::DbErr;
use thiserror::Error;

/// Error types for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Collection name collision; reported distinctly from generic
    /// store failures so the user can pick another name.
    #[error("a collection named '{0}' already exists")]
    DuplicateName(String),

    /// The referenced row does not exist.
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// Any other persistence failure; the enclosing transaction has been
    /// rolled back.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl StoreError {
    /// Short machine-readable kind, for error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::DuplicateName(_) => "DUPLICATE_NAME",
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::Database(_) => "STORE_ERROR",
        }
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::DuplicateName(_) => StatusCode::CONFLICT,
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

//! Storage traits and error types
//!
//! The crawler only writes through [`DocumentStore`]; it does not own the
//! schema of whatever backend sits behind it.

use crate::storage::{CompanyRecord, NewDocument};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence interface consumed by the crawler
pub trait DocumentStore {
    /// Looks up a company by its slug
    fn find_company_by_slug(&self, slug: &str) -> StorageResult<Option<CompanyRecord>>;

    /// Adds `urls` to the company's document sources
    ///
    /// Existing sources are kept; duplicates are ignored.
    fn update_document_sources(&mut self, company_id: i64, urls: &[String]) -> StorageResult<()>;

    /// Inserts a document, replacing an earlier one at the same effective URL
    ///
    /// # Returns
    ///
    /// The ID of the stored document
    fn insert_document(&mut self, document: &NewDocument) -> StorageResult<i64>;
}

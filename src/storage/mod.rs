//! Storage module for persisting extracted documents
//!
//! This module handles the document database the crawler writes into:
//! - SQLite database initialization and schema management
//! - Company lookup and document-source tracking
//! - Document insertion from crawl results

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteDocumentStore;
pub use traits::{DocumentStore, StorageError, StorageResult};

use crate::crawler::PageResult;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

/// Opens or creates a document database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteDocumentStore)` - Store with the schema initialized
/// * `Err(StorageError)` - Failed to open or initialize the database
pub fn open_storage(path: &Path) -> StorageResult<SqliteDocumentStore> {
    SqliteDocumentStore::new(path)
}

/// Represents a company in the database
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRecord {
    pub id: i64,
    pub slug: String,
    pub name: String,
    /// URLs documents were collected from, in first-seen order
    pub document_sources: Vec<String>,
}

/// A document ready to be inserted
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub company_id: i64,
    pub url: String,
    pub effective_url: String,
    pub title: Option<String>,
    pub content: String,
    pub content_hash: String,
    pub content_type: Option<String>,
    pub legal_score: f64,
    pub fetched_at: DateTime<Utc>,
}

impl NewDocument {
    /// Builds a document from a successful crawl result
    ///
    /// Returns `None` for failed results and results without text.
    pub fn from_result(company_id: i64, result: &PageResult) -> Option<Self> {
        if !result.success {
            return None;
        }
        let content = result.content.as_ref()?;

        Some(Self {
            company_id,
            url: result.url.clone(),
            effective_url: result.effective_url.clone(),
            title: result.title.clone(),
            content: content.clone(),
            content_hash: content_hash(content),
            content_type: result.metadata.content_type.clone(),
            legal_score: result.legal_score,
            fetched_at: result.fetched_at,
        })
    }
}

/// Represents a stored document (without its text)
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub id: i64,
    pub company_id: i64,
    pub url: String,
    pub effective_url: String,
    pub title: Option<String>,
    pub content_hash: String,
    pub legal_score: f64,
    pub fetched_at: String,
}

/// SHA-256 of document text, hex encoded
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Writes the qualifying results of a crawl for `company_id`
///
/// Only successful results with `legal_score >= min_score` are stored.
/// Their effective URLs are then added to the company's document sources.
///
/// # Arguments
///
/// * `store` - Destination store
/// * `company_id` - ID of the company the documents belong to
/// * `results` - Page results from a crawl
/// * `min_score` - Lowest legal score that is stored
///
/// # Returns
///
/// * `Ok(usize)` - The number of documents written
/// * `Err(StorageError)` - A write failed
pub fn persist_results<S: DocumentStore + ?Sized>(
    store: &mut S,
    company_id: i64,
    results: &[PageResult],
    min_score: f64,
) -> StorageResult<usize> {
    let mut sources = Vec::new();

    for result in results {
        if result.legal_score < min_score {
            continue;
        }
        let Some(document) = NewDocument::from_result(company_id, result) else {
            continue;
        };

        let id = store.insert_document(&document)?;
        debug!("Stored document {} from {}", id, document.effective_url);
        if !sources.contains(&document.effective_url) {
            sources.push(document.effective_url);
        }
    }

    if !sources.is_empty() {
        store.update_document_sources(company_id, &sources)?;
    }

    info!("Stored {} documents for company {}", sources.len(), company_id);
    Ok(sources.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::PageMetadata;
    use crate::state::PageOutcome;

    fn result(url: &str, success: bool, score: f64) -> PageResult {
        PageResult {
            url: url.to_string(),
            effective_url: url.to_string(),
            success,
            status_code: Some(200),
            title: Some("Terms".to_string()),
            content: success.then(|| format!("Terms of service for {}", url)),
            legal_score: score,
            discovered_urls: Vec::new(),
            metadata: PageMetadata::default(),
            error_message: None,
            outcome: if success {
                PageOutcome::Processed
            } else {
                PageOutcome::HttpError
            },
            depth: 0,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
        assert_eq!(content_hash("").len(), 64);
    }

    #[test]
    fn test_new_document_skips_failures() {
        assert!(NewDocument::from_result(1, &result("https://a.com/x", false, 0.0)).is_none());
        assert!(NewDocument::from_result(1, &result("https://a.com/x", true, 0.5)).is_some());
    }

    #[test]
    fn test_persist_results_filters_and_records_sources() {
        let mut store = SqliteDocumentStore::new_in_memory().unwrap();
        let company = store.ensure_company("acme", "Acme").unwrap();

        let results = vec![
            result("https://acme.com/terms", true, 0.9),
            result("https://acme.com/blog", true, 0.1),
            result("https://acme.com/missing", false, 0.0),
            result("https://acme.com/privacy", true, 0.6),
        ];

        let stored = persist_results(&mut store, company.id, &results, 0.5).unwrap();
        assert_eq!(stored, 2);
        assert_eq!(store.count_documents(company.id).unwrap(), 2);

        let company = store.find_company_by_slug("acme").unwrap().unwrap();
        assert_eq!(
            company.document_sources,
            vec!["https://acme.com/terms", "https://acme.com/privacy"]
        );
    }

    #[test]
    fn test_persist_nothing_leaves_sources_untouched() {
        let mut store = SqliteDocumentStore::new_in_memory().unwrap();
        let company = store.ensure_company("acme", "Acme").unwrap();

        let stored = persist_results(&mut store, company.id, &[], 0.0).unwrap();
        assert_eq!(stored, 0);
        assert!(store
            .find_company_by_slug("acme")
            .unwrap()
            .unwrap()
            .document_sources
            .is_empty());
    }
}

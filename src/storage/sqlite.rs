//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the DocumentStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DocumentStore, StorageError, StorageResult};
use crate::storage::{CompanyRecord, DocumentRecord, NewDocument};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite document store
pub struct SqliteDocumentStore {
    conn: Connection,
}

impl SqliteDocumentStore {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteDocumentStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Gets the company with `slug`, creating it if needed
    ///
    /// # Arguments
    ///
    /// * `slug` - Unique company identifier
    /// * `name` - Display name, used only when the company is created
    ///
    /// # Returns
    ///
    /// * `Ok(CompanyRecord)` - The existing or newly created company
    /// * `Err(StorageError)` - Database error
    pub fn ensure_company(&mut self, slug: &str, name: &str) -> StorageResult<CompanyRecord> {
        if let Some(company) = self.find_company_by_slug(slug)? {
            return Ok(company);
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO companies (slug, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![slug, name, now],
        )?;

        self.find_company_by_slug(slug)?
            .ok_or_else(|| StorageError::CompanyNotFound(slug.to_string()))
    }

    /// Lists a company's documents, highest legal score first
    ///
    /// # Arguments
    ///
    /// * `company_id` - ID of the owning company
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<DocumentRecord>)` - Stored documents, possibly empty
    /// * `Err(StorageError)` - Database error
    pub fn list_documents(&self, company_id: i64) -> StorageResult<Vec<DocumentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, url, effective_url, title, content_hash, legal_score, fetched_at
             FROM documents WHERE company_id = ?1
             ORDER BY legal_score DESC, id ASC",
        )?;

        let documents = stmt
            .query_map(params![company_id], |row| {
                Ok(DocumentRecord {
                    id: row.get(0)?,
                    company_id: row.get(1)?,
                    url: row.get(2)?,
                    effective_url: row.get(3)?,
                    title: row.get(4)?,
                    content_hash: row.get(5)?,
                    legal_score: row.get(6)?,
                    fetched_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents)
    }

    /// Counts a company's documents
    pub fn count_documents(&self, company_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE company_id = ?1",
            params![company_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn find_company_by_slug(&self, slug: &str) -> StorageResult<Option<CompanyRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, slug, name, document_sources FROM companies WHERE slug = ?1",
                params![slug],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((id, slug, name, sources)) => Ok(Some(CompanyRecord {
                id,
                slug,
                name,
                document_sources: serde_json::from_str(&sources)?,
            })),
            None => Ok(None),
        }
    }

    fn update_document_sources(&mut self, company_id: i64, urls: &[String]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT document_sources FROM companies WHERE id = ?1",
                params![company_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(existing) = existing else {
            return Err(StorageError::CompanyNotFound(format!("Company ID {}", company_id)));
        };

        let mut sources: Vec<String> = serde_json::from_str(&existing)?;
        for url in urls {
            if !sources.contains(url) {
                sources.push(url.clone());
            }
        }

        tx.execute(
            "UPDATE companies SET document_sources = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                serde_json::to_string(&sources)?,
                Utc::now().to_rfc3339(),
                company_id
            ],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn insert_document(&mut self, document: &NewDocument) -> StorageResult<i64> {
        let id = self.conn.query_row(
            "INSERT INTO documents (company_id, url, effective_url, title, content, content_hash,
                                    content_type, legal_score, fetched_at, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(company_id, effective_url) DO UPDATE SET
                url = excluded.url,
                title = excluded.title,
                content = excluded.content,
                content_hash = excluded.content_hash,
                content_type = excluded.content_type,
                legal_score = excluded.legal_score,
                fetched_at = excluded.fetched_at,
                stored_at = excluded.stored_at
             RETURNING id",
            params![
                document.company_id,
                document.url,
                document.effective_url,
                document.title,
                document.content,
                document.content_hash,
                document.content_type,
                document.legal_score,
                document.fetched_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
            |row| row.get(0),
        )?;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn document(company_id: i64, effective_url: &str, content: &str) -> NewDocument {
        NewDocument {
            company_id,
            url: effective_url.to_string(),
            effective_url: effective_url.to_string(),
            title: Some("Privacy Policy".to_string()),
            content: content.to_string(),
            content_hash: crate::storage::content_hash(content),
            content_type: Some("text/html".to_string()),
            legal_score: 0.8,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_ensure_company_is_idempotent() {
        let mut store = SqliteDocumentStore::new_in_memory().unwrap();
        let first = store.ensure_company("acme", "Acme Corp").unwrap();
        let second = store.ensure_company("acme", "Other Name").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Acme Corp");
        assert!(second.document_sources.is_empty());
    }

    #[test]
    fn test_find_missing_company() {
        let store = SqliteDocumentStore::new_in_memory().unwrap();
        assert!(store.find_company_by_slug("nobody").unwrap().is_none());
    }

    #[test]
    fn test_update_document_sources_merges() {
        let mut store = SqliteDocumentStore::new_in_memory().unwrap();
        let company = store.ensure_company("acme", "Acme Corp").unwrap();

        store
            .update_document_sources(
                company.id,
                &["https://acme.com/privacy".to_string(), "https://acme.com/terms".to_string()],
            )
            .unwrap();
        store
            .update_document_sources(
                company.id,
                &["https://acme.com/terms".to_string(), "https://acme.com/cookies".to_string()],
            )
            .unwrap();

        let company = store.find_company_by_slug("acme").unwrap().unwrap();
        assert_eq!(
            company.document_sources,
            vec![
                "https://acme.com/privacy",
                "https://acme.com/terms",
                "https://acme.com/cookies"
            ]
        );
    }

    #[test]
    fn test_update_sources_for_unknown_company() {
        let mut store = SqliteDocumentStore::new_in_memory().unwrap();
        let result = store.update_document_sources(42, &["https://acme.com/".to_string()]);
        assert!(matches!(result, Err(StorageError::CompanyNotFound(_))));
    }

    #[test]
    fn test_insert_document_replaces_same_url() {
        let mut store = SqliteDocumentStore::new_in_memory().unwrap();
        let company = store.ensure_company("acme", "Acme Corp").unwrap();

        let first = store
            .insert_document(&document(company.id, "https://acme.com/privacy", "old text"))
            .unwrap();
        let second = store
            .insert_document(&document(company.id, "https://acme.com/privacy", "new text"))
            .unwrap();
        store
            .insert_document(&document(company.id, "https://acme.com/terms", "terms text"))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count_documents(company.id).unwrap(), 2);

        let docs = store.list_documents(company.id).unwrap();
        let privacy = docs
            .iter()
            .find(|d| d.effective_url == "https://acme.com/privacy")
            .unwrap();
        assert_eq!(privacy.content_hash, crate::storage::content_hash("new text"));
    }

    #[test]
    fn test_insert_document_requires_company() {
        let mut store = SqliteDocumentStore::new_in_memory().unwrap();
        let result = store.insert_document(&document(99, "https://acme.com/privacy", "text"));
        assert!(result.is_err());
    }

    #[test]
    fn test_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scout.db");

        {
            let mut store = SqliteDocumentStore::new(&path).unwrap();
            store.ensure_company("acme", "Acme Corp").unwrap();
        }

        let store = SqliteDocumentStore::new(&path).unwrap();
        assert!(store.find_company_by_slug("acme").unwrap().is_some());
    }
}

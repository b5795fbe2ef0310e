//! RecordService — metadata persistence and full-text search backed by
//! SQLite. A record row and its FTS5 index row are written inside one
//! transaction, so the index never drifts from the table.

use crate::models::record::{MetadataRecord, NewRecord, ScoredRecord};
use chrono::Utc;
use sqlx::{SqlitePool, types::Json};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RecordError {
    /// The record could not be written to the store.
    #[error("failed to persist metadata record: {0}")]
    Persist(#[source] sqlx::Error),
    /// The full-text query could not be executed.
    #[error("failed to search metadata records: {0}")]
    Search(#[source] sqlx::Error),
}

pub type RecordResult<T> = Result<T, RecordError>;

/// Gateway to the metadata store.
///
/// Owns the insert and search paths over the `records` table and its
/// `records_fts` full-text index.
#[derive(Clone)]
pub struct RecordService {
    /// Shared SQLite pool for record rows and their search index.
    pub db: Arc<SqlitePool>,
}

impl RecordService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Insert a record and its search-index row in one transaction.
    ///
    /// The index row carries the title and the space-joined file names,
    /// keyed by the record's rowid.
    pub async fn insert(&self, new: NewRecord) -> RecordResult<MetadataRecord> {
        let now = Utc::now();
        let record = MetadataRecord {
            id: Uuid::new_v4(),
            title: new.title,
            college: new.college,
            category: new.category,
            file_names: Json(new.file_names),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await.map_err(RecordError::Persist)?;

        let inserted = sqlx::query(
            "INSERT INTO records (id, title, college, category, file_names, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.college)
        .bind(&record.category)
        .bind(&record.file_names)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(RecordError::Persist)?;

        sqlx::query("INSERT INTO records_fts (rowid, title, file_names) VALUES (?, ?, ?)")
            .bind(inserted.last_insert_rowid())
            .bind(record.title.as_deref().unwrap_or(""))
            .bind(record.file_names.join(" "))
            .execute(&mut *tx)
            .await
            .map_err(RecordError::Persist)?;

        tx.commit().await.map_err(RecordError::Persist)?;
        Ok(record)
    }

    /// Full-text search over titles and file names, ranked by relevance.
    ///
    /// Query tokens are OR-ed, so any matching term qualifies a record. The
    /// returned score is the negated bm25 weight (bm25 reports negative
    /// lower-is-better values), ordered descending. An empty or
    /// whitespace-only query yields no results rather than an error.
    pub async fn search_by_text(&self, query: &str) -> RecordResult<Vec<ScoredRecord>> {
        let Some(match_query) = build_match_query(query) else {
            return Ok(Vec::new());
        };

        sqlx::query_as::<_, ScoredRecord>(
            "SELECT r.id, r.title, r.college, r.category, r.file_names,
                    r.created_at, r.updated_at,
                    -bm25(records_fts) AS score
             FROM records_fts
             JOIN records r ON r.rowid = records_fts.rowid
             WHERE records_fts MATCH ?
             ORDER BY score DESC",
        )
        .bind(&match_query)
        .fetch_all(&*self.db)
        .await
        .map_err(RecordError::Search)
    }
}

/// Build an FTS5 MATCH expression from free text.
///
/// Each whitespace token becomes a quoted string (embedded quotes doubled)
/// and tokens are joined with OR. Returns None when the input holds no
/// tokens.
fn build_match_query(input: &str) -> Option<String> {
    let tokens: Vec<String> = input
        .split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}

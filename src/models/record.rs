//! Represents a metadata record describing one uploaded document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// A stored metadata record.
///
/// The document bytes themselves live in the remote drive; the record keeps
/// the descriptive fields plus the file names used to find the blob again.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    /// Internal UUID assigned at insert.
    pub id: Uuid,

    /// Human-readable document title.
    pub title: Option<String>,

    /// Owning college or organization.
    pub college: Option<String>,

    /// Document category, serialized as `type` on the wire.
    #[serde(rename = "type")]
    pub category: Option<String>,

    /// Names of the stored blobs. Holds at least one entry.
    pub file_names: Json<Vec<String>>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// Same instant as `created_at`; records are never updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a record.
///
/// `file_names` must be non-empty; the upload path always supplies exactly
/// one name.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub title: Option<String>,
    pub college: Option<String>,
    pub category: Option<String>,
    pub file_names: Vec<String>,
}

/// A record returned from full-text search together with its relevance.
///
/// `score` is the negated bm25 weight, so larger means more relevant.
#[derive(Debug, Clone, FromRow)]
pub struct ScoredRecord {
    #[sqlx(flatten)]
    pub record: MetadataRecord,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> MetadataRecord {
        MetadataRecord {
            id: Uuid::new_v4(),
            title: Some("Algebra".into()),
            college: Some("XYZ".into()),
            category: Some("notes".into()),
            file_names: Json(vec!["notes.pdf".into()]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn record_serializes_category_as_type() {
        let value = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(value["type"], "notes");
        assert!(value.get("category").is_none());
    }

    #[test]
    fn record_serializes_file_names_as_plain_array() {
        let value = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(value["fileNames"], serde_json::json!(["notes.pdf"]));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }
}

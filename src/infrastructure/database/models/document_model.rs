use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::value_objects::{ContentHash, DocumentMetadata, DocumentStatus};
use crate::infrastructure::database::schema::documents;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentModel {
    pub id: Uuid,
    pub store_id: Uuid,
    pub display_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub content_hash: String,
    pub status: String,
    pub remote_id: Option<String>,
    pub remote_path: Option<String>,
    pub metadata: serde_json::Value,
    pub error_message: Option<String>,
    pub storage_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = documents)]
pub struct NewDocumentModel {
    pub id: Uuid,
    pub store_id: Uuid,
    pub display_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub content_hash: String,
    pub status: String,
    pub remote_id: Option<String>,
    pub remote_path: Option<String>,
    pub metadata: serde_json::Value,
    pub error_message: Option<String>,
    pub storage_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = documents)]
#[diesel(treat_none_as_null = true)]
pub struct DocumentChanges {
    pub size_bytes: i64,
    pub status: String,
    pub remote_id: Option<String>,
    pub remote_path: Option<String>,
    pub metadata: serde_json::Value,
    pub error_message: Option<String>,
    pub storage_path: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Document> for NewDocumentModel {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id(),
            store_id: document.store_id(),
            display_name: document.display_name().to_string(),
            content_type: document.content_type().to_string(),
            size_bytes: document.size_bytes(),
            content_hash: document.content_hash().as_str().to_string(),
            status: document.status().as_str().to_string(),
            remote_id: document.remote_id().map(str::to_string),
            remote_path: document.remote_path().map(str::to_string),
            metadata: document.metadata().clone().into(),
            error_message: document.error_message().map(str::to_string),
            storage_path: document.storage_path().map(str::to_string),
            created_at: document.created_at(),
            updated_at: document.updated_at(),
            deleted_at: document.deleted_at(),
        }
    }
}

impl From<&Document> for DocumentChanges {
    fn from(document: &Document) -> Self {
        Self {
            size_bytes: document.size_bytes(),
            status: document.status().as_str().to_string(),
            remote_id: document.remote_id().map(str::to_string),
            remote_path: document.remote_path().map(str::to_string),
            metadata: document.metadata().clone().into(),
            error_message: document.error_message().map(str::to_string),
            storage_path: document.storage_path().map(str::to_string),
            updated_at: document.updated_at(),
            deleted_at: document.deleted_at(),
        }
    }
}

impl TryFrom<DocumentModel> for Document {
    type Error = String;

    fn try_from(model: DocumentModel) -> Result<Self, Self::Error> {
        let content_hash = ContentHash::new(model.content_hash)
            .map_err(|e| format!("Invalid content hash: {}", e))?;
        let metadata = DocumentMetadata::try_from(model.metadata)
            .map_err(|e| format!("Invalid metadata: {}", e))?;

        Ok(Document::from_database(
            model.id,
            model.store_id,
            model.display_name,
            model.content_type,
            model.size_bytes,
            content_hash,
            DocumentStatus::parse(&model.status)?,
            model.remote_id,
            model.remote_path,
            metadata,
            model.error_message,
            model.storage_path,
            model.created_at,
            model.updated_at,
            model.deleted_at,
        ))
    }
}

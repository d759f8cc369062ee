use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Document, Store};

#[derive(Debug, Deserialize)]
pub struct CreateStoreDto {
    pub display_name: String,
    /// Absent for a global store.
    pub tenant_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct StoreResponseDto {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub display_name: String,
    pub remote_name: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub size_bytes: i64,
    pub active_document_count: i32,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl From<Store> for StoreResponseDto {
    fn from(store: Store) -> Self {
        Self {
            id: store.id(),
            tenant_id: store.owner().tenant_id(),
            display_name: store.display_name().to_string(),
            remote_name: store.remote_name().map(str::to_string),
            status: store.status().as_str().to_string(),
            error_message: store.error_message().map(str::to_string),
            size_bytes: store.size_bytes(),
            active_document_count: store.active_document_count(),
            created_at: store.created_at().to_rfc3339(),
            updated_at: store.updated_at().to_rfc3339(),
            deleted_at: store.deleted_at().map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentResponseDto {
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
    pub created_at: String,
    pub updated_at: String,
}

impl From<Document> for DocumentResponseDto {
    fn from(document: Document) -> Self {
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
            created_at: document.created_at().to_rfc3339(),
            updated_at: document.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponseDto {
    pub store_id: Uuid,
    pub documents: Vec<DocumentResponseDto>,
}

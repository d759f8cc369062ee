use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{ContentHash, DocumentMetadata, DocumentStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: Uuid,
    store_id: Uuid,
    display_name: String,
    content_type: String,
    size_bytes: i64,
    content_hash: ContentHash,
    status: DocumentStatus,
    remote_id: Option<String>,
    remote_path: Option<String>,
    metadata: DocumentMetadata,
    error_message: Option<String>,
    storage_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(
        store_id: Uuid,
        display_name: String,
        content_type: String,
        size_bytes: i64,
        content_hash: ContentHash,
        metadata: DocumentMetadata,
        storage_path: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            store_id,
            display_name,
            content_type,
            size_bytes,
            content_hash,
            status: DocumentStatus::Pending,
            remote_id: None,
            remote_path: None,
            metadata,
            error_message: None,
            storage_path,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        store_id: Uuid,
        display_name: String,
        content_type: String,
        size_bytes: i64,
        content_hash: ContentHash,
        status: DocumentStatus,
        remote_id: Option<String>,
        remote_path: Option<String>,
        metadata: DocumentMetadata,
        error_message: Option<String>,
        storage_path: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            store_id,
            display_name,
            content_type,
            size_bytes,
            content_hash,
            status,
            remote_id,
            remote_path,
            metadata,
            error_message,
            storage_path,
            created_at,
            updated_at,
            deleted_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store_id(&self) -> Uuid {
        self.store_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size_bytes(&self) -> i64 {
        self.size_bytes
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    pub fn remote_path(&self) -> Option<&str> {
        self.remote_path.as_deref()
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn storage_path(&self) -> Option<&str> {
        self.storage_path.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_active(&self) -> bool {
        self.status == DocumentStatus::Active
    }

    pub fn is_deleted(&self) -> bool {
        self.status == DocumentStatus::Deleted
    }

    pub fn start_processing(&mut self) -> Result<(), String> {
        self.transition(DocumentStatus::Processing)
    }

    pub fn complete_upload(
        &mut self,
        remote_id: String,
        remote_path: String,
        size_bytes: i64,
    ) -> Result<(), String> {
        self.transition(DocumentStatus::Active)?;
        self.remote_id = Some(remote_id);
        self.remote_path = Some(remote_path);
        self.size_bytes = size_bytes;
        self.error_message = None;
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<(), String> {
        self.transition(DocumentStatus::Failed)?;
        self.error_message = Some(error);
        Ok(())
    }

    pub fn mark_deleted(&mut self) -> Result<(), String> {
        self.transition(DocumentStatus::Deleted)?;
        self.deleted_at = Some(self.updated_at);
        Ok(())
    }

    fn transition(&mut self, next: DocumentStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Document {} cannot move from {} to {}",
                self.id, self.status, next
            ));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(store_id: Uuid) -> Document {
        Document::new(
            store_id,
            "contract.pdf".to_string(),
            "application/pdf".to_string(),
            2048,
            ContentHash::of_bytes(b"contract"),
            DocumentMetadata::new(),
            Some("/uploads/abc".to_string()),
        )
    }

    #[test]
    fn test_upload_workflow() {
        let mut doc = pdf(Uuid::new_v4());
        assert_eq!(doc.status(), DocumentStatus::Pending);

        doc.start_processing().unwrap();
        doc.complete_upload(
            "doc-1".to_string(),
            "fileSearchStores/s/documents/doc-1".to_string(),
            2100,
        )
        .unwrap();

        assert!(doc.is_active());
        assert_eq!(doc.remote_id(), Some("doc-1"));
        assert_eq!(doc.size_bytes(), 2100);
    }

    #[test]
    fn test_failed_document_can_be_reclaimed() {
        let mut doc = pdf(Uuid::new_v4());
        doc.start_processing().unwrap();
        doc.fail("operation timed out".to_string()).unwrap();
        assert_eq!(doc.error_message(), Some("operation timed out"));

        assert!(doc.start_processing().is_ok());
        doc.complete_upload("d".to_string(), "p".to_string(), 1).unwrap();
        assert!(doc.error_message().is_none());
    }

    #[test]
    fn test_active_document_cannot_be_reprocessed() {
        let mut doc = pdf(Uuid::new_v4());
        doc.start_processing().unwrap();
        doc.complete_upload("d".to_string(), "p".to_string(), 1).unwrap();
        assert!(doc.start_processing().is_err());

        doc.mark_deleted().unwrap();
        assert!(doc.is_deleted());
        assert!(doc.mark_deleted().is_err());
    }
}

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::ports::{EventBus, FileStorage};
use crate::application::use_cases::UseCaseError;
use crate::domain::DomainEvent;
use crate::domain::entities::Document;
use crate::domain::repositories::{DocumentRepository, RepositoryError, StoreRepository};
use crate::domain::value_objects::{ContentHash, DocumentMetadata, content_type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Ceiling on the summed size of a store's documents.
    pub store_capacity_bytes: i64,
    pub max_document_bytes: i64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            store_capacity_bytes: 1 << 30,
            max_document_bytes: 100 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadDocumentRequest {
    pub store_id: Uuid,
    pub file_name: String,
    pub file_data: Vec<u8>,
    pub metadata: Option<DocumentMetadata>,
}

pub struct UploadDocumentUseCase {
    stores: Arc<dyn StoreRepository>,
    documents: Arc<dyn DocumentRepository>,
    file_storage: Arc<dyn FileStorage>,
    events: Arc<dyn EventBus>,
    limits: UploadLimits,
}

impl UploadDocumentUseCase {
    pub fn new(
        stores: Arc<dyn StoreRepository>,
        documents: Arc<dyn DocumentRepository>,
        file_storage: Arc<dyn FileStorage>,
        events: Arc<dyn EventBus>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            stores,
            documents,
            file_storage,
            events,
            limits,
        }
    }

    pub async fn execute(&self, request: UploadDocumentRequest) -> Result<Document, UseCaseError> {
        let file_name = request.file_name.trim().to_string();
        if file_name.is_empty() {
            return Err(UseCaseError::ValidationError(
                "File name cannot be empty".to_string(),
            ));
        }
        if request.file_data.is_empty() {
            return Err(UseCaseError::ValidationError(
                "File data cannot be empty".to_string(),
            ));
        }

        let size = request.file_data.len() as i64;
        if size > self.limits.max_document_bytes {
            return Err(UseCaseError::ValidationError(format!(
                "File exceeds the {} byte limit",
                self.limits.max_document_bytes
            )));
        }

        let mime_type = content_type::mime_type_for(&file_name).ok_or_else(|| {
            UseCaseError::ValidationError(format!(
                "Unsupported file type; allowed: {}",
                content_type::supported_extensions()
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        let store = self
            .stores
            .find_by_id(request.store_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Store {}", request.store_id)))?;
        if !store.is_active() {
            return Err(UseCaseError::ValidationError(format!(
                "Store {} is {} and cannot accept documents",
                store.id(),
                store.status()
            )));
        }

        let content_hash = ContentHash::of_bytes(&request.file_data);

        if !self
            .stores
            .reserve_capacity(store.id(), size, self.limits.store_capacity_bytes)
            .await?
        {
            return Err(UseCaseError::ValidationError(
                "Store capacity exceeded".to_string(),
            ));
        }

        let stored = match self
            .file_storage
            .store_file(&request.file_data, &file_name)
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                self.release_reservation(store.id(), size).await;
                return Err(e.into());
            }
        };

        let document = Document::new(
            store.id(),
            file_name,
            mime_type.to_string(),
            size,
            content_hash,
            request.metadata.unwrap_or_default(),
            Some(stored.key.clone()),
        );

        if let Err(e) = self.documents.insert(&document).await {
            self.release_reservation(store.id(), size).await;
            if let Err(cleanup) = self.file_storage.delete_file(&stored.key).await {
                warn!(key = %stored.key, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(match e {
                RepositoryError::DuplicateError(_) => UseCaseError::Conflict(
                    "A document with identical content already exists in this store".to_string(),
                ),
                other => other.into(),
            });
        }

        self.events
            .publish(DomainEvent::DocumentUploadRequested {
                document_id: document.id(),
            })
            .await?;

        info!(document_id = %document.id(), store_id = %store.id(), size, "Document upload requested");
        Ok(document)
    }

    async fn release_reservation(&self, store_id: Uuid, size: i64) {
        if let Err(e) = self.stores.adjust_usage(store_id, -size, 0).await {
            warn!(%store_id, error = %e, "Failed to release reserved capacity");
        }
    }
}

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::application::ports::EventBus;
use crate::application::use_cases::UseCaseError;
use crate::domain::DomainEvent;
use crate::domain::repositories::DocumentRepository;

pub struct DeleteDocumentUseCase {
    documents: Arc<dyn DocumentRepository>,
    events: Arc<dyn EventBus>,
}

impl DeleteDocumentUseCase {
    pub fn new(documents: Arc<dyn DocumentRepository>, events: Arc<dyn EventBus>) -> Self {
        Self { documents, events }
    }

    pub async fn execute(&self, document_id: Uuid) -> Result<(), UseCaseError> {
        let document = self
            .documents
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Document {}", document_id)))?;

        if document.is_deleted() {
            return Err(UseCaseError::Conflict(format!(
                "Document {} is already deleted",
                document_id
            )));
        }

        self.events
            .publish(DomainEvent::DocumentDeletionRequested {
                document_id,
                remote_path: document.remote_path().map(str::to_string),
            })
            .await?;

        info!(%document_id, "Document deletion requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Document;
    use crate::domain::value_objects::{ContentHash, DocumentMetadata};
    use crate::infrastructure::memory::InMemoryDocumentRepository;
    use crate::test_support::RecordingEventBus;

    #[tokio::test]
    async fn test_carries_remote_path_into_request() {
        let documents = Arc::new(InMemoryDocumentRepository::new());
        let events = Arc::new(RecordingEventBus::new());
        let mut document = Document::new(
            Uuid::new_v4(),
            "a.txt".to_string(),
            "text/plain".to_string(),
            1,
            ContentHash::of_bytes(b"a"),
            DocumentMetadata::new(),
            None,
        );
        document.start_processing().unwrap();
        document
            .complete_upload("d1".to_string(), "fileSearchStores/s/documents/d1".to_string(), 1)
            .unwrap();
        documents.insert(&document).await.unwrap();

        DeleteDocumentUseCase::new(documents, events.clone())
            .execute(document.id())
            .await
            .unwrap();

        assert_eq!(
            events.events(),
            vec![DomainEvent::DocumentDeletionRequested {
                document_id: document.id(),
                remote_path: Some("fileSearchStores/s/documents/d1".to_string()),
            }]
        );
    }
}

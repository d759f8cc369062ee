use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle events exchanged between use cases, workers and notifiers.
///
/// Payloads carry only ids and strings; handlers reload whatever else they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    StoreCreationRequested {
        store_id: Uuid,
        actor_id: Option<Uuid>,
    },
    StoreCreated {
        store_id: Uuid,
        actor_id: Option<Uuid>,
        remote_name: String,
    },
    StoreCreationFailed {
        store_id: Uuid,
        actor_id: Option<Uuid>,
        error_message: String,
    },
    StoreDeletionRequested {
        store_id: Uuid,
        actor_id: Option<Uuid>,
    },
    StoreDeleted {
        store_id: Uuid,
        actor_id: Option<Uuid>,
        remote_name: Option<String>,
    },
    StoreDeletionFailed {
        store_id: Uuid,
        actor_id: Option<Uuid>,
        error_message: String,
    },
    DocumentUploadRequested {
        document_id: Uuid,
    },
    DocumentUploaded {
        document_id: Uuid,
        remote_id: String,
        remote_path: String,
        size_bytes: i64,
    },
    DocumentUploadFailed {
        document_id: Uuid,
        error_message: String,
    },
    DocumentDeletionRequested {
        document_id: Uuid,
        remote_path: Option<String>,
    },
    DocumentDeleted {
        document_id: Uuid,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::StoreCreationRequested { .. } => "stores.creation_requested",
            DomainEvent::StoreCreated { .. } => "stores.created",
            DomainEvent::StoreCreationFailed { .. } => "stores.creation_failed",
            DomainEvent::StoreDeletionRequested { .. } => "stores.deletion_requested",
            DomainEvent::StoreDeleted { .. } => "stores.deleted",
            DomainEvent::StoreDeletionFailed { .. } => "stores.deletion_failed",
            DomainEvent::DocumentUploadRequested { .. } => "documents.upload_requested",
            DomainEvent::DocumentUploaded { .. } => "documents.uploaded",
            DomainEvent::DocumentUploadFailed { .. } => "documents.upload_failed",
            DomainEvent::DocumentDeletionRequested { .. } => "documents.deletion_requested",
            DomainEvent::DocumentDeleted { .. } => "documents.deleted",
        }
    }

    /// User to notify about the outcome, when the event names one.
    pub fn actor_id(&self) -> Option<Uuid> {
        match self {
            DomainEvent::StoreCreationRequested { actor_id, .. }
            | DomainEvent::StoreCreated { actor_id, .. }
            | DomainEvent::StoreCreationFailed { actor_id, .. }
            | DomainEvent::StoreDeletionRequested { actor_id, .. }
            | DomainEvent::StoreDeleted { actor_id, .. }
            | DomainEvent::StoreDeletionFailed { actor_id, .. } => *actor_id,
            _ => None,
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(
            self,
            DomainEvent::StoreCreationRequested { .. }
                | DomainEvent::StoreDeletionRequested { .. }
                | DomainEvent::DocumentUploadRequested { .. }
                | DomainEvent::DocumentDeletionRequested { .. }
        )
    }
}

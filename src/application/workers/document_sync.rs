use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::ports::{EventBus, FileStorage, RemoteStoreClient};
use crate::application::services::OperationPoller;
use crate::application::workers::WorkerError;
use crate::domain::DomainEvent;
use crate::domain::entities::{Document, JobContext};
use crate::domain::repositories::{DocumentRepository, StoreRepository};

/// Where an uploaded document landed in the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub remote_id: String,
    pub remote_path: String,
    pub size_bytes: i64,
}

impl UploadReceipt {
    /// Read the operation response. `local_size` is used when the service
    /// does not report a size.
    pub fn from_operation_result(
        result: &serde_json::Value,
        local_size: i64,
    ) -> Result<Self, WorkerError> {
        let remote_path = result
            .get("documentName")
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                WorkerError::InvalidResponse("operation response has no documentName".to_string())
            })?;

        let remote_id = remote_path
            .rsplit('/')
            .next()
            .unwrap_or(remote_path)
            .to_string();

        // int64 fields arrive as JSON strings.
        let size_bytes = result
            .get("sizeBytes")
            .and_then(|v| {
                v.as_i64()
                    .or_else(|| v.as_str().and_then(|s| s.parse::<i64>().ok()))
            })
            .unwrap_or(local_size);

        Ok(Self {
            remote_id,
            remote_path: remote_path.to_string(),
            size_bytes,
        })
    }
}

/// Mirrors local documents into the remote store.
pub struct DocumentSyncWorker {
    documents: Arc<dyn DocumentRepository>,
    stores: Arc<dyn StoreRepository>,
    remote: Arc<dyn RemoteStoreClient>,
    poller: Arc<OperationPoller>,
    file_storage: Arc<dyn FileStorage>,
    events: Arc<dyn EventBus>,
}

impl DocumentSyncWorker {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        stores: Arc<dyn StoreRepository>,
        remote: Arc<dyn RemoteStoreClient>,
        poller: Arc<OperationPoller>,
        file_storage: Arc<dyn FileStorage>,
        events: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            documents,
            stores,
            remote,
            poller,
            file_storage,
            events,
        }
    }

    pub async fn handle_upload_requested(
        &self,
        ctx: JobContext,
        document_id: Uuid,
    ) -> Result<(), WorkerError> {
        let Some(existing) = self.documents.find_by_id(document_id).await? else {
            warn!(%document_id, "Document vanished before upload");
            return Ok(());
        };

        if existing.is_active() || existing.is_deleted() {
            debug!(%document_id, status = %existing.status(), "Upload already settled");
            return Ok(());
        }

        let Some(mut document) = self.documents.claim_for_processing(document_id).await? else {
            debug!(%document_id, "Document claimed by another delivery");
            return Ok(());
        };

        info!(%document_id, attempt = ctx.attempt, "Uploading document");

        match self.upload(&document).await {
            Ok(receipt) => self.finish_upload(document, receipt).await,
            Err(e) => {
                let error_message = e.to_string();
                warn!(%document_id, attempt = ctx.attempt, error = %error_message, "Document upload failed");
                document
                    .fail(error_message.clone())
                    .map_err(WorkerError::InvalidState)?;
                if !self.documents.settle_processing(&document).await? {
                    info!(%document_id, "Document deleted during upload, dropping failure");
                    return Ok(());
                }
                self.events
                    .publish(DomainEvent::DocumentUploadFailed {
                        document_id,
                        error_message,
                    })
                    .await?;
                Err(e)
            }
        }
    }

    pub async fn handle_deletion_requested(
        &self,
        ctx: JobContext,
        document_id: Uuid,
        remote_path: Option<String>,
    ) -> Result<(), WorkerError> {
        if let Some(path) = remote_path.as_deref() {
            self.remote.delete_document(path).await?;
        }

        if let Some(mut document) = self.documents.find_by_id(document_id).await? {
            if !document.is_deleted() {
                let was_active = document.is_active();
                document.mark_deleted().map_err(WorkerError::InvalidState)?;
                self.documents.update(&document).await?;
                self.stores
                    .adjust_usage(
                        document.store_id(),
                        -document.size_bytes(),
                        if was_active { -1 } else { 0 },
                    )
                    .await?;
            }

            if let Some(key) = document.storage_path() {
                match self.file_storage.delete_file(key).await {
                    Ok(_) => {}
                    Err(e) => warn!(%document_id, error = %e, "Failed to remove local document bytes"),
                }
            }
        }

        info!(%document_id, attempt = ctx.attempt, "Document deleted");
        self.events
            .publish(DomainEvent::DocumentDeleted { document_id })
            .await?;
        Ok(())
    }

    async fn upload(&self, document: &Document) -> Result<UploadReceipt, WorkerError> {
        let store = self
            .stores
            .find_by_id(document.store_id())
            .await?
            .ok_or_else(|| WorkerError::NotFound(format!("store {}", document.store_id())))?;
        if !store.is_active() {
            return Err(WorkerError::InvalidState(format!(
                "Store {} is not active",
                store.id()
            )));
        }
        let store_remote_name = store.remote_name().ok_or_else(|| {
            WorkerError::InvalidState(format!("Store {} has no remote name", store.id()))
        })?;

        let key = document.storage_path().ok_or_else(|| {
            WorkerError::InvalidState(format!("Document {} has no stored bytes", document.id()))
        })?;
        let bytes = self.file_storage.retrieve_file(key).await?;
        let staged = stage_bytes(bytes, document.display_name().to_string()).await?;

        let handle = self
            .remote
            .upload_document(
                staged.path(),
                store_remote_name,
                document.display_name(),
                document.content_type(),
            )
            .await?;
        debug!(document_id = %document.id(), operation = %handle, "Upload accepted");

        let result = self.poller.poll_until_complete(&handle).await?;
        UploadReceipt::from_operation_result(&result, document.size_bytes())
    }

    async fn finish_upload(
        &self,
        mut document: Document,
        receipt: UploadReceipt,
    ) -> Result<(), WorkerError> {
        let document_id = document.id();

        let reserved = document.size_bytes();
        document
            .complete_upload(
                receipt.remote_id.clone(),
                receipt.remote_path.clone(),
                receipt.size_bytes,
            )
            .map_err(WorkerError::InvalidState)?;

        // A deletion may have landed while the upload was in flight.
        if !self.documents.settle_processing(&document).await? {
            warn!(%document_id, remote_path = %receipt.remote_path, "Document deleted during upload, removing remote copy");
            return self.remove_orphan(document_id, receipt.remote_path).await;
        }
        self.stores
            .adjust_usage(document.store_id(), receipt.size_bytes - reserved, 1)
            .await?;

        info!(%document_id, remote_path = %receipt.remote_path, "Document uploaded");
        self.events
            .publish(DomainEvent::DocumentUploaded {
                document_id,
                remote_id: receipt.remote_id,
                remote_path: receipt.remote_path,
                size_bytes: receipt.size_bytes,
            })
            .await?;
        Ok(())
    }

    /// A failure is terminal: redeliveries skip deleted documents.
    async fn remove_orphan(&self, document_id: Uuid, remote_path: String) -> Result<(), WorkerError> {
        match self.remote.delete_document(&remote_path).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(%document_id, %remote_path, error = %e, "Remote copy of deleted document left behind");
                Err(WorkerError::OrphanedRemote {
                    remote_path,
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Write bytes to a temporary file that is removed when dropped.
async fn stage_bytes(bytes: Vec<u8>, display_name: String) -> Result<NamedTempFile, WorkerError> {
    tokio::task::spawn_blocking(move || {
        let suffix = display_name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{}", ext))
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("groundrag-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok::<_, std::io::Error>(file)
    })
    .await
    .map_err(|e| WorkerError::Io(format!("staging task failed: {}", e)))?
    .map_err(WorkerError::from)
}

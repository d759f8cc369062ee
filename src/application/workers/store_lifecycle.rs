use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::ports::remote_store::RemoteStoreError;
use crate::application::ports::{EventBus, RemoteStoreClient};
use crate::application::workers::WorkerError;
use crate::domain::DomainEvent;
use crate::domain::entities::{JobContext, Store};
use crate::domain::repositories::{DocumentRepository, StoreRepository};

/// Creates and deletes the remote collection behind a local store.
pub struct StoreLifecycleWorker {
    stores: Arc<dyn StoreRepository>,
    documents: Arc<dyn DocumentRepository>,
    remote: Arc<dyn RemoteStoreClient>,
    events: Arc<dyn EventBus>,
}

impl StoreLifecycleWorker {
    pub fn new(
        stores: Arc<dyn StoreRepository>,
        documents: Arc<dyn DocumentRepository>,
        remote: Arc<dyn RemoteStoreClient>,
        events: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            stores,
            documents,
            remote,
            events,
        }
    }

    pub async fn handle_create_requested(
        &self,
        ctx: JobContext,
        store_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> Result<(), WorkerError> {
        let Some(mut store) = self.stores.find_by_id(store_id).await? else {
            warn!(%store_id, "Store vanished before creation");
            return Ok(());
        };

        if store.is_active() || store.is_deleted() {
            debug!(%store_id, status = %store.status(), "Store creation already settled");
            return Ok(());
        }

        match self.remote.create_store(store.display_name()).await {
            Ok(remote_name) => {
                if !self.stores.activate(store_id, &remote_name).await? {
                    // Another delivery activated it first. Drop our duplicate.
                    warn!(%store_id, %remote_name, "Store activated concurrently, removing duplicate");
                    if let Err(e) = self.remote.delete_store(&remote_name).await {
                        warn!(%store_id, %remote_name, error = %e, "Failed to remove duplicate remote store");
                    }
                    return Ok(());
                }

                info!(%store_id, %remote_name, attempt = ctx.attempt, "Store created");
                self.events
                    .publish(DomainEvent::StoreCreated {
                        store_id,
                        actor_id,
                        remote_name,
                    })
                    .await?;
                Ok(())
            }
            Err(e) => {
                if Self::should_redeliver(&ctx, &e) {
                    warn!(%store_id, attempt = ctx.attempt, error = %e, "Store creation failed, will retry");
                    return Err(WorkerError::Remote(e));
                }

                let error_message = format!("Store creation failed: {}", e);
                self.record_failure(&mut store, &error_message).await?;
                self.events
                    .publish(DomainEvent::StoreCreationFailed {
                        store_id,
                        actor_id,
                        error_message,
                    })
                    .await?;
                Ok(())
            }
        }
    }

    pub async fn handle_delete_requested(
        &self,
        ctx: JobContext,
        store_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> Result<(), WorkerError> {
        let Some(mut store) = self.stores.find_by_id(store_id).await? else {
            warn!(%store_id, "Store vanished before deletion");
            return Ok(());
        };

        if store.is_deleted() {
            debug!(%store_id, "Store already deleted");
            return Ok(());
        }

        if let Some(remote_name) = store.remote_name().map(str::to_string) {
            if let Err(e) = self.remote.delete_store(&remote_name).await {
                if Self::should_redeliver(&ctx, &e) {
                    warn!(%store_id, attempt = ctx.attempt, error = %e, "Store deletion failed, will retry");
                    return Err(WorkerError::Remote(e));
                }

                let error_message = format!("Store deletion failed: {}", e);
                self.record_failure(&mut store, &error_message).await?;
                self.events
                    .publish(DomainEvent::StoreDeletionFailed {
                        store_id,
                        actor_id,
                        error_message,
                    })
                    .await?;
                return Ok(());
            }
        } else {
            debug!(%store_id, "Store has no remote collection, skipping remote delete");
        }

        store.mark_deleted().map_err(WorkerError::InvalidState)?;
        self.stores.update_lifecycle(&store).await?;
        self.retire_documents(store_id).await?;

        info!(%store_id, attempt = ctx.attempt, "Store deleted");
        self.events
            .publish(DomainEvent::StoreDeleted {
                store_id,
                actor_id,
                remote_name: store.remote_name().map(str::to_string),
            })
            .await?;
        Ok(())
    }

    fn should_redeliver(ctx: &JobContext, error: &RemoteStoreError) -> bool {
        error.is_retriable() && !ctx.is_final_attempt()
    }

    async fn record_failure(&self, store: &mut Store, error_message: &str) -> Result<(), WorkerError> {
        warn!(store_id = %store.id(), error = %error_message, "Store lifecycle failed");
        store
            .fail(error_message.to_string())
            .map_err(WorkerError::InvalidState)?;
        self.stores.update_lifecycle(store).await?;
        Ok(())
    }

    /// Documents of a deleted store go with it; the remote side was force-deleted.
    async fn retire_documents(&self, store_id: Uuid) -> Result<(), WorkerError> {
        for mut document in self.documents.list_by_store(store_id).await? {
            if document.is_deleted() {
                continue;
            }
            if let Err(e) = document.mark_deleted() {
                warn!(document_id = %document.id(), error = %e, "Could not retire document");
                continue;
            }
            self.documents.update(&document).await?;
        }
        Ok(())
    }
}

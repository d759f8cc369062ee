use async_trait::async_trait;
use std::sync::Arc;

use crate::application::services::{RetryPolicies, RetryPolicy};
use crate::application::workers::{
    ChatTurnProcessor, DocumentSyncWorker, StoreLifecycleWorker, WorkerError,
};
use crate::domain::entities::{Job, JobContext, JobKind};

/// Runs one delivery of a job.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Delivery budget for `kind`.
    fn retry_policy(&self, kind: &JobKind) -> RetryPolicy;

    async fn execute(&self, job: &Job, ctx: JobContext) -> Result<(), WorkerError>;
}

/// Dispatches jobs to the worker owning their kind.
pub struct JobRouter {
    stores: Arc<StoreLifecycleWorker>,
    documents: Arc<DocumentSyncWorker>,
    chat: Arc<ChatTurnProcessor>,
    policies: RetryPolicies,
}

impl JobRouter {
    pub fn new(
        stores: Arc<StoreLifecycleWorker>,
        documents: Arc<DocumentSyncWorker>,
        chat: Arc<ChatTurnProcessor>,
        policies: RetryPolicies,
    ) -> Self {
        Self {
            stores,
            documents,
            chat,
            policies,
        }
    }
}

#[async_trait]
impl JobExecutor for JobRouter {
    fn retry_policy(&self, kind: &JobKind) -> RetryPolicy {
        match kind {
            JobKind::CreateStore { .. } | JobKind::DeleteStore { .. } => {
                self.policies.store_lifecycle
            }
            JobKind::UploadDocument { .. } => self.policies.document_upload,
            JobKind::DeleteDocument { .. } => self.policies.document_deletion,
            JobKind::ProcessChatTurn { .. } => self.policies.chat_turn,
        }
    }

    async fn execute(&self, job: &Job, ctx: JobContext) -> Result<(), WorkerError> {
        match job.kind() {
            JobKind::CreateStore { store_id, actor_id } => {
                self.stores
                    .handle_create_requested(ctx, *store_id, *actor_id)
                    .await
            }
            JobKind::DeleteStore { store_id, actor_id } => {
                self.stores
                    .handle_delete_requested(ctx, *store_id, *actor_id)
                    .await
            }
            JobKind::UploadDocument { document_id } => {
                self.documents
                    .handle_upload_requested(ctx, *document_id)
                    .await
            }
            JobKind::DeleteDocument {
                document_id,
                remote_path,
            } => {
                self.documents
                    .handle_deletion_requested(ctx, *document_id, remote_path.clone())
                    .await
            }
            JobKind::ProcessChatTurn { message_id } => {
                self.chat.process_turn(ctx, *message_id).await.map(|_| ())
            }
        }
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::repositories::RepositoryError;

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document. Fails with `DuplicateError` when a non-deleted
    /// document with the same content hash already exists in the store.
    async fn insert(&self, document: &Document) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, RepositoryError>;
    async fn update(&self, document: &Document) -> Result<(), RepositoryError>;

    /// Move a pending or failed document to processing in one conditional
    /// write. Returns `None` when the document is not claimable.
    async fn claim_for_processing(&self, id: Uuid) -> Result<Option<Document>, RepositoryError>;

    /// Write the outcome of a claimed upload. Applies only while the stored
    /// row is still processing; returns `false` when it has since moved on
    /// (a deletion landed meanwhile).
    async fn settle_processing(&self, document: &Document) -> Result<bool, RepositoryError>;

    /// Non-deleted documents in any of `store_ids` whose display name is in `names`.
    async fn find_by_display_names(
        &self,
        store_ids: &[Uuid],
        names: &[String],
    ) -> Result<Vec<Document>, RepositoryError>;

    async fn list_by_store(&self, store_id: Uuid) -> Result<Vec<Document>, RepositoryError>;
}

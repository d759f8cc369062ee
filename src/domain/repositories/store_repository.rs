use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Store;
use crate::domain::repositories::RepositoryError;

#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn save(&self, store: &Store) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Store>, RepositoryError>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Store>, RepositoryError>;

    /// Persist status, remote name, error and deletion timestamp. Usage
    /// counters are owned by `reserve_capacity` / `adjust_usage`.
    async fn update_lifecycle(&self, store: &Store) -> Result<(), RepositoryError>;

    /// Assign the remote name and mark the store active, only if it is still
    /// pending or failed at write time. Returns false when another delivery won.
    async fn activate(&self, id: Uuid, remote_name: &str) -> Result<bool, RepositoryError>;

    /// Add `bytes` to the store's usage if the result stays within
    /// `capacity_bytes`. Check and write happen in one conditional update.
    async fn reserve_capacity(
        &self,
        id: Uuid,
        bytes: i64,
        capacity_bytes: i64,
    ) -> Result<bool, RepositoryError>;

    async fn adjust_usage(
        &self,
        id: Uuid,
        size_delta: i64,
        active_count_delta: i32,
    ) -> Result<(), RepositoryError>;
}

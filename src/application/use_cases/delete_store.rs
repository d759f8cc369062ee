use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::application::ports::EventBus;
use crate::application::use_cases::UseCaseError;
use crate::domain::DomainEvent;
use crate::domain::repositories::StoreRepository;

pub struct DeleteStoreUseCase {
    stores: Arc<dyn StoreRepository>,
    events: Arc<dyn EventBus>,
}

impl DeleteStoreUseCase {
    pub fn new(stores: Arc<dyn StoreRepository>, events: Arc<dyn EventBus>) -> Self {
        Self { stores, events }
    }

    pub async fn execute(&self, store_id: Uuid, actor_id: Option<Uuid>) -> Result<(), UseCaseError> {
        let store = self
            .stores
            .find_by_id(store_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Store {}", store_id)))?;

        if store.is_deleted() {
            return Err(UseCaseError::Conflict(format!(
                "Store {} is already deleted",
                store_id
            )));
        }

        self.events
            .publish(DomainEvent::StoreDeletionRequested { store_id, actor_id })
            .await?;

        info!(%store_id, "Store deletion requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Store;
    use crate::domain::value_objects::Owner;
    use crate::infrastructure::memory::InMemoryStoreRepository;
    use crate::test_support::RecordingEventBus;

    #[tokio::test]
    async fn test_requests_deletion_once() {
        let stores = Arc::new(InMemoryStoreRepository::new());
        let events = Arc::new(RecordingEventBus::new());
        let use_case = DeleteStoreUseCase::new(stores.clone(), events.clone());
        let mut store = Store::new(Owner::Global, "Old".to_string());
        stores.save(&store).await.unwrap();

        use_case.execute(store.id(), None).await.unwrap();
        assert_eq!(events.events().len(), 1);

        store.mark_deleted().unwrap();
        stores.update_lifecycle(&store).await.unwrap();
        assert!(matches!(
            use_case.execute(store.id(), None).await,
            Err(UseCaseError::Conflict(_))
        ));
        assert!(matches!(
            use_case.execute(Uuid::new_v4(), None).await,
            Err(UseCaseError::NotFound(_))
        ));
    }
}

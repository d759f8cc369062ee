use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::application::ports::EventBus;
use crate::application::use_cases::UseCaseError;
use crate::domain::DomainEvent;
use crate::domain::entities::Store;
use crate::domain::repositories::StoreRepository;
use crate::domain::value_objects::Owner;

const MAX_DISPLAY_NAME_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub struct CreateStoreRequest {
    pub owner: Owner,
    pub display_name: String,
    /// User to notify once the remote store exists.
    pub actor_id: Option<Uuid>,
}

pub struct CreateStoreUseCase {
    stores: Arc<dyn StoreRepository>,
    events: Arc<dyn EventBus>,
}

impl CreateStoreUseCase {
    pub fn new(stores: Arc<dyn StoreRepository>, events: Arc<dyn EventBus>) -> Self {
        Self { stores, events }
    }

    pub async fn execute(&self, request: CreateStoreRequest) -> Result<Store, UseCaseError> {
        let display_name = request.display_name.trim();
        if display_name.is_empty() {
            return Err(UseCaseError::ValidationError(
                "Store name cannot be empty".to_string(),
            ));
        }
        if display_name.chars().count() > MAX_DISPLAY_NAME_CHARS {
            return Err(UseCaseError::ValidationError(format!(
                "Store name cannot exceed {} characters",
                MAX_DISPLAY_NAME_CHARS
            )));
        }

        let store = Store::new(request.owner, display_name.to_string());
        self.stores.save(&store).await?;

        self.events
            .publish(DomainEvent::StoreCreationRequested {
                store_id: store.id(),
                actor_id: request.actor_id,
            })
            .await?;

        info!(store_id = %store.id(), "Store creation requested");
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::StoreStatus;
    use crate::infrastructure::memory::InMemoryStoreRepository;
    use crate::test_support::RecordingEventBus;

    #[tokio::test]
    async fn test_creates_pending_store_and_requests_remote() {
        let stores = Arc::new(InMemoryStoreRepository::new());
        let events = Arc::new(RecordingEventBus::new());
        let use_case = CreateStoreUseCase::new(stores.clone(), events.clone());
        let actor = Uuid::new_v4();

        let store = use_case
            .execute(CreateStoreRequest {
                owner: Owner::Tenant(Uuid::new_v4()),
                display_name: "  Contracts  ".to_string(),
                actor_id: Some(actor),
            })
            .await
            .unwrap();

        assert_eq!(store.display_name(), "Contracts");
        assert_eq!(store.status(), StoreStatus::Pending);
        assert!(stores.find_by_id(store.id()).await.unwrap().is_some());
        assert_eq!(
            events.events(),
            vec![DomainEvent::StoreCreationRequested {
                store_id: store.id(),
                actor_id: Some(actor),
            }]
        );
    }

    #[tokio::test]
    async fn test_rejects_blank_name() {
        let use_case = CreateStoreUseCase::new(
            Arc::new(InMemoryStoreRepository::new()),
            Arc::new(RecordingEventBus::new()),
        );

        let err = use_case
            .execute(CreateStoreRequest {
                owner: Owner::Global,
                display_name: "   ".to_string(),
                actor_id: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, UseCaseError::ValidationError(_)));
    }
}

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::application::use_cases::UseCaseError;
use crate::domain::entities::Chat;
use crate::domain::repositories::{ChatRepository, StoreRepository};
use crate::domain::value_objects::Owner;

#[derive(Debug, Clone)]
pub struct CreateChatRequest {
    pub owner: Owner,
    pub title: String,
    pub primary_store_id: Uuid,
    /// Shared stores consulted alongside the primary one.
    pub auxiliary_store_ids: Vec<Uuid>,
}

pub struct CreateChatUseCase {
    chats: Arc<dyn ChatRepository>,
    stores: Arc<dyn StoreRepository>,
}

impl CreateChatUseCase {
    pub fn new(chats: Arc<dyn ChatRepository>, stores: Arc<dyn StoreRepository>) -> Self {
        Self { chats, stores }
    }

    pub async fn execute(&self, request: CreateChatRequest) -> Result<Chat, UseCaseError> {
        let primary = self
            .stores
            .find_by_id(request.primary_store_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Store {}", request.primary_store_id)))?;
        if primary.is_deleted() {
            return Err(UseCaseError::ValidationError(format!(
                "Store {} is deleted",
                primary.id()
            )));
        }

        let auxiliary = self.stores.find_by_ids(&request.auxiliary_store_ids).await?;
        for store_id in &request.auxiliary_store_ids {
            let store = auxiliary
                .iter()
                .find(|s| s.id() == *store_id)
                .ok_or_else(|| UseCaseError::NotFound(format!("Store {}", store_id)))?;
            if store.is_deleted() {
                return Err(UseCaseError::ValidationError(format!(
                    "Store {} is deleted",
                    store_id
                )));
            }
            if !store.owner().is_global() {
                return Err(UseCaseError::ValidationError(format!(
                    "Store {} is not shared and cannot be attached",
                    store_id
                )));
            }
        }

        let title = match request.title.trim() {
            "" => "New chat".to_string(),
            title => title.to_string(),
        };

        let chat = Chat::new(
            request.owner,
            title,
            request.primary_store_id,
            request.auxiliary_store_ids,
        )
        .map_err(UseCaseError::ValidationError)?;
        self.chats.save(&chat).await?;

        info!(chat_id = %chat.id(), "Chat created");
        Ok(chat)
    }
}

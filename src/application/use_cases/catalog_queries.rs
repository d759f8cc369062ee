use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::UseCaseError;
use crate::domain::entities::{Chat, Citation, Document, Message, Store};
use crate::domain::repositories::{
    ChatRepository, CitationRepository, DocumentRepository, MessageRepository, StoreRepository,
};
use crate::domain::value_objects::MessageRole;

#[derive(Debug, Clone)]
pub struct MessageWithCitations {
    pub message: Message,
    pub citations: Vec<Citation>,
}

/// Read side used to observe lifecycle progress.
pub struct CatalogQueries {
    stores: Arc<dyn StoreRepository>,
    documents: Arc<dyn DocumentRepository>,
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
    citations: Arc<dyn CitationRepository>,
}

impl CatalogQueries {
    pub fn new(
        stores: Arc<dyn StoreRepository>,
        documents: Arc<dyn DocumentRepository>,
        chats: Arc<dyn ChatRepository>,
        messages: Arc<dyn MessageRepository>,
        citations: Arc<dyn CitationRepository>,
    ) -> Self {
        Self {
            stores,
            documents,
            chats,
            messages,
            citations,
        }
    }

    pub async fn store(&self, store_id: Uuid) -> Result<Store, UseCaseError> {
        self.stores
            .find_by_id(store_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Store {}", store_id)))
    }

    pub async fn documents(&self, store_id: Uuid) -> Result<Vec<Document>, UseCaseError> {
        self.store(store_id).await?;
        Ok(self.documents.list_by_store(store_id).await?)
    }

    pub async fn document(&self, document_id: Uuid) -> Result<Document, UseCaseError> {
        self.documents
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Document {}", document_id)))
    }

    pub async fn chat(&self, chat_id: Uuid) -> Result<Chat, UseCaseError> {
        self.chats
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Chat {}", chat_id)))
    }

    /// Messages oldest first, assistant replies with their citations.
    pub async fn messages(&self, chat_id: Uuid) -> Result<Vec<MessageWithCitations>, UseCaseError> {
        self.chat(chat_id).await?;
        let mut result = Vec::new();
        for message in self.messages.list_by_chat(chat_id).await? {
            let citations = if message.role() == MessageRole::Assistant {
                self.citations.find_by_message(message.id()).await?
            } else {
                Vec::new()
            };
            result.push(MessageWithCitations { message, citations });
        }
        Ok(result)
    }
}

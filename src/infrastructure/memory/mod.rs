//! Process-local repositories backing `STORAGE_BACKEND=memory` and unit tests.
//!
//! Each conditional operation takes the write lock for its whole check and
//! write, giving the same atomicity the Postgres implementations get from a
//! single filtered statement.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{Chat, Citation, Document, Message, Store};
use crate::domain::repositories::{
    ChatRepository, CitationRepository, DocumentRepository, MessageRepository, RepositoryError,
    StoreRepository,
};
use crate::domain::value_objects::{DocumentStatus, StoreStatus};

#[derive(Default)]
pub struct InMemoryStoreRepository {
    stores: RwLock<HashMap<Uuid, Store>>,
}

impl InMemoryStoreRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreRepository for InMemoryStoreRepository {
    async fn save(&self, store: &Store) -> Result<(), RepositoryError> {
        self.stores.write().await.insert(store.id(), store.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Store>, RepositoryError> {
        Ok(self.stores.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Store>, RepositoryError> {
        let stores = self.stores.read().await;
        Ok(ids.iter().filter_map(|id| stores.get(id).cloned()).collect())
    }

    async fn update_lifecycle(&self, store: &Store) -> Result<(), RepositoryError> {
        let mut stores = self.stores.write().await;
        let existing = stores
            .get_mut(&store.id())
            .ok_or(RepositoryError::NotFound(store.id()))?;
        // Keep the stored usage counters, they are only written by the usage methods.
        *existing = Store::from_database(
            store.id(),
            store.owner(),
            store.display_name().to_string(),
            store.remote_name().map(str::to_string),
            store.status(),
            store.error_message().map(str::to_string),
            existing.size_bytes(),
            existing.active_document_count(),
            store.created_at(),
            store.updated_at(),
            store.deleted_at(),
        );
        Ok(())
    }

    async fn activate(&self, id: Uuid, remote_name: &str) -> Result<bool, RepositoryError> {
        let mut stores = self.stores.write().await;
        let store = stores.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        if !matches!(store.status(), StoreStatus::Pending | StoreStatus::Failed) {
            return Ok(false);
        }
        store
            .activate(remote_name.to_string())
            .map_err(RepositoryError::ValidationError)?;
        Ok(true)
    }

    async fn reserve_capacity(
        &self,
        id: Uuid,
        bytes: i64,
        capacity_bytes: i64,
    ) -> Result<bool, RepositoryError> {
        let mut stores = self.stores.write().await;
        let store = stores.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        if !store.has_capacity_for(bytes, capacity_bytes) {
            return Ok(false);
        }
        store.adjust_usage(bytes, 0);
        Ok(true)
    }

    async fn adjust_usage(
        &self,
        id: Uuid,
        size_delta: i64,
        active_count_delta: i32,
    ) -> Result<(), RepositoryError> {
        let mut stores = self.stores.write().await;
        let store = stores.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        store.adjust_usage(size_delta, active_count_delta);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn insert(&self, document: &Document) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id()) {
            return Err(RepositoryError::DuplicateError(format!(
                "Document {} already exists",
                document.id()
            )));
        }
        let duplicate = documents.values().any(|d| {
            d.store_id() == document.store_id()
                && d.content_hash() == document.content_hash()
                && !d.is_deleted()
        });
        if duplicate {
            return Err(RepositoryError::DuplicateError(format!(
                "Store {} already holds content {}",
                document.store_id(),
                document.content_hash()
            )));
        }
        documents.insert(document.id(), document.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, RepositoryError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn update(&self, document: &Document) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&document.id()) {
            Some(existing) => {
                *existing = document.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(document.id())),
        }
    }

    async fn claim_for_processing(&self, id: Uuid) -> Result<Option<Document>, RepositoryError> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents.get_mut(&id) else {
            return Ok(None);
        };
        if !document.status().is_claimable() {
            return Ok(None);
        }
        document
            .start_processing()
            .map_err(RepositoryError::ValidationError)?;
        Ok(Some(document.clone()))
    }

    async fn settle_processing(&self, document: &Document) -> Result<bool, RepositoryError> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&document.id()) {
            Some(existing) if existing.status() == DocumentStatus::Processing => {
                *existing = document.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_display_names(
        &self,
        store_ids: &[Uuid],
        names: &[String],
    ) -> Result<Vec<Document>, RepositoryError> {
        let documents = self.documents.read().await;
        let mut found: Vec<Document> = documents
            .values()
            .filter(|d| {
                !d.is_deleted()
                    && store_ids.contains(&d.store_id())
                    && names.iter().any(|n| n == d.display_name())
            })
            .cloned()
            .collect();
        found.sort_by_key(|d| d.created_at());
        Ok(found)
    }

    async fn list_by_store(&self, store_id: Uuid) -> Result<Vec<Document>, RepositoryError> {
        let documents = self.documents.read().await;
        let mut found: Vec<Document> = documents
            .values()
            .filter(|d| d.store_id() == store_id && d.status() != DocumentStatus::Deleted)
            .cloned()
            .collect();
        found.sort_by_key(|d| d.created_at());
        Ok(found)
    }
}

#[derive(Default)]
pub struct InMemoryChatRepository {
    chats: RwLock<HashMap<Uuid, Chat>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn save(&self, chat: &Chat) -> Result<(), RepositoryError> {
        self.chats.write().await.insert(chat.id(), chat.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Chat>, RepositoryError> {
        Ok(self.chats.read().await.get(&id).cloned())
    }
}

/// Messages kept in insertion order so chat history reads oldest first.
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn save(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        match messages.iter_mut().find(|m| m.id() == message.id()) {
            Some(existing) => *existing = message.clone(),
            None => messages.push(message.clone()),
        }
        Ok(())
    }

    async fn insert_if_chat_idle(&self, message: &Message) -> Result<bool, RepositoryError> {
        let mut messages = self.messages.write().await;
        let busy = messages
            .iter()
            .any(|m| m.chat_id() == message.chat_id() && m.status().is_in_flight());
        if busy {
            return Ok(false);
        }
        messages.push(message.clone());
        Ok(true)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, RepositoryError> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .find(|m| m.id() == id)
            .cloned())
    }

    async fn update(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        let existing = messages
            .iter_mut()
            .find(|m| m.id() == message.id())
            .ok_or(RepositoryError::NotFound(message.id()))?;
        *existing = message.clone();
        Ok(())
    }

    async fn list_by_chat(&self, chat_id: Uuid) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.chat_id() == chat_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryCitationRepository {
    citations: RwLock<Vec<Citation>>,
}

impl InMemoryCitationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CitationRepository for InMemoryCitationRepository {
    async fn save_batch(&self, batch: &[Citation]) -> Result<(), RepositoryError> {
        let mut citations = self.citations.write().await;
        for citation in batch {
            citations.retain(|c| {
                !(c.message_id() == citation.message_id()
                    && c.document_id() == citation.document_id())
            });
            citations.push(citation.clone());
        }
        Ok(())
    }

    async fn find_by_message(&self, message_id: Uuid) -> Result<Vec<Citation>, RepositoryError> {
        Ok(self
            .citations
            .read()
            .await
            .iter()
            .filter(|c| c.message_id() == message_id)
            .cloned()
            .collect())
    }
}

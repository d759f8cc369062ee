use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::ports::file_storage::{FileStorage, FileStorageError, StoredFile};

#[derive(Default)]
pub struct InMemoryFileStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn store_file(
        &self,
        data: &[u8],
        _file_name: &str,
    ) -> Result<StoredFile, FileStorageError> {
        let key = Uuid::new_v4().to_string();
        self.files.write().await.insert(key.clone(), data.to_vec());
        Ok(StoredFile {
            key,
            size: data.len() as u64,
        })
    }

    async fn retrieve_file(&self, key: &str) -> Result<Vec<u8>, FileStorageError> {
        self.files
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| FileStorageError::FileNotFound(key.to_string()))
    }

    async fn delete_file(&self, key: &str) -> Result<bool, FileStorageError> {
        Ok(self.files.write().await.remove(key).is_some())
    }
}

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::file_storage::{FileStorage, FileStorageError, StoredFile};

/// Keeps uploaded bytes under `base_path` until the sync worker has pushed
/// them to the remote store. Keys are generated names, never caller input.
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub async fn ensure_directory_exists(&self) -> Result<(), FileStorageError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, FileStorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(FileStorageError::InvalidPath(key.to_string()));
        }
        Ok(self.base_path.join(key))
    }
}

/// `<uuid>.<ext>` keeping a sanitized extension so the staged file keeps its type.
fn generate_key(file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase());

    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store_file(
        &self,
        data: &[u8],
        file_name: &str,
    ) -> Result<StoredFile, FileStorageError> {
        self.ensure_directory_exists().await?;

        let key = generate_key(file_name);
        let file_path = self.path_for(&key)?;

        fs::write(&file_path, data)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))?;

        Ok(StoredFile {
            key,
            size: data.len() as u64,
        })
    }

    async fn retrieve_file(&self, key: &str) -> Result<Vec<u8>, FileStorageError> {
        let file_path = self.path_for(key)?;

        if !fs::try_exists(&file_path).await.unwrap_or(false) {
            return Err(FileStorageError::FileNotFound(key.to_string()));
        }

        fs::read(&file_path)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))
    }

    async fn delete_file(&self, key: &str) -> Result<bool, FileStorageError> {
        let file_path = self.path_for(key)?;

        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FileStorageError::IoError(e.to_string())),
        }
    }
}

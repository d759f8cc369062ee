use async_trait::async_trait;

#[derive(Debug)]
pub enum FileStorageError {
    FileNotFound(String),
    IoError(String),
    InvalidPath(String),
}

impl std::fmt::Display for FileStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStorageError::FileNotFound(path) => write!(f, "File not found: {}", path),
            FileStorageError::IoError(msg) => write!(f, "IO error: {}", msg),
            FileStorageError::InvalidPath(path) => write!(f, "Invalid path: {}", path),
        }
    }
}

impl std::error::Error for FileStorageError {}

#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Opaque key used to read the bytes back.
    pub key: String,
    pub size: u64,
}

/// Local persistence for uploaded document bytes until they reach the remote store.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store_file(&self, data: &[u8], file_name: &str)
    -> Result<StoredFile, FileStorageError>;

    async fn retrieve_file(&self, key: &str) -> Result<Vec<u8>, FileStorageError>;

    /// Returns false when nothing was stored under `key`.
    async fn delete_file(&self, key: &str) -> Result<bool, FileStorageError>;
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteStoreError {
    /// Transport or HTTP-level failure. `status` is absent when no response arrived.
    Api { status: Option<u16>, body: String },
    NotFound(String),
    InvalidResponse(String),
}

impl RemoteStoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteStoreError::Api { status, .. } => *status,
            RemoteStoreError::NotFound(_) => Some(404),
            RemoteStoreError::InvalidResponse(_) => None,
        }
    }

    pub fn is_retriable(&self) -> bool {
        match self {
            RemoteStoreError::Api { status: None, .. } => true,
            RemoteStoreError::Api {
                status: Some(code), ..
            } => *code >= 500 || *code == 429 || *code == 408,
            RemoteStoreError::NotFound(_) | RemoteStoreError::InvalidResponse(_) => false,
        }
    }
}

impl std::fmt::Display for RemoteStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteStoreError::Api {
                status: Some(code),
                body,
            } => write!(f, "Remote API error ({}): {}", code, body),
            RemoteStoreError::Api { status: None, body } => {
                write!(f, "Remote API unreachable: {}", body)
            }
            RemoteStoreError::NotFound(name) => write!(f, "Remote resource not found: {}", name),
            RemoteStoreError::InvalidResponse(msg) => {
                write!(f, "Invalid remote response: {}", msg)
            }
        }
    }
}

impl std::error::Error for RemoteStoreError {}

/// Name of a long-running remote operation, e.g. `fileSearchStores/x/operations/y`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationHandle(pub String);

impl OperationHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure reported by the remote service on a finished operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteOperationError {
    pub code: Option<i32>,
    pub message: String,
}

impl std::fmt::Display for RemoteOperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "Remote operation failed ({}): {}", code, self.message),
            None => write!(f, "Remote operation failed: {}", self.message),
        }
    }
}

impl std::error::Error for RemoteOperationError {}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationStatus {
    pub done: bool,
    pub error: Option<RemoteOperationError>,
    /// Raw response payload of a finished operation.
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub name: String,
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub state: Option<String>,
}

#[async_trait]
pub trait RemoteStoreClient: Send + Sync {
    async fn create_store(&self, display_name: &str) -> Result<String, RemoteStoreError>;

    /// Deleting a store that no longer exists succeeds.
    async fn delete_store(&self, remote_name: &str) -> Result<(), RemoteStoreError>;

    async fn upload_document(
        &self,
        file_path: &Path,
        store_remote_name: &str,
        display_name: &str,
        mime_type: &str,
    ) -> Result<OperationHandle, RemoteStoreError>;

    async fn get_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, RemoteStoreError>;

    /// Deleting a document that no longer exists succeeds.
    async fn delete_document(&self, remote_path: &str) -> Result<(), RemoteStoreError>;

    /// Returns `RemoteStoreError::NotFound` when the document does not exist.
    async fn find_document(&self, remote_path: &str) -> Result<RemoteDocument, RemoteStoreError>;
}

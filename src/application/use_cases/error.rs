use crate::application::ports::event_bus::EventBusError;
use crate::application::ports::file_storage::FileStorageError;
use crate::application::ports::job_queue::JobQueueError;
use crate::domain::repositories::RepositoryError;

#[derive(Debug, Clone, PartialEq)]
pub enum UseCaseError {
    /// Input rejected locally. Never retried.
    ValidationError(String),
    NotFound(String),
    /// The request collides with existing state (duplicate content, busy chat).
    Conflict(String),
    RepositoryError(String),
    StorageError(String),
    DispatchError(String),
}

impl std::fmt::Display for UseCaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UseCaseError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            UseCaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            UseCaseError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            UseCaseError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            UseCaseError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            UseCaseError::DispatchError(msg) => write!(f, "Dispatch error: {}", msg),
        }
    }
}

impl std::error::Error for UseCaseError {}

impl From<RepositoryError> for UseCaseError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(id) => UseCaseError::NotFound(id.to_string()),
            RepositoryError::ValidationError(msg) => UseCaseError::ValidationError(msg),
            RepositoryError::DuplicateError(msg) => UseCaseError::Conflict(msg),
            RepositoryError::DatabaseError(msg) => UseCaseError::RepositoryError(msg),
        }
    }
}

impl From<FileStorageError> for UseCaseError {
    fn from(error: FileStorageError) -> Self {
        UseCaseError::StorageError(error.to_string())
    }
}

impl From<EventBusError> for UseCaseError {
    fn from(error: EventBusError) -> Self {
        UseCaseError::DispatchError(error.to_string())
    }
}

impl From<JobQueueError> for UseCaseError {
    fn from(error: JobQueueError) -> Self {
        UseCaseError::DispatchError(error.to_string())
    }
}

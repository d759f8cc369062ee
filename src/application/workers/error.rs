use crate::application::ports::chat_model::ChatCompletionError;
use crate::application::ports::event_bus::EventBusError;
use crate::application::ports::file_storage::FileStorageError;
use crate::application::ports::remote_store::RemoteStoreError;
use crate::application::services::PollError;
use crate::domain::repositories::RepositoryError;

#[derive(Debug)]
pub enum WorkerError {
    Repository(RepositoryError),
    Remote(RemoteStoreError),
    Poll(PollError),
    Chat(ChatCompletionError),
    Storage(FileStorageError),
    EventBus(EventBusError),
    /// The remote service answered without the fields we need.
    InvalidResponse(String),
    /// The entity is in a state the job cannot act on.
    InvalidState(String),
    NotFound(String),
    /// A remote document outlived its local record and must be removed by hand.
    OrphanedRemote { remote_path: String, reason: String },
    Io(String),
}

impl WorkerError {
    /// Whether redelivering the job could succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            WorkerError::Repository(RepositoryError::DatabaseError(_)) => true,
            WorkerError::Repository(_) => false,
            WorkerError::Remote(e) => e.is_retriable(),
            WorkerError::Poll(e) => e.is_retriable(),
            WorkerError::Chat(e) => e.is_retriable(),
            WorkerError::Storage(FileStorageError::IoError(_)) => true,
            WorkerError::Storage(_) => false,
            WorkerError::EventBus(_) => true,
            WorkerError::Io(_) => true,
            WorkerError::InvalidResponse(_)
            | WorkerError::InvalidState(_)
            | WorkerError::NotFound(_)
            | WorkerError::OrphanedRemote { .. } => false,
        }
    }
}

impl std::fmt::Display for WorkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerError::Repository(e) => write!(f, "{}", e),
            WorkerError::Remote(e) => write!(f, "{}", e),
            WorkerError::Poll(e) => write!(f, "{}", e),
            WorkerError::Chat(e) => write!(f, "{}", e),
            WorkerError::Storage(e) => write!(f, "Storage error: {}", e),
            WorkerError::EventBus(e) => write!(f, "{}", e),
            WorkerError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            WorkerError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            WorkerError::NotFound(msg) => write!(f, "Not found: {}", msg),
            WorkerError::OrphanedRemote {
                remote_path,
                reason,
            } => write!(f, "Orphaned remote document {}: {}", remote_path, reason),
            WorkerError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for WorkerError {}

impl From<RepositoryError> for WorkerError {
    fn from(err: RepositoryError) -> Self {
        WorkerError::Repository(err)
    }
}

impl From<RemoteStoreError> for WorkerError {
    fn from(err: RemoteStoreError) -> Self {
        WorkerError::Remote(err)
    }
}

impl From<PollError> for WorkerError {
    fn from(err: PollError) -> Self {
        WorkerError::Poll(err)
    }
}

impl From<ChatCompletionError> for WorkerError {
    fn from(err: ChatCompletionError) -> Self {
        WorkerError::Chat(err)
    }
}

impl From<FileStorageError> for WorkerError {
    fn from(err: FileStorageError) -> Self {
        WorkerError::Storage(err)
    }
}

impl From<EventBusError> for WorkerError {
    fn from(err: EventBusError) -> Self {
        WorkerError::EventBus(err)
    }
}

impl From<std::io::Error> for WorkerError {
    fn from(err: std::io::Error) -> Self {
        WorkerError::Io(err.to_string())
    }
}

pub mod chat_turn;
pub mod document_sync;
pub mod error;
pub mod job_router;
pub mod store_lifecycle;

pub use chat_turn::{ChatConfig, ChatTurnProcessor, TurnOutcome};
pub use document_sync::{DocumentSyncWorker, UploadReceipt};
pub use error::WorkerError;
pub use job_router::{JobExecutor, JobRouter};
pub use store_lifecycle::StoreLifecycleWorker;

pub mod broadcaster;
pub mod chat_model;
pub mod event_bus;
pub mod file_storage;
pub mod job_queue;
pub mod remote_store;

pub use broadcaster::Broadcaster;
pub use chat_model::ChatModel;
pub use event_bus::EventBus;
pub use file_storage::FileStorage;
pub use job_queue::JobQueue;
pub use remote_store::RemoteStoreClient;

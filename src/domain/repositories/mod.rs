pub mod chat_repository;
pub mod document_repository;
pub mod error;
pub mod store_repository;

pub use chat_repository::{ChatRepository, CitationRepository, MessageRepository};
pub use document_repository::DocumentRepository;
pub use error::RepositoryError;
pub use store_repository::StoreRepository;

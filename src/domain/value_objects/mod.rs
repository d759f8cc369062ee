pub mod content_hash;
pub mod content_type;
pub mod document_metadata;
pub mod document_status;
pub mod message_status;
pub mod owner;
pub mod store_status;
pub mod token_usage;

pub use content_hash::ContentHash;
pub use document_metadata::DocumentMetadata;
pub use document_status::DocumentStatus;
pub use message_status::{MessageRole, MessageStatus};
pub use owner::Owner;
pub use store_status::StoreStatus;
pub use token_usage::TokenUsage;

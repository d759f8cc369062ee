pub mod chat_model;
pub mod document_model;
pub mod store_model;

pub use chat_model::*;
pub use document_model::*;
pub use store_model::*;

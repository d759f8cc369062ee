pub mod in_memory_file_storage;
pub mod local_file_storage;

pub use in_memory_file_storage::InMemoryFileStorage;
pub use local_file_storage::LocalFileStorage;

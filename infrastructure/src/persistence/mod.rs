pub mod in_memory_store;
pub mod json_file_store;

// Re-export both store types
pub use in_memory_store::InMemoryBookStore;
pub use json_file_store::JsonFileBookStore;

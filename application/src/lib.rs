use async_trait::async_trait;
use domain::{Book, DomainError};
use std::time::Duration;
use thiserror::Error;

pub mod catalog;
pub mod search;
pub mod stats;

pub use catalog::CatalogService;
pub use search::SearchOptions;
pub use stats::{StatsResponse, StatsService};

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Stored catalog could not be decoded: {0}")]
    DecodeError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Search did not finish within {0:?}")]
    SearchTimedOut(Duration),
    #[error("Search failed: {0}")]
    SearchError(String),
    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
    #[error("Domain validation error: {0}")]
    DomainError(#[from] DomainError), // Propagate domain errors cleanly
}

// --- Infrastructure Interfaces (Traits) ---

/// Persistence gateway for the whole book collection.
///
/// Implementations store full snapshots: `save` replaces everything that was
/// stored before and `load` returns everything at once. Nothing is appended
/// or versioned.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Reads the full collection. A store that holds no data yet yields an
    /// empty collection; malformed content is a `DecodeError`.
    async fn load(&self) -> Result<Vec<Book>, ApplicationError>;
    /// Overwrites the stored collection. A concurrent `load` never observes
    /// a partially written snapshot.
    async fn save(&self, books: &[Book]) -> Result<(), ApplicationError>;
    /// Human-readable location of the backing store (path, "memory", ...).
    fn location(&self) -> String;
    /// Size in bytes of the persisted snapshot, when the store can tell.
    async fn stored_bytes(&self) -> Option<u64> {
        None
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::NaiveDate;
    use domain::BookId;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-process store that records every snapshot and can be told to fail.
    #[derive(Default)]
    pub struct RecordingStore {
        pub initial: Vec<Book>,
        pub saved: Mutex<Vec<Book>>,
        pub saves: AtomicUsize,
        pub fail_saves: AtomicBool,
    }

    impl RecordingStore {
        pub fn with_books(initial: Vec<Book>) -> Self {
            Self {
                initial,
                ..Self::default()
            }
        }

        pub fn last_saved(&self) -> Vec<Book> {
            self.saved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BookStore for RecordingStore {
        async fn load(&self) -> Result<Vec<Book>, ApplicationError> {
            Ok(self.initial.clone())
        }

        async fn save(&self, books: &[Book]) -> Result<(), ApplicationError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(ApplicationError::StorageUnavailable(
                    "disk full".to_string(),
                ));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.saved.lock().unwrap() = books.to_vec();
            Ok(())
        }

        fn location(&self) -> String {
            "recording".to_string()
        }
    }

    pub fn book(id: &str, title: &str, description: &str) -> Book {
        Book {
            id: BookId::from(id),
            author_id: "author".to_string(),
            publisher_id: "publisher".to_string(),
            title: title.to_string(),
            publication_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            isbn: "isbn".to_string(),
            pages: 100,
            genre: "genre".to_string(),
            description: description.to_string(),
            price: 9.5,
            quantity: 1,
        }
    }
}

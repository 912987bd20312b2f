// ./infrastructure/src/persistence/in_memory_store.rs
use application::{ApplicationError, BookStore};
use async_trait::async_trait;
use domain::Book;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Keeps the last saved snapshot in process memory. Nothing survives a
/// restart; useful for tests and throwaway runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookStore {
    snapshot: Arc<RwLock<Vec<Book>>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that starts out holding `books`.
    pub fn seeded(books: Vec<Book>) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(books)),
        }
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    #[instrument(skip(self))]
    async fn load(&self) -> Result<Vec<Book>, ApplicationError> {
        let books = self.snapshot.read().await.clone();
        debug!(count = books.len(), "Loading books from in-memory store");
        Ok(books)
    }

    #[instrument(skip(self, books))]
    async fn save(&self, books: &[Book]) -> Result<(), ApplicationError> {
        debug!(count = books.len(), "Saving books to in-memory store");
        // Swapping under the write lock keeps load() from seeing a half copy.
        *self.snapshot.write().await = books.to_vec();
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use domain::BookId;

    fn book(id: &str) -> Book {
        Book {
            id: BookId::from(id),
            author_id: String::new(),
            publisher_id: String::new(),
            title: format!("Title {id}"),
            publication_date: NaiveDate::from_ymd_opt(2010, 6, 1).unwrap(),
            isbn: String::new(),
            pages: 1,
            genre: String::new(),
            description: String::new(),
            price: 0.0,
            quantity: 0,
        }
    }

    #[tokio::test]
    async fn new_store_is_empty() {
        assert!(InMemoryBookStore::new().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_replaces_snapshot() {
        let store = InMemoryBookStore::seeded(vec![book("1"), book("2")]);
        store.save(&[book("3")]).await.unwrap();
        assert_eq!(store.load().await.unwrap(), vec![book("3")]);
    }

    #[tokio::test]
    async fn clones_share_the_snapshot() {
        let store = InMemoryBookStore::new();
        let other = store.clone();
        store.save(&[book("1")]).await.unwrap();
        assert_eq!(other.load().await.unwrap().len(), 1);
    }
}

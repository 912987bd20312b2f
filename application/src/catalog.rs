use crate::search::{SearchOptions, parallel_search};
use crate::{ApplicationError, BookStore};
use domain::{Book, BookId, Keyword};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

/// Hands out time-derived identifiers that never repeat within the process.
#[derive(Debug, Default)]
struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    /// Nanoseconds since the Unix epoch, bumped past the previous value when
    /// two calls land on the same tick.
    fn next(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(0);
        match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            }) {
            Ok(previous) | Err(previous) => now.max(previous + 1),
        }
    }
}

/// The book catalog: owns the in-memory collection and keeps the store in
/// sync with it.
///
/// Writers hold the lock exclusively for the mutation and the save that
/// follows it. Readers and searches take it shared. The collection sits in an
/// `Arc` so a search can keep scanning its snapshot after the lock is
/// released; a writer only copies the vector while such a snapshot is alive.
///
/// When a save fails the mutation is rolled back, so memory never runs ahead
/// of what is on disk.
pub struct CatalogService {
    store: Arc<dyn BookStore>,
    books: RwLock<Arc<Vec<Book>>>,
    ids: IdGenerator,
    search_options: SearchOptions,
}

impl CatalogService {
    /// Builds the catalog from whatever the store currently holds.
    #[instrument(skip(store, search_options), fields(store = %store.location()))]
    pub async fn load(
        store: Arc<dyn BookStore>,
        search_options: SearchOptions,
    ) -> Result<Self, ApplicationError> {
        let books = store.load().await.map_err(|e| {
            error!("Failed to load catalog: {}", e);
            e
        })?;
        info!(count = books.len(), "Catalog loaded");
        Ok(Self {
            store,
            books: RwLock::new(Arc::new(books)),
            ids: IdGenerator::default(),
            search_options,
        })
    }

    pub fn search_options(&self) -> SearchOptions {
        self.search_options
    }

    pub fn store_location(&self) -> String {
        self.store.location()
    }

    pub async fn stored_bytes(&self) -> Option<u64> {
        self.store.stored_bytes().await
    }

    #[instrument(skip(self, book), fields(title = %book.title))]
    pub async fn create(&self, book: Book) -> Result<Book, ApplicationError> {
        let mut books = self.books.write().await;

        if !book.id().is_empty() {
            debug!(supplied_id = %book.id(), "Ignoring caller-supplied identifier on create");
        }
        let id = self.fresh_id(&books);
        let book = book.with_id(id);

        Arc::make_mut(&mut *books).push(book.clone());
        if let Err(e) = self.persist(&books).await {
            Arc::make_mut(&mut *books).pop();
            return Err(e);
        }

        info!(book_id = %book.id(), count = books.len(), "Book created");
        Ok(book)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &BookId) -> Result<Option<Book>, ApplicationError> {
        let books = self.books.read().await;
        let found = books.iter().find(|book| book.id() == id).cloned();
        if found.is_none() {
            debug!(book_id = %id, "Book not found");
        }
        Ok(found)
    }

    /// Replaces the book stored under `id`. The stored identifier stays `id`
    /// whatever the payload carries.
    #[instrument(skip(self, book))]
    pub async fn update(&self, id: &BookId, book: Book) -> Result<Option<Book>, ApplicationError> {
        let mut books = self.books.write().await;

        let Some(position) = books.iter().position(|stored| stored.id() == id) else {
            debug!(book_id = %id, "Update target not found");
            return Ok(None);
        };
        if !book.id().is_empty() && book.id() != id {
            warn!(book_id = %id, payload_id = %book.id(), "Payload identifier differs from path, keeping the stored one");
        }
        let book = book.with_id(id.clone());

        let previous = std::mem::replace(&mut Arc::make_mut(&mut *books)[position], book.clone());
        if let Err(e) = self.persist(&books).await {
            Arc::make_mut(&mut *books)[position] = previous;
            return Err(e);
        }

        info!(book_id = %id, "Book updated");
        Ok(Some(book))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &BookId) -> Result<bool, ApplicationError> {
        let mut books = self.books.write().await;

        let Some(position) = books.iter().position(|stored| stored.id() == id) else {
            debug!(book_id = %id, "Delete target not found");
            return Ok(false);
        };

        let removed = Arc::make_mut(&mut *books).remove(position);
        if let Err(e) = self.persist(&books).await {
            Arc::make_mut(&mut *books).insert(position, removed);
            return Err(e);
        }

        info!(book_id = %id, count = books.len(), "Book deleted");
        Ok(true)
    }

    /// Owned copy of the whole collection, in insertion order.
    pub async fn get_all(&self) -> Vec<Book> {
        let books = self.books.read().await;
        books.to_vec()
    }

    pub async fn count(&self) -> usize {
        self.books.read().await.len()
    }

    /// Every book whose title or description contains `keyword`, ignoring
    /// case, in collection order.
    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str) -> Result<Vec<Book>, ApplicationError> {
        let keyword = Keyword::parse(keyword)?;
        let snapshot = Arc::clone(&*self.books.read().await);
        let hits = parallel_search(snapshot, &keyword, self.search_options).await?;
        info!(keyword = %keyword, hits = hits.len(), "Search finished");
        Ok(hits)
    }

    fn fresh_id(&self, books: &[Book]) -> BookId {
        loop {
            let candidate = BookId::new(self.ids.next().to_string());
            if !books.iter().any(|book| book.id() == &candidate) {
                return candidate;
            }
            debug!(candidate = %candidate, "Generated identifier already taken, drawing another");
        }
    }

    async fn persist(&self, books: &[Book]) -> Result<(), ApplicationError> {
        self.store.save(books).await.map_err(|e| {
            error!(store = %self.store.location(), "Failed to persist catalog, rolling back: {}", e);
            e
        })
    }
}

// ./infrastructure/src/persistence/json_file_store.rs
use application::{ApplicationError, BookStore};
use async_trait::async_trait;
use domain::Book;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Stores the whole catalog as one pretty-printed JSON array.
///
/// Saves go to a sibling `<file>.tmp` first and are then renamed over the
/// target, so readers see either the previous snapshot or the new one.
#[derive(Debug, Clone)]
pub struct JsonFileBookStore {
    path: PathBuf,
}

impl JsonFileBookStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn unavailable(&self, action: &str, e: std::io::Error) -> ApplicationError {
        ApplicationError::StorageUnavailable(format!(
            "cannot {} '{}': {}",
            action,
            self.path.display(),
            e
        ))
    }
}

#[async_trait]
impl BookStore for JsonFileBookStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Vec<Book>, ApplicationError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Data file does not exist yet, starting with an empty catalog");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.unavailable("read", e)),
        };

        // A file that was created but never written holds no books.
        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!("Data file is empty, starting with an empty catalog");
            return Ok(Vec::new());
        }

        let books: Vec<Book> = serde_json::from_slice(&bytes).map_err(|e| {
            ApplicationError::DecodeError(format!("'{}': {}", self.path.display(), e))
        })?;
        debug!(count = books.len(), "Loaded books from data file");
        Ok(books)
    }

    #[instrument(skip(self, books), fields(path = %self.path.display(), count = books.len()))]
    async fn save(&self, books: &[Book]) -> Result<(), ApplicationError> {
        let bytes = serde_json::to_vec_pretty(books).map_err(|e| {
            ApplicationError::InfrastructureError(format!("cannot encode catalog: {}", e))
        })?;

        let temp_path = self.temp_path();
        if let Err(e) = tokio::fs::write(&temp_path, &bytes).await {
            return Err(self.unavailable("write", e));
        }
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                warn!(temp = %temp_path.display(), "Could not remove temp file: {}", cleanup);
            }
            return Err(self.unavailable("replace", e));
        }

        debug!(bytes = bytes.len(), "Catalog snapshot written");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn stored_bytes(&self) -> Option<u64> {
        tokio::fs::metadata(&self.path)
            .await
            .ok()
            .map(|meta| meta.len())
    }
}

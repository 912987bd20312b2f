//! Chunked keyword search over a catalog snapshot.
//!
//! The snapshot is split into contiguous chunks, every chunk is scanned on
//! its own blocking worker, and the per-chunk matches are merged back in
//! chunk order. The merged result is identical to a sequential scan no
//! matter which worker finishes first.

use crate::ApplicationError;
use domain::{Book, Keyword};
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, instrument, trace, warn};

/// Worker count used when none is configured.
pub const DEFAULT_SEARCH_WORKERS: usize = 4;

/// Tuning knobs for [`parallel_search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Upper bound on the number of chunks (and therefore workers).
    pub workers: usize,
    /// Give up waiting for workers after this long. `None` waits for all.
    pub timeout: Option<Duration>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_SEARCH_WORKERS,
            timeout: None,
        }
    }
}

/// Splits `0..len` into at most `chunks` contiguous, non-overlapping ranges.
///
/// The chunk size is rounded up so the ranges always cover the full extent;
/// the last range is clamped to `len` and absorbs the remainder.
pub fn chunk_ranges(len: usize, chunks: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let chunk_size = len.div_ceil(chunks.max(1));
    (0..len)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(len))
        .collect()
}

/// Sequential scan, preserving the input order.
pub fn scan(books: &[Book], keyword: &Keyword) -> Vec<Book> {
    books
        .iter()
        .filter(|book| book.matches(keyword))
        .cloned()
        .collect()
}

/// One write-once slot per chunk; the single place worker results land.
struct ResultSlots {
    slots: Vec<Option<Vec<Book>>>,
}

impl ResultSlots {
    fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    fn fill(&mut self, index: usize, matches: Vec<Book>) {
        debug_assert!(self.slots[index].is_none(), "chunk {index} reported twice");
        self.slots[index] = Some(matches);
    }

    /// Concatenates slots in ascending chunk order.
    fn into_merged(self) -> Vec<Book> {
        self.slots.into_iter().flatten().flatten().collect()
    }
}

/// Scans `snapshot` concurrently and returns every match in collection order.
#[instrument(skip(snapshot, options), fields(keyword = %keyword, size = snapshot.len()))]
pub async fn parallel_search(
    snapshot: Arc<Vec<Book>>,
    keyword: &Keyword,
    options: SearchOptions,
) -> Result<Vec<Book>, ApplicationError> {
    let ranges = chunk_ranges(snapshot.len(), options.workers);
    if ranges.is_empty() {
        debug!("Empty snapshot, nothing to scan");
        return Ok(Vec::new());
    }
    debug!(chunks = ranges.len(), "Dispatching search workers");

    let mut workers = JoinSet::new();
    for (index, range) in ranges.iter().cloned().enumerate() {
        let snapshot = Arc::clone(&snapshot);
        let keyword = keyword.clone();
        workers.spawn_blocking(move || {
            trace!(chunk = index, start = range.start, end = range.end, "Scanning chunk");
            (index, scan(&snapshot[range], &keyword))
        });
    }

    let mut slots = ResultSlots::new(ranges.len());
    let collect = async {
        while let Some(joined) = workers.join_next().await {
            let (index, matches) = joined.map_err(|e| {
                warn!("Search worker did not complete: {}", e);
                ApplicationError::SearchError(format!("worker failed: {}", e))
            })?;
            slots.fill(index, matches);
        }
        Ok::<_, ApplicationError>(())
    };

    match options.timeout {
        Some(limit) => tokio::time::timeout(limit, collect)
            .await
            .map_err(|_| {
                warn!(timeout_ms = limit.as_millis() as u64, "Search timed out");
                ApplicationError::SearchTimedOut(limit)
            })??,
        None => collect.await?,
    }

    let merged = slots.into_merged();
    debug!(hits = merged.len(), "Search workers finished");
    Ok(merged)
}

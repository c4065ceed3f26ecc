use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use trailmark_store::IssueRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub keys: usize,
    pub hits: usize,
    pub fetches: usize,
    pub errors: usize,
}

/// Issue records memoized by ticket key for the lifetime of one run.
///
/// The first caller for a key inserts an empty cell under the lock and then
/// initializes it outside the lock; concurrent callers for the same key wait
/// on that cell, so each key is fetched at most once. Failed fetches are
/// stored as error records and never retried.
#[derive(Debug, Default)]
pub struct IssueCache {
    cells: Mutex<HashMap<String, Arc<OnceCell<IssueRecord>>>>,
    hits: AtomicUsize,
    fetches: AtomicUsize,
    errors: AtomicUsize,
}

impl IssueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> IssueRecord
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = IssueRecord>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(key.to_owned()).or_default().clone()
        };

        let mut fetched = false;
        let flag = &mut fetched;
        let record = cell
            .get_or_init(|| async move {
                *flag = true;
                fetch().await
            })
            .await;

        if fetched {
            self.fetches.fetch_add(1, Ordering::Relaxed);
            if record.is_error() {
                self.errors.fetch_add(1, Ordering::Relaxed);
            }
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key, "issue cache hit");
        }

        record.clone()
    }

    pub async fn stats(&self) -> CacheStats {
        let keys = self.cells.lock().await.len();
        CacheStats {
            keys,
            hits: self.hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

//! Lazy Initialization
//!
//! Memoizes an expensive asynchronous setup (such as opening a connection)
//! per target key.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

// == Lazy Init ==
/// Keyed, lazily initialized values.
///
/// The first caller for a key runs the initializer; concurrent callers for the
/// same key wait for that attempt instead of starting their own. A failed
/// attempt is not memoized, so the next caller tries again.
pub struct LazyInit<T> {
    cells: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
}

impl<T: Clone> LazyInit<T> {
    /// Creates an empty initializer.
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the value for `key`, running `init` if it is not set yet.
    pub async fn get_or_try_init<F, Fut, E>(&self, key: &str, init: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(key.to_string()).or_default().clone()
        };

        let value = cell.get_or_try_init(init).await?;
        Ok(value.clone())
    }

    /// True once a value has been memoized for `key`.
    pub async fn is_initialized(&self, key: &str) -> bool {
        self.cells
            .lock()
            .await
            .get(key)
            .is_some_and(|cell| cell.initialized())
    }

    /// Forgets every memoized value so the next call re-initializes.
    pub async fn reset(&self) {
        self.cells.lock().await.clear();
    }
}

impl<T: Clone> Default for LazyInit<T> {
    fn default() -> Self {
        Self::new()
    }
}

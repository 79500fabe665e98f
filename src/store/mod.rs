//! Persistence port: the narrow seam between the connector and a triple store.
//!
//! Reads return the store's raw answer in the requested format; writes report a
//! [`WriteOutcome`] instead of failing, so a store-side rejection and a
//! transport failure stay distinguishable.

pub mod http;
pub mod memory;
pub mod results;

use std::sync::Arc;

pub use http::HttpStore;
pub use memory::MemoryStore;
pub use results::{RdfTerm, ResultTable, Row};

use crate::config::ConnectConfig;
use crate::error::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Graph-shaped answers (CONSTRUCT/DESCRIBE).
pub const ACCEPT_TURTLE: &str = "text/turtle";
pub const ACCEPT_NTRIPLES: &str = "application/n-triples";
/// Tabular answers (SELECT/ASK).
pub const ACCEPT_RESULTS_JSON: &str = "application/sparql-results+json";

/// Result of a write: whether the store accepted it, and what it said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub ok: bool,
    pub message: String,
}

impl WriteOutcome {
    pub fn accepted() -> Self {
        Self {
            ok: true,
            message: String::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// A triple store reachable through SPARQL query and update.
pub trait GraphStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Run a query, returning the raw response body in `accept` format.
    fn read(&self, query: &str, accept: &str) -> StoreResult<String>;

    /// Run an update.
    fn write(&self, update: &str) -> StoreResult<WriteOutcome>;

    /// Whether the store answers its health check right now.
    fn check_connectivity(&self) -> bool;
}

impl<T: GraphStore + ?Sized> GraphStore for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn read(&self, query: &str, accept: &str) -> StoreResult<String> {
        (**self).read(query, accept)
    }

    fn write(&self, update: &str) -> StoreResult<WriteOutcome> {
        (**self).write(update)
    }

    fn check_connectivity(&self) -> bool {
        (**self).check_connectivity()
    }
}

/// Block until the store answers its health check.
///
/// Retries with a fixed delay; gives up only when `max_attempts` is set.
pub fn wait_until_available(store: &dyn GraphStore, connect: &ConnectConfig) -> StoreResult<()> {
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        if store.check_connectivity() {
            tracing::info!(backend = store.name(), attempts, "connected to triple store");
            return Ok(());
        }
        tracing::warn!(
            backend = store.name(),
            attempt = attempts,
            retry_in_ms = connect.retry_delay_ms,
            "triple store not reachable"
        );
        if connect.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(StoreError::ConnectExhausted { attempts });
        }
        std::thread::sleep(connect.retry_delay());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        calls: AtomicU32,
        up_after: u32,
    }

    impl GraphStore for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }
        fn read(&self, _: &str, _: &str) -> StoreResult<String> {
            Ok(String::new())
        }
        fn write(&self, _: &str) -> StoreResult<WriteOutcome> {
            Ok(WriteOutcome::accepted())
        }
        fn check_connectivity(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.up_after
        }
    }

    fn fast(max_attempts: Option<u32>) -> ConnectConfig {
        ConnectConfig {
            retry_delay_ms: 1,
            max_attempts,
        }
    }

    #[test]
    fn retries_until_reachable() {
        let store = Flaky {
            calls: AtomicU32::new(0),
            up_after: 3,
        };
        wait_until_available(&store, &fast(None)).unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn bounded_retries_give_up() {
        let store = Flaky {
            calls: AtomicU32::new(0),
            up_after: u32::MAX,
        };
        let err = wait_until_available(&store, &fast(Some(2))).unwrap_err();
        assert!(matches!(err, StoreError::ConnectExhausted { attempts: 2 }));
    }
}

//! Existence lookups used by database-backed validators.
//!
//! Validators call the blocking [`Lookup`] with the time they have left.
//! Async backends implement [`AsyncLookup`] and are bridged into the
//! blocking seam with [`BlockingLookup`].

use crate::error::LookupError;
use crate::value::Value;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;

/// Blocking existence check.
pub trait Lookup: Send + Sync {
    /// Whether `value` exists in `scope` (a table, a column, a key space).
    ///
    /// Implementations must give up after `timeout`.
    fn exists(&self, scope: &str, value: &Value, timeout: Duration) -> Result<bool, LookupError>;
}

/// Async existence check.
#[async_trait]
pub trait AsyncLookup: Send + Sync {
    async fn exists(&self, scope: &str, value: &Value) -> Result<bool, LookupError>;
}

/// Runs an [`AsyncLookup`] on a tokio runtime from blocking code.
///
/// Works from plain threads, from the blocking pool [`crate::validate_async`]
/// runs on, and from worker threads of a multi-threaded runtime. Called
/// from a current-thread runtime it cannot block, and the lookup fails
/// with [`LookupError::Unavailable`].
pub struct BlockingLookup<L> {
    inner: Arc<L>,
    handle: Handle,
}

impl<L: AsyncLookup + 'static> BlockingLookup<L> {
    pub fn new(inner: L, handle: Handle) -> Self {
        Self {
            inner: Arc::new(inner),
            handle,
        }
    }

    /// Bridge bound to the runtime of the calling task.
    pub fn current(inner: L) -> Self {
        Self::new(inner, Handle::current())
    }
}

impl<L: AsyncLookup + 'static> Lookup for BlockingLookup<L> {
    fn exists(&self, scope: &str, value: &Value, timeout: Duration) -> Result<bool, LookupError> {
        let lookup = self.inner.exists(scope, value);
        let run = || {
            self.handle.block_on(async move {
                match tokio::time::timeout(timeout, lookup).await {
                    Ok(result) => result,
                    Err(_) => {
                        debug!(scope = scope, timeout_ms = timeout.as_millis() as u64, "lookup timed out");
                        Err(LookupError::Timeout(timeout))
                    }
                }
            })
        };

        match Handle::try_current().map(|current| current.runtime_flavor()) {
            Err(_) => run(),
            Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(run),
            Ok(_) => {
                debug!(scope = scope, "blocking lookup called on a current-thread runtime");
                Err(LookupError::Unavailable(
                    "blocking lookup called from async context".into(),
                ))
            }
        }
    }
}

/// In-memory lookup keyed by scope, for tests and fixtures.
#[derive(Debug, Default)]
pub struct MemoryLookup {
    entries: RwLock<HashMap<String, HashSet<String>>>,
}

impl MemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, scope: &str, value: impl Into<Value>) -> Self {
        self.insert(scope, value);
        self
    }

    pub fn insert(&self, scope: &str, value: impl Into<Value>) {
        if let Ok(mut entries) = self.entries.write() {
            entries
                .entry(scope.to_string())
                .or_default()
                .insert(value.into().to_string());
        }
    }
}

impl Lookup for MemoryLookup {
    fn exists(&self, scope: &str, value: &Value, _timeout: Duration) -> Result<bool, LookupError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LookupError::Unavailable("lookup table poisoned".into()))?;
        Ok(entries
            .get(scope)
            .is_some_and(|values| values.contains(&value.to_string())))
    }
}

#[async_trait]
impl AsyncLookup for MemoryLookup {
    async fn exists(&self, scope: &str, value: &Value) -> Result<bool, LookupError> {
        Lookup::exists(self, scope, value, Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow;

    #[async_trait]
    impl AsyncLookup for Slow {
        async fn exists(&self, _scope: &str, _value: &Value) -> Result<bool, LookupError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(true)
        }
    }

    #[test]
    fn test_memory_lookup() {
        let lookup = MemoryLookup::new().with("users", "ada@example.com").with("ids", 7);
        let timeout = Duration::from_millis(10);
        assert!(Lookup::exists(&lookup, "users", &Value::from("ada@example.com"), timeout).unwrap());
        assert!(Lookup::exists(&lookup, "ids", &Value::Int(7), timeout).unwrap());
        assert!(!Lookup::exists(&lookup, "users", &Value::from("bob@example.com"), timeout).unwrap());
        assert!(!Lookup::exists(&lookup, "missing", &Value::Int(7), timeout).unwrap());
    }

    #[test]
    fn test_blocking_bridge() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let bridge = BlockingLookup::new(MemoryLookup::new().with("ids", 1), runtime.handle().clone());
        assert!(bridge.exists("ids", &Value::Int(1), Duration::from_secs(1)).unwrap());
        assert!(!bridge.exists("ids", &Value::Int(2), Duration::from_secs(1)).unwrap());
    }

    #[test]
    fn test_blocking_bridge_times_out() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let bridge = BlockingLookup::new(Slow, runtime.handle().clone());
        let err = bridge
            .exists("ids", &Value::Int(1), Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(err, LookupError::Timeout(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blocking_bridge_on_worker_thread() {
        let bridge = BlockingLookup::current(MemoryLookup::new().with("ids", 1));
        assert!(bridge.exists("ids", &Value::Int(1), Duration::from_secs(1)).unwrap());
        assert!(!bridge.exists("ids", &Value::Int(2), Duration::from_secs(1)).unwrap());
    }

    #[tokio::test]
    async fn test_blocking_bridge_on_current_thread_runtime() {
        let bridge = BlockingLookup::current(MemoryLookup::new().with("ids", 1));
        let err = bridge
            .exists("ids", &Value::Int(1), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, LookupError::Unavailable(_)));
    }

    #[test]
    fn test_memory_lookup_async() {
        let lookup = MemoryLookup::new().with("teams", "core");
        let found = tokio_test::block_on(AsyncLookup::exists(&lookup, "teams", &Value::from("core")));
        assert!(found.unwrap());
    }
}

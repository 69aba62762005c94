//! Mapped diagnostic context (MDC)
//!
//! An ambient key/value store the logging layer can consult to enrich every
//! emitted line with request-scoped fields. The middleware writes exactly
//! one key (the configured MDC key) before invoking downstream processing
//! and removes that same key afterward; it never touches other keys.
//!
//! The middleware talks to the store through the [`LogContext`] trait so the
//! lifecycle logic is testable with a recording stub instead of a real
//! logging backend. [`Mdc`] is the production implementation, backed by the
//! same task-local-with-thread-local-fallback storage as the correlation
//! context.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;

tokio::task_local! {
    static MAP: RefCell<HashMap<String, String>>;
}

thread_local! {
    static FALLBACK: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
}

/// Ambient logging context collaborator
///
/// The middleware only ever calls `put` before downstream invocation and
/// `remove` after it, for the single key it owns.
pub trait LogContext: Send + Sync {
    fn put(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Production [`LogContext`] writing to the task-scoped MDC map
#[derive(Debug, Clone, Copy, Default)]
pub struct Mdc;

impl LogContext for Mdc {
    fn put(&self, key: &str, value: &str) {
        put(key, value);
    }

    fn remove(&self, key: &str) {
        remove(key);
    }
}

/// Stores `value` under `key` in the calling execution unit's MDC map.
pub fn put(key: &str, value: &str) {
    let mut entry = Some((key.to_string(), value.to_string()));
    let in_task = MAP
        .try_with(|map| {
            if let Some((key, value)) = entry.take() {
                map.borrow_mut().insert(key, value);
            }
        })
        .is_ok();
    if !in_task {
        if let Some((key, value)) = entry.take() {
            FALLBACK.with(|map| map.borrow_mut().insert(key, value));
        }
    }
}

/// Returns the value stored under `key` for the calling execution unit.
pub fn get(key: &str) -> Option<String> {
    MAP.try_with(|map| map.borrow().get(key).cloned())
        .unwrap_or_else(|_| FALLBACK.with(|map| map.borrow().get(key).cloned()))
}

/// Removes `key` from the calling execution unit's MDC map.
pub fn remove(key: &str) {
    if MAP.try_with(|map| map.borrow_mut().remove(key)).is_err() {
        FALLBACK.with(|map| map.borrow_mut().remove(key));
    }
}

/// Runs `fut` with a fresh, empty task-local MDC map.
pub async fn scope<F>(fut: F) -> F::Output
where
    F: Future,
{
    MAP.scope(RefCell::new(HashMap::new()), fut).await
}

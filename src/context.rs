//! Per-request correlation context
//!
//! Holds the correlation id for the request currently being processed,
//! isolated per execution unit. Handlers and any code they call can read
//! the active id without threading it through call signatures:
//!
//! ```rust
//! use request_correlation::CorrelationContext;
//!
//! let id = CorrelationContext::current().correlation_id();
//! ```
//!
//! Storage is a task-local cell installed per request by the middleware via
//! [`CorrelationContext::scope`]; the cell is dropped when the request's
//! scope ends, so a reused worker never leaks a previous request's value.
//! Callers running outside any task scope (plain threads, sync tests) fall
//! through to a thread-local cell with the same semantics.

use std::cell::RefCell;
use std::future::Future;

tokio::task_local! {
    static CURRENT: RefCell<Option<String>>;
}

thread_local! {
    static FALLBACK: RefCell<Option<String>> = RefCell::new(None);
}

/// Handle to the calling execution unit's correlation context
#[derive(Debug, Clone, Copy)]
pub struct CorrelationContext;

impl CorrelationContext {
    /// Returns the context handle for the calling execution unit. Never fails.
    pub fn current() -> Self {
        CorrelationContext
    }

    /// Returns the correlation id stored for this execution unit, if any.
    pub fn correlation_id(&self) -> Option<String> {
        CURRENT
            .try_with(|cell| cell.borrow().clone())
            .unwrap_or_else(|_| FALLBACK.with(|cell| cell.borrow().clone()))
    }

    /// Stores `id` as the current correlation id, overwriting any prior value.
    pub fn set_correlation_id(&self, id: impl Into<String>) {
        let mut holder = Some(id.into());
        if CURRENT
            .try_with(|cell| *cell.borrow_mut() = holder.take())
            .is_err()
        {
            FALLBACK.with(|cell| *cell.borrow_mut() = holder.take());
        }
    }

    /// Removes the stored correlation id so a later access starts fresh.
    pub fn clear_current() {
        if CURRENT.try_with(|cell| cell.borrow_mut().take()).is_err() {
            FALLBACK.with(|cell| cell.borrow_mut().take());
        }
    }

    /// Runs `fut` with fresh, empty task-local storage.
    ///
    /// The storage lives exactly as long as `fut`, giving each request its
    /// own cell even when tasks interleave on the same worker thread.
    pub async fn scope<F>(fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT.scope(RefCell::new(None), fut).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear_on_plain_thread() {
        CorrelationContext::clear_current();
        assert_eq!(CorrelationContext::current().correlation_id(), None);

        CorrelationContext::current().set_correlation_id("abc-123");
        assert_eq!(
            CorrelationContext::current().correlation_id(),
            Some("abc-123".to_string())
        );

        CorrelationContext::current().set_correlation_id("def-456"); // Overwrites
        assert_eq!(
            CorrelationContext::current().correlation_id(),
            Some("def-456".to_string())
        );

        CorrelationContext::clear_current();
        assert_eq!(CorrelationContext::current().correlation_id(), None);
    }

    #[tokio::test]
    async fn test_scope_starts_empty_and_drops_value() {
        CorrelationContext::scope(async {
            assert_eq!(CorrelationContext::current().correlation_id(), None);
            CorrelationContext::current().set_correlation_id("scoped");
            assert_eq!(
                CorrelationContext::current().correlation_id(),
                Some("scoped".to_string())
            );
        })
        .await;

        // A new scope on the same task starts fresh
        CorrelationContext::scope(async {
            assert_eq!(CorrelationContext::current().correlation_id(), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_concurrent_tasks_are_isolated() {
        let task_a = tokio::spawn(CorrelationContext::scope(async {
            CorrelationContext::current().set_correlation_id("A");
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            CorrelationContext::current().correlation_id()
        }));
        let task_b = tokio::spawn(CorrelationContext::scope(async {
            CorrelationContext::current().set_correlation_id("B");
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            CorrelationContext::current().correlation_id()
        }));

        let (a, b) = (task_a.await.unwrap(), task_b.await.unwrap());
        assert_eq!(a, Some("A".to_string()));
        assert_eq!(b, Some("B".to_string()));
    }
}

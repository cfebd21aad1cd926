//! Guard keeping synchronous database work off the async worker threads.
//!
//! Diesel and r2d2 are blocking APIs. The only sanctioned way to call them is
//! through [`run_blocking`], which moves the work onto tokio's blocking pool
//! and marks the thread for the duration of the closure. Code that checks out
//! a connection calls [`ensure_blocking_allowed`] first, so a call path that
//! forgets to hop threads fails loudly instead of stalling a worker.

use std::cell::Cell;

use log::error;
use tokio::task;

use super::repository::{ErrorContext, RepositoryError, RepositoryResult};

thread_local! {
    static IN_BLOCKING_SECTION: Cell<bool> = const { Cell::new(false) };
}

/// Resets the thread-local flag even if the closure panics.
struct SectionGuard {
    previous: bool,
}

impl SectionGuard {
    fn enter() -> Self {
        let previous = IN_BLOCKING_SECTION.with(|flag| flag.replace(true));
        Self { previous }
    }
}

impl Drop for SectionGuard {
    fn drop(&mut self) {
        IN_BLOCKING_SECTION.with(|flag| flag.set(self.previous));
    }
}

/// Whether the current thread is inside a blocking section.
pub fn in_blocking_section() -> bool {
    IN_BLOCKING_SECTION.with(Cell::get)
}

/// Fail when called from outside a blocking section.
///
/// `operation` names the blocking call for the log line and error context.
pub fn ensure_blocking_allowed(operation: &str) -> RepositoryResult<()> {
    if in_blocking_section() {
        return Ok(());
    }
    error!(
        "Blocking call '{}' attempted outside a blocking section (thread: {:?})",
        operation,
        std::thread::current().name()
    );
    Err(RepositoryError::blocking_not_allowed(operation))
}

/// Run `f` on the blocking pool and await its result.
pub async fn run_blocking<T, F>(operation: &'static str, f: F) -> RepositoryResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> RepositoryResult<T> + Send + 'static,
{
    task::spawn_blocking(move || {
        let _guard = SectionGuard::enter();
        f()
    })
    .await
    .map_err(|e| {
        RepositoryError::internal_with_context(
            format!("Task join error: {}", e),
            ErrorContext::new(operation).with_details("spawn_blocking"),
        )
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_worker_thread_is_not_a_blocking_section() {
        assert!(!in_blocking_section());
        let err = ensure_blocking_allowed("checkout").unwrap_err();
        assert!(matches!(err, RepositoryError::BlockingNotAllowed { .. }));
        assert_eq!(err.context().operation.as_deref(), Some("checkout"));
    }

    #[tokio::test]
    async fn test_run_blocking_marks_section() {
        let allowed = run_blocking("probe", || {
            ensure_blocking_allowed("probe")?;
            Ok(in_blocking_section())
        })
        .await
        .unwrap();
        assert!(allowed);
        assert!(!in_blocking_section());
    }

    #[tokio::test]
    async fn test_run_blocking_propagates_errors() {
        let result: RepositoryResult<()> =
            run_blocking("failing", || Err(RepositoryError::query("bad sql"))).await;
        assert!(matches!(result, Err(RepositoryError::QueryError { .. })));
    }

    #[tokio::test]
    async fn test_run_blocking_reports_panics_as_internal() {
        let result: RepositoryResult<()> = run_blocking("panicking", || panic!("boom")).await;
        let err = result.unwrap_err();
        assert!(matches!(err, RepositoryError::InternalError { .. }));
        assert_eq!(err.context().operation.as_deref(), Some("panicking"));
    }
}

//! Task bridge: one admission per engine call, sync or async.
//!
//! Every operation follows the same shape. The caller's thread tries to
//! take the book's admission slot; a second caller fails with
//! `OperationPending` before any work is scheduled. Admitted sync work runs
//! on the calling thread; admitted async work moves to the tokio blocking
//! pool, since the engine blocks on file and buffer I/O. The permit travels
//! with the work and is dropped after the handle lock is released, so the
//! slot reopens before the outcome is delivered and never stays taken when
//! a closure panics or a caller stops awaiting.

use std::sync::Arc;

use bookbridge_engine as engine;

use crate::error::{EngineError, Result, ResourceError};
use crate::owner::BookCore;

/// Run `work` on the calling thread under one admission.
pub(crate) fn run_sync<T>(
    core: &Arc<BookCore>,
    op: &'static str,
    work: impl FnOnce(&mut engine::Book) -> Result<T>,
) -> Result<T> {
    let permit = match core.admit() {
        Ok(permit) => permit,
        Err(err) => {
            tracing::debug!(op, "rejected, another operation is pending");
            return Err(err);
        }
    };
    let result = {
        let mut book = permit.core().engine();
        work(&mut book)
    };
    drop(permit);
    if let Err(err) = &result {
        tracing::debug!(op, error = %err, "engine call failed");
    }
    result
}

/// Run an engine call that reports failure by returning false.
pub(crate) fn run_sync_bool(
    core: &Arc<BookCore>,
    op: &'static str,
    call: impl FnOnce(&mut engine::Book) -> bool,
) -> Result<()> {
    run_sync(core, op, |book| {
        if call(book) {
            Ok(())
        } else {
            Err(EngineError::from_book(op, book).into())
        }
    })
}

/// Run an engine call that reports failure by returning `None`.
///
/// `T` cannot borrow from the handle, which forces call sites to copy
/// engine-owned output inside the closure, while the lock is held.
pub(crate) fn run_sync_opt<T>(
    core: &Arc<BookCore>,
    op: &'static str,
    call: impl FnOnce(&mut engine::Book) -> Option<T>,
) -> Result<T> {
    run_sync(core, op, |book| match call(book) {
        Some(value) => Ok(value),
        None => Err(EngineError::from_book(op, book).into()),
    })
}

/// Run an engine call that cannot fail. Admission can still be refused.
pub(crate) fn run_sync_infallible<T>(
    core: &Arc<BookCore>,
    op: &'static str,
    call: impl FnOnce(&mut engine::Book) -> T,
) -> Result<T> {
    run_sync(core, op, |book| Ok(call(book)))
}

/// Run `work` on the blocking pool under one admission.
///
/// The future rejects at its first poll when the slot is taken. Once the
/// work is scheduled it always runs to completion: dropping the returned
/// future abandons the outcome, not the work, and the permit inside the
/// closure keeps the core alive and reopens the slot when the closure
/// finishes. A panic in `work` resumes on the awaiting task after the slot
/// has reopened.
pub(crate) async fn run_blocking<T, F>(
    core: &Arc<BookCore>,
    op: &'static str,
    work: F,
) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut engine::Book) -> Result<T> + Send + 'static,
{
    let permit = match core.admit() {
        Ok(permit) => permit,
        Err(err) => {
            tracing::debug!(op, "rejected, another operation is pending");
            return Err(err);
        }
    };
    tracing::trace!(op, "scheduling on the blocking pool");
    let handle = tokio::task::spawn_blocking(move || {
        let result = {
            let mut book = permit.core().engine();
            work(&mut book)
        };
        // Slot reopens here, before the outcome reaches the caller.
        drop(permit);
        result
    });
    match handle.await {
        Ok(result) => {
            if let Err(err) = &result {
                tracing::debug!(op, error = %err, "engine call failed");
            }
            result
        }
        Err(join_err) => {
            if join_err.is_panic() {
                std::panic::resume_unwind(join_err.into_panic());
            }
            Err(ResourceError::Scheduler(join_err.to_string()).into())
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, UsageError};
    use bookbridge_engine::BookKind;
    use std::sync::mpsc;

    fn new_core() -> Arc<BookCore> {
        BookCore::new(engine::Book::create(BookKind::Binary).unwrap())
    }

    #[test]
    fn test_sync_success_releases_the_slot() {
        let core = new_core();
        let count = run_sync_infallible(&core, "sheet_count", |book| book.sheet_count()).unwrap();
        assert_eq!(count, 0);
        assert!(core.admit().is_ok());
    }

    #[test]
    fn test_sync_failure_carries_engine_diagnostic() {
        let core = new_core();
        let err = run_sync_opt(&core, "sheet_at", |book| book.sheet_at(5)).unwrap_err();
        match err {
            Error::Engine(engine_err) => {
                assert_eq!(engine_err.op, "sheet_at");
                assert!(!engine_err.message.is_empty());
            }
            other => panic!("expected an engine error, got {other:?}"),
        }
        // Failure also releases the slot.
        assert!(core.admit().is_ok());
    }

    #[test]
    fn test_sync_rejected_while_permit_held() {
        let core = new_core();
        let permit = core.admit().unwrap();
        let err = run_sync_infallible(&core, "sheet_count", |book| book.sheet_count()).unwrap_err();
        assert!(matches!(err, Error::Usage(UsageError::OperationPending)));
        drop(permit);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_rejects_while_another_runs() {
        let core = new_core();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();

        let runner = Arc::clone(&core);
        let first = tokio::spawn(async move {
            run_blocking(&runner, "slow", move |book| {
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                Ok(book.sheet_count())
            })
            .await
        });

        started_rx.recv().unwrap();
        let err = run_blocking(&core, "second", |_| Ok(())).await.unwrap_err();
        assert!(matches!(err, Error::Usage(UsageError::OperationPending)));
        let err = run_sync_infallible(&core, "third", |book| book.sheet_count()).unwrap_err();
        assert!(matches!(err, Error::Usage(UsageError::OperationPending)));

        release_tx.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), 0);
        assert!(run_blocking(&core, "after", |_| Ok(())).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panic_resumes_on_caller_and_reopens_slot() {
        let core = new_core();
        let runner = Arc::clone(&core);
        let task = tokio::spawn(async move {
            let _: Result<()> = run_blocking(&runner, "boom", |_| panic!("worker panic")).await;
        });
        let join_err = task.await.unwrap_err();
        assert!(join_err.is_panic());
        // The permit dropped during unwinding, so the slot is open again.
        assert!(run_sync_infallible(&core, "after", |book| book.sheet_count()).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dropped_future_still_runs_the_work() {
        let core = new_core();
        let (done_tx, done_rx) = mpsc::channel();
        {
            let fut = run_blocking(&core, "abandoned", move |book| {
                std::thread::sleep(std::time::Duration::from_millis(50));
                book.add_sheet("FromWorker", None);
                done_tx.send(()).unwrap();
                Ok(())
            });
            let raced = tokio::time::timeout(std::time::Duration::from_millis(5), fut).await;
            assert!(raced.is_err());
        }
        done_rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        // The abandoned task completed and released the slot.
        let count = run_sync_infallible(&core, "sheet_count", |book| book.sheet_count()).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_output_copies_are_taken_under_the_lock() {
        let core = new_core();
        run_sync_opt(&core, "add_sheet", |book| book.add_sheet("Totals", None)).unwrap();
        let name = run_sync_opt(&core, "sheet_name", |book| {
            book.sheet_name(engine::SheetId(0)).map(str::to_string)
        })
        .unwrap();
        assert_eq!(name, "Totals");
    }
}

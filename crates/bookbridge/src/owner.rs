//! Ownership plumbing shared by the owner book and its dependents.
//!
//! Every open book is backed by one [`BookCore`] holding the engine handle
//! and the admission guard. The owner [`Book`] keeps a strong reference;
//! sheets, fonts and formats keep weak ones, so dropping the book
//! invalidates them instead of extending the handle's life. An in-flight
//! task holds its own strong reference through the [`TaskPermit`], which is
//! what keeps the handle alive until scheduled work has finished.
//!
//! [`Book`]: crate::Book

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use bookbridge_engine as engine;

use crate::error::{Result, UsageError};
use crate::guard::PendingGuard;

/// Shared state behind one owner book.
pub(crate) struct BookCore {
    engine: Mutex<Box<engine::Book>>,
    guard: PendingGuard,
}

impl fmt::Debug for BookCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookCore").finish_non_exhaustive()
    }
}

impl BookCore {
    pub(crate) fn new(book: Box<engine::Book>) -> Arc<Self> {
        Arc::new(Self {
            engine: Mutex::new(book),
            guard: PendingGuard::new(),
        })
    }

    /// Admit one operation, or fail fast when another is pending.
    pub(crate) fn admit(self: &Arc<Self>) -> Result<TaskPermit> {
        if !self.guard.admit() {
            return Err(UsageError::OperationPending.into());
        }
        Ok(TaskPermit {
            core: Arc::clone(self),
        })
    }

    /// Lock the engine handle.
    ///
    /// The guard serializes admissions, so this lock is uncontended and a
    /// poisoned state can only mean an earlier admitted operation panicked
    /// after which the slot was already released. The handle itself is
    /// still consistent, so poisoning is recovered rather than propagated.
    pub(crate) fn engine(&self) -> MutexGuard<'_, Box<engine::Book>> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof that one operation was admitted on a book.
///
/// Dropping the permit releases the admission slot. Completion therefore
/// runs exactly once per admission on every path out of a task, including
/// a panicking work closure and a worker whose result is never awaited.
#[derive(Debug)]
pub(crate) struct TaskPermit {
    core: Arc<BookCore>,
}

impl TaskPermit {
    /// The core this permit keeps alive.
    pub(crate) fn core(&self) -> &Arc<BookCore> {
        &self.core
    }
}

impl Drop for TaskPermit {
    fn drop(&mut self) {
        self.core.guard.complete();
    }
}

/// Resolve a dependent's owner, failing once the book has been dropped.
pub(crate) fn upgrade_owner(owner: &Weak<BookCore>) -> Result<Arc<BookCore>> {
    owner.upgrade().ok_or_else(|| UsageError::BookClosed.into())
}

/// Check that a dependent belongs to `core` before its id is used there.
///
/// Identity is the core allocation itself. The weak reference pins the
/// allocation even after its book is dropped, so the comparison cannot be
/// confused by a reused address.
pub(crate) fn require_same_owner(core: &Arc<BookCore>, owner: &Weak<BookCore>) -> Result<()> {
    if std::ptr::eq(Arc::as_ptr(core), Weak::as_ptr(owner)) {
        Ok(())
    } else {
        Err(UsageError::CrossOwner.into())
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use bookbridge_engine::BookKind;

    fn new_core() -> Arc<BookCore> {
        BookCore::new(engine::Book::create(BookKind::Binary).unwrap())
    }

    #[test]
    fn test_permit_drop_releases_the_slot() {
        let core = new_core();
        let permit = core.admit().unwrap();
        assert!(matches!(
            core.admit().unwrap_err(),
            Error::Usage(UsageError::OperationPending)
        ));
        drop(permit);
        assert!(core.admit().is_ok());
    }

    #[test]
    fn test_permit_keeps_core_alive() {
        let core = new_core();
        let weak = Arc::downgrade(&core);
        let permit = core.admit().unwrap();
        drop(core);
        assert!(weak.upgrade().is_some());
        drop(permit);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_same_owner_accepts_own_dependents() {
        let core = new_core();
        let weak = Arc::downgrade(&core);
        assert!(require_same_owner(&core, &weak).is_ok());
    }

    #[test]
    fn test_same_owner_rejects_foreign_dependents() {
        let core_a = new_core();
        let core_b = new_core();
        let weak_b = Arc::downgrade(&core_b);
        assert!(matches!(
            require_same_owner(&core_a, &weak_b).unwrap_err(),
            Error::Usage(UsageError::CrossOwner)
        ));
    }

    #[test]
    fn test_upgrade_fails_after_owner_drop() {
        let core = new_core();
        let weak = Arc::downgrade(&core);
        drop(core);
        assert!(matches!(
            upgrade_owner(&weak).unwrap_err(),
            Error::Usage(UsageError::BookClosed)
        ));
    }

    #[test]
    fn test_engine_lock_recovers_from_poison() {
        let core = new_core();
        let core2 = Arc::clone(&core);
        let _ = std::thread::spawn(move || {
            let _book = core2.engine();
            panic!("poison the handle lock");
        })
        .join();
        let book = core.engine();
        assert_eq!(book.sheet_count(), 0);
    }
}

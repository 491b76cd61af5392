//! Per-book admission state.

use std::sync::atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const BUSY: u8 = 1;

/// Single-flight admission flag for one book.
///
/// At most one operation is admitted at a time; every other attempt fails
/// fast without touching the engine handle. Only the bridge mutates this
/// flag: admission happens on the caller's thread before any work is
/// scheduled, and completion is tied to a permit drop so it runs exactly
/// once per admission, panic or not.
#[derive(Debug)]
pub(crate) struct PendingGuard {
    state: AtomicU8,
}

impl PendingGuard {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    /// Try to take the slot. Returns false when an operation is pending.
    pub(crate) fn admit(&self) -> bool {
        self.state
            .compare_exchange(IDLE, BUSY, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the slot. Called exactly once per successful [`admit`].
    ///
    /// [`admit`]: PendingGuard::admit
    pub(crate) fn complete(&self) {
        self.state.store(IDLE, Ordering::Release);
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_when_idle() {
        let guard = PendingGuard::new();
        assert!(guard.admit());
    }

    #[test]
    fn test_rejects_while_busy() {
        let guard = PendingGuard::new();
        assert!(guard.admit());
        assert!(!guard.admit());
        assert!(!guard.admit());
    }

    #[test]
    fn test_complete_reopens_the_slot() {
        let guard = PendingGuard::new();
        assert!(guard.admit());
        guard.complete();
        assert!(guard.admit());
    }

    #[test]
    fn test_only_one_thread_wins_admission() {
        use std::sync::Arc;

        let guard = Arc::new(PendingGuard::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let guard = Arc::clone(&guard);
            handles.push(std::thread::spawn(move || guard.admit()));
        }
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(wins, 1);
    }
}

//! Error types for the binding layer.
//!
//! Failures fall into three families, and the split is load-bearing for
//! callers: a [`UsageError`] is raised by the binding itself before the
//! engine is ever invoked, an [`EngineError`] carries a diagnostic the
//! engine retained when a call came back with its failure sentinel, and a
//! [`ResourceError`] reports that the binding's own machinery (allocation,
//! the blocking pool) gave out.

use bookbridge_engine as engine;
use thiserror::Error;

/// Result type for all binding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Any error surfaced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The caller misused the binding; the engine was not invoked.
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// The engine executed the call and reported failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The binding could not allocate or schedule.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Caller mistakes detected before any engine work happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// Another operation on the same book was still pending.
    #[error("another operation on this book is still pending")]
    OperationPending,

    /// An object created by one book was passed to a different book.
    #[error("object belongs to a different book")]
    CrossOwner,

    /// The book that owned this object has been dropped.
    #[error("the owning book has been closed")]
    BookClosed,

    /// A caller-supplied value failed validation in the binding.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// An engine call reported failure.
///
/// The engine signals failure through sentinel return values and retains a
/// diagnostic message on the book handle. The binding reads that message
/// while it still holds the handle, so a later call cannot overwrite it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op} failed: {message}")]
pub struct EngineError {
    /// Name of the operation that failed.
    pub op: &'static str,
    /// Diagnostic retained by the engine at the point of failure.
    pub message: String,
}

impl EngineError {
    /// Capture the engine's retained diagnostic for a failed call. Must be
    /// called before the handle is released to the next operation.
    pub(crate) fn from_book(op: &'static str, book: &engine::Book) -> Self {
        let message = book
            .last_error()
            .unwrap_or("engine reported failure without a diagnostic")
            .to_string();
        Self { op, message }
    }
}

/// Failures of the binding's own machinery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The engine could not allocate a new book handle.
    #[error("engine could not allocate a book handle")]
    Allocation,

    /// The blocking task was lost before it could report a result.
    #[error("worker task failed: {0}")]
    Scheduler(String),
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use bookbridge_engine::BookKind;

    #[test]
    fn test_usage_error_display() {
        let err = Error::from(UsageError::OperationPending);
        assert_eq!(
            err.to_string(),
            "another operation on this book is still pending"
        );
    }

    #[test]
    fn test_engine_error_reads_retained_diagnostic() {
        let mut book = engine::Book::create(BookKind::Binary).unwrap();
        assert!(!book.save(std::path::Path::new("/nonexistent/dir/out.bbk")));
        let err = EngineError::from_book("save", &book);
        assert_eq!(err.op, "save");
        assert!(err.message.contains("book has no sheets") || err.message.contains("cannot write"));
    }

    #[test]
    fn test_engine_error_without_diagnostic() {
        let book = engine::Book::create(BookKind::Binary).unwrap();
        let err = EngineError::from_book("probe", &book);
        assert_eq!(err.message, "engine reported failure without a diagnostic");
    }

    #[test]
    fn test_invalid_argument_formats_detail() {
        let err = UsageError::InvalidArgument("bad locale".to_string());
        assert_eq!(err.to_string(), "invalid argument: bad locale");
    }
}

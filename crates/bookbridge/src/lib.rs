//! Concurrency-safe binding over the single-threaded bookbridge engine.
//!
//! The engine executes one call at a time on one thread and reports
//! failure through sentinel values plus a retained diagnostic. This crate
//! wraps each engine handle so it can live in an async program:
//!
//! - Every operation passes through a per-book admission slot. While one
//!   call is pending, any other call on the same book fails fast with
//!   [`UsageError::OperationPending`] instead of queueing or blocking.
//! - I/O-heavy operations come in async forms that run on the tokio
//!   blocking pool. Arguments are snapshotted into owned values before
//!   scheduling and outputs are copied out under the handle lock, so
//!   worker code never borrows from a caller.
//! - Books own their engine handles. [`Sheet`], [`Font`] and [`Format`]
//!   reference their book weakly and fail with [`UsageError::BookClosed`]
//!   after it drops, and an object passed to a book that did not create it
//!   fails with [`UsageError::CrossOwner`] before the engine is invoked.
//!
//! # Example
//!
//! ```
//! use bookbridge::{BookKind, Library, LibraryConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> bookbridge::Result<()> {
//! let library = Library::new(LibraryConfig::default());
//! let book = library.new_book(BookKind::Binary)?;
//!
//! let sheet = book.add_sheet("Report", None)?;
//! sheet.write_text(0, 0, "total", None)?;
//! sheet.write_number(0, 1, 1250.0, None)?;
//!
//! let bytes = book.save_raw().await?;
//! assert!(!bytes.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod book;
pub mod error;
pub mod font;
pub mod format;
pub mod library;
pub mod prelude;
pub mod sheet;
pub mod stable;

mod bridge;
mod guard;
mod owner;

/// The wrapped engine crate, for use with
/// [`Book::with_engine`](crate::Book::with_engine).
pub use bookbridge_engine as engine;

pub use book::{Book, PictureSource};
pub use error::{EngineError, Error, ResourceError, Result, UsageError};
pub use font::Font;
pub use format::Format;
pub use library::{Library, LibraryConfig, LicenseKey};
pub use sheet::Sheet;
pub use stable::{StableBytes, StablePath};

// Engine types that appear in this crate's public signatures.
pub use bookbridge_engine::{
    AlignH, AlignV, BookKind, BorderStyle, CellKind, DateParts, FillPattern, PictureKind,
    SheetKind, Underline,
};

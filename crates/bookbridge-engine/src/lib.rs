//! bookbridge-engine: a single-threaded workbook engine.
//!
//! This crate is the engine side of the bookbridge workspace: a workbook
//! reader/writer with a deliberately C-library-shaped surface. Failing
//! operations return a sentinel (`false`, `None`, `-1`,
//! [`PictureKind::Unknown`]) and retain a human-readable message behind
//! [`Book::last_error`]. The handle performs no synchronization of its own:
//! [`Book`] is `Send` but not `Sync`, every fallible operation takes
//! `&mut self` so it can record that message, and callers that want to share
//! a book across threads must serialize access themselves. The `bookbridge`
//! crate is that caller.
//!
//! Two container kinds exist ([`BookKind::Binary`] and [`BookKind::Archive`]),
//! sharing one little-endian record layout but carrying different magic. A
//! book only loads bytes of its own kind.
//!
//! # Example
//!
//! ```
//! use bookbridge_engine::{Book, BookKind};
//!
//! let mut book = Book::create(BookKind::Binary).unwrap();
//! let sheet = book.add_sheet("Totals", None).unwrap();
//! assert!(book.write_number(sheet, 0, 0, 42.0, None));
//! assert_eq!(book.read_number(sheet, 0, 0), Some(42.0));
//! ```

pub mod book;
mod codec;
pub mod date;
pub mod picture;
pub mod sheet;
pub mod style;

pub use book::{Book, BookKind, FontId, FormatId, SheetId};
pub use date::DateParts;
pub use picture::PictureKind;
pub use sheet::{CellKind, SheetKind};
pub use style::{AlignH, AlignV, BorderStyle, FillPattern, Underline};

/// Maximum number of rows in a sheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a sheet
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name in characters
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// First id handed out for custom number formats; smaller ids are reserved
/// for the built-in table.
pub const CUSTOM_FORMAT_BASE: u16 = 164;

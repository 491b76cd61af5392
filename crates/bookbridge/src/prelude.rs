//! Convenience re-exports for the common path.
//!
//! ```
//! use bookbridge::prelude::*;
//! ```

pub use crate::book::{Book, PictureSource};
pub use crate::error::{EngineError, Error, ResourceError, Result, UsageError};
pub use crate::font::Font;
pub use crate::format::Format;
pub use crate::library::{Library, LibraryConfig, LicenseKey};
pub use crate::sheet::Sheet;
pub use crate::stable::{StableBytes, StablePath};
pub use bookbridge_engine::{
    AlignH, AlignV, BookKind, BorderStyle, CellKind, DateParts, FillPattern, PictureKind,
    SheetKind, Underline,
};

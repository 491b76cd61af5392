//! The owner book: sole holder of an engine handle.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bookbridge_engine as engine;
use bookbridge_engine::{BookKind, DateParts, PictureKind, SheetKind};

use crate::bridge;
use crate::error::{EngineError, Result};
use crate::font::Font;
use crate::format::Format;
use crate::owner::{self, BookCore};
use crate::sheet::Sheet;
use crate::stable::{StableBytes, StablePath};

/// Source for [`Book::add_picture`].
#[derive(Debug, Clone)]
pub enum PictureSource {
    /// Read the picture from a file.
    File(StablePath),
    /// Use in-memory image bytes.
    Bytes(StableBytes),
}

impl PictureSource {
    pub fn file(path: impl Into<StablePath>) -> Self {
        Self::File(path.into())
    }

    pub fn bytes(data: impl Into<StableBytes>) -> Self {
        Self::Bytes(data.into())
    }
}

/// An open workbook.
///
/// A `Book` is the only owner of its engine handle; [`Sheet`], [`Font`] and
/// [`Format`] values reference it weakly and fail with `BookClosed` once it
/// is dropped. All methods take `&self`, so a book can be shared across
/// tasks behind an [`Arc`]. One operation runs at a time: while any call is
/// pending, every other call on the same book fails with
/// `OperationPending` instead of queueing.
///
/// Operations that touch files or whole-book buffers come in pairs: the
/// plain name is async and runs on the blocking pool, the `_sync` suffix
/// runs on the calling thread. Everything else is synchronous but still
/// goes through the same admission slot.
pub struct Book {
    core: Arc<BookCore>,
}

impl fmt::Debug for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Book").finish_non_exhaustive()
    }
}

impl Book {
    pub(crate) fn from_handle(handle: Box<engine::Book>) -> Self {
        Self {
            core: BookCore::new(handle),
        }
    }

    // ==================== Load and save ====================

    /// Load a file into this book, replacing its contents.
    pub async fn load(&self, path: impl Into<StablePath>) -> Result<()> {
        let path = path.into();
        bridge::run_blocking(&self.core, "load", move |book| {
            if book.load(path.as_path()) {
                Ok(())
            } else {
                Err(EngineError::from_book("load", book).into())
            }
        })
        .await
    }

    /// Synchronous form of [`load`](Book::load).
    pub fn load_sync(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        bridge::run_sync_bool(&self.core, "load", |book| book.load(path))
    }

    /// Save this book to a file.
    pub async fn save(&self, path: impl Into<StablePath>) -> Result<()> {
        let path = path.into();
        bridge::run_blocking(&self.core, "save", move |book| {
            if book.save(path.as_path()) {
                Ok(())
            } else {
                Err(EngineError::from_book("save", book).into())
            }
        })
        .await
    }

    /// Synchronous form of [`save`](Book::save).
    pub fn save_sync(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        bridge::run_sync_bool(&self.core, "save", |book| book.save(path))
    }

    /// Load a book from serialized bytes, replacing its contents.
    pub async fn load_raw(&self, data: impl Into<StableBytes>) -> Result<()> {
        let data = data.into();
        bridge::run_blocking(&self.core, "load_raw", move |book| {
            if book.load_raw(data.as_slice()) {
                Ok(())
            } else {
                Err(EngineError::from_book("load_raw", book).into())
            }
        })
        .await
    }

    /// Synchronous form of [`load_raw`](Book::load_raw).
    pub fn load_raw_sync(&self, data: &[u8]) -> Result<()> {
        bridge::run_sync_bool(&self.core, "load_raw", |book| book.load_raw(data))
    }

    /// Serialize this book and return the bytes.
    pub async fn save_raw(&self) -> Result<StableBytes> {
        bridge::run_blocking(&self.core, "save_raw", |book| match book.save_raw() {
            Some(bytes) => Ok(StableBytes::from(bytes)),
            None => Err(EngineError::from_book("save_raw", book).into()),
        })
        .await
    }

    /// Synchronous form of [`save_raw`](Book::save_raw).
    pub fn save_raw_sync(&self) -> Result<StableBytes> {
        bridge::run_sync(&self.core, "save_raw", |book| match book.save_raw() {
            Some(bytes) => Ok(StableBytes::from(bytes)),
            None => Err(EngineError::from_book("save_raw", book).into()),
        })
    }

    // ==================== Sheets ====================

    /// Append a sheet, optionally copying structure and content from a
    /// template sheet of this book.
    pub fn add_sheet(&self, name: &str, template: Option<&Sheet>) -> Result<Sheet> {
        let template_id = self.resolve_sheet_template(template)?;
        let id = bridge::run_sync_opt(&self.core, "add_sheet", |book| {
            book.add_sheet(name, template_id)
        })?;
        Ok(Sheet::new(&self.core, id))
    }

    /// Insert a sheet at `index`, shifting later sheets up by one.
    pub fn insert_sheet(&self, index: usize, name: &str, template: Option<&Sheet>) -> Result<Sheet> {
        let template_id = self.resolve_sheet_template(template)?;
        let id = bridge::run_sync_opt(&self.core, "insert_sheet", |book| {
            book.insert_sheet(index, name, template_id)
        })?;
        Ok(Sheet::new(&self.core, id))
    }

    /// The sheet at `index`.
    pub fn sheet(&self, index: usize) -> Result<Sheet> {
        let id = bridge::run_sync_opt(&self.core, "sheet", |book| book.sheet_at(index))?;
        Ok(Sheet::new(&self.core, id))
    }

    /// Kind of the sheet at `index`.
    pub fn sheet_kind(&self, index: usize) -> Result<SheetKind> {
        bridge::run_sync(&self.core, "sheet_kind", |book| match book.sheet_at(index) {
            Some(id) => Ok(book.sheet_kind(id)),
            None => Err(EngineError::from_book("sheet_kind", book).into()),
        })
    }

    /// Remove a sheet. Sheets after it shift down, and handles to them
    /// keep addressing positions, not the sheets they used to name.
    pub fn remove_sheet(&self, sheet: Sheet) -> Result<()> {
        owner::require_same_owner(&self.core, &sheet.owner)?;
        bridge::run_sync_bool(&self.core, "remove_sheet", |book| book.remove_sheet(sheet.id))
    }

    pub fn sheet_count(&self) -> Result<usize> {
        bridge::run_sync_infallible(&self.core, "sheet_count", |book| book.sheet_count())
    }

    /// Index of the active sheet.
    pub fn active_sheet(&self) -> Result<usize> {
        bridge::run_sync_infallible(&self.core, "active_sheet", |book| book.active_sheet())
    }

    pub fn set_active_sheet(&self, index: usize) -> Result<()> {
        bridge::run_sync_bool(&self.core, "set_active_sheet", |book| {
            book.set_active_sheet(index)
        })
    }

    fn resolve_sheet_template(&self, template: Option<&Sheet>) -> Result<Option<engine::SheetId>> {
        match template {
            Some(sheet) => {
                owner::require_same_owner(&self.core, &sheet.owner)?;
                Ok(Some(sheet.id))
            }
            None => Ok(None),
        }
    }

    // ==================== Fonts and formats ====================

    /// Register a font, optionally copying an existing font of this book.
    pub fn add_font(&self, template: Option<&Font>) -> Result<Font> {
        let template_id = match template {
            Some(font) => {
                owner::require_same_owner(&self.core, &font.owner)?;
                Some(font.id)
            }
            None => None,
        };
        let id = bridge::run_sync_opt(&self.core, "add_font", |book| book.add_font(template_id))?;
        Ok(Font::new(&self.core, id))
    }

    /// The font at `index`.
    pub fn font(&self, index: usize) -> Result<Font> {
        let id = bridge::run_sync_opt(&self.core, "font", |book| book.font_at(index))?;
        Ok(Font::new(&self.core, id))
    }

    pub fn font_count(&self) -> Result<usize> {
        bridge::run_sync_infallible(&self.core, "font_count", |book| book.font_count())
    }

    /// Register a cell format, optionally copying an existing format of
    /// this book.
    pub fn add_format(&self, template: Option<&Format>) -> Result<Format> {
        let template_id = match template {
            Some(format) => {
                owner::require_same_owner(&self.core, &format.owner)?;
                Some(format.id)
            }
            None => None,
        };
        let id =
            bridge::run_sync_opt(&self.core, "add_format", |book| book.add_format(template_id))?;
        Ok(Format::new(&self.core, id))
    }

    /// The format at `index`.
    pub fn format(&self, index: usize) -> Result<Format> {
        let id = bridge::run_sync_opt(&self.core, "format", |book| book.format_at(index))?;
        Ok(Format::new(&self.core, id))
    }

    pub fn format_count(&self) -> Result<usize> {
        bridge::run_sync_infallible(&self.core, "format_count", |book| book.format_count())
    }

    /// Register a custom number format string and return its id.
    pub fn add_custom_num_format(&self, pattern: &str) -> Result<u16> {
        bridge::run_sync_opt(&self.core, "add_custom_num_format", |book| {
            book.add_custom_num_format(pattern)
        })
    }

    /// The pattern registered under a custom number format id.
    pub fn custom_num_format(&self, id: u16) -> Result<String> {
        bridge::run_sync_opt(&self.core, "custom_num_format", |book| {
            book.custom_num_format(id).map(str::to_string)
        })
    }

    // ==================== Pictures ====================

    /// Add a picture from a file or from bytes; returns its index.
    pub async fn add_picture(&self, source: PictureSource) -> Result<usize> {
        bridge::run_blocking(&self.core, "add_picture", move |book| {
            add_picture_with(book, &source)
        })
        .await
    }

    /// Synchronous form of [`add_picture`](Book::add_picture).
    pub fn add_picture_sync(&self, source: &PictureSource) -> Result<usize> {
        bridge::run_sync(&self.core, "add_picture", |book| {
            add_picture_with(book, source)
        })
    }

    /// The picture at `index`, as its detected kind and a copy of its bytes.
    pub async fn picture(&self, index: usize) -> Result<(PictureKind, StableBytes)> {
        bridge::run_blocking(&self.core, "picture", move |book| picture_at(book, index)).await
    }

    /// Synchronous form of [`picture`](Book::picture).
    pub fn picture_sync(&self, index: usize) -> Result<(PictureKind, StableBytes)> {
        bridge::run_sync(&self.core, "picture", |book| picture_at(book, index))
    }

    pub fn picture_count(&self) -> Result<usize> {
        bridge::run_sync_infallible(&self.core, "picture_count", |book| book.picture_count())
    }

    // ==================== Book settings ====================

    /// Container kind of this book.
    pub fn kind(&self) -> Result<BookKind> {
        bridge::run_sync_infallible(&self.core, "kind", |book| book.kind())
    }

    /// Format version the book serializes as.
    pub fn version(&self) -> Result<u16> {
        bridge::run_sync_infallible(&self.core, "version", |book| book.version())
    }

    /// Default font name and size for the book.
    pub fn default_font(&self) -> Result<(String, f64)> {
        bridge::run_sync_infallible(&self.core, "default_font", |book| {
            let (name, size) = book.default_font();
            (name.to_string(), size)
        })
    }

    pub fn set_default_font(&self, name: &str, size: f64) -> Result<()> {
        bridge::run_sync_bool(&self.core, "set_default_font", |book| {
            book.set_default_font(name, size)
        })
    }

    /// Whether formula references use R1C1 style.
    pub fn ref_r1c1(&self) -> Result<bool> {
        bridge::run_sync_infallible(&self.core, "ref_r1c1", |book| book.ref_r1c1())
    }

    pub fn set_ref_r1c1(&self, on: bool) -> Result<()> {
        bridge::run_sync_infallible(&self.core, "set_ref_r1c1", |book| book.set_ref_r1c1(on))
    }

    /// Whether colors are tracked as raw RGB instead of palette entries.
    pub fn rgb_mode(&self) -> Result<bool> {
        bridge::run_sync_infallible(&self.core, "rgb_mode", |book| book.rgb_mode())
    }

    pub fn set_rgb_mode(&self, on: bool) -> Result<()> {
        bridge::run_sync_infallible(&self.core, "set_rgb_mode", |book| book.set_rgb_mode(on))
    }

    /// Whether serial dates count from the 1904 epoch.
    pub fn date_1904(&self) -> Result<bool> {
        bridge::run_sync_infallible(&self.core, "date_1904", |book| book.date_1904())
    }

    pub fn set_date_1904(&self, on: bool) -> Result<()> {
        bridge::run_sync_infallible(&self.core, "set_date_1904", |book| book.set_date_1904(on))
    }

    /// Whether the book saves as a template.
    pub fn is_template(&self) -> Result<bool> {
        bridge::run_sync_infallible(&self.core, "is_template", |book| book.is_template())
    }

    pub fn set_template(&self, on: bool) -> Result<()> {
        bridge::run_sync_infallible(&self.core, "set_template", |book| book.set_template(on))
    }

    /// Set the license key directly on this book. Usually carried by the
    /// library configuration instead.
    pub fn set_key(&self, name: &str, key: &str) -> Result<()> {
        bridge::run_sync_infallible(&self.core, "set_key", |book| book.set_key(name, key))
    }

    // ==================== Conversions ====================

    /// Pack calendar parts into the book's serial date representation.
    pub fn date_pack(&self, parts: &DateParts) -> Result<f64> {
        bridge::run_sync_opt(&self.core, "date_pack", |book| book.date_pack(parts))
    }

    /// Unpack a serial date into calendar parts.
    pub fn date_unpack(&self, value: f64) -> Result<DateParts> {
        bridge::run_sync_opt(&self.core, "date_unpack", |book| book.date_unpack(value))
    }

    /// Pack RGB components into the book's color representation.
    pub fn color_pack(&self, red: u8, green: u8, blue: u8) -> Result<u32> {
        bridge::run_sync_infallible(&self.core, "color_pack", |book| {
            book.color_pack(red, green, blue)
        })
    }

    /// Unpack a packed color into RGB components.
    pub fn color_unpack(&self, color: u32) -> Result<(u8, u8, u8)> {
        bridge::run_sync_infallible(&self.core, "color_unpack", |book| book.color_unpack(color))
    }

    // ==================== Direct engine access ====================

    /// Run a closure against the engine handle under one admission.
    ///
    /// The closure observes the same single-flight rule as every built-in
    /// operation, so it can never overlap with other calls on this book.
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut engine::Book) -> Result<T>) -> Result<T> {
        bridge::run_sync(&self.core, "with_engine", f)
    }

    /// Async form of [`with_engine`](Book::with_engine); the closure runs
    /// on the blocking pool and must copy any engine-owned output it
    /// returns.
    pub async fn with_engine_async<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut engine::Book) -> Result<T> + Send + 'static,
    {
        bridge::run_blocking(&self.core, "with_engine_async", f).await
    }
}

fn add_picture_with(book: &mut engine::Book, source: &PictureSource) -> Result<usize> {
    let index = match source {
        PictureSource::File(path) => book.add_picture_file(path.as_path()),
        PictureSource::Bytes(data) => book.add_picture_bytes(data.as_slice()),
    };
    if index < 0 {
        Err(EngineError::from_book("add_picture", book).into())
    } else {
        Ok(index as usize)
    }
}

fn picture_at(book: &mut engine::Book, index: usize) -> Result<(PictureKind, StableBytes)> {
    // Copy before the failure probe; the slice borrows the handle.
    let (kind, data) = book.picture(index);
    let data = StableBytes::from(data);
    if kind == PictureKind::Unknown {
        return Err(EngineError::from_book("picture", book).into());
    }
    Ok((kind, data))
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, UsageError};
    use crate::library::{Library, LibraryConfig};

    fn new_book() -> Book {
        Library::new(LibraryConfig::default())
            .new_book(BookKind::Binary)
            .unwrap()
    }

    #[test]
    fn test_sheet_lifecycle() {
        let book = new_book();
        let first = book.add_sheet("First", None).unwrap();
        book.add_sheet("Second", None).unwrap();
        assert_eq!(book.sheet_count().unwrap(), 2);
        assert_eq!(book.sheet(0).unwrap().name().unwrap(), "First");
        assert_eq!(book.sheet_kind(1).unwrap(), SheetKind::Worksheet);

        book.remove_sheet(first).unwrap();
        assert_eq!(book.sheet_count().unwrap(), 1);
        assert_eq!(book.sheet(0).unwrap().name().unwrap(), "Second");
    }

    #[test]
    fn test_sheet_template_copies_content() {
        let book = new_book();
        let base = book.add_sheet("Base", None).unwrap();
        base.write_text(0, 0, "seed", None).unwrap();
        let copy = book.add_sheet("Copy", Some(&base)).unwrap();
        assert_eq!(copy.read_text(0, 0).unwrap(), "seed");
    }

    #[test]
    fn test_cross_owner_template_never_reaches_engine() {
        let library = Library::new(LibraryConfig::default());
        let book_a = library.new_book(BookKind::Binary).unwrap();
        let book_b = library.new_book(BookKind::Binary).unwrap();
        let foreign = book_b.add_sheet("Foreign", None).unwrap();

        let err = book_a.add_sheet("Copy", Some(&foreign)).unwrap_err();
        assert!(matches!(err, Error::Usage(UsageError::CrossOwner)));
        // Nothing was created and no engine diagnostic was recorded.
        assert_eq!(book_a.sheet_count().unwrap(), 0);
        let diag = book_a
            .with_engine(|book| Ok(book.last_error().map(str::to_string)))
            .unwrap();
        assert_eq!(diag, None);
    }

    #[test]
    fn test_font_and_format_registration() {
        let book = new_book();
        let font = book.add_font(None).unwrap();
        font.set_size(14.0).unwrap();
        let format = book.add_format(None).unwrap();
        format.set_font(&font).unwrap();
        assert_eq!(book.font_count().unwrap(), 2);
        assert_eq!(book.format_count().unwrap(), 2);
        assert_eq!(format.font().unwrap().size().unwrap(), 14.0);
    }

    #[test]
    fn test_custom_num_format_roundtrip() {
        let book = new_book();
        let id = book.add_custom_num_format("0.00%").unwrap();
        assert_eq!(book.custom_num_format(id).unwrap(), "0.00%");
    }

    #[test]
    fn test_settings_roundtrip() {
        let book = new_book();
        book.set_default_font("Arial", 10.0).unwrap();
        assert_eq!(book.default_font().unwrap(), ("Arial".to_string(), 10.0));
        book.set_ref_r1c1(true).unwrap();
        assert!(book.ref_r1c1().unwrap());
        book.set_date_1904(true).unwrap();
        assert!(book.date_1904().unwrap());
        book.set_template(true).unwrap();
        assert!(book.is_template().unwrap());
        assert_eq!(book.kind().unwrap(), BookKind::Binary);
    }

    #[test]
    fn test_conversions_follow_book_settings() {
        let book = new_book();
        let serial = book.date_pack(&DateParts::new(1900, 1, 1)).unwrap();
        assert_eq!(serial, 2.0);
        assert_eq!(book.date_unpack(2.5).unwrap(), DateParts::new(1900, 1, 1).with_time(12, 0, 0, 0));

        let packed = book.color_pack(0x12, 0x34, 0x56).unwrap();
        assert_eq!(packed, 0x123456);
        assert_eq!(book.color_unpack(packed).unwrap(), (0x12, 0x34, 0x56));
    }

    #[test]
    fn test_invalid_date_is_an_engine_error() {
        let book = new_book();
        let err = book.date_pack(&DateParts::new(1850, 1, 1)).unwrap_err();
        match err {
            Error::Engine(engine_err) => {
                assert_eq!(engine_err.op, "date_pack");
                assert!(!engine_err.message.is_empty());
            }
            other => panic!("expected an engine error, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_picture_roundtrip() {
        const PNG: &[u8] = &[
            0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H',
            b'D', b'R',
        ];
        let book = new_book();
        let index = book
            .add_picture(PictureSource::bytes(PNG))
            .await
            .unwrap();
        assert_eq!(index, 0);
        assert_eq!(book.picture_count().unwrap(), 1);

        let (kind, data) = book.picture(index).await.unwrap();
        assert_eq!(kind, PictureKind::Png);
        assert_eq!(data.as_slice(), PNG);
    }

    #[test]
    fn test_unrecognized_picture_bytes_fail() {
        let book = new_book();
        let err = book
            .add_picture_sync(&PictureSource::bytes(&b"not an image"[..]))
            .unwrap_err();
        assert!(matches!(err, Error::Engine(_)));
    }
}

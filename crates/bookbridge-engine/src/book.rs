//! The workbook handle.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use crate::codec;
use crate::date::{self, DateParts};
use crate::picture::{self, PictureKind};
use crate::sheet::SheetData;
use crate::style::{FontData, FormatData};

/// Container kind of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookKind {
    Binary,
    Archive,
}

impl BookKind {
    pub(crate) fn magic(self) -> [u8; 4] {
        match self {
            BookKind::Binary => codec::MAGIC_BINARY,
            BookKind::Archive => codec::MAGIC_ARCHIVE,
        }
    }

    pub(crate) fn initial_version(self) -> u16 {
        match self {
            BookKind::Binary => codec::VERSION_BINARY,
            BookKind::Archive => codec::VERSION_ARCHIVE,
        }
    }
}

impl fmt::Display for BookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookKind::Binary => write!(f, "binary"),
            BookKind::Archive => write!(f, "archive"),
        }
    }
}

/// Sheet view id: the sheet's position in the book. Removing a sheet
/// renumbers the ids after it; the book cannot tell a stale or foreign id
/// from a live one as long as it is in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SheetId(pub usize);

/// Font table id; stable for the life of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(pub usize);

/// Format table id; stable for the life of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatId(pub usize);

/// A workbook.
///
/// The handle is `Send` but not `Sync`: it may move between threads, but
/// nothing about it tolerates overlapping calls, and all fallible operations
/// take `&mut self` so they can retain a diagnostic for [`Book::last_error`].
pub struct Book {
    pub(crate) kind: BookKind,
    pub(crate) version: u16,
    pub(crate) sheets: Vec<SheetData>,
    pub(crate) fonts: Vec<FontData>,
    pub(crate) formats: Vec<FormatData>,
    pub(crate) custom_formats: Vec<String>,
    pub(crate) pictures: Vec<(PictureKind, Vec<u8>)>,
    pub(crate) active_sheet: usize,
    pub(crate) default_font_name: String,
    pub(crate) default_font_size: f64,
    pub(crate) ref_r1c1: bool,
    pub(crate) rgb_mode: bool,
    pub(crate) date_1904: bool,
    pub(crate) is_template: bool,
    pub(crate) key: Option<(String, String)>,
    pub(crate) locale: Option<String>,
    pub(crate) last_error: Option<String>,
    scratch: Vec<u8>,
    _not_sync: PhantomData<Cell<()>>,
}

impl Book {
    /// Allocate a fresh book. `None` reports allocation failure.
    pub fn create(kind: BookKind) -> Option<Box<Book>> {
        Some(Box::new(Book {
            kind,
            version: kind.initial_version(),
            sheets: Vec::new(),
            fonts: vec![FontData::default()],
            formats: vec![FormatData::default()],
            custom_formats: Vec::new(),
            pictures: Vec::new(),
            active_sheet: 0,
            default_font_name: "Calibri".to_string(),
            default_font_size: 11.0,
            ref_r1c1: false,
            rgb_mode: false,
            date_1904: false,
            is_template: false,
            key: None,
            locale: None,
            last_error: None,
            scratch: Vec::new(),
            _not_sync: PhantomData,
        }))
    }

    /// Message retained by the most recent failing operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Record a diagnostic and return the failure sentinel.
    pub(crate) fn fail<T>(&mut self, sentinel: T, message: impl Into<String>) -> T {
        self.last_error = Some(message.into());
        sentinel
    }
}

// ==================== Loading and saving ====================

impl Book {
    /// Read and decode a container file of this book's kind.
    pub fn load(&mut self, path: &Path) -> bool {
        let data = match std::fs::read(path) {
            Ok(d) => d,
            Err(e) => return self.fail(false, format!("cannot read {}: {}", path.display(), e)),
        };
        self.load_raw(&data)
    }

    /// Decode container bytes of this book's kind. A failed decode leaves
    /// the book unchanged.
    pub fn load_raw(&mut self, data: &[u8]) -> bool {
        match codec::decode_book(self.kind, data) {
            Ok(decoded) => {
                self.commit(decoded);
                true
            }
            Err(e) => self.fail(false, e.to_string()),
        }
    }

    /// Encode and write a container file.
    pub fn save(&mut self, path: &Path) -> bool {
        let Some(data) = self.encode_checked() else {
            return false;
        };
        if let Err(e) = std::fs::write(path, &data) {
            return self.fail(false, format!("cannot write {}: {}", path.display(), e));
        }
        true
    }

    /// Encode into an internal buffer and borrow it. The slice is
    /// invalidated by the next operation on this book.
    pub fn save_raw(&mut self) -> Option<&[u8]> {
        let data = self.encode_checked()?;
        self.scratch = data;
        Some(self.scratch.as_slice())
    }

    fn encode_checked(&mut self) -> Option<Vec<u8>> {
        if self.sheets.is_empty() {
            return self.fail(None, "book has no sheets");
        }
        Some(codec::encode_book(self))
    }

    fn commit(&mut self, d: codec::Decoded) {
        self.version = d.version;
        self.default_font_name = d.default_font_name;
        self.default_font_size = d.default_font_size;
        self.ref_r1c1 = d.ref_r1c1;
        self.rgb_mode = d.rgb_mode;
        self.date_1904 = d.date_1904;
        self.is_template = d.is_template;
        self.active_sheet = d.active_sheet;
        self.fonts = d.fonts;
        self.formats = d.formats;
        self.custom_formats = d.custom_formats;
        self.sheets = d.sheets;
        self.pictures = d.pictures;
        self.scratch.clear();
    }
}

// ==================== Book settings ====================

impl Book {
    pub fn kind(&self) -> BookKind {
        self.kind
    }

    /// Container version of the created or loaded book.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Default font name and size used for new fonts.
    pub fn default_font(&self) -> (&str, f64) {
        (self.default_font_name.as_str(), self.default_font_size)
    }

    pub fn set_default_font(&mut self, name: &str, size: f64) -> bool {
        if name.is_empty() {
            return self.fail(false, "font name cannot be empty");
        }
        if !size.is_finite() || size <= 0.0 {
            return self.fail(false, format!("invalid font size {}", size));
        }
        self.default_font_name = name.to_string();
        self.default_font_size = size;
        true
    }

    /// Whether cell references display as R1C1.
    pub fn ref_r1c1(&self) -> bool {
        self.ref_r1c1
    }

    pub fn set_ref_r1c1(&mut self, on: bool) {
        self.ref_r1c1 = on;
    }

    /// Whether colors are kept as raw RGB instead of a palette.
    pub fn rgb_mode(&self) -> bool {
        self.rgb_mode
    }

    pub fn set_rgb_mode(&mut self, on: bool) {
        self.rgb_mode = on;
    }

    /// Whether serial dates use the 1904 epoch.
    pub fn date_1904(&self) -> bool {
        self.date_1904
    }

    pub fn set_date_1904(&mut self, on: bool) {
        self.date_1904 = on;
    }

    pub fn is_template(&self) -> bool {
        self.is_template
    }

    pub fn set_template(&mut self, on: bool) {
        self.is_template = on;
    }

    /// Store a license key. Never fails; an invalid key surfaces on save.
    pub fn set_key(&mut self, name: &str, key: &str) {
        self.key = Some((name.to_string(), key.to_string()));
    }

    pub fn set_locale(&mut self, locale: &str) -> bool {
        if locale.is_empty() {
            return self.fail(false, "locale cannot be empty");
        }
        self.locale = Some(locale.to_string());
        true
    }
}

// ==================== Pictures ====================

impl Book {
    /// Number of pictures stored in the book.
    pub fn picture_count(&self) -> usize {
        self.pictures.len()
    }

    /// Kind and bytes of a stored picture. [`PictureKind::Unknown`] with an
    /// empty slice reports a bad index. The slice is invalidated by the next
    /// operation on this book.
    pub fn picture(&mut self, index: usize) -> (PictureKind, &[u8]) {
        if index >= self.pictures.len() {
            return self.fail(
                (PictureKind::Unknown, &[][..]),
                format!("picture index {} out of range", index),
            );
        }
        let (kind, data) = &self.pictures[index];
        (*kind, data.as_slice())
    }

    /// Read an image file and store it; returns the picture index or -1.
    pub fn add_picture_file(&mut self, path: &Path) -> i32 {
        let data = match std::fs::read(path) {
            Ok(d) => d,
            Err(e) => return self.fail(-1, format!("cannot read {}: {}", path.display(), e)),
        };
        self.add_picture_raw(data)
    }

    /// Store image bytes; returns the picture index or -1.
    pub fn add_picture_bytes(&mut self, data: &[u8]) -> i32 {
        self.add_picture_raw(data.to_vec())
    }

    fn add_picture_raw(&mut self, data: Vec<u8>) -> i32 {
        let kind = picture::sniff(&data);
        if kind == PictureKind::Unknown {
            return self.fail(-1, "unrecognized picture format");
        }
        self.pictures.push((kind, data));
        (self.pictures.len() - 1) as i32
    }
}

// ==================== Date and color conversions ====================

impl Book {
    /// Pack calendar parts into a serial date using the book's date system.
    pub fn date_pack(&mut self, parts: &DateParts) -> Option<f64> {
        match date::pack(self.date_1904, parts) {
            Ok(v) => Some(v),
            Err(msg) => self.fail(None, msg),
        }
    }

    /// Unpack a serial date using the book's date system.
    pub fn date_unpack(&mut self, value: f64) -> Option<DateParts> {
        match date::unpack(self.date_1904, value) {
            Ok(parts) => Some(parts),
            Err(msg) => self.fail(None, msg),
        }
    }

    /// Pack RGB channels as 0xRRGGBB.
    pub fn color_pack(&self, r: u8, g: u8, b: u8) -> u32 {
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }

    /// Unpack 0xRRGGBB into channels; the top byte is ignored.
    pub fn color_unpack(&self, color: u32) -> (u8, u8, u8) {
        (
            ((color >> 16) & 0xFF) as u8,
            ((color >> 8) & 0xFF) as u8,
            (color & 0xFF) as u8,
        )
    }
}

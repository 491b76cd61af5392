//! Font handles.

use std::sync::{Arc, Weak};

use bookbridge_engine as engine;
use bookbridge_engine::Underline;

use crate::bridge;
use crate::error::Result;
use crate::owner::{self, BookCore};

/// A font registered in a [`Book`](crate::Book).
///
/// Font handles stay valid for the life of their book; they do not keep
/// the book alive.
#[derive(Debug, Clone)]
pub struct Font {
    pub(crate) owner: Weak<BookCore>,
    pub(crate) id: engine::FontId,
}

impl Font {
    pub(crate) fn new(core: &Arc<BookCore>, id: engine::FontId) -> Self {
        Self {
            owner: Arc::downgrade(core),
            id,
        }
    }

    fn core(&self) -> Result<Arc<BookCore>> {
        owner::upgrade_owner(&self.owner)
    }

    pub fn name(&self) -> Result<String> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "font_name", |book| {
            book.font_name(id).map(str::to_string)
        })
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_font_name", |book| book.set_font_name(id, name))
    }

    /// Size in points.
    pub fn size(&self) -> Result<f64> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "font_size", |book| book.font_size(id))
    }

    pub fn set_size(&self, size: f64) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_font_size", |book| book.set_font_size(id, size))
    }

    pub fn bold(&self) -> Result<bool> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "font_bold", |book| book.font_bold(id))
    }

    pub fn set_bold(&self, bold: bool) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_font_bold", |book| book.set_font_bold(id, bold))
    }

    pub fn italic(&self) -> Result<bool> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "font_italic", |book| book.font_italic(id))
    }

    pub fn set_italic(&self, italic: bool) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_font_italic", |book| {
            book.set_font_italic(id, italic)
        })
    }

    pub fn underline(&self) -> Result<Underline> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "font_underline", |book| book.font_underline(id))
    }

    pub fn set_underline(&self, underline: Underline) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_font_underline", |book| {
            book.set_font_underline(id, underline)
        })
    }

    pub fn strikeout(&self) -> Result<bool> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "font_strikeout", |book| book.font_strikeout(id))
    }

    pub fn set_strikeout(&self, strikeout: bool) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_font_strikeout", |book| {
            book.set_font_strikeout(id, strikeout)
        })
    }

    /// Packed color, as produced by [`Book::color_pack`](crate::Book::color_pack).
    pub fn color(&self) -> Result<u32> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "font_color", |book| book.font_color(id))
    }

    pub fn set_color(&self, color: u32) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_font_color", |book| book.set_font_color(id, color))
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, UsageError};
    use crate::library::{Library, LibraryConfig};
    use bookbridge_engine::BookKind;

    #[test]
    fn test_font_properties_roundtrip() {
        let book = Library::new(LibraryConfig::default())
            .new_book(BookKind::Binary)
            .unwrap();
        let font = book.add_font(None).unwrap();

        font.set_name("Georgia").unwrap();
        font.set_size(16.0).unwrap();
        font.set_bold(true).unwrap();
        font.set_italic(true).unwrap();
        font.set_underline(Underline::Double).unwrap();
        font.set_strikeout(true).unwrap();
        font.set_color(0x00FF00).unwrap();

        assert_eq!(font.name().unwrap(), "Georgia");
        assert_eq!(font.size().unwrap(), 16.0);
        assert!(font.bold().unwrap());
        assert!(font.italic().unwrap());
        assert_eq!(font.underline().unwrap(), Underline::Double);
        assert!(font.strikeout().unwrap());
        assert_eq!(font.color().unwrap(), 0x00FF00);
    }

    #[test]
    fn test_invalid_size_is_an_engine_error() {
        let book = Library::new(LibraryConfig::default())
            .new_book(BookKind::Binary)
            .unwrap();
        let font = book.add_font(None).unwrap();
        assert!(matches!(
            font.set_size(0.0).unwrap_err(),
            Error::Engine(_)
        ));
        assert!(matches!(
            font.set_name("").unwrap_err(),
            Error::Engine(_)
        ));
    }

    #[test]
    fn test_font_outliving_book_reports_closed() {
        let book = Library::new(LibraryConfig::default())
            .new_book(BookKind::Binary)
            .unwrap();
        let font = book.add_font(None).unwrap();
        drop(book);
        assert!(matches!(
            font.name().unwrap_err(),
            Error::Usage(UsageError::BookClosed)
        ));
    }
}

//! Cell format handles.

use std::sync::{Arc, Weak};

use bookbridge_engine as engine;
use bookbridge_engine::{AlignH, AlignV, BorderStyle, FillPattern};

use crate::bridge;
use crate::error::Result;
use crate::font::Font;
use crate::owner::{self, BookCore};

/// A cell format registered in a [`Book`](crate::Book).
///
/// Format handles stay valid for the life of their book; they do not keep
/// the book alive.
#[derive(Debug, Clone)]
pub struct Format {
    pub(crate) owner: Weak<BookCore>,
    pub(crate) id: engine::FormatId,
}

impl Format {
    pub(crate) fn new(core: &Arc<BookCore>, id: engine::FormatId) -> Self {
        Self {
            owner: Arc::downgrade(core),
            id,
        }
    }

    fn core(&self) -> Result<Arc<BookCore>> {
        owner::upgrade_owner(&self.owner)
    }

    /// The font this format renders with.
    pub fn font(&self) -> Result<Font> {
        let core = self.core()?;
        let id = self.id;
        let font_id = bridge::run_sync_opt(&core, "format_font", |book| book.format_font(id))?;
        Ok(Font::new(&core, font_id))
    }

    /// Point this format at another font of the same book.
    pub fn set_font(&self, font: &Font) -> Result<()> {
        let core = self.core()?;
        owner::require_same_owner(&core, &font.owner)?;
        let id = self.id;
        let font_id = font.id;
        bridge::run_sync_bool(&core, "set_format_font", |book| {
            book.set_format_font(id, font_id)
        })
    }

    /// Number format id, either a builtin or a registered custom id.
    pub fn num_format(&self) -> Result<u16> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "format_num_format", |book| book.format_num_format(id))
    }

    pub fn set_num_format(&self, num_format: u16) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_format_num_format", |book| {
            book.set_format_num_format(id, num_format)
        })
    }

    pub fn align_h(&self) -> Result<AlignH> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "format_align_h", |book| book.format_align_h(id))
    }

    pub fn set_align_h(&self, align: AlignH) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_format_align_h", |book| {
            book.set_format_align_h(id, align)
        })
    }

    pub fn align_v(&self) -> Result<AlignV> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "format_align_v", |book| book.format_align_v(id))
    }

    pub fn set_align_v(&self, align: AlignV) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_format_align_v", |book| {
            book.set_format_align_v(id, align)
        })
    }

    /// Whether cell text wraps.
    pub fn wrap(&self) -> Result<bool> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "format_wrap", |book| book.format_wrap(id))
    }

    pub fn set_wrap(&self, wrap: bool) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_format_wrap", |book| book.set_format_wrap(id, wrap))
    }

    /// Border style applied to all four edges.
    pub fn border(&self) -> Result<BorderStyle> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "format_border", |book| book.format_border(id))
    }

    pub fn set_border(&self, style: BorderStyle) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_format_border", |book| {
            book.set_format_border(id, style)
        })
    }

    pub fn border_color(&self) -> Result<u32> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "format_border_color", |book| {
            book.format_border_color(id)
        })
    }

    pub fn set_border_color(&self, color: u32) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_format_border_color", |book| {
            book.set_format_border_color(id, color)
        })
    }

    pub fn fill(&self) -> Result<FillPattern> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "format_fill", |book| book.format_fill(id))
    }

    pub fn set_fill(&self, pattern: FillPattern) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_format_fill", |book| {
            book.set_format_fill(id, pattern)
        })
    }

    pub fn fill_fg(&self) -> Result<u32> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "format_fill_fg", |book| book.format_fill_fg(id))
    }

    pub fn set_fill_fg(&self, color: u32) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_format_fill_fg", |book| {
            book.set_format_fill_fg(id, color)
        })
    }

    pub fn fill_bg(&self) -> Result<u32> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "format_fill_bg", |book| book.format_fill_bg(id))
    }

    pub fn set_fill_bg(&self, color: u32) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_format_fill_bg", |book| {
            book.set_format_fill_bg(id, color)
        })
    }
}

// ==================== Tests ====================

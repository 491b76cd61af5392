//! Sheet handles.

use std::sync::{Arc, Weak};

use bookbridge_engine as engine;
use bookbridge_engine::{CellKind, DateParts};

use crate::bridge;
use crate::error::Result;
use crate::format::Format;
use crate::owner::{self, BookCore};

/// A sheet of a [`Book`](crate::Book).
///
/// Sheets address their book by position: removing an earlier sheet shifts
/// later ones down, and existing handles then name the shifted positions.
/// A sheet does not keep its book alive; once the book is dropped every
/// method fails with `BookClosed`.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub(crate) owner: Weak<BookCore>,
    pub(crate) id: engine::SheetId,
}

impl Sheet {
    pub(crate) fn new(core: &Arc<BookCore>, id: engine::SheetId) -> Self {
        Self {
            owner: Arc::downgrade(core),
            id,
        }
    }

    fn core(&self) -> Result<Arc<BookCore>> {
        owner::upgrade_owner(&self.owner)
    }

    // ==================== Identity ====================

    pub fn name(&self) -> Result<String> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "sheet_name", |book| {
            book.sheet_name(id).map(str::to_string)
        })
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_sheet_name", |book| book.set_sheet_name(id, name))
    }

    // ==================== Cell writes ====================

    pub fn write_text(&self, row: u32, col: u16, text: &str, format: Option<&Format>) -> Result<()> {
        let core = self.core()?;
        let format_id = resolve_format(&core, format)?;
        let id = self.id;
        bridge::run_sync_bool(&core, "write_text", |book| {
            book.write_text(id, row, col, text, format_id)
        })
    }

    pub fn write_number(&self, row: u32, col: u16, value: f64, format: Option<&Format>) -> Result<()> {
        let core = self.core()?;
        let format_id = resolve_format(&core, format)?;
        let id = self.id;
        bridge::run_sync_bool(&core, "write_number", |book| {
            book.write_number(id, row, col, value, format_id)
        })
    }

    pub fn write_bool(&self, row: u32, col: u16, value: bool, format: Option<&Format>) -> Result<()> {
        let core = self.core()?;
        let format_id = resolve_format(&core, format)?;
        let id = self.id;
        bridge::run_sync_bool(&core, "write_bool", |book| {
            book.write_bool(id, row, col, value, format_id)
        })
    }

    /// Write an empty cell that still carries a format.
    pub fn write_blank(&self, row: u32, col: u16, format: Option<&Format>) -> Result<()> {
        let core = self.core()?;
        let format_id = resolve_format(&core, format)?;
        let id = self.id;
        bridge::run_sync_bool(&core, "write_blank", |book| {
            book.write_blank(id, row, col, format_id)
        })
    }

    /// Write calendar parts as a serial date under the book's date system.
    pub fn write_date(
        &self,
        row: u32,
        col: u16,
        parts: &DateParts,
        format: Option<&Format>,
    ) -> Result<()> {
        let core = self.core()?;
        let format_id = resolve_format(&core, format)?;
        let id = self.id;
        bridge::run_sync_bool(&core, "write_date", |book| {
            book.write_date(id, row, col, parts, format_id)
        })
    }

    // ==================== Cell reads ====================

    /// Read a text cell. Fails when the cell holds another kind.
    pub fn read_text(&self, row: u32, col: u16) -> Result<String> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "read_text", |book| {
            book.read_text(id, row, col).map(str::to_string)
        })
    }

    /// Read a number cell. Fails when the cell holds another kind.
    pub fn read_number(&self, row: u32, col: u16) -> Result<f64> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "read_number", |book| book.read_number(id, row, col))
    }

    /// Read a boolean cell. Fails when the cell holds another kind.
    pub fn read_bool(&self, row: u32, col: u16) -> Result<bool> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "read_bool", |book| book.read_bool(id, row, col))
    }

    /// Read a number cell as calendar parts under the book's date system.
    pub fn read_date(&self, row: u32, col: u16) -> Result<DateParts> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "read_date", |book| book.read_date(id, row, col))
    }

    /// Kind of the cell at `(row, col)`.
    pub fn cell_kind(&self, row: u32, col: u16) -> Result<CellKind> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "cell_kind", |book| book.cell_kind(id, row, col))
    }

    // ==================== Cell formats ====================

    /// The format attached to a non-empty cell.
    pub fn cell_format(&self, row: u32, col: u16) -> Result<Format> {
        let core = self.core()?;
        let id = self.id;
        let format_id =
            bridge::run_sync_opt(&core, "cell_format", |book| book.cell_format(id, row, col))?;
        Ok(Format::new(&core, format_id))
    }

    pub fn set_cell_format(&self, row: u32, col: u16, format: &Format) -> Result<()> {
        let core = self.core()?;
        owner::require_same_owner(&core, &format.owner)?;
        let id = self.id;
        let format_id = format.id;
        bridge::run_sync_bool(&core, "set_cell_format", |book| {
            book.set_cell_format(id, row, col, format_id)
        })
    }

    // ==================== Geometry ====================

    /// Width of a column in character units.
    pub fn col_width(&self, col: u16) -> Result<f64> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "col_width", |book| book.col_width(id, col))
    }

    /// Set the width of the columns `first_col..=last_col`.
    pub fn set_col_width(&self, first_col: u16, last_col: u16, width: f64) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_col_width", |book| {
            book.set_col_width(id, first_col, last_col, width)
        })
    }

    /// Height of a row in points.
    pub fn row_height(&self, row: u32) -> Result<f64> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "row_height", |book| book.row_height(id, row))
    }

    pub fn set_row_height(&self, row: u32, height: f64) -> Result<()> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_bool(&core, "set_row_height", |book| {
            book.set_row_height(id, row, height)
        })
    }

    // ==================== Used range ====================

    /// First occupied row, or 0 for an empty sheet.
    pub fn first_row(&self) -> Result<u32> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "first_row", |book| book.first_row(id))
    }

    /// One past the last occupied row, or 0 for an empty sheet.
    pub fn last_row(&self) -> Result<u32> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "last_row", |book| book.last_row(id))
    }

    /// First occupied column, or 0 for an empty sheet.
    pub fn first_col(&self) -> Result<u16> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "first_col", |book| book.first_col(id))
    }

    /// One past the last occupied column, or 0 for an empty sheet.
    pub fn last_col(&self) -> Result<u16> {
        let core = self.core()?;
        let id = self.id;
        bridge::run_sync_opt(&core, "last_col", |book| book.last_col(id))
    }
}

fn resolve_format(core: &Arc<BookCore>, format: Option<&Format>) -> Result<Option<engine::FormatId>> {
    match format {
        Some(format) => {
            owner::require_same_owner(core, &format.owner)?;
            Ok(Some(format.id))
        }
        None => Ok(None),
    }
}

// ==================== Tests ====================

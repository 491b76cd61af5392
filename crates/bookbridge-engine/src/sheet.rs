//! Sheet data, the cell model, and sheet-addressed operations.

use std::collections::BTreeMap;

use crate::book::{Book, FormatId, SheetId};
use crate::date::DateParts;
use crate::{MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN};

/// Column width reported when none has been set
pub const DEFAULT_COL_WIDTH: f64 = 8.43;

/// Row height reported when none has been set
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// Kind of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKind {
    Worksheet,
    Chart,
    /// Failure tag for kind queries with a bad id
    Unknown,
}

impl SheetKind {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            SheetKind::Worksheet => 0,
            SheetKind::Chart => 1,
            SheetKind::Unknown => 0xFF,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(SheetKind::Worksheet),
            1 => Some(SheetKind::Chart),
            _ => None,
        }
    }
}

/// Content classification of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// No cell stored at the address
    Empty,
    /// A cell with a format but no value
    Blank,
    Number,
    Text,
    Bool,
}

/// Value stored in a cell; `Empty` with a format is a blank cell
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CellData {
    pub(crate) value: CellValue,
    pub(crate) format: FormatId,
}

/// One sheet of a book
#[derive(Debug, Clone)]
pub(crate) struct SheetData {
    pub(crate) name: String,
    pub(crate) kind: SheetKind,
    // BTreeMaps keep the serialized record order deterministic
    pub(crate) cells: BTreeMap<(u32, u16), CellData>,
    pub(crate) col_widths: BTreeMap<u16, f64>,
    pub(crate) row_heights: BTreeMap<u32, f64>,
}

impl SheetData {
    pub(crate) fn new(name: &str, kind: SheetKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            cells: BTreeMap::new(),
            col_widths: BTreeMap::new(),
            row_heights: BTreeMap::new(),
        }
    }
}

// ==================== Sheet table operations ====================

impl Book {
    /// Append a worksheet, copying cells and sizing from `template` when
    /// given.
    pub fn add_sheet(&mut self, name: &str, template: Option<SheetId>) -> Option<SheetId> {
        self.insert_sheet(self.sheets.len(), name, template)
    }

    /// Insert a worksheet at `index`, shifting later sheets up.
    pub fn insert_sheet(
        &mut self,
        index: usize,
        name: &str,
        template: Option<SheetId>,
    ) -> Option<SheetId> {
        if index > self.sheets.len() {
            return self.fail(
                None,
                format!("sheet index {} out of range (count {})", index, self.sheets.len()),
            );
        }
        if !self.validate_sheet_name(name, None) {
            return None;
        }
        let mut data = match template {
            Some(t) => {
                if t.0 >= self.sheets.len() {
                    return self.fail(None, format!("sheet id {} out of range", t.0));
                }
                self.sheets[t.0].clone()
            }
            None => SheetData::new(name, SheetKind::Worksheet),
        };
        data.name = name.to_string();

        let bump_active = !self.sheets.is_empty() && self.active_sheet >= index;
        self.sheets.insert(index, data);
        if bump_active {
            self.active_sheet += 1;
        }
        Some(SheetId(index))
    }

    /// Sheet id at a position.
    pub fn sheet_at(&mut self, index: usize) -> Option<SheetId> {
        if index >= self.sheets.len() {
            return self.fail(
                None,
                format!("sheet index {} out of range (count {})", index, self.sheets.len()),
            );
        }
        Some(SheetId(index))
    }

    /// Kind of the sheet, or [`SheetKind::Unknown`] for a bad id.
    pub fn sheet_kind(&mut self, sheet: SheetId) -> SheetKind {
        match self.sheet_ref(sheet) {
            Some(data) => data.kind,
            None => SheetKind::Unknown,
        }
    }

    /// Remove a sheet. Later sheet ids shift down by one.
    pub fn remove_sheet(&mut self, sheet: SheetId) -> bool {
        if sheet.0 >= self.sheets.len() {
            return self.fail(false, format!("sheet id {} out of range", sheet.0));
        }
        self.sheets.remove(sheet.0);
        if self.sheets.is_empty() {
            self.active_sheet = 0;
        } else if self.active_sheet >= self.sheets.len() {
            self.active_sheet = self.sheets.len() - 1;
        }
        true
    }

    /// Number of sheets in the book.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Position of the active sheet.
    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    pub fn set_active_sheet(&mut self, index: usize) -> bool {
        if index >= self.sheets.len() {
            return self.fail(
                false,
                format!("sheet index {} out of range (count {})", index, self.sheets.len()),
            );
        }
        self.active_sheet = index;
        true
    }

    pub fn sheet_name(&mut self, sheet: SheetId) -> Option<&str> {
        if sheet.0 >= self.sheets.len() {
            return self.fail(None, format!("sheet id {} out of range", sheet.0));
        }
        Some(self.sheets[sheet.0].name.as_str())
    }

    pub fn set_sheet_name(&mut self, sheet: SheetId, name: &str) -> bool {
        if sheet.0 >= self.sheets.len() {
            return self.fail(false, format!("sheet id {} out of range", sheet.0));
        }
        if !self.validate_sheet_name(name, Some(sheet.0)) {
            return false;
        }
        self.sheets[sheet.0].name = name.to_string();
        true
    }

    /// Check a proposed sheet name, optionally excluding one sheet from the
    /// duplicate check.
    fn validate_sheet_name(&mut self, name: &str, exclude: Option<usize>) -> bool {
        if name.is_empty() {
            return self.fail(false, "sheet name cannot be empty");
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return self.fail(
                false,
                format!("sheet name too long (max {} characters)", MAX_SHEET_NAME_LEN),
            );
        }
        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        for c in INVALID_CHARS {
            if name.contains(*c) {
                return self.fail(false, format!("sheet name cannot contain '{}'", c));
            }
        }
        let name_lower = name.to_lowercase();
        for (i, data) in self.sheets.iter().enumerate() {
            if Some(i) != exclude && data.name.to_lowercase() == name_lower {
                return self.fail(false, format!("sheet name '{}' already exists", name));
            }
        }
        true
    }
}

// ==================== Cell operations ====================

impl Book {
    pub fn write_text(
        &mut self,
        sheet: SheetId,
        row: u32,
        col: u16,
        text: &str,
        format: Option<FormatId>,
    ) -> bool {
        self.write_cell(sheet, row, col, CellValue::Text(text.to_string()), format)
    }

    pub fn write_number(
        &mut self,
        sheet: SheetId,
        row: u32,
        col: u16,
        value: f64,
        format: Option<FormatId>,
    ) -> bool {
        self.write_cell(sheet, row, col, CellValue::Number(value), format)
    }

    pub fn write_bool(
        &mut self,
        sheet: SheetId,
        row: u32,
        col: u16,
        value: bool,
        format: Option<FormatId>,
    ) -> bool {
        self.write_cell(sheet, row, col, CellValue::Bool(value), format)
    }

    /// Write a formatted cell with no value.
    pub fn write_blank(
        &mut self,
        sheet: SheetId,
        row: u32,
        col: u16,
        format: Option<FormatId>,
    ) -> bool {
        self.write_cell(sheet, row, col, CellValue::Empty, format)
    }

    /// Pack `date` with the book's date system and write the serial number.
    pub fn write_date(
        &mut self,
        sheet: SheetId,
        row: u32,
        col: u16,
        date: &DateParts,
        format: Option<FormatId>,
    ) -> bool {
        let serial = match crate::date::pack(self.date_1904, date) {
            Ok(v) => v,
            Err(msg) => return self.fail(false, msg),
        };
        self.write_cell(sheet, row, col, CellValue::Number(serial), format)
    }

    pub fn read_text(&mut self, sheet: SheetId, row: u32, col: u16) -> Option<&str> {
        match self.cell_kind(sheet, row, col)? {
            CellKind::Text => {}
            other => {
                return self.fail(
                    None,
                    format!("cell ({}, {}) holds {:?}, not text", row, col, other),
                );
            }
        }
        match &self.sheets[sheet.0].cells[&(row, col)].value {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn read_number(&mut self, sheet: SheetId, row: u32, col: u16) -> Option<f64> {
        match self.cell_kind(sheet, row, col)? {
            CellKind::Number => {}
            other => {
                return self.fail(
                    None,
                    format!("cell ({}, {}) holds {:?}, not a number", row, col, other),
                );
            }
        }
        match self.sheets[sheet.0].cells[&(row, col)].value {
            CellValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn read_bool(&mut self, sheet: SheetId, row: u32, col: u16) -> Option<bool> {
        match self.cell_kind(sheet, row, col)? {
            CellKind::Bool => {}
            other => {
                return self.fail(
                    None,
                    format!("cell ({}, {}) holds {:?}, not a boolean", row, col, other),
                );
            }
        }
        match self.sheets[sheet.0].cells[&(row, col)].value {
            CellValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Read a serial number cell and unpack it with the book's date system.
    pub fn read_date(&mut self, sheet: SheetId, row: u32, col: u16) -> Option<DateParts> {
        let serial = self.read_number(sheet, row, col)?;
        match crate::date::unpack(self.date_1904, serial) {
            Ok(parts) => Some(parts),
            Err(msg) => self.fail(None, msg),
        }
    }

    /// Classify the cell at an address. `None` means the address or sheet id
    /// was invalid.
    pub fn cell_kind(&mut self, sheet: SheetId, row: u32, col: u16) -> Option<CellKind> {
        if !self.check_cell_addr(row, col) {
            return None;
        }
        let data = self.sheet_ref(sheet)?;
        Some(match data.cells.get(&(row, col)) {
            None => CellKind::Empty,
            Some(cell) => match &cell.value {
                CellValue::Empty => CellKind::Blank,
                CellValue::Bool(_) => CellKind::Bool,
                CellValue::Number(_) => CellKind::Number,
                CellValue::Text(_) => CellKind::Text,
            },
        })
    }

    /// Format id of an existing cell.
    pub fn cell_format(&mut self, sheet: SheetId, row: u32, col: u16) -> Option<FormatId> {
        if !self.check_cell_addr(row, col) {
            return None;
        }
        let data = self.sheet_ref(sheet)?;
        match data.cells.get(&(row, col)) {
            Some(cell) => Some(cell.format),
            None => self.fail(None, format!("cell ({}, {}) is empty", row, col)),
        }
    }

    pub fn set_cell_format(&mut self, sheet: SheetId, row: u32, col: u16, format: FormatId) -> bool {
        if !self.check_cell_addr(row, col) || !self.check_format_opt(Some(format)) {
            return false;
        }
        let Some(data) = self.sheet_ref(sheet) else {
            return false;
        };
        match data.cells.get_mut(&(row, col)) {
            Some(cell) => {
                cell.format = format;
                true
            }
            None => self.fail(false, format!("cell ({}, {}) is empty", row, col)),
        }
    }

    fn write_cell(
        &mut self,
        sheet: SheetId,
        row: u32,
        col: u16,
        value: CellValue,
        format: Option<FormatId>,
    ) -> bool {
        if !self.check_cell_addr(row, col) || !self.check_format_opt(format) {
            return false;
        }
        let Some(data) = self.sheet_ref(sheet) else {
            return false;
        };
        let cell = data.cells.entry((row, col)).or_insert(CellData {
            value: CellValue::Empty,
            format: FormatId(0),
        });
        cell.value = value;
        if let Some(f) = format {
            cell.format = f;
        }
        true
    }

    fn check_cell_addr(&mut self, row: u32, col: u16) -> bool {
        if row >= MAX_ROWS {
            return self.fail(false, format!("row {} out of range (max {})", row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return self.fail(
                false,
                format!("column {} out of range (max {})", col, MAX_COLS - 1),
            );
        }
        true
    }

    fn check_format_opt(&mut self, format: Option<FormatId>) -> bool {
        if let Some(f) = format {
            if f.0 >= self.formats.len() {
                return self.fail(false, format!("format id {} out of range", f.0));
            }
        }
        true
    }

    fn sheet_ref(&mut self, sheet: SheetId) -> Option<&mut SheetData> {
        if sheet.0 >= self.sheets.len() {
            self.last_error = Some(format!("sheet id {} out of range", sheet.0));
            return None;
        }
        Some(&mut self.sheets[sheet.0])
    }
}

// ==================== Row and column sizing ====================

impl Book {
    /// Width of a column, in character units.
    pub fn col_width(&mut self, sheet: SheetId, col: u16) -> Option<f64> {
        if col >= MAX_COLS {
            return self.fail(None, format!("column {} out of range (max {})", col, MAX_COLS - 1));
        }
        let data = self.sheet_ref(sheet)?;
        Some(data.col_widths.get(&col).copied().unwrap_or(DEFAULT_COL_WIDTH))
    }

    /// Set the width of the columns `first_col..=last_col`.
    pub fn set_col_width(&mut self, sheet: SheetId, first_col: u16, last_col: u16, width: f64) -> bool {
        if first_col > last_col || last_col >= MAX_COLS {
            return self.fail(
                false,
                format!("invalid column range {}..={}", first_col, last_col),
            );
        }
        if !width.is_finite() || width < 0.0 {
            return self.fail(false, format!("invalid column width {}", width));
        }
        let Some(data) = self.sheet_ref(sheet) else {
            return false;
        };
        for col in first_col..=last_col {
            data.col_widths.insert(col, width);
        }
        true
    }

    /// Height of a row, in points.
    pub fn row_height(&mut self, sheet: SheetId, row: u32) -> Option<f64> {
        if row >= MAX_ROWS {
            return self.fail(None, format!("row {} out of range (max {})", row, MAX_ROWS - 1));
        }
        let data = self.sheet_ref(sheet)?;
        Some(data.row_heights.get(&row).copied().unwrap_or(DEFAULT_ROW_HEIGHT))
    }

    pub fn set_row_height(&mut self, sheet: SheetId, row: u32, height: f64) -> bool {
        if row >= MAX_ROWS {
            return self.fail(false, format!("row {} out of range (max {})", row, MAX_ROWS - 1));
        }
        if !height.is_finite() || height < 0.0 {
            return self.fail(false, format!("invalid row height {}", height));
        }
        let Some(data) = self.sheet_ref(sheet) else {
            return false;
        };
        data.row_heights.insert(row, height);
        true
    }

    /// First row holding a cell.
    pub fn first_row(&mut self, sheet: SheetId) -> Option<u32> {
        let data = self.sheet_ref(sheet)?;
        Some(data.cells.keys().next().map(|&(r, _)| r).unwrap_or(0))
    }

    /// One past the last row holding a cell; 0 for an empty sheet.
    pub fn last_row(&mut self, sheet: SheetId) -> Option<u32> {
        let data = self.sheet_ref(sheet)?;
        Some(data.cells.keys().next_back().map(|&(r, _)| r + 1).unwrap_or(0))
    }

    /// First column holding a cell.
    pub fn first_col(&mut self, sheet: SheetId) -> Option<u16> {
        let data = self.sheet_ref(sheet)?;
        Some(data.cells.keys().map(|&(_, c)| c).min().unwrap_or(0))
    }

    /// One past the last column holding a cell; 0 for an empty sheet.
    pub fn last_col(&mut self, sheet: SheetId) -> Option<u16> {
        let data = self.sheet_ref(sheet)?;
        Some(data.cells.keys().map(|&(_, c)| c).max().map(|c| c + 1).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::BookKind;

    fn book() -> Box<Book> {
        Book::create(BookKind::Binary).unwrap()
    }

    fn book_with_sheet() -> (Box<Book>, SheetId) {
        let mut b = book();
        let s = b.add_sheet("Sheet1", None).unwrap();
        (b, s)
    }

    #[test]
    fn test_new_book_has_no_sheets() {
        let b = book();
        assert_eq!(b.sheet_count(), 0);
    }

    #[test]
    fn test_add_and_remove_sheets() {
        let mut b = book();
        let s1 = b.add_sheet("One", None).unwrap();
        let s2 = b.add_sheet("Two", None).unwrap();
        assert_eq!((s1, s2), (SheetId(0), SheetId(1)));
        assert_eq!(b.sheet_count(), 2);

        assert!(b.remove_sheet(s1));
        assert_eq!(b.sheet_count(), 1);
        // Positions shift down after removal
        assert_eq!(b.sheet_name(SheetId(0)), Some("Two"));
    }

    #[test]
    fn test_insert_keeps_active_sheet() {
        let mut b = book();
        b.add_sheet("One", None).unwrap();
        b.add_sheet("Two", None).unwrap();
        assert!(b.set_active_sheet(1));
        b.insert_sheet(0, "Zero", None).unwrap();
        // Active still points at "Two"
        assert_eq!(b.active_sheet(), 2);
        assert_eq!(b.sheet_name(SheetId(2)), Some("Two"));
    }

    #[test]
    fn test_sheet_name_validation() {
        let mut b = book();
        b.add_sheet("One", None).unwrap();
        assert!(b.add_sheet("", None).is_none());
        assert!(b.add_sheet("a:b", None).is_none());
        assert!(b.add_sheet("a[b]", None).is_none());
        assert!(b.add_sheet(&"x".repeat(MAX_SHEET_NAME_LEN + 1), None).is_none());
        // Duplicates are case-insensitive
        assert!(b.add_sheet("ONE", None).is_none());
        assert!(b.last_error().unwrap().contains("already exists"));
    }

    #[test]
    fn test_rename_self_is_not_a_duplicate() {
        let (mut b, s) = book_with_sheet();
        assert!(b.set_sheet_name(s, "SHEET1"));
        assert_eq!(b.sheet_name(s), Some("SHEET1"));
    }

    #[test]
    fn test_template_copies_cells() {
        let (mut b, s) = book_with_sheet();
        b.write_number(s, 0, 0, 7.0, None);
        b.set_col_width(s, 0, 0, 20.0);

        let copy = b.add_sheet("Copy", Some(s)).unwrap();
        assert_eq!(b.read_number(copy, 0, 0), Some(7.0));
        assert_eq!(b.col_width(copy, 0), Some(20.0));
        // Copies are independent
        b.write_number(copy, 0, 0, 8.0, None);
        assert_eq!(b.read_number(s, 0, 0), Some(7.0));
    }

    #[test]
    fn test_typed_reads_reject_other_kinds() {
        let (mut b, s) = book_with_sheet();
        b.write_text(s, 1, 1, "hello", None);
        assert_eq!(b.read_text(s, 1, 1), Some("hello"));
        assert_eq!(b.read_number(s, 1, 1), None);
        assert!(b.last_error().unwrap().contains("not a number"));
        assert_eq!(b.read_bool(s, 1, 1), None);
    }

    #[test]
    fn test_cell_kinds() {
        let (mut b, s) = book_with_sheet();
        assert_eq!(b.cell_kind(s, 0, 0), Some(CellKind::Empty));
        b.write_blank(s, 0, 0, Some(FormatId(0)));
        assert_eq!(b.cell_kind(s, 0, 0), Some(CellKind::Blank));
        b.write_bool(s, 0, 1, true, None);
        assert_eq!(b.cell_kind(s, 0, 1), Some(CellKind::Bool));
        b.write_number(s, 0, 2, 1.5, None);
        assert_eq!(b.cell_kind(s, 0, 2), Some(CellKind::Number));
        b.write_text(s, 0, 3, "x", None);
        assert_eq!(b.cell_kind(s, 0, 3), Some(CellKind::Text));
    }

    #[test]
    fn test_write_rejects_out_of_range() {
        let (mut b, s) = book_with_sheet();
        assert!(!b.write_number(s, MAX_ROWS, 0, 1.0, None));
        assert!(!b.write_number(s, 0, MAX_COLS, 1.0, None));
        assert!(!b.write_number(s, 0, 0, 1.0, Some(FormatId(9))));
        assert!(!b.write_number(SheetId(5), 0, 0, 1.0, None));
    }

    #[test]
    fn test_cell_format_tracking() {
        let (mut b, s) = book_with_sheet();
        let fmt = b.add_format(None).unwrap();
        b.write_number(s, 2, 2, 9.0, Some(fmt));
        assert_eq!(b.cell_format(s, 2, 2), Some(fmt));

        let fmt2 = b.add_format(None).unwrap();
        assert!(b.set_cell_format(s, 2, 2, fmt2));
        assert_eq!(b.cell_format(s, 2, 2), Some(fmt2));

        assert_eq!(b.cell_format(s, 9, 9), None);
        assert!(b.last_error().unwrap().contains("empty"));
    }

    #[test]
    fn test_dates_roundtrip_through_cells() {
        let (mut b, s) = book_with_sheet();
        let date = DateParts::new(2023, 7, 14).with_time(8, 30, 0, 0);
        assert!(b.write_date(s, 0, 0, &date, None));
        assert_eq!(b.cell_kind(s, 0, 0), Some(CellKind::Number));
        assert_eq!(b.read_date(s, 0, 0), Some(date));
    }

    #[test]
    fn test_write_date_rejects_invalid() {
        let (mut b, s) = book_with_sheet();
        assert!(!b.write_date(s, 0, 0, &DateParts::new(1850, 1, 1), None));
        assert_eq!(b.cell_kind(s, 0, 0), Some(CellKind::Empty));
    }

    #[test]
    fn test_sizing_defaults() {
        let (mut b, s) = book_with_sheet();
        assert_eq!(b.col_width(s, 3), Some(DEFAULT_COL_WIDTH));
        assert_eq!(b.row_height(s, 3), Some(DEFAULT_ROW_HEIGHT));
        assert!(b.set_col_width(s, 2, 4, 15.5));
        assert_eq!(b.col_width(s, 3), Some(15.5));
        assert_eq!(b.col_width(s, 5), Some(DEFAULT_COL_WIDTH));
        assert!(b.set_row_height(s, 1, 30.0));
        assert_eq!(b.row_height(s, 1), Some(30.0));
        assert!(!b.set_col_width(s, 4, 2, 10.0));
        assert!(!b.set_row_height(s, 0, f64::NAN));
    }

    #[test]
    fn test_used_range_bounds() {
        let (mut b, s) = book_with_sheet();
        assert_eq!(b.first_row(s), Some(0));
        assert_eq!(b.last_row(s), Some(0));
        b.write_number(s, 3, 2, 1.0, None);
        b.write_number(s, 7, 5, 1.0, None);
        assert_eq!(b.first_row(s), Some(3));
        assert_eq!(b.last_row(s), Some(8));
        assert_eq!(b.first_col(s), Some(2));
        assert_eq!(b.last_col(s), Some(6));
    }

    #[test]
    fn test_sheet_kind_sentinel() {
        let (mut b, s) = book_with_sheet();
        assert_eq!(b.sheet_kind(s), SheetKind::Worksheet);
        assert_eq!(b.sheet_kind(SheetId(9)), SheetKind::Unknown);
        assert!(b.last_error().is_some());
    }
}

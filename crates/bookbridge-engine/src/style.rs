//! Font and cell-format records plus their property operations.
//!
//! Fonts and formats live in per-book tables addressed by [`FontId`] and
//! [`FormatId`]; they are never removed, so ids stay stable for the life of
//! the book.

use crate::book::{Book, FontId, FormatId};
use crate::CUSTOM_FORMAT_BASE;

/// Underline style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
}

/// Horizontal cell alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlignH {
    /// Type-dependent default alignment
    #[default]
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
}

/// Vertical cell alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlignV {
    Top,
    Center,
    #[default]
    Bottom,
}

/// Cell border line style, applied to all four sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
}

/// Cell fill pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillPattern {
    #[default]
    None,
    Solid,
    Gray50,
    Gray25,
    Gray12,
}

impl Underline {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Underline::None => 0,
            Underline::Single => 1,
            Underline::Double => 2,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Underline::None),
            1 => Some(Underline::Single),
            2 => Some(Underline::Double),
            _ => None,
        }
    }
}

impl AlignH {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            AlignH::General => 0,
            AlignH::Left => 1,
            AlignH::Center => 2,
            AlignH::Right => 3,
            AlignH::Fill => 4,
            AlignH::Justify => 5,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(AlignH::General),
            1 => Some(AlignH::Left),
            2 => Some(AlignH::Center),
            3 => Some(AlignH::Right),
            4 => Some(AlignH::Fill),
            5 => Some(AlignH::Justify),
            _ => None,
        }
    }
}

impl AlignV {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            AlignV::Top => 0,
            AlignV::Center => 1,
            AlignV::Bottom => 2,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(AlignV::Top),
            1 => Some(AlignV::Center),
            2 => Some(AlignV::Bottom),
            _ => None,
        }
    }
}

impl BorderStyle {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            BorderStyle::None => 0,
            BorderStyle::Thin => 1,
            BorderStyle::Medium => 2,
            BorderStyle::Thick => 3,
            BorderStyle::Dashed => 4,
            BorderStyle::Dotted => 5,
            BorderStyle::Double => 6,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(BorderStyle::None),
            1 => Some(BorderStyle::Thin),
            2 => Some(BorderStyle::Medium),
            3 => Some(BorderStyle::Thick),
            4 => Some(BorderStyle::Dashed),
            5 => Some(BorderStyle::Dotted),
            6 => Some(BorderStyle::Double),
            _ => None,
        }
    }
}

impl FillPattern {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            FillPattern::None => 0,
            FillPattern::Solid => 1,
            FillPattern::Gray50 => 2,
            FillPattern::Gray25 => 3,
            FillPattern::Gray12 => 4,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(FillPattern::None),
            1 => Some(FillPattern::Solid),
            2 => Some(FillPattern::Gray50),
            3 => Some(FillPattern::Gray25),
            4 => Some(FillPattern::Gray12),
            _ => None,
        }
    }
}

/// Font table entry
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FontData {
    pub(crate) name: String,
    pub(crate) size: f64,
    pub(crate) bold: bool,
    pub(crate) italic: bool,
    pub(crate) underline: Underline,
    pub(crate) strikeout: bool,
    /// Packed 0xRRGGBB
    pub(crate) color: u32,
}

impl Default for FontData {
    fn default() -> Self {
        Self {
            name: "Calibri".to_string(),
            size: 11.0,
            bold: false,
            italic: false,
            underline: Underline::None,
            strikeout: false,
            color: 0,
        }
    }
}

/// Format table entry
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FormatData {
    pub(crate) font: FontId,
    pub(crate) num_format: u16,
    pub(crate) align_h: AlignH,
    pub(crate) align_v: AlignV,
    pub(crate) wrap: bool,
    pub(crate) border: BorderStyle,
    pub(crate) border_color: u32,
    pub(crate) fill: FillPattern,
    pub(crate) fill_fg: u32,
    pub(crate) fill_bg: u32,
}

impl Default for FormatData {
    fn default() -> Self {
        Self {
            font: FontId(0),
            num_format: 0,
            align_h: AlignH::General,
            align_v: AlignV::Bottom,
            wrap: false,
            border: BorderStyle::None,
            border_color: 0,
            fill: FillPattern::None,
            fill_fg: 0,
            fill_bg: 0xFF_FFFF,
        }
    }
}

// ==================== Font operations ====================

impl Book {
    /// Add a font, copying `template` when given, otherwise starting from the
    /// book's default font.
    pub fn add_font(&mut self, template: Option<FontId>) -> Option<FontId> {
        let data = match template {
            Some(t) => self.font_ref(t)?.clone(),
            None => FontData {
                name: self.default_font_name.clone(),
                size: self.default_font_size,
                ..FontData::default()
            },
        };
        let id = FontId(self.fonts.len());
        self.fonts.push(data);
        Some(id)
    }

    /// Font id at a table index.
    pub fn font_at(&mut self, index: usize) -> Option<FontId> {
        if index >= self.fonts.len() {
            return self.fail(None, format!("font index {} out of range", index));
        }
        Some(FontId(index))
    }

    /// Number of fonts in the book.
    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    pub fn font_name(&mut self, font: FontId) -> Option<&str> {
        self.font_ref(font).map(|f| f.name.as_str())
    }

    pub fn set_font_name(&mut self, font: FontId, name: &str) -> bool {
        if name.is_empty() {
            return self.fail(false, "font name cannot be empty");
        }
        match self.font_ref(font) {
            Some(f) => {
                f.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn font_size(&mut self, font: FontId) -> Option<f64> {
        self.font_ref(font).map(|f| f.size)
    }

    pub fn set_font_size(&mut self, font: FontId, size: f64) -> bool {
        if !size.is_finite() || size <= 0.0 {
            return self.fail(false, format!("invalid font size {}", size));
        }
        match self.font_ref(font) {
            Some(f) => {
                f.size = size;
                true
            }
            None => false,
        }
    }

    pub fn font_bold(&mut self, font: FontId) -> Option<bool> {
        self.font_ref(font).map(|f| f.bold)
    }

    pub fn set_font_bold(&mut self, font: FontId, bold: bool) -> bool {
        match self.font_ref(font) {
            Some(f) => {
                f.bold = bold;
                true
            }
            None => false,
        }
    }

    pub fn font_italic(&mut self, font: FontId) -> Option<bool> {
        self.font_ref(font).map(|f| f.italic)
    }

    pub fn set_font_italic(&mut self, font: FontId, italic: bool) -> bool {
        match self.font_ref(font) {
            Some(f) => {
                f.italic = italic;
                true
            }
            None => false,
        }
    }

    pub fn font_underline(&mut self, font: FontId) -> Option<Underline> {
        self.font_ref(font).map(|f| f.underline)
    }

    pub fn set_font_underline(&mut self, font: FontId, underline: Underline) -> bool {
        match self.font_ref(font) {
            Some(f) => {
                f.underline = underline;
                true
            }
            None => false,
        }
    }

    pub fn font_strikeout(&mut self, font: FontId) -> Option<bool> {
        self.font_ref(font).map(|f| f.strikeout)
    }

    pub fn set_font_strikeout(&mut self, font: FontId, strikeout: bool) -> bool {
        match self.font_ref(font) {
            Some(f) => {
                f.strikeout = strikeout;
                true
            }
            None => false,
        }
    }

    /// Font color as packed 0xRRGGBB.
    pub fn font_color(&mut self, font: FontId) -> Option<u32> {
        self.font_ref(font).map(|f| f.color)
    }

    pub fn set_font_color(&mut self, font: FontId, color: u32) -> bool {
        match self.font_ref(font) {
            Some(f) => {
                f.color = color;
                true
            }
            None => false,
        }
    }

    fn font_ref(&mut self, font: FontId) -> Option<&mut FontData> {
        if font.0 >= self.fonts.len() {
            self.last_error = Some(format!("font id {} out of range", font.0));
            return None;
        }
        Some(&mut self.fonts[font.0])
    }
}

// ==================== Format operations ====================

impl Book {
    /// Add a cell format, copying `template` when given.
    pub fn add_format(&mut self, template: Option<FormatId>) -> Option<FormatId> {
        let data = match template {
            Some(t) => self.format_ref(t)?.clone(),
            None => FormatData::default(),
        };
        let id = FormatId(self.formats.len());
        self.formats.push(data);
        Some(id)
    }

    /// Format id at a table index.
    pub fn format_at(&mut self, index: usize) -> Option<FormatId> {
        if index >= self.formats.len() {
            return self.fail(None, format!("format index {} out of range", index));
        }
        Some(FormatId(index))
    }

    /// Number of cell formats in the book.
    pub fn format_count(&self) -> usize {
        self.formats.len()
    }

    pub fn format_font(&mut self, format: FormatId) -> Option<FontId> {
        self.format_ref(format).map(|f| f.font)
    }

    pub fn set_format_font(&mut self, format: FormatId, font: FontId) -> bool {
        if font.0 >= self.fonts.len() {
            return self.fail(false, format!("font id {} out of range", font.0));
        }
        match self.format_ref(format) {
            Some(f) => {
                f.font = font;
                true
            }
            None => false,
        }
    }

    /// Number format id (built-in below [`CUSTOM_FORMAT_BASE`], custom above).
    pub fn format_num_format(&mut self, format: FormatId) -> Option<u16> {
        self.format_ref(format).map(|f| f.num_format)
    }

    pub fn set_format_num_format(&mut self, format: FormatId, num_format: u16) -> bool {
        if num_format >= CUSTOM_FORMAT_BASE {
            let idx = (num_format - CUSTOM_FORMAT_BASE) as usize;
            if idx >= self.custom_formats.len() {
                return self.fail(
                    false,
                    format!("custom number format id {} not registered", num_format),
                );
            }
        }
        match self.format_ref(format) {
            Some(f) => {
                f.num_format = num_format;
                true
            }
            None => false,
        }
    }

    pub fn format_align_h(&mut self, format: FormatId) -> Option<AlignH> {
        self.format_ref(format).map(|f| f.align_h)
    }

    pub fn set_format_align_h(&mut self, format: FormatId, align: AlignH) -> bool {
        match self.format_ref(format) {
            Some(f) => {
                f.align_h = align;
                true
            }
            None => false,
        }
    }

    pub fn format_align_v(&mut self, format: FormatId) -> Option<AlignV> {
        self.format_ref(format).map(|f| f.align_v)
    }

    pub fn set_format_align_v(&mut self, format: FormatId, align: AlignV) -> bool {
        match self.format_ref(format) {
            Some(f) => {
                f.align_v = align;
                true
            }
            None => false,
        }
    }

    pub fn format_wrap(&mut self, format: FormatId) -> Option<bool> {
        self.format_ref(format).map(|f| f.wrap)
    }

    pub fn set_format_wrap(&mut self, format: FormatId, wrap: bool) -> bool {
        match self.format_ref(format) {
            Some(f) => {
                f.wrap = wrap;
                true
            }
            None => false,
        }
    }

    pub fn format_border(&mut self, format: FormatId) -> Option<BorderStyle> {
        self.format_ref(format).map(|f| f.border)
    }

    pub fn set_format_border(&mut self, format: FormatId, border: BorderStyle) -> bool {
        match self.format_ref(format) {
            Some(f) => {
                f.border = border;
                true
            }
            None => false,
        }
    }

    pub fn format_border_color(&mut self, format: FormatId) -> Option<u32> {
        self.format_ref(format).map(|f| f.border_color)
    }

    pub fn set_format_border_color(&mut self, format: FormatId, color: u32) -> bool {
        match self.format_ref(format) {
            Some(f) => {
                f.border_color = color;
                true
            }
            None => false,
        }
    }

    pub fn format_fill(&mut self, format: FormatId) -> Option<FillPattern> {
        self.format_ref(format).map(|f| f.fill)
    }

    pub fn set_format_fill(&mut self, format: FormatId, fill: FillPattern) -> bool {
        match self.format_ref(format) {
            Some(f) => {
                f.fill = fill;
                true
            }
            None => false,
        }
    }

    /// Fill foreground color as packed 0xRRGGBB.
    pub fn format_fill_fg(&mut self, format: FormatId) -> Option<u32> {
        self.format_ref(format).map(|f| f.fill_fg)
    }

    pub fn set_format_fill_fg(&mut self, format: FormatId, color: u32) -> bool {
        match self.format_ref(format) {
            Some(f) => {
                f.fill_fg = color;
                true
            }
            None => false,
        }
    }

    /// Fill background color as packed 0xRRGGBB.
    pub fn format_fill_bg(&mut self, format: FormatId) -> Option<u32> {
        self.format_ref(format).map(|f| f.fill_bg)
    }

    pub fn set_format_fill_bg(&mut self, format: FormatId, color: u32) -> bool {
        match self.format_ref(format) {
            Some(f) => {
                f.fill_bg = color;
                true
            }
            None => false,
        }
    }

    fn format_ref(&mut self, format: FormatId) -> Option<&mut FormatData> {
        if format.0 >= self.formats.len() {
            self.last_error = Some(format!("format id {} out of range", format.0));
            return None;
        }
        Some(&mut self.formats[format.0])
    }
}

// ==================== Custom number formats ====================

impl Book {
    /// Register a custom number format string, returning its id.
    pub fn add_custom_num_format(&mut self, format: &str) -> Option<u16> {
        if format.is_empty() {
            return self.fail(None, "custom number format cannot be empty");
        }
        let next = CUSTOM_FORMAT_BASE as usize + self.custom_formats.len();
        if next > u16::MAX as usize {
            return self.fail(None, "custom number format table is full");
        }
        self.custom_formats.push(format.to_string());
        Some(next as u16)
    }

    /// Look up a registered custom number format string.
    pub fn custom_num_format(&mut self, id: u16) -> Option<&str> {
        let idx = match id.checked_sub(CUSTOM_FORMAT_BASE) {
            Some(i) if (i as usize) < self.custom_formats.len() => i as usize,
            _ => {
                return self.fail(None, format!("custom number format id {} not registered", id));
            }
        };
        Some(self.custom_formats[idx].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::BookKind;

    fn book() -> Box<Book> {
        Book::create(BookKind::Binary).unwrap()
    }

    #[test]
    fn test_new_book_has_default_tables() {
        let b = book();
        assert_eq!(b.font_count(), 1);
        assert_eq!(b.format_count(), 1);
    }

    #[test]
    fn test_add_font_from_template() {
        let mut b = book();
        let base = b.add_font(None).unwrap();
        assert!(b.set_font_bold(base, true));
        assert!(b.set_font_size(base, 14.0));

        let copy = b.add_font(Some(base)).unwrap();
        assert_eq!(b.font_bold(copy), Some(true));
        assert_eq!(b.font_size(copy), Some(14.0));
        // The copy is independent
        assert!(b.set_font_bold(copy, false));
        assert_eq!(b.font_bold(base), Some(true));
    }

    #[test]
    fn test_font_id_out_of_range() {
        let mut b = book();
        assert_eq!(b.font_size(FontId(99)), None);
        assert!(b.last_error().unwrap().contains("out of range"));
    }

    #[test]
    fn test_set_font_size_rejects_nonpositive() {
        let mut b = book();
        let f = b.add_font(None).unwrap();
        assert!(!b.set_font_size(f, 0.0));
        assert!(!b.set_font_size(f, -3.0));
        assert!(!b.set_font_size(f, f64::NAN));
        assert_eq!(b.font_size(f), Some(11.0));
    }

    #[test]
    fn test_format_properties() {
        let mut b = book();
        let fmt = b.add_format(None).unwrap();
        assert!(b.set_format_align_h(fmt, AlignH::Center));
        assert!(b.set_format_wrap(fmt, true));
        assert!(b.set_format_border(fmt, BorderStyle::Thin));
        assert_eq!(b.format_align_h(fmt), Some(AlignH::Center));
        assert_eq!(b.format_wrap(fmt), Some(true));
        assert_eq!(b.format_border(fmt), Some(BorderStyle::Thin));
    }

    #[test]
    fn test_format_font_link() {
        let mut b = book();
        let font = b.add_font(None).unwrap();
        let fmt = b.add_format(None).unwrap();
        assert!(b.set_format_font(fmt, font));
        assert_eq!(b.format_font(fmt), Some(font));
        assert!(!b.set_format_font(fmt, FontId(42)));
    }

    #[test]
    fn test_custom_num_format_ids() {
        let mut b = book();
        let id = b.add_custom_num_format("0.00%").unwrap();
        assert_eq!(id, CUSTOM_FORMAT_BASE);
        assert_eq!(b.custom_num_format(id), Some("0.00%"));

        let id2 = b.add_custom_num_format("#,##0").unwrap();
        assert_eq!(id2, CUSTOM_FORMAT_BASE + 1);

        assert_eq!(b.custom_num_format(163), None);
        assert_eq!(b.custom_num_format(id2 + 1), None);
    }

    #[test]
    fn test_set_num_format_requires_registration() {
        let mut b = book();
        let fmt = b.add_format(None).unwrap();
        // Built-in ids always pass
        assert!(b.set_format_num_format(fmt, 14));
        // Custom ids must be registered first
        assert!(!b.set_format_num_format(fmt, CUSTOM_FORMAT_BASE));
        let id = b.add_custom_num_format("0.000").unwrap();
        assert!(b.set_format_num_format(fmt, id));
        assert_eq!(b.format_num_format(fmt), Some(id));
    }
}

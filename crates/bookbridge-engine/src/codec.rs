//! Little-endian record container shared by both book kinds.
//!
//! Layout: 4-byte magic, `u16` container version, then a sequence of
//! tag/length/payload records terminated by [`REC_END`]. All multi-byte
//! integers are little-endian. Strings are a `u32` byte length followed by
//! UTF-8 data.

use thiserror::Error;

use crate::book::{Book, BookKind, FontId, FormatId};
use crate::picture::PictureKind;
use crate::sheet::{CellData, CellValue, SheetData, SheetKind};
use crate::style::{AlignH, AlignV, BorderStyle, FillPattern, FontData, FormatData, Underline};

/// Result type for container encode/decode
pub(crate) type CodecResult<T> = std::result::Result<T, CodecError>;

/// Errors raised while decoding a container
#[derive(Debug, Error)]
pub(crate) enum CodecError {
    /// Input ended before a complete field
    #[error("input truncated at offset {0}, need {1} more bytes")]
    Truncated(usize, usize),

    /// Structurally invalid data
    #[error("malformed container: {0}")]
    Malformed(String),
}

// ==================== Record tags ====================

pub(crate) const REC_SETTINGS: u16 = 0x0010;
pub(crate) const REC_FONT: u16 = 0x0020;
pub(crate) const REC_FORMAT: u16 = 0x0021;
pub(crate) const REC_CUSTOM_FORMAT: u16 = 0x0022;
pub(crate) const REC_SHEET: u16 = 0x0030;
pub(crate) const REC_PICTURE: u16 = 0x0040;
pub(crate) const REC_END: u16 = 0xFFFF;

/// Container magic for [`crate::BookKind::Binary`]
pub(crate) const MAGIC_BINARY: [u8; 4] = *b"BBK1";
/// Container magic for [`crate::BookKind::Archive`]
pub(crate) const MAGIC_ARCHIVE: [u8; 4] = *b"BBX1";

/// Container version written for [`crate::BookKind::Binary`] books
pub(crate) const VERSION_BINARY: u16 = 0x0300;
/// Container version written for [`crate::BookKind::Archive`] books
pub(crate) const VERSION_ARCHIVE: u16 = 0x0400;

// ==================== Read helpers ====================

/// Read a `u8` from a byte slice at `offset`, advancing `offset`.
#[inline]
pub(crate) fn read_u8(data: &[u8], offset: &mut usize) -> CodecResult<u8> {
    if *offset >= data.len() {
        return Err(CodecError::Truncated(*offset, 1));
    }
    let v = data[*offset];
    *offset += 1;
    Ok(v)
}

/// Read a `u16` (little-endian) at `offset`, advancing `offset`.
#[inline]
pub(crate) fn read_u16(data: &[u8], offset: &mut usize) -> CodecResult<u16> {
    if *offset + 2 > data.len() {
        return Err(CodecError::Truncated(*offset, 2));
    }
    let v = u16::from_le_bytes([data[*offset], data[*offset + 1]]);
    *offset += 2;
    Ok(v)
}

/// Read a `u32` (little-endian) at `offset`, advancing `offset`.
#[inline]
pub(crate) fn read_u32(data: &[u8], offset: &mut usize) -> CodecResult<u32> {
    if *offset + 4 > data.len() {
        return Err(CodecError::Truncated(*offset, 4));
    }
    let v = u32::from_le_bytes([
        data[*offset],
        data[*offset + 1],
        data[*offset + 2],
        data[*offset + 3],
    ]);
    *offset += 4;
    Ok(v)
}

/// Read an `f64` (IEEE 754 double, little-endian) at `offset`.
#[inline]
pub(crate) fn read_f64(data: &[u8], offset: &mut usize) -> CodecResult<f64> {
    if *offset + 8 > data.len() {
        return Err(CodecError::Truncated(*offset, 8));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[*offset..*offset + 8]);
    *offset += 8;
    Ok(f64::from_le_bytes(bytes))
}

/// Read `len` raw bytes at `offset`, advancing `offset`.
#[inline]
pub(crate) fn read_bytes<'a>(
    data: &'a [u8],
    offset: &mut usize,
    len: usize,
) -> CodecResult<&'a [u8]> {
    if *offset + len > data.len() {
        return Err(CodecError::Truncated(*offset, len));
    }
    let slice = &data[*offset..*offset + len];
    *offset += len;
    Ok(slice)
}

/// Read a length-prefixed UTF-8 string at `offset`.
pub(crate) fn read_str(data: &[u8], offset: &mut usize) -> CodecResult<String> {
    let len = read_u32(data, offset)? as usize;
    let bytes = read_bytes(data, offset, len)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| CodecError::Malformed(format!("invalid UTF-8 in string at offset {}", *offset - len)))
}

// ==================== Write helpers ====================

#[inline]
pub(crate) fn write_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

#[inline]
pub(crate) fn write_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

#[inline]
pub(crate) fn write_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

#[inline]
pub(crate) fn write_f64(out: &mut Vec<u8>, v: f64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Write a length-prefixed UTF-8 string.
pub(crate) fn write_str(out: &mut Vec<u8>, s: &str) {
    write_u32(out, s.len() as u32);
    out.extend_from_slice(s.as_bytes());
}

/// Append one tag/length/payload record.
pub(crate) fn write_record(out: &mut Vec<u8>, tag: u16, payload: &[u8]) {
    write_u16(out, tag);
    write_u32(out, payload.len() as u32);
    out.extend_from_slice(payload);
}

// ==================== Book containers ====================

/// Fields of a successfully decoded container, applied to a book in one step
/// so a failed load leaves the book untouched.
pub(crate) struct Decoded {
    pub(crate) version: u16,
    pub(crate) default_font_name: String,
    pub(crate) default_font_size: f64,
    pub(crate) ref_r1c1: bool,
    pub(crate) rgb_mode: bool,
    pub(crate) date_1904: bool,
    pub(crate) is_template: bool,
    pub(crate) active_sheet: usize,
    pub(crate) fonts: Vec<FontData>,
    pub(crate) formats: Vec<FormatData>,
    pub(crate) custom_formats: Vec<String>,
    pub(crate) sheets: Vec<SheetData>,
    pub(crate) pictures: Vec<(PictureKind, Vec<u8>)>,
}

/// Serialize a book. The result always decodes under the same kind.
pub(crate) fn encode_book(book: &Book) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&book.kind.magic());
    write_u16(&mut out, book.version);

    let mut p = Vec::new();
    write_str(&mut p, &book.default_font_name);
    write_f64(&mut p, book.default_font_size);
    let mut flags = 0u8;
    if book.ref_r1c1 {
        flags |= 0x01;
    }
    if book.rgb_mode {
        flags |= 0x02;
    }
    if book.date_1904 {
        flags |= 0x04;
    }
    if book.is_template {
        flags |= 0x08;
    }
    write_u8(&mut p, flags);
    write_u32(&mut p, book.active_sheet as u32);
    write_record(&mut out, REC_SETTINGS, &p);

    for font in &book.fonts {
        write_record(&mut out, REC_FONT, &encode_font(font));
    }
    for format in &book.formats {
        write_record(&mut out, REC_FORMAT, &encode_format(format));
    }
    for custom in &book.custom_formats {
        let mut p = Vec::new();
        write_str(&mut p, custom);
        write_record(&mut out, REC_CUSTOM_FORMAT, &p);
    }
    for sheet in &book.sheets {
        write_record(&mut out, REC_SHEET, &encode_sheet(sheet));
    }
    for (kind, bytes) in &book.pictures {
        let mut p = Vec::new();
        write_u8(&mut p, kind.as_u8());
        write_u32(&mut p, bytes.len() as u32);
        p.extend_from_slice(bytes);
        write_record(&mut out, REC_PICTURE, &p);
    }
    write_record(&mut out, REC_END, &[]);
    out
}

/// Decode a container of the given kind.
pub(crate) fn decode_book(kind: BookKind, data: &[u8]) -> CodecResult<Decoded> {
    let mut off = 0;
    let magic = read_bytes(data, &mut off, 4)?;
    if magic != &kind.magic()[..] {
        return Err(CodecError::Malformed(format!(
            "magic does not match kind {}",
            kind
        )));
    }
    let version = read_u16(data, &mut off)?;

    let mut decoded = Decoded {
        version,
        default_font_name: "Calibri".to_string(),
        default_font_size: 11.0,
        ref_r1c1: false,
        rgb_mode: false,
        date_1904: false,
        is_template: false,
        active_sheet: 0,
        fonts: Vec::new(),
        formats: Vec::new(),
        custom_formats: Vec::new(),
        sheets: Vec::new(),
        pictures: Vec::new(),
    };

    loop {
        let tag = read_u16(data, &mut off)?;
        let len = read_u32(data, &mut off)? as usize;
        let payload = read_bytes(data, &mut off, len)?;
        match tag {
            REC_END => break,
            REC_SETTINGS => {
                let mut p = 0;
                decoded.default_font_name = read_str(payload, &mut p)?;
                decoded.default_font_size = read_f64(payload, &mut p)?;
                let flags = read_u8(payload, &mut p)?;
                decoded.ref_r1c1 = flags & 0x01 != 0;
                decoded.rgb_mode = flags & 0x02 != 0;
                decoded.date_1904 = flags & 0x04 != 0;
                decoded.is_template = flags & 0x08 != 0;
                decoded.active_sheet = read_u32(payload, &mut p)? as usize;
            }
            REC_FONT => decoded.fonts.push(decode_font(payload)?),
            REC_FORMAT => decoded.formats.push(decode_format(payload)?),
            REC_CUSTOM_FORMAT => {
                let mut p = 0;
                decoded.custom_formats.push(read_str(payload, &mut p)?);
            }
            REC_SHEET => decoded.sheets.push(decode_sheet(payload)?),
            REC_PICTURE => {
                let mut p = 0;
                let kind_tag = read_u8(payload, &mut p)?;
                let picture_kind = PictureKind::from_u8(kind_tag);
                if picture_kind == PictureKind::Unknown {
                    return Err(CodecError::Malformed(format!(
                        "invalid picture kind tag {}",
                        kind_tag
                    )));
                }
                let n = read_u32(payload, &mut p)? as usize;
                let bytes = read_bytes(payload, &mut p, n)?;
                decoded.pictures.push((picture_kind, bytes.to_vec()));
            }
            other => log::warn!("skipping unknown record tag 0x{:04X} ({} bytes)", other, len),
        }
    }

    validate(&decoded)?;
    Ok(decoded)
}

/// Cross-record consistency checks.
fn validate(d: &Decoded) -> CodecResult<()> {
    for (i, format) in d.formats.iter().enumerate() {
        if format.font.0 >= d.fonts.len() {
            return Err(CodecError::Malformed(format!(
                "format {} references missing font {}",
                i, format.font.0
            )));
        }
    }
    for sheet in &d.sheets {
        for (&(row, col), cell) in &sheet.cells {
            if cell.format.0 >= d.formats.len() {
                return Err(CodecError::Malformed(format!(
                    "cell ({}, {}) on '{}' references missing format {}",
                    row, col, sheet.name, cell.format.0
                )));
            }
        }
    }
    if !d.sheets.is_empty() && d.active_sheet >= d.sheets.len() {
        return Err(CodecError::Malformed(format!(
            "active sheet {} out of range",
            d.active_sheet
        )));
    }
    Ok(())
}

fn encode_font(font: &FontData) -> Vec<u8> {
    let mut p = Vec::new();
    write_str(&mut p, &font.name);
    write_f64(&mut p, font.size);
    let mut flags = 0u8;
    if font.bold {
        flags |= 0x01;
    }
    if font.italic {
        flags |= 0x02;
    }
    if font.strikeout {
        flags |= 0x04;
    }
    write_u8(&mut p, flags);
    write_u8(&mut p, font.underline.as_u8());
    write_u32(&mut p, font.color);
    p
}

fn decode_font(data: &[u8]) -> CodecResult<FontData> {
    let mut off = 0;
    let name = read_str(data, &mut off)?;
    let size = read_f64(data, &mut off)?;
    let flags = read_u8(data, &mut off)?;
    let underline_tag = read_u8(data, &mut off)?;
    let underline = Underline::from_u8(underline_tag)
        .ok_or_else(|| CodecError::Malformed(format!("invalid underline tag {}", underline_tag)))?;
    let color = read_u32(data, &mut off)?;
    Ok(FontData {
        name,
        size,
        bold: flags & 0x01 != 0,
        italic: flags & 0x02 != 0,
        underline,
        strikeout: flags & 0x04 != 0,
        color,
    })
}

fn encode_format(format: &FormatData) -> Vec<u8> {
    let mut p = Vec::new();
    write_u32(&mut p, format.font.0 as u32);
    write_u16(&mut p, format.num_format);
    write_u8(&mut p, format.align_h.as_u8());
    write_u8(&mut p, format.align_v.as_u8());
    write_u8(&mut p, format.wrap as u8);
    write_u8(&mut p, format.border.as_u8());
    write_u32(&mut p, format.border_color);
    write_u8(&mut p, format.fill.as_u8());
    write_u32(&mut p, format.fill_fg);
    write_u32(&mut p, format.fill_bg);
    p
}

fn decode_format(data: &[u8]) -> CodecResult<FormatData> {
    let mut off = 0;
    let font = FontId(read_u32(data, &mut off)? as usize);
    let num_format = read_u16(data, &mut off)?;
    let h = read_u8(data, &mut off)?;
    let align_h = AlignH::from_u8(h)
        .ok_or_else(|| CodecError::Malformed(format!("invalid horizontal alignment tag {}", h)))?;
    let v = read_u8(data, &mut off)?;
    let align_v = AlignV::from_u8(v)
        .ok_or_else(|| CodecError::Malformed(format!("invalid vertical alignment tag {}", v)))?;
    let wrap = read_u8(data, &mut off)? != 0;
    let b = read_u8(data, &mut off)?;
    let border = BorderStyle::from_u8(b)
        .ok_or_else(|| CodecError::Malformed(format!("invalid border style tag {}", b)))?;
    let border_color = read_u32(data, &mut off)?;
    let f = read_u8(data, &mut off)?;
    let fill = FillPattern::from_u8(f)
        .ok_or_else(|| CodecError::Malformed(format!("invalid fill pattern tag {}", f)))?;
    let fill_fg = read_u32(data, &mut off)?;
    let fill_bg = read_u32(data, &mut off)?;
    Ok(FormatData {
        font,
        num_format,
        align_h,
        align_v,
        wrap,
        border,
        border_color,
        fill,
        fill_fg,
        fill_bg,
    })
}

fn encode_sheet(sheet: &SheetData) -> Vec<u8> {
    let mut p = Vec::new();
    write_u8(&mut p, sheet.kind.as_u8());
    write_str(&mut p, &sheet.name);

    write_u32(&mut p, sheet.col_widths.len() as u32);
    for (&col, &width) in &sheet.col_widths {
        write_u16(&mut p, col);
        write_f64(&mut p, width);
    }
    write_u32(&mut p, sheet.row_heights.len() as u32);
    for (&row, &height) in &sheet.row_heights {
        write_u32(&mut p, row);
        write_f64(&mut p, height);
    }
    write_u32(&mut p, sheet.cells.len() as u32);
    for (&(row, col), cell) in &sheet.cells {
        write_u32(&mut p, row);
        write_u16(&mut p, col);
        write_u32(&mut p, cell.format.0 as u32);
        match &cell.value {
            CellValue::Empty => write_u8(&mut p, 0),
            CellValue::Bool(v) => {
                write_u8(&mut p, 1);
                write_u8(&mut p, *v as u8);
            }
            CellValue::Number(n) => {
                write_u8(&mut p, 2);
                write_f64(&mut p, *n);
            }
            CellValue::Text(s) => {
                write_u8(&mut p, 3);
                write_str(&mut p, s);
            }
        }
    }
    p
}

fn decode_sheet(data: &[u8]) -> CodecResult<SheetData> {
    let mut off = 0;
    let kind_tag = read_u8(data, &mut off)?;
    let kind = SheetKind::from_u8(kind_tag)
        .ok_or_else(|| CodecError::Malformed(format!("invalid sheet kind tag {}", kind_tag)))?;
    let name = read_str(data, &mut off)?;
    let mut sheet = SheetData::new(&name, kind);

    let n = read_u32(data, &mut off)?;
    for _ in 0..n {
        let col = read_u16(data, &mut off)?;
        let width = read_f64(data, &mut off)?;
        sheet.col_widths.insert(col, width);
    }
    let n = read_u32(data, &mut off)?;
    for _ in 0..n {
        let row = read_u32(data, &mut off)?;
        let height = read_f64(data, &mut off)?;
        sheet.row_heights.insert(row, height);
    }
    let n = read_u32(data, &mut off)?;
    for _ in 0..n {
        let row = read_u32(data, &mut off)?;
        let col = read_u16(data, &mut off)?;
        let format = FormatId(read_u32(data, &mut off)? as usize);
        let tag = read_u8(data, &mut off)?;
        let value = match tag {
            0 => CellValue::Empty,
            1 => CellValue::Bool(read_u8(data, &mut off)? != 0),
            2 => CellValue::Number(read_f64(data, &mut off)?),
            3 => CellValue::Text(read_str(data, &mut off)?),
            other => {
                return Err(CodecError::Malformed(format!("invalid cell value tag {}", other)));
            }
        };
        sheet.cells.insert((row, col), CellData { value, format });
    }
    Ok(sheet)
}

//! bookbridge CLI - workbook inspection and conversion tool

use anyhow::{bail, Context, Result};
use bookbridge::prelude::*;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bookbridge")]
#[command(author, version, about = "Workbook inspection and conversion tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a workbook
    Info {
        /// Input workbook file (.bbk or .bbx)
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all sheets in a workbook
    Sheets {
        /// Input workbook file
        input: PathBuf,
    },

    /// Copy cell content into a new workbook, converting between kinds
    ///
    /// Cell values, sheet names, geometry, pictures and book settings are
    /// carried over; fonts and formats are not.
    Convert {
        /// Input workbook file
        input: PathBuf,

        /// Output workbook file; its extension picks the kind
        output: PathBuf,
    },

    /// Extract embedded pictures into a directory
    Pictures {
        /// Input workbook file
        input: PathBuf,

        /// Directory for the extracted files
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Create an empty workbook
    New {
        /// Output workbook file; its extension picks the kind
        output: PathBuf,

        /// Number of empty sheets to create
        #[arg(short, long, default_value = "1")]
        sheets: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input, json } => show_info(&input, json),
        Commands::Sheets { input } => list_sheets(&input),
        Commands::Convert { input, output } => convert(&input, &output),
        Commands::Pictures { input, out_dir } => extract_pictures(&input, &out_dir),
        Commands::New { output, sheets } => new_book(&output, sheets),
    }
}

fn open(input: &Path) -> Result<Book> {
    Library::new(LibraryConfig::default())
        .open_sync(input)
        .with_context(|| format!("Failed to open '{}'", input.display()))
}

// ==================== info ====================

#[derive(Serialize)]
struct BookInfo {
    file: String,
    kind: String,
    version: u16,
    date_system: &'static str,
    sheet_count: usize,
    font_count: usize,
    format_count: usize,
    picture_count: usize,
    sheets: Vec<SheetInfo>,
}

#[derive(Serialize)]
struct SheetInfo {
    index: usize,
    name: String,
    kind: &'static str,
    rows: u32,
    cols: u16,
}

fn show_info(input: &Path, json: bool) -> Result<()> {
    let book = open(input)?;

    let mut sheets = Vec::new();
    for index in 0..book.sheet_count()? {
        let sheet = book.sheet(index)?;
        sheets.push(SheetInfo {
            index,
            name: sheet.name()?,
            kind: sheet_kind_name(book.sheet_kind(index)?),
            rows: sheet.last_row()?,
            cols: sheet.last_col()?,
        });
    }

    let info = BookInfo {
        file: input.display().to_string(),
        kind: book.kind()?.to_string(),
        version: book.version()?,
        date_system: if book.date_1904()? { "1904" } else { "1900" },
        sheet_count: book.sheet_count()?,
        font_count: book.font_count()?,
        format_count: book.format_count()?,
        picture_count: book.picture_count()?,
        sheets,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", info.file);
    println!("Kind: {} (version 0x{:04X})", info.kind, info.version);
    println!("Date system: {}", info.date_system);
    println!("Fonts: {}", info.font_count);
    println!("Formats: {}", info.format_count);
    println!("Pictures: {}", info.picture_count);
    println!("Sheets: {}", info.sheet_count);

    for sheet in &info.sheets {
        println!();
        println!("  Sheet {}: \"{}\" ({})", sheet.index, sheet.name, sheet.kind);
        if sheet.rows == 0 {
            println!("    Used range: empty");
        } else {
            println!(
                "    Used range: {} rows x {} columns",
                sheet.rows, sheet.cols
            );
        }
    }

    Ok(())
}

fn sheet_kind_name(kind: SheetKind) -> &'static str {
    match kind {
        SheetKind::Worksheet => "worksheet",
        SheetKind::Chart => "chart",
        SheetKind::Unknown => "unknown",
    }
}

// ==================== sheets ====================

fn list_sheets(input: &Path) -> Result<()> {
    let book = open(input)?;

    for index in 0..book.sheet_count()? {
        println!("{}\t{}", index, book.sheet(index)?.name()?);
    }

    Ok(())
}

// ==================== convert ====================

fn convert(input: &Path, output: &Path) -> Result<()> {
    let source = open(input)?;
    let target = Library::new(LibraryConfig::default())
        .new_book(kind_for(output)?)
        .context("Failed to create the target book")?;

    copy_settings(&source, &target)?;
    for index in 0..source.sheet_count()? {
        copy_sheet(&source, &target, index)
            .with_context(|| format!("Failed to copy sheet {}", index))?;
    }
    target.set_active_sheet(source.active_sheet()?)?;
    for index in 0..source.picture_count()? {
        let (_, data) = source.picture_sync(index)?;
        target.add_picture_sync(&PictureSource::bytes(data))?;
    }

    target
        .save_sync(output)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    eprintln!(
        "Wrote {} sheet(s) to '{}'",
        target.sheet_count()?,
        output.display()
    );

    Ok(())
}

fn copy_settings(source: &Book, target: &Book) -> Result<()> {
    let (font_name, font_size) = source.default_font()?;
    target.set_default_font(&font_name, font_size)?;
    target.set_ref_r1c1(source.ref_r1c1()?)?;
    target.set_rgb_mode(source.rgb_mode()?)?;
    target.set_date_1904(source.date_1904()?)?;
    target.set_template(source.is_template()?)?;
    Ok(())
}

fn copy_sheet(source: &Book, target: &Book, index: usize) -> Result<()> {
    let from = source.sheet(index)?;
    let to = target.add_sheet(&from.name()?, None)?;

    let (first_row, last_row) = (from.first_row()?, from.last_row()?);
    let (first_col, last_col) = (from.first_col()?, from.last_col()?);

    for row in first_row..last_row {
        for col in first_col..last_col {
            match from.cell_kind(row, col)? {
                CellKind::Empty => {}
                CellKind::Blank => to.write_blank(row, col, None)?,
                CellKind::Number => to.write_number(row, col, from.read_number(row, col)?, None)?,
                CellKind::Text => to.write_text(row, col, &from.read_text(row, col)?, None)?,
                CellKind::Bool => to.write_bool(row, col, from.read_bool(row, col)?, None)?,
            }
        }
    }

    for col in first_col..last_col {
        to.set_col_width(col, col, from.col_width(col)?)?;
    }
    for row in first_row..last_row {
        to.set_row_height(row, from.row_height(row)?)?;
    }

    Ok(())
}

// ==================== pictures ====================

fn extract_pictures(input: &Path, out_dir: &Path) -> Result<()> {
    let book = open(input)?;
    let count = book.picture_count()?;
    if count == 0 {
        eprintln!("No pictures in '{}'", input.display());
        return Ok(());
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create '{}'", out_dir.display()))?;

    for index in 0..count {
        let (kind, data) = book.picture_sync(index)?;
        let file = out_dir.join(format!("picture{}.{}", index, kind.extension()));
        std::fs::write(&file, data.as_slice())
            .with_context(|| format!("Failed to write '{}'", file.display()))?;
        println!("{} ({} bytes)", file.display(), data.len());
    }

    Ok(())
}

// ==================== new ====================

fn new_book(output: &Path, sheets: usize) -> Result<()> {
    if sheets == 0 {
        bail!("A book needs at least one sheet to be saved");
    }

    let book = Library::new(LibraryConfig::default())
        .new_book(kind_for(output)?)
        .context("Failed to create the book")?;
    for index in 0..sheets {
        book.add_sheet(&format!("Sheet{}", index + 1), None)?;
    }
    book.save_sync(output)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    println!("Created '{}' with {} sheet(s)", output.display(), sheets);

    Ok(())
}

fn kind_for(path: &Path) -> Result<BookKind> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("bbk") => Ok(BookKind::Binary),
        Some("bbx") => Ok(BookKind::Archive),
        _ => bail!(
            "Cannot infer book kind from '{}' (expected .bbk or .bbx)",
            path.display()
        ),
    }
}

// ==================== Tests ====================

//! Example: build a report on one task while another task is told to wait

use std::sync::Arc;

use bookbridge::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let library = Library::new(LibraryConfig::default());
    let book = Arc::new(library.new_book(BookKind::Binary)?);

    // Styles are registered up front and shared by handle.
    let header_font = book.add_font(None)?;
    header_font.set_bold(true)?;
    let header = book.add_format(None)?;
    header.set_font(&header_font)?;
    header.set_fill(FillPattern::Solid)?;
    header.set_fill_fg(0xDDDDDD)?;

    let sheet = book.add_sheet("Quarterly", None)?;
    sheet.write_text(0, 0, "Region", Some(&header))?;
    sheet.write_text(0, 1, "Revenue", Some(&header))?;
    sheet.write_text(1, 0, "North", None)?;
    sheet.write_number(1, 1, 410_000.0, None)?;
    sheet.write_text(2, 0, "South", None)?;
    sheet.write_number(2, 1, 355_500.0, None)?;
    sheet.write_date(4, 0, &DateParts::new(2025, 3, 31), None)?;

    // Serialize on the blocking pool while a second task tries to use the
    // same book. The second call fails fast instead of corrupting anything.
    let contender = Arc::clone(&book);
    let racer = tokio::spawn(async move { contender.sheet_count() });
    let bytes = book.save_raw().await?;
    match racer.await.expect("task panicked") {
        Ok(count) => println!("racer saw {count} sheet(s)"),
        Err(Error::Usage(UsageError::OperationPending)) => {
            println!("racer was told the book is busy");
        }
        Err(err) => return Err(err),
    }

    println!("serialized {} bytes", bytes.len());

    // Reload the bytes into a fresh book and read them back.
    let reread = library.new_book(BookKind::Binary)?;
    reread.load_raw(bytes).await?;
    let sheet = reread.sheet(0)?;
    println!(
        "{}: {} revenue {}",
        sheet.name()?,
        sheet.read_text(1, 0)?,
        sheet.read_number(1, 1)?
    );

    Ok(())
}

//! Explicit factory for owner books.
//!
//! Construction state lives here instead of in process-wide globals: the
//! license key and locale a book needs are carried by the [`Library`] that
//! creates it, so two libraries with different configurations can coexist
//! in one process and tests never leak state into each other.

use std::path::Path;

use bookbridge_engine as engine;

use crate::book::Book;
use crate::error::{Result, ResourceError, UsageError};
use crate::stable::StablePath;

/// License key applied to engine books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseKey {
    /// Registered licensee name.
    pub name: String,
    /// Key issued for that name.
    pub key: String,
}

/// Configuration applied to every book a [`Library`] creates.
#[derive(Debug, Clone, Default)]
pub struct LibraryConfig {
    /// License for the engine. `None` runs the engine in demo mode.
    pub license: Option<LicenseKey>,
    /// Locale for engine text handling, e.g. `"en_US.UTF-8"`.
    pub locale: Option<String>,
}

/// Factory for [`Book`] values.
pub struct Library {
    config: LibraryConfig,
}

impl Library {
    pub fn new(config: LibraryConfig) -> Self {
        Self { config }
    }

    /// Create an empty book of the given container kind.
    pub fn new_book(&self, kind: engine::BookKind) -> Result<Book> {
        let mut handle = engine::Book::create(kind).ok_or(ResourceError::Allocation)?;
        if let Some(license) = &self.config.license {
            handle.set_key(&license.name, &license.key);
        }
        if let Some(locale) = &self.config.locale {
            if !handle.set_locale(locale) {
                return Err(
                    UsageError::InvalidArgument(format!("locale {locale:?} rejected")).into(),
                );
            }
        }
        tracing::debug!(kind = %kind, "created book");
        Ok(Book::from_handle(handle))
    }

    /// Open an existing file, inferring the container kind from its
    /// extension (`.bbk` or `.bbx`, case-insensitive).
    pub async fn open(&self, path: impl Into<StablePath>) -> Result<Book> {
        let path = path.into();
        let book = self.new_book(kind_for_path(path.as_path())?)?;
        book.load(path).await?;
        Ok(book)
    }

    /// Synchronous form of [`open`].
    ///
    /// [`open`]: Library::open
    pub fn open_sync(&self, path: impl AsRef<Path>) -> Result<Book> {
        let path = path.as_ref();
        let book = self.new_book(kind_for_path(path)?)?;
        book.load_sync(path)?;
        Ok(book)
    }
}

fn kind_for_path(path: &Path) -> Result<engine::BookKind> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("bbk") => Ok(engine::BookKind::Binary),
        Some("bbx") => Ok(engine::BookKind::Archive),
        _ => Err(UsageError::InvalidArgument(format!(
            "cannot infer book kind from {} (expected .bbk or .bbx)",
            path.display()
        ))
        .into()),
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, UsageError};
    use bookbridge_engine::BookKind;

    #[test]
    fn test_new_book_starts_empty() {
        let library = Library::new(LibraryConfig::default());
        let book = library.new_book(BookKind::Binary).unwrap();
        assert_eq!(book.sheet_count().unwrap(), 0);
        assert_eq!(book.font_count().unwrap(), 1);
        assert_eq!(book.format_count().unwrap(), 1);
    }

    #[test]
    fn test_config_locale_is_applied() {
        let library = Library::new(LibraryConfig {
            license: None,
            locale: Some("en_US.UTF-8".to_string()),
        });
        assert!(library.new_book(BookKind::Archive).is_ok());
    }

    #[test]
    fn test_empty_locale_is_rejected() {
        let library = Library::new(LibraryConfig {
            license: None,
            locale: Some(String::new()),
        });
        let err = library.new_book(BookKind::Binary).unwrap_err();
        assert!(matches!(err, Error::Usage(UsageError::InvalidArgument(_))));
    }

    #[test]
    fn test_kind_for_path_matches_extensions() {
        assert_eq!(
            kind_for_path(Path::new("out.bbk")).unwrap(),
            BookKind::Binary
        );
        assert_eq!(
            kind_for_path(Path::new("OUT.BBX")).unwrap(),
            BookKind::Archive
        );
        assert!(kind_for_path(Path::new("out.xlsx")).is_err());
        assert!(kind_for_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_open_sync_missing_file_reports_engine_error() {
        let library = Library::new(LibraryConfig::default());
        let err = library.open_sync("definitely/missing.bbk").unwrap_err();
        match err {
            Error::Engine(engine_err) => assert!(engine_err.message.contains("cannot read")),
            other => panic!("expected an engine error, got {other:?}"),
        }
    }
}

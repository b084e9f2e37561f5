//! # Bundle Archive Access
//!
//! A documentation bundle is a plain zip (or jar) archive holding HTML pages plus
//! the descriptors that describe its navigation structure. This module wraps the
//! underlying container as a keyed byte-blob store: list entries, read an entry,
//! and ask for an entry's timestamp. Handles are opened per use and dropped on
//! every exit path.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::DocshelfError;

/// Archive file extensions recognized when scanning a collection directory.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["jar", "zip"];

/// Metadata for a single archive entry.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Uncompressed size in bytes.
    pub size: u64,
    /// The entry's modification time as recorded in the container, if valid.
    pub last_modified: Option<NaiveDateTime>,
}

/// An open documentation bundle archive.
pub struct BundleArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl BundleArchive {
    /// Opens the archive for `archive_key` inside the collection directory,
    /// trying each recognized extension in turn.
    pub fn open(dir: &Path, archive_key: &str) -> Result<Self, DocshelfError> {
        for ext in ARCHIVE_EXTENSIONS {
            let candidate = dir.join(format!("{}.{}", archive_key, ext));
            if candidate.is_file() {
                return Self::open_path(&candidate);
            }
        }
        Err(DocshelfError::Archive(ZipError::FileNotFound))
    }

    /// Opens an archive at an explicit path.
    pub fn open_path(path: &Path) -> Result<Self, DocshelfError> {
        let file = File::open(path)
            .map_err(|source| DocshelfError::Io { source, path: path.to_path_buf() })?;
        let archive = ZipArchive::new(file)?;
        Ok(Self { path: path.to_path_buf(), archive })
    }

    /// Whether the container holds an entry with this exact name.
    pub fn has_entry(&mut self, name: &str) -> bool {
        self.archive.by_name(name).is_ok()
    }

    /// Reads an entry fully into memory.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, DocshelfError> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(e) => return Err(entry_error(&self.path, name, e)),
        };
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data).map_err(|source| DocshelfError::Io {
            source,
            path: self.path.clone(),
        })?;
        Ok(data)
    }

    /// Reads an entry as UTF-8 text, replacing invalid sequences.
    pub fn read_entry_str(&mut self, name: &str) -> Result<String, DocshelfError> {
        let data = self.read_entry(name)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Size and timestamp of an entry without reading its contents.
    pub fn entry_info(&mut self, name: &str) -> Result<EntryInfo, DocshelfError> {
        let entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(e) => return Err(entry_error(&self.path, name, e)),
        };
        Ok(EntryInfo {
            size: entry.size(),
            last_modified: zip_datetime(entry.last_modified()),
        })
    }
}

fn entry_error(path: &Path, name: &str, err: ZipError) -> DocshelfError {
    match err {
        ZipError::FileNotFound => DocshelfError::MissingEntry {
            archive: path.display().to_string(),
            entry: name.to_string(),
        },
        other => DocshelfError::Archive(other),
    }
}

/// Converts a container timestamp into a calendar time, discarding the
/// out-of-range values the zip format permits.
fn zip_datetime(dt: zip::DateTime) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(dt.year() as i32, dt.month() as u32, dt.day() as u32)?
        .and_hms_opt(dt.hour() as u32, dt.minute() as u32, dt.second() as u32)
}

/// A content-type hint derived from a file name's extension.
///
/// The resolution contract only promises a hint; unknown extensions fall back
/// to `application/octet-stream`.
pub fn mime_type(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "html" | "htm" | "xhtml" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "txt" => "text/plain",
        "xml" => "application/xml",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

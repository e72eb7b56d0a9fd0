use crate::error::SourceError;
use crate::traits::ExportParser;
use csv::Reader;
use filmsync_models::{LetterboxdExport, Record};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

pub const RATINGS_CSV: &str = "ratings.csv";
pub const WATCHED_CSV: &str = "watched.csv";
pub const WATCHLIST_CSV: &str = "watchlist.csv";

/// Reads a Letterboxd data export, either the downloaded zip or a directory
/// it was extracted into
#[derive(Debug, Default, Clone, Copy)]
pub struct LetterboxdArchive;

impl ExportParser for LetterboxdArchive {
    fn parse(&self, path: &Path) -> Result<LetterboxdExport, SourceError> {
        if path.is_dir() {
            read_directory(path)
        } else {
            read_zip(path)
        }
    }
}

/// Parse the three export CSVs from a zip archive
pub fn read_zip(path: &Path) -> Result<LetterboxdExport, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(file)?;

    let mut read_entry = |name: &str| -> Result<Vec<Record>, SourceError> {
        let entry = archive.by_name(name).map_err(|e| match e {
            ZipError::FileNotFound => SourceError::MissingEntry(name.to_string()),
            other => SourceError::Archive(other),
        })?;
        read_csv(entry, name)
    };

    let export = LetterboxdExport {
        rated: read_entry(RATINGS_CSV)?,
        watched: read_entry(WATCHED_CSV)?,
        watchlist: read_entry(WATCHLIST_CSV)?,
    };
    debug!(
        rated = export.rated.len(),
        watched = export.watched.len(),
        watchlist = export.watchlist.len(),
        "Parsed Letterboxd zip export {}",
        path.display()
    );
    Ok(export)
}

/// Parse the three export CSVs from an extracted export directory
pub fn read_directory(dir: &Path) -> Result<LetterboxdExport, SourceError> {
    let read_file = |name: &str| -> Result<Vec<Record>, SourceError> {
        let path = dir.join(name);
        if !path.is_file() {
            return Err(SourceError::MissingEntry(name.to_string()));
        }
        let file = File::open(&path).map_err(|source| SourceError::Io { path, source })?;
        read_csv(file, name)
    };

    Ok(LetterboxdExport {
        rated: read_file(RATINGS_CSV)?,
        watched: read_file(WATCHED_CSV)?,
        watchlist: read_file(WATCHLIST_CSV)?,
    })
}

/// Turn every CSV row into a record keyed by the header names
pub fn read_csv<R: Read>(reader: R, file_name: &str) -> Result<Vec<Record>, SourceError> {
    let csv_error = |source| SourceError::Csv {
        file: file_name.to_string(),
        source,
    };

    let mut reader = Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        records.push(Record::from_fields(
            headers.iter().cloned().zip(row.iter().map(str::to_string)),
        ));
    }

    debug!("Read {} rows from {}", records.len(), file_name);
    Ok(records)
}

#[cfg(test)]
mod tests;

use super::*;
use std::io::Write;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

const RATINGS: &str = "\u{feff}Date,Name,Year,Letterboxd URI,Rating\n\
2023-01-02,Heat,1995,https://boxd.it/2aHi,4.5\n\
2023-01-03,\"Crouching Tiger, Hidden Dragon\",2000,https://boxd.it/1ZhA,4\n";

const WATCHED: &str = "Date,Name,Year,Letterboxd URI\n\
2023-01-02,Heat,1995,https://boxd.it/2aHi\n\
2023-01-05,Ronin,1998,https://boxd.it/1Uo8\n\
,,,\n";

const WATCHLIST: &str = "Date,Name,Year,Letterboxd URI\n\
2023-02-01,Thief,1981,https://boxd.it/1Wcm\n";

fn write_zip(dir: &TempDir, entries: &[(&str, &str)]) -> std::path::PathBuf {
    let path = dir.path().join("letterboxd-export.zip");
    let file = File::create(&path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, content) in entries {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

#[test]
fn test_parse_zip_export() {
    let dir = TempDir::new().unwrap();
    let path = write_zip(
        &dir,
        &[(RATINGS_CSV, RATINGS), (WATCHED_CSV, WATCHED), (WATCHLIST_CSV, WATCHLIST)],
    );

    let export = LetterboxdArchive.parse(&path).unwrap();

    assert_eq!(export.rated.len(), 2);
    assert_eq!(export.watched.len(), 2, "blank rows are skipped");
    assert_eq!(export.watchlist.len(), 1);

    let heat = &export.rated[0];
    assert_eq!(heat.title(), "Heat");
    assert_eq!(heat.year(), Some(1995));
    assert_eq!(heat.star_rating(), Some(4.5));
    assert_eq!(heat.get("Date"), Some("2023-01-02"), "BOM stripped from first header");

    assert_eq!(export.rated[1].title(), "Crouching Tiger, Hidden Dragon");
    assert_eq!(export.watchlist[0].source_uri(), Some("https://boxd.it/1Wcm"));
}

#[test]
fn test_missing_entry_is_reported_by_name() {
    let dir = TempDir::new().unwrap();
    let path = write_zip(&dir, &[(RATINGS_CSV, RATINGS), (WATCHED_CSV, WATCHED)]);

    match LetterboxdArchive.parse(&path) {
        Err(SourceError::MissingEntry(name)) => assert_eq!(name, WATCHLIST_CSV),
        other => panic!("expected missing entry error, got {:?}", other),
    }
}

#[test]
fn test_unreadable_archive() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("not-a-zip.zip");
    std::fs::write(&path, b"plain text").unwrap();

    assert!(matches!(LetterboxdArchive.parse(&path), Err(SourceError::Archive(_))));
}

#[test]
fn test_missing_archive_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.zip");

    assert!(matches!(LetterboxdArchive.parse(&path), Err(SourceError::Io { .. })));
}

#[test]
fn test_parse_extracted_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(RATINGS_CSV), RATINGS).unwrap();
    std::fs::write(dir.path().join(WATCHED_CSV), WATCHED).unwrap();
    std::fs::write(dir.path().join(WATCHLIST_CSV), WATCHLIST).unwrap();

    let export = LetterboxdArchive.parse(dir.path()).unwrap();
    assert_eq!(export.rated.len(), 2);
    assert_eq!(export.watched_unrated().len(), 1);
}

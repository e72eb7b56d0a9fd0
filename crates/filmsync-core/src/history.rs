use crate::fingerprint::Fingerprint;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const LEDGER_EXTENSION: &str = "history";

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Identifies a run by the content of its input files. The same export and
/// the same credentials always map to the same ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RunKey(String);

impl RunKey {
    /// Digest of the given files. A directory contributes its top-level
    /// files in name order, each name followed by its content, so an
    /// extracted export keys by what it holds rather than where it lives.
    pub fn from_files(paths: &[&Path]) -> Result<Self, HistoryError> {
        let mut hasher = Sha256::new();
        for path in paths {
            if path.is_dir() {
                for file in sorted_files(path)? {
                    let name = file.strip_prefix(path).unwrap_or(&file).to_string_lossy();
                    hasher.update((name.len() as u64).to_le_bytes());
                    hasher.update(name.as_bytes());
                    hash_file(&mut hasher, &file)?;
                }
            } else {
                hash_file(&mut hasher, path)?;
            }
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Parse a key back out of a ledger file stem
    pub fn from_hex(s: &str) -> Option<Self> {
        let valid = s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit());
        valid.then(|| Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn hash_file(hasher: &mut Sha256, path: &Path) -> Result<(), HistoryError> {
    let bytes = std::fs::read(path).map_err(|source| HistoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(&bytes);
    Ok(())
}

fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>, HistoryError> {
    let read_err = |source| HistoryError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-run record of fingerprints that completed successfully.
///
/// One file per run key, one hex fingerprint per line. Unparseable lines are
/// skipped with a warning rather than failing the run.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    dir: PathBuf,
}

impl HistoryLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &RunKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key, LEDGER_EXTENSION))
    }

    /// Fingerprints recorded for this run key; empty if there is no ledger yet
    pub fn load(&self, key: &RunKey) -> Result<HashSet<Fingerprint>, HistoryError> {
        let path = self.path_for(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history at {:?}, starting fresh", path);
                return Ok(HashSet::new());
            }
            Err(source) => return Err(HistoryError::Read { path, source }),
        };

        let mut entries = HashSet::new();
        let mut skipped = 0;
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match Fingerprint::from_hex(line) {
                Some(fp) => {
                    entries.insert(fp);
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("Skipped {} unreadable lines in {:?}", skipped, path);
        }
        debug!("Loaded {} history entries from {:?}", entries.len(), path);
        Ok(entries)
    }

    /// Merge fingerprints into the ledger. Returns how many were new.
    pub fn append<'a, I>(&self, key: &RunKey, fingerprints: I) -> Result<usize, HistoryError>
    where
        I: IntoIterator<Item = &'a Fingerprint>,
    {
        let existing = self.load(key)?;
        let added: Vec<Fingerprint> = fingerprints
            .into_iter()
            .filter(|fp| !existing.contains(*fp))
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if added.is_empty() {
            return Ok(0);
        }

        let mut all: Vec<Fingerprint> = existing.into_iter().chain(added.iter().copied()).collect();
        all.sort();
        let mut content = String::with_capacity(all.len() * 65);
        for fp in &all {
            content.push_str(&fp.to_hex());
            content.push('\n');
        }

        let path = self.path_for(key);
        let write_err = |source| HistoryError::Write { path: path.clone(), source };
        std::fs::create_dir_all(&self.dir).map_err(write_err)?;

        // Write to a temp file then rename so a crash never leaves half a ledger
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, content).map_err(write_err)?;
        std::fs::rename(&temp_path, &path).map_err(write_err)?;

        debug!("Recorded {} new history entries in {:?}", added.len(), path);
        Ok(added.len())
    }

    /// Forget one run. Returns whether a ledger existed.
    pub fn clear(&self, key: &RunKey) -> Result<bool, HistoryError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Cleared history {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(HistoryError::Write { path, source }),
        }
    }

    /// Forget every run. Returns how many ledgers were removed.
    pub fn clear_all(&self) -> Result<usize, HistoryError> {
        let keys = self.run_keys()?;
        let mut removed = 0;
        for key in &keys {
            if self.clear(key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Run keys that currently have a ledger
    pub fn run_keys(&self) -> Result<Vec<RunKey>, HistoryError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryError::Read {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut keys: Vec<RunKey> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(LEDGER_EXTENSION))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(RunKey::from_hex)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Successes gathered during one run, written to the ledger exactly once.
///
/// `commit` writes on the normal path. If the guard is dropped without a
/// commit (early return, panic unwinding, a cancelled task) the successes
/// are still written, and any write error is logged.
pub struct PendingHistory {
    ledger: Option<HistoryLedger>,
    key: RunKey,
    succeeded: Vec<Fingerprint>,
    committed: bool,
}

impl PendingHistory {
    pub fn new(ledger: Option<HistoryLedger>, key: RunKey) -> Self {
        Self {
            ledger,
            key,
            succeeded: Vec::new(),
            committed: false,
        }
    }

    pub fn record(&mut self, fingerprint: Fingerprint) {
        self.succeeded.push(fingerprint);
    }

    pub fn len(&self) -> usize {
        self.succeeded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty()
    }

    /// Write the gathered successes. Returns how many new entries were added.
    pub fn commit(mut self) -> Result<usize, HistoryError> {
        self.committed = true;
        self.flush()
    }

    fn flush(&mut self) -> Result<usize, HistoryError> {
        let succeeded = std::mem::take(&mut self.succeeded);
        match &self.ledger {
            Some(ledger) if !succeeded.is_empty() => ledger.append(&self.key, &succeeded),
            _ => Ok(0),
        }
    }
}

impl Drop for PendingHistory {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let pending = self.succeeded.len();
        match self.flush() {
            Ok(added) if added > 0 => {
                info!("Saved {} history entries before exiting", added);
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to save {} history entries: {}", pending, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use filmsync_models::{Action, Record, WorkItem};
    use tempfile::TempDir;

    fn fp(name: &str) -> Fingerprint {
        fingerprint(&WorkItem::new(Record::from_fields([("Name", name)]), Action::AddToWatchlist))
    }

    fn key(dir: &TempDir, content: &str) -> RunKey {
        let path = dir.path().join(format!("input-{}.txt", content));
        std::fs::write(&path, content).unwrap();
        RunKey::from_files(&[&path]).unwrap()
    }

    #[test]
    fn test_run_key_depends_on_content() {
        let dir = TempDir::new().unwrap();
        let a = key(&dir, "a");
        let a_again = key(&dir, "a");
        let b = key(&dir, "b");

        assert_eq!(a, a_again);
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(RunKey::from_hex(a.as_str()), Some(a));
    }

    #[test]
    fn test_run_key_for_directory_ignores_location() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        for dir in [&a, &b] {
            std::fs::write(dir.path().join("ratings.csv"), "Name\nHeat\n").unwrap();
            std::fs::write(dir.path().join("watched.csv"), "Name\nRonin\n").unwrap();
        }

        let ka = RunKey::from_files(&[a.path()]).unwrap();
        let kb = RunKey::from_files(&[b.path()]).unwrap();
        assert_eq!(ka, kb);

        std::fs::write(b.path().join("watched.csv"), "Name\nThief\n").unwrap();
        assert_ne!(ka, RunKey::from_files(&[b.path()]).unwrap());
    }

    #[test]
    fn test_run_key_for_directory_includes_file_names() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        std::fs::write(a.path().join("ratings.csv"), "Name\nHeat\n").unwrap();
        std::fs::write(a.path().join("watched.csv"), "Name\nRonin\n").unwrap();
        std::fs::write(b.path().join("ratings.csv"), "Name\nRonin\n").unwrap();
        std::fs::write(b.path().join("watched.csv"), "Name\nHeat\n").unwrap();

        assert_ne!(
            RunKey::from_files(&[a.path()]).unwrap(),
            RunKey::from_files(&[b.path()]).unwrap()
        );
    }

    #[test]
    fn test_run_key_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        assert!(matches!(RunKey::from_files(&[&missing]), Err(HistoryError::Read { .. })));
    }

    #[test]
    fn test_load_missing_ledger_is_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = HistoryLedger::new(dir.path().join("history"));
        assert!(ledger.load(&key(&dir, "a")).unwrap().is_empty());
    }

    #[test]
    fn test_append_merges_without_duplicates() {
        let dir = TempDir::new().unwrap();
        let ledger = HistoryLedger::new(dir.path().join("history"));
        let run = key(&dir, "a");

        assert_eq!(ledger.append(&run, &[fp("Heat"), fp("Ronin")]).unwrap(), 2);
        assert_eq!(ledger.append(&run, &[fp("Heat"), fp("Thief"), fp("Thief")]).unwrap(), 1);

        let loaded = ledger.load(&run).unwrap();
        assert_eq!(loaded.len(), 3);
        assert!(loaded.contains(&fp("Thief")));
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let ledger = HistoryLedger::new(dir.path());
        let run = key(&dir, "a");
        let content = format!("{}\nnot-a-fingerprint\n\n", fp("Heat"));
        std::fs::write(ledger.path_for(&run), content).unwrap();

        let loaded = ledger.load(&run).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains(&fp("Heat")));
    }

    #[test]
    fn test_clear_and_clear_all() {
        let dir = TempDir::new().unwrap();
        let ledger = HistoryLedger::new(dir.path().join("history"));
        let a = key(&dir, "a");
        let b = key(&dir, "b");
        ledger.append(&a, &[fp("Heat")]).unwrap();
        ledger.append(&b, &[fp("Ronin")]).unwrap();

        assert_eq!(ledger.run_keys().unwrap().len(), 2);
        assert!(ledger.clear(&a).unwrap());
        assert!(!ledger.clear(&a).unwrap());
        assert_eq!(ledger.clear_all().unwrap(), 1);
        assert!(ledger.run_keys().unwrap().is_empty());
    }

    #[test]
    fn test_pending_history_persists_on_drop() {
        let dir = TempDir::new().unwrap();
        let ledger = HistoryLedger::new(dir.path().join("history"));
        let run = key(&dir, "a");

        {
            let mut pending = PendingHistory::new(Some(ledger.clone()), run.clone());
            pending.record(fp("Heat"));
            pending.record(fp("Ronin"));
        }

        assert_eq!(ledger.load(&run).unwrap().len(), 2);
    }

    #[test]
    fn test_pending_history_commit_writes_once() {
        let dir = TempDir::new().unwrap();
        let ledger = HistoryLedger::new(dir.path().join("history"));
        let run = key(&dir, "a");

        let mut pending = PendingHistory::new(Some(ledger.clone()), run.clone());
        pending.record(fp("Heat"));
        assert_eq!(pending.commit().unwrap(), 1);
        assert_eq!(ledger.load(&run).unwrap().len(), 1);
    }

    #[test]
    fn test_pending_history_without_ledger() {
        let dir = TempDir::new().unwrap();
        let mut pending = PendingHistory::new(None, key(&dir, "a"));
        pending.record(fp("Heat"));
        assert_eq!(pending.commit().unwrap(), 0);
    }
}

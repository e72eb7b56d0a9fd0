use crate::record::Record;
use serde::{Deserialize, Serialize};

/// Record collections read from a Letterboxd data export
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LetterboxdExport {
    pub rated: Vec<Record>,
    pub watched: Vec<Record>,
    pub watchlist: Vec<Record>,
}

impl LetterboxdExport {
    /// Watched films that have no entry in the ratings file
    pub fn watched_unrated(&self) -> Vec<&Record> {
        let rated_uris: std::collections::HashSet<&str> = self
            .rated
            .iter()
            .filter_map(Record::source_uri)
            .collect();

        self.watched
            .iter()
            .filter(|w| w.source_uri().map_or(true, |uri| !rated_uris.contains(uri)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn film(name: &str, uri: &str) -> Record {
        Record::from_fields([("Name", name), ("Letterboxd URI", uri)])
    }

    #[test]
    fn test_watched_unrated_excludes_rated_uris() {
        let export = LetterboxdExport {
            rated: vec![film("Heat", "https://boxd.it/a")],
            watched: vec![film("Heat", "https://boxd.it/a"), film("Ronin", "https://boxd.it/b")],
            watchlist: vec![],
        };

        let unrated = export.watched_unrated();
        assert_eq!(unrated.len(), 1);
        assert_eq!(unrated[0].title(), "Ronin");
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column names used by the Letterboxd export CSVs
pub const NAME_FIELD: &str = "Name";
pub const YEAR_FIELD: &str = "Year";
pub const URI_FIELD: &str = "Letterboxd URI";
pub const RATING_FIELD: &str = "Rating";

/// One row of a Letterboxd export, kept as an immutable field map.
///
/// Fields are stored sorted by column name so that two records built from the
/// same columns in a different order compare (and hash) equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Derive a copy with one field added or replaced
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(key.into(), value.into());
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn title(&self) -> &str {
        self.get(NAME_FIELD).unwrap_or("")
    }

    pub fn year(&self) -> Option<u32> {
        self.get(YEAR_FIELD).and_then(|y| y.trim().parse().ok())
    }

    /// Letterboxd film page, used to resolve the IMDb identifier
    pub fn source_uri(&self) -> Option<&str> {
        self.get(URI_FIELD)
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
    }

    /// Star rating on Letterboxd's 0.5..=5 scale
    pub fn star_rating(&self) -> Option<f32> {
        self.get(RATING_FIELD)
            .and_then(|r| r.trim().parse::<f32>().ok())
    }

    /// "Title (Year)" as printed in failure listings
    pub fn display_title(&self) -> String {
        match self.get(YEAR_FIELD).filter(|y| !y.is_empty()) {
            Some(year) => format!("{} ({})", self.title(), year),
            None => self.title().to_string(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_fields(iter)
    }
}

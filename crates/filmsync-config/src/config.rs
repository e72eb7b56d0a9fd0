use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MIN_PARALLEL: usize = 1;
pub const MAX_PARALLEL: usize = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transfer: TransferSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Items processed in parallel (valid: 1 to 20)
    #[serde(default = "default_parallel")]
    pub parallel: usize,
    /// Rating (1-10) given to watched but unrated films. Unset means they are ignored.
    #[serde(default)]
    pub unrated_rating: Option<u8>,
    /// Also transfer the watchlist
    #[serde(default)]
    pub watchlist: bool,
    #[serde(default = "default_cookie_file")]
    pub cookie_file: PathBuf,
    /// Put watched but unrated films into this IMDb list
    #[serde(default)]
    pub list: Option<ListSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSettings {
    pub name: String,
    #[serde(default = "default_list_description")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Overrides `<data_dir>/history`
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_parallel() -> usize {
    5
}

fn default_cookie_file() -> PathBuf {
    PathBuf::from("cookie.txt")
}

fn default_list_description() -> String {
    "Watched on Letterboxd, imported by letterboxd2imdb".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("letterboxd2imdb/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            unrated_rating: None,
            watchlist: false,
            cookie_file: default_cookie_file(),
            list: None,
        }
    }
}

impl ListSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: default_list_description(),
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            dir: None,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parallel = self.transfer.parallel;
        if !(MIN_PARALLEL..=MAX_PARALLEL).contains(&parallel) {
            return Err(ConfigError::Invalid(format!(
                "parallel must be between {} and {} (got {})",
                MIN_PARALLEL, MAX_PARALLEL, parallel
            )));
        }

        if let Some(rating) = self.transfer.unrated_rating {
            if !(1..=10).contains(&rating) {
                return Err(ConfigError::Invalid(format!(
                    "unrated_rating must be between 1 and 10 (got {})",
                    rating
                )));
            }
        }

        if let Some(ref list) = self.transfer.list {
            if list.name.trim().is_empty() {
                return Err(ConfigError::Invalid("list name cannot be empty".to_string()));
            }
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be greater than zero".to_string()));
        }

        Ok(())
    }
}

use crate::error::ConfigError;
use std::path::PathBuf;

/// Base directory override, taken from `LETTERBOXD2IMDB_BASE_PATH` when set
pub fn base_path_override() -> Option<PathBuf> {
    std::env::var_os("LETTERBOXD2IMDB_BASE_PATH").map(PathBuf::from)
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self, ConfigError> {
        let base_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("letterboxd2imdb");
        Ok(Self::from_base(base_dir))
    }

    /// Lay everything out under a single directory: config files at the
    /// base level, transfer data in a subdirectory
    pub fn from_base(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
        }
    }

    pub fn history_dir(&self) -> PathBuf {
        self.data_dir.join("history")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }
}

impl Default for PathManager {
    fn default() -> Self {
        if let Some(base) = base_path_override() {
            return Self::from_base(base);
        }

        // Platform config dir (e.g. ~/.config/letterboxd2imdb on Linux),
        // falling back to the working directory
        Self::new().unwrap_or_else(|_| Self::from_base(".letterboxd2imdb"))
    }
}

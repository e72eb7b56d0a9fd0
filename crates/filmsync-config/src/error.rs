use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cookie file {} is empty", .0.display())]
    EmptyCookie(PathBuf),

    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("{0}")]
    Invalid(String),
}

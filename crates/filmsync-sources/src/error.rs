use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export is missing {0}")]
    MissingEntry(String),

    #[error("invalid export archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid CSV in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{service} returned an unexpected response: {message}")]
    Api { service: &'static str, message: String },
}

pub mod config;
pub mod credentials;
pub mod error;
pub mod paths;

pub use config::{Config, HistorySettings, HttpSettings, ListSettings, TransferSettings, MAX_PARALLEL, MIN_PARALLEL};
pub use credentials::ImdbCookie;
pub use error::ConfigError;
pub use paths::{PathManager, base_path_override};

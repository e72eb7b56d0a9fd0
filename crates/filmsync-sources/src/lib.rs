pub mod error;
pub mod factory;
pub mod imdb;
pub mod letterboxd;
pub mod response;
pub mod traits;

pub use error::SourceError;
pub use factory::{build_http_client, SourceSet};
pub use imdb::ImdbClient;
pub use letterboxd::{LetterboxdArchive, LetterboxdResolver};
pub use response::ActionResponse;
pub use traits::{ExportParser, IdResolver, ListResolver, RemoteActionClient};

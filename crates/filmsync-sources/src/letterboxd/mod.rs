pub mod parser;
pub mod resolver;

pub use parser::{LetterboxdArchive, RATINGS_CSV, WATCHED_CSV, WATCHLIST_CSV};
pub use resolver::LetterboxdResolver;

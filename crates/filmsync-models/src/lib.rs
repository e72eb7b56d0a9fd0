pub mod action;
pub mod export;
pub mod ids;
pub mod record;
pub mod work_item;

pub use action::{Action, ActionKind, ImdbRating};
pub use export::LetterboxdExport;
pub use ids::{ExternalId, ListId};
pub use record::Record;
pub use work_item::WorkItem;
pub use record::{NAME_FIELD, RATING_FIELD, URI_FIELD, YEAR_FIELD};
pub use work_item::ORIGIN_FIELD;

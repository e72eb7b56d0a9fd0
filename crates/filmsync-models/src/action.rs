use crate::ids::ListId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rating on IMDb's 1-10 integer scale
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct ImdbRating(u8);

impl ImdbRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Convert a Letterboxd star rating (0.5 steps up to 5) to the 1-10 scale
    pub fn from_stars(stars: f32) -> Option<Self> {
        if !stars.is_finite() || stars <= 0.0 {
            return None;
        }
        Self::new((stars * 2.0).round() as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ImdbRating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("rating {} outside 1-10", value))
    }
}

impl From<ImdbRating> for u8 {
    fn from(rating: ImdbRating) -> Self {
        rating.0
    }
}

impl fmt::Display for ImdbRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/10", self.0)
    }
}

/// Remote write performed for a work item. Each variant carries exactly the
/// data that action needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Rate { rating: ImdbRating },
    AddToWatchlist,
    AddToList { list_id: ListId },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Rate { .. } => ActionKind::Rate,
            Action::AddToWatchlist => ActionKind::Watchlist,
            Action::AddToList { .. } => ActionKind::List,
        }
    }
}

/// Payload-free discriminant of [`Action`], used to group results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Rate,
    Watchlist,
    List,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Rate, ActionKind::Watchlist, ActionKind::List];

    /// Stable tag, also part of the fingerprint encoding
    pub fn tag(self) -> &'static str {
        match self {
            ActionKind::Rate => "rate",
            ActionKind::Watchlist => "watchlist",
            ActionKind::List => "list",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stars() {
        assert_eq!(ImdbRating::from_stars(3.5).map(ImdbRating::value), Some(7));
        assert_eq!(ImdbRating::from_stars(0.5).map(ImdbRating::value), Some(1));
        assert_eq!(ImdbRating::from_stars(5.0).map(ImdbRating::value), Some(10));
        assert_eq!(ImdbRating::from_stars(0.0), None);
        assert_eq!(ImdbRating::from_stars(5.5), None);
        assert_eq!(ImdbRating::from_stars(f32::NAN), None);
    }

    #[test]
    fn test_rating_bounds() {
        assert!(ImdbRating::new(0).is_none());
        assert!(ImdbRating::new(11).is_none());
        assert_eq!(ImdbRating::new(8).unwrap().to_string(), "8/10");
    }

    #[test]
    fn test_action_serializes_with_tag() {
        let action = Action::Rate { rating: ImdbRating::new(7).unwrap() };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "rate");
        assert_eq!(json["rating"], 7);

        let parsed: Action = serde_json::from_str(r#"{"action":"add_to_list","list_id":"ls1"}"#).unwrap();
        assert_eq!(parsed.kind(), ActionKind::List);
    }

    #[test]
    fn test_out_of_range_rating_rejected_on_deserialize() {
        let parsed: Result<Action, _> = serde_json::from_str(r#"{"action":"rate","rating":12}"#);
        assert!(parsed.is_err());
    }
}

pub mod client;
pub mod graphql;

pub use client::{ImdbClient, GRAPHQL_URL, WEB_URL};

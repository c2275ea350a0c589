//! Remote catalog access.
//!
//! [`CatalogClient`] speaks HTTP to the API; [`CatalogStore`] wraps it with
//! per-query caching and in-flight de-duplication. The rest of the app talks
//! to the store.

mod cache;
mod client;
mod store;
mod types;

pub use cache::{QueryCache, QueryKey};
pub use client::{
    CatalogClient, ClientOptions, FetchError, DEFAULT_API_BASE, DEFAULT_MAX_RETRIES,
    DEFAULT_TIMEOUT, FULL_LISTING_LIMIT,
};
pub use store::{CatalogStore, ITEM_STALE_AFTER, LISTING_STALE_AFTER};
pub use types::{
    CatalogEntry, DetailRecord, EvolutionNode, ListingPage, SpeciesRecord, Sprites, Stat,
};

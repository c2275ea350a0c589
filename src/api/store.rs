use crate::api::cache::{QueryCache, QueryKey};
use crate::api::client::{CatalogClient, FetchError};
use crate::api::types::{CatalogEntry, DetailRecord, EvolutionNode, ListingPage, SpeciesRecord};
use std::sync::Arc;
use std::time::Duration;

/// Staleness window for single-item queries (detail, species).
pub const ITEM_STALE_AFTER: Duration = Duration::from_secs(10 * 60);
/// Staleness window for listings and evolution graphs.
pub const LISTING_STALE_AFTER: Duration = Duration::from_secs(30 * 60);

/// Cached front door to the catalog API.
///
/// Clones share the client and every cache, so a fetch started from one
/// spawned task is visible to all others.
#[derive(Clone)]
pub struct CatalogStore {
    client: Arc<CatalogClient>,
    listings: QueryCache<Vec<CatalogEntry>>,
    pages: QueryCache<ListingPage>,
    details: QueryCache<DetailRecord>,
    species: QueryCache<SpeciesRecord>,
    evolutions: QueryCache<EvolutionNode>,
    artwork: QueryCache<Option<String>>,
}

impl CatalogStore {
    pub fn new(client: CatalogClient) -> Self {
        Self {
            client: Arc::new(client),
            listings: QueryCache::new(Some(LISTING_STALE_AFTER)),
            pages: QueryCache::new(Some(LISTING_STALE_AFTER)),
            details: QueryCache::new(Some(ITEM_STALE_AFTER)),
            species: QueryCache::new(Some(ITEM_STALE_AFTER)),
            evolutions: QueryCache::new(Some(LISTING_STALE_AFTER)),
            artwork: QueryCache::new(None),
        }
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    pub async fn full_listing(&self) -> Result<Arc<Vec<CatalogEntry>>, FetchError> {
        let client = Arc::clone(&self.client);
        self.listings
            .get_or_fetch(QueryKey::FullListing, move || async move {
                client.fetch_full_listing().await
            })
            .await
    }

    pub async fn listing_page(&self, offset: usize, limit: usize) -> Result<Arc<ListingPage>, FetchError> {
        let client = Arc::clone(&self.client);
        self.pages
            .get_or_fetch(QueryKey::ListingPage { offset, limit }, move || async move {
                client.fetch_listing_page(offset, limit).await
            })
            .await
    }

    pub async fn category(&self, category: &str) -> Result<Arc<Vec<CatalogEntry>>, FetchError> {
        let client = Arc::clone(&self.client);
        let name = category.to_string();
        self.listings
            .get_or_fetch(QueryKey::Category(name.clone()), move || async move {
                client.fetch_by_category(&name).await
            })
            .await
    }

    pub async fn detail(&self, identifier: &str) -> Result<Arc<DetailRecord>, FetchError> {
        let client = Arc::clone(&self.client);
        let id = identifier.to_string();
        self.details
            .get_or_fetch(QueryKey::Detail(id.clone()), move || async move {
                client.fetch_detail(&id).await
            })
            .await
    }

    pub async fn species(&self, identifier: &str) -> Result<Arc<SpeciesRecord>, FetchError> {
        let client = Arc::clone(&self.client);
        let id = identifier.to_string();
        self.species
            .get_or_fetch(QueryKey::Species(id.clone()), move || async move {
                client.fetch_species(&id).await
            })
            .await
    }

    pub async fn evolution(&self, locator: &str) -> Result<Arc<EvolutionNode>, FetchError> {
        let client = Arc::clone(&self.client);
        let locator = locator.to_string();
        self.evolutions
            .get_or_fetch(QueryKey::Evolution(locator.clone()), move || async move {
                client.fetch_evolution_graph(&locator).await
            })
            .await
    }

    /// Artwork locators never go stale once resolved.
    pub async fn artwork(&self, identifier: &str) -> Result<Arc<Option<String>>, FetchError> {
        let client = Arc::clone(&self.client);
        let id = identifier.to_string();
        self.artwork
            .get_or_fetch(QueryKey::Artwork(id.clone()), move || async move {
                client.fetch_artwork(&id).await
            })
            .await
    }

    /// Cached detail without fetching, for rendering cards already seen.
    pub fn cached_detail(&self, identifier: &str) -> Option<Arc<DetailRecord>> {
        self.details.peek(&QueryKey::Detail(identifier.to_string()))
    }

    /// Drop cached listings so the next request refetches them.
    pub fn invalidate_listings(&self, category: Option<&str>) {
        self.listings.invalidate(&QueryKey::FullListing);
        if let Some(category) = category {
            self.listings
                .invalidate(&QueryKey::Category(category.to_string()));
        }
    }
}

//! Integration tests for the catalog pipeline against a mock API.
//!
//! Each test starts its own wiremock server. The store, aggregator and detail
//! resolution are driven the way the UI drives them: the aggregator names the
//! listings to fetch, the store fetches them, and results are fed back.

use dexterm::api::{CatalogClient, CatalogStore, ClientOptions, FetchError};
use dexterm::catalog::detail::resolve_detail;
use dexterm::catalog::{CatalogAggregator, FilterState, SourceRequest, ViewStatus};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> CatalogStore {
    let client = CatalogClient::with_options(
        &server.uri(),
        ClientOptions {
            timeout: Duration::from_secs(5),
            max_retries: 0,
        },
    )
    .unwrap();
    CatalogStore::new(client)
}

fn entry(server: &MockServer, name: &str, id: u32) -> Value {
    json!({ "name": name, "url": format!("{}/pokemon/{}/", server.uri(), id) })
}

fn listing(entries: Vec<Value>) -> Value {
    json!({ "count": entries.len(), "next": null, "results": entries })
}

fn membership(entries: Vec<Value>) -> Value {
    let slots: Vec<Value> = entries.into_iter().map(|e| json!({ "pokemon": e })).collect();
    json!({ "pokemon": slots })
}

fn detail_json(id: u32, name: &str, species: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "height": 7,
        "weight": 69,
        "base_experience": 64,
        "sprites": {
            "front_default": format!("https://img.example/{}.png", id),
            "back_default": null,
            "front_shiny": null,
            "other": { "official-artwork": { "front_default": null } }
        },
        "types": [
            { "slot": 2, "type": { "name": "poison" } },
            { "slot": 1, "type": { "name": "grass" } }
        ],
        "stats": [
            { "base_stat": 45, "stat": { "name": "hp" } },
            { "base_stat": 49, "stat": { "name": "attack" } }
        ],
        "abilities": [{ "ability": { "name": "overgrow" } }],
        "moves": [{ "move": { "name": "razor-wind" } }],
        "species": { "name": species }
    })
}

fn species_json(server: &MockServer, id: u32, name: &str, chain: Option<u32>) -> Value {
    json!({
        "id": id,
        "name": name,
        "flavor_text_entries": [
            { "flavor_text": "Une graine.", "language": { "name": "fr" } },
            { "flavor_text": "A strange seed was\u{c}planted on its back.", "language": { "name": "en" } }
        ],
        "genera": [{ "genus": "Seed Pokémon", "language": { "name": "en" } }],
        "habitat": { "name": "grassland" },
        "evolution_chain": chain.map(|c| json!({ "url": format!("{}/evolution-chain/{}/", server.uri(), c) }))
    })
}

async fn mount_json(server: &MockServer, at: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Perform every requested fetch and feed the results back.
async fn drive(store: &CatalogStore, aggregator: &mut CatalogAggregator, requests: Vec<SourceRequest>) {
    for request in requests {
        match request {
            SourceRequest::FullListing => aggregator.apply_full_listing(store.full_listing().await),
            SourceRequest::Category(category) => {
                let result = store.category(&category).await;
                aggregator.apply_category_listing(&category, result);
            }
        }
    }
}

fn names(aggregator: &CatalogAggregator) -> Vec<String> {
    aggregator
        .view()
        .visible_entries
        .into_iter()
        .map(|e| e.name)
        .collect()
}

// ============================================================================
// Listing + Aggregator
// ============================================================================

#[tokio::test]
async fn test_search_then_category_narrows_view() {
    let server = MockServer::start().await;
    let all = vec![
        entry(&server, "bulbasaur", 1),
        entry(&server, "charmander", 4),
        entry(&server, "squirtle", 7),
        entry(&server, "wartortle", 8),
    ];
    mount_json(&server, "/pokemon", listing(all)).await;
    mount_json(
        &server,
        "/type/water",
        membership(vec![entry(&server, "squirtle", 7), entry(&server, "wartortle", 8)]),
    )
    .await;
    let store = store_for(&server);
    let mut aggregator = CatalogAggregator::new();

    let requests = aggregator.on_filter_changed(&FilterState::default());
    assert_eq!(requests, vec![SourceRequest::FullListing]);
    drive(&store, &mut aggregator, requests).await;
    assert_eq!(aggregator.view().status, ViewStatus::Ready);
    assert_eq!(names(&aggregator).len(), 4);

    let requests = aggregator.on_filter_changed(&FilterState::new("TLE", None));
    assert!(requests.is_empty());
    assert_eq!(names(&aggregator), vec!["squirtle", "wartortle"]);

    let requests = aggregator.on_filter_changed(&FilterState::new("war", Some("water")));
    assert_eq!(requests, vec![SourceRequest::Category("water".to_string())]);
    drive(&store, &mut aggregator, requests).await;
    assert_eq!(names(&aggregator), vec!["wartortle"]);
    assert_eq!(aggregator.view().total_filtered, 1);
}

#[tokio::test]
async fn test_category_with_no_match_is_empty() {
    let server = MockServer::start().await;
    mount_json(&server, "/pokemon", listing(vec![entry(&server, "charmander", 4)])).await;
    mount_json(&server, "/type/fire", membership(vec![entry(&server, "charmander", 4)])).await;
    let store = store_for(&server);
    let mut aggregator = CatalogAggregator::new();

    let requests = aggregator.on_filter_changed(&FilterState::new("z", Some("fire")));
    drive(&store, &mut aggregator, requests).await;

    let view = aggregator.view();
    assert_eq!(view.status, ViewStatus::Empty);
    assert!(view.visible_entries.is_empty());
}

#[tokio::test]
async fn test_stale_category_result_is_discarded() {
    let server = MockServer::start().await;
    mount_json(&server, "/pokemon", listing(vec![entry(&server, "oddish", 43)])).await;
    mount_json(&server, "/type/water", membership(vec![entry(&server, "psyduck", 54)])).await;
    mount_json(&server, "/type/grass", membership(vec![entry(&server, "oddish", 43)])).await;
    let store = store_for(&server);
    let mut aggregator = CatalogAggregator::new();

    let first = aggregator.on_filter_changed(&FilterState::new("", Some("water")));
    let second = aggregator.on_filter_changed(&FilterState::new("", Some("grass")));
    assert_eq!(second, vec![SourceRequest::Category("grass".to_string())]);
    drive(&store, &mut aggregator, vec![SourceRequest::FullListing]).await;
    drive(&store, &mut aggregator, second).await;

    // The water listing lands after grass was selected.
    let water = store.category("water").await;
    assert!(first.contains(&SourceRequest::Category("water".to_string())));
    assert!(!aggregator.apply_category_listing("water", water));
    assert_eq!(names(&aggregator), vec!["oddish"]);
}

#[tokio::test]
async fn test_window_grows_in_steps_of_twenty() {
    let server = MockServer::start().await;
    let all: Vec<Value> = (1..=45).map(|i| entry(&server, &format!("mon-{i}"), i)).collect();
    mount_json(&server, "/pokemon", listing(all)).await;
    let store = store_for(&server);
    let mut aggregator = CatalogAggregator::new();

    let requests = aggregator.on_filter_changed(&FilterState::default());
    drive(&store, &mut aggregator, requests).await;

    assert_eq!(aggregator.displayed_count(), 20);
    assert!(aggregator.notify_sentinel_visible());
    assert_eq!(aggregator.displayed_count(), 40);
    assert!(aggregator.notify_sentinel_visible());
    assert_eq!(aggregator.displayed_count(), 45);
    assert!(!aggregator.notify_sentinel_visible());
    assert_eq!(aggregator.displayed_count(), 45);
    assert!(!aggregator.view().can_grow);
}

#[tokio::test]
async fn test_failed_listing_recovers_on_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_json(&server, "/pokemon", listing(vec![entry(&server, "mew", 151)])).await;
    let store = store_for(&server);
    let mut aggregator = CatalogAggregator::new();

    let requests = aggregator.on_filter_changed(&FilterState::default());
    drive(&store, &mut aggregator, requests).await;
    assert!(matches!(
        aggregator.view().status,
        ViewStatus::Failed(FetchError::HttpStatus(500))
    ));

    let requests = aggregator.retry();
    assert_eq!(requests, vec![SourceRequest::FullListing]);
    drive(&store, &mut aggregator, requests).await;
    assert_eq!(names(&aggregator), vec!["mew"]);
}

// ============================================================================
// Store
// ============================================================================

#[tokio::test]
async fn test_concurrent_detail_requests_share_one_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/bulbasaur"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(detail_json(1, "bulbasaur", "bulbasaur"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let store = store_for(&server);
    let other = store.clone();

    let (a, b, c) = tokio::join!(
        store.detail("bulbasaur"),
        store.detail("bulbasaur"),
        other.detail("bulbasaur"),
    );
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    assert!(std::sync::Arc::ptr_eq(&a, &c));
    assert_eq!(a.types, vec!["grass", "poison"]);

    // Fresh value, no second request.
    store.detail("bulbasaur").await.unwrap();
    assert!(store.cached_detail("bulbasaur").is_some());
}

#[tokio::test]
async fn test_invalidated_listing_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon"))
        .and(query_param("limit", "10000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(vec![])))
        .expect(2)
        .mount(&server)
        .await;
    let store = store_for(&server);

    store.full_listing().await.unwrap();
    store.full_listing().await.unwrap();
    store.invalidate_listings(None);
    store.full_listing().await.unwrap();
}

#[tokio::test]
async fn test_listing_page_reports_next() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon"))
        .and(query_param("offset", "20"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1302,
            "next": format!("{}/pokemon?offset=40&limit=20", server.uri()),
            "results": [entry(&server, "spearow", 21)]
        })))
        .mount(&server)
        .await;
    let store = store_for(&server);

    let page = store.listing_page(20, 20).await.unwrap();
    assert!(page.has_next);
    assert_eq!(page.entries[0].id(), Some(21));
}

// ============================================================================
// Detail Resolution
// ============================================================================

#[tokio::test]
async fn test_detail_species_and_evolution_resolve() {
    let server = MockServer::start().await;
    mount_json(&server, "/pokemon/bulbasaur", detail_json(1, "bulbasaur", "bulbasaur")).await;
    mount_json(
        &server,
        "/pokemon-species/bulbasaur",
        species_json(&server, 1, "bulbasaur", Some(1)),
    )
    .await;
    mount_json(
        &server,
        "/evolution-chain/1/",
        json!({ "chain": { "species": { "name": "bulbasaur" }, "evolves_to": [
            { "species": { "name": "ivysaur" }, "evolves_to": [] }
        ]}}),
    )
    .await;
    let store = store_for(&server);

    let res = resolve_detail(&store, "bulbasaur").await;
    let detail = res.detail.unwrap();
    let species = res.species.unwrap();
    assert_eq!(detail.id, 1);
    assert_eq!(species.genus.as_deref(), Some("Seed Pokémon"));
    assert_eq!(
        species.flavor_text.as_deref(),
        Some("A strange seed was planted on its back.")
    );
    let chain = res.evolution.unwrap().unwrap();
    assert_eq!(chain.identifiers(), vec!["bulbasaur", "ivysaur"]);
}

#[tokio::test]
async fn test_variant_form_falls_back_to_base_species() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/pokemon/deoxys-attack",
        detail_json(10001, "deoxys-attack", "deoxys"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/pokemon-species/deoxys-attack"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_json(&server, "/pokemon-species/deoxys", species_json(&server, 386, "deoxys", None)).await;
    let store = store_for(&server);

    let res = resolve_detail(&store, "deoxys-attack").await;
    assert_eq!(res.detail.unwrap().name, "deoxys-attack");
    assert_eq!(res.species.unwrap().name, "deoxys");
    assert!(res.evolution.is_none());
}

#[tokio::test]
async fn test_missing_detail_does_not_block_species() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/missingno"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pokemon-species/missingno"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let store = store_for(&server);

    let res = resolve_detail(&store, "missingno").await;
    assert_eq!(res.detail.unwrap_err(), FetchError::NotFound);
    assert_eq!(res.species.unwrap_err(), FetchError::NotFound);
    assert!(res.evolution.is_none());
}

//! Detail view resolution and the presentation rules for a detail record.
//!
//! Detail and species records are fetched concurrently. The species record's
//! evolution-chain locator gates the third fetch. Artwork for each evolution
//! node resolves independently through the store's never-stale cache.

use crate::api::{CatalogStore, DetailRecord, EvolutionNode, FetchError, SpeciesRecord};
use std::sync::Arc;

/// Upper bound of a base stat, used to scale stat bars.
pub const STAT_MAX: u32 = 255;
/// Abilities shown in the detail header.
pub const ABILITY_PREVIEW: usize = 2;
/// Moves listed before collapsing the rest into "+N more".
pub const MOVE_PREVIEW: usize = 20;

/// Everything the detail view needs, each part failing independently.
#[derive(Debug, Clone)]
pub struct DetailResolution {
    pub detail: Result<Arc<DetailRecord>, FetchError>,
    pub species: Result<Arc<SpeciesRecord>, FetchError>,
    /// `None` when the species record has no evolution locator or failed.
    pub evolution: Option<Result<Arc<EvolutionNode>, FetchError>>,
}

/// Resolve detail, species and evolution for one identifier.
pub async fn resolve_detail(store: &CatalogStore, identifier: &str) -> DetailResolution {
    let (detail, species) = tokio::join!(store.detail(identifier), resolve_species(store, identifier));

    let evolution = match &species {
        Ok(species) => resolve_evolution(store, species).await,
        Err(_) => None,
    };

    DetailResolution {
        detail,
        species,
        evolution,
    }
}

/// Species lookup with the base-species fallback.
///
/// Variant forms (`deoxys-attack`, `giratina-origin`) have detail records
/// but no species record of their own. When the species lookup reports
/// `NotFound`, the detail record's species name is tried once instead. The
/// detail fetch is shared with any concurrent request for it.
pub async fn resolve_species(
    store: &CatalogStore,
    identifier: &str,
) -> Result<Arc<SpeciesRecord>, FetchError> {
    match store.species(identifier).await {
        Err(FetchError::NotFound) => {
            let detail = store.detail(identifier).await?;
            if detail.species_name == identifier {
                return Err(FetchError::NotFound);
            }
            tracing::debug!(
                identifier = %identifier,
                species = %detail.species_name,
                "Species not found, falling back to base species"
            );
            store.species(&detail.species_name).await
        }
        other => other,
    }
}

/// Fetch the evolution graph named by `species`, if it names one.
pub async fn resolve_evolution(
    store: &CatalogStore,
    species: &SpeciesRecord,
) -> Option<Result<Arc<EvolutionNode>, FetchError>> {
    let locator = species.evolution_chain.as_deref()?;
    Some(store.evolution(locator).await)
}

/// Artwork locator for one evolution node. Failures degrade to no artwork.
pub async fn resolve_artwork(store: &CatalogStore, identifier: &str) -> Option<String> {
    match store.artwork(identifier).await {
        Ok(art) => art.as_ref().clone(),
        Err(e) => {
            tracing::debug!(identifier = %identifier, error = %e, "Artwork unavailable");
            None
        }
    }
}

/// Short label for a stat name as shown in the stat block.
pub fn stat_label(name: &str) -> &str {
    match name {
        "hp" => "HP",
        "attack" => "ATK",
        "defense" => "DEF",
        "special-attack" => "SP.ATK",
        "special-defense" => "SP.DEF",
        "speed" => "SPD",
        other => other,
    }
}

/// Fraction of [`STAT_MAX`] filled by `base`, clamped to `0.0..=1.0`.
pub fn stat_ratio(base: u32) -> f64 {
    (f64::from(base) / f64::from(STAT_MAX)).min(1.0)
}

pub fn format_base_experience(base: Option<u32>) -> String {
    base.map_or_else(|| "---".to_string(), |b| b.to_string())
}

pub fn ability_preview(abilities: &[String]) -> &[String] {
    &abilities[..abilities.len().min(ABILITY_PREVIEW)]
}

/// First [`MOVE_PREVIEW`] moves and the number left out.
pub fn move_preview(moves: &[String]) -> (&[String], usize) {
    let shown = moves.len().min(MOVE_PREVIEW);
    (&moves[..shown], moves.len() - shown)
}

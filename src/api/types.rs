//! Catalog records and the wire shapes they are decoded from.
//!
//! Wire structs mirror the JSON the API returns and stay private to the
//! client; the public records are flattened to what the app renders. Any
//! missing required field fails the whole decode, so a malformed response is
//! never partially applied.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Public Records
// ============================================================================

/// A minimal catalog record used for browsing before detail is fetched.
///
/// Identity is `name` (unique, lowercase). `url` locates the detail record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Numeric identifier parsed from the trailing path segment of `url`.
    ///
    /// `https://pokeapi.co/api/v2/pokemon/25/` yields `Some(25)`.
    pub fn id(&self) -> Option<u32> {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse().ok())
    }
}

/// One page of the paged listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub entries: Vec<CatalogEntry>,
    pub has_next: bool,
}

/// Visual assets for one item. Every locator is optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sprites {
    pub front_default: Option<String>,
    pub back_default: Option<String>,
    pub front_shiny: Option<String>,
    pub official_artwork: Option<String>,
}

impl Sprites {
    /// Official artwork, falling back to the default front sprite.
    pub fn primary(&self) -> Option<&str> {
        self.official_artwork
            .as_deref()
            .or(self.front_default.as_deref())
    }
}

/// A single base stat (`hp`, `attack`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub name: String,
    pub base: u32,
}

/// Full attribute set for one catalog item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRecord {
    pub id: u32,
    pub name: String,
    /// Height in decimetres.
    pub height: u32,
    /// Weight in hectograms.
    pub weight: u32,
    pub base_experience: Option<u32>,
    pub sprites: Sprites,
    /// Category tags in slot order. The first one is the primary type.
    pub types: Vec<String>,
    pub stats: Vec<Stat>,
    pub abilities: Vec<String>,
    pub moves: Vec<String>,
    /// Name of the species this item (possibly a variant form) belongs to.
    pub species_name: String,
}

impl DetailRecord {
    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }

    pub fn stat_total(&self) -> u32 {
        self.stats.iter().map(|s| s.base).sum()
    }

    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }

    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 10.0
    }
}

/// Descriptive species metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesRecord {
    pub id: u32,
    pub name: String,
    /// First English flavor text, form feeds replaced by spaces.
    pub flavor_text: Option<String>,
    /// English genus, e.g. "Seed Pokémon".
    pub genus: Option<String>,
    pub habitat: Option<String>,
    /// Opaque locator of the evolution graph.
    pub evolution_chain: Option<String>,
}

/// A node of the evolution tree.
///
/// Decoded directly from the API's `chain` object: `species.name` becomes
/// `identifier` and `evolves_to` becomes `children`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EvolutionNode {
    #[serde(rename = "species", deserialize_with = "named_resource_name")]
    pub identifier: String,
    #[serde(rename = "evolves_to", default)]
    pub children: Vec<EvolutionNode>,
}

impl EvolutionNode {
    pub fn leaf(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(identifier: impl Into<String>, children: Vec<EvolutionNode>) -> Self {
        Self {
            identifier: identifier.into(),
            children,
        }
    }

    /// Pre-order walk yielding `(depth, node)` pairs.
    ///
    /// Uses an explicit stack so arbitrarily deep chains cannot overflow the
    /// call stack. Siblings keep their API order.
    pub fn walk(&self) -> Vec<(usize, &EvolutionNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    /// Every identifier in the tree, pre-order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.walk()
            .into_iter()
            .map(|(_, node)| node.identifier.as_str())
            .collect()
    }
}

impl Drop for EvolutionNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

fn named_resource_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    NamedResource::deserialize(deserializer).map(|r| r.name)
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct NamedResource {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingResponse {
    pub next: Option<String>,
    pub results: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryMembershipResponse {
    pub pokemon: Vec<CategoryMember>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryMember {
    pub pokemon: CatalogEntry,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSprites {
    front_default: Option<String>,
    back_default: Option<String>,
    front_shiny: Option<String>,
    #[serde(default)]
    other: RawOtherSprites,
}

#[derive(Debug, Default, Deserialize)]
struct RawOtherSprites {
    #[serde(rename = "official-artwork", default)]
    official_artwork: RawArtwork,
}

#[derive(Debug, Default, Deserialize)]
struct RawArtwork {
    front_default: Option<String>,
}

impl From<RawSprites> for Sprites {
    fn from(raw: RawSprites) -> Self {
        Self {
            front_default: raw.front_default,
            back_default: raw.back_default,
            front_shiny: raw.front_shiny,
            official_artwork: raw.other.official_artwork.front_default,
        }
    }
}

/// Only the sprite block of a detail response, for artwork resolution.
#[derive(Debug, Deserialize)]
pub(crate) struct SpritesOnlyResponse {
    pub sprites: RawSprites,
}

#[derive(Debug, Deserialize)]
struct RawTypeSlot {
    #[serde(default)]
    slot: u8,
    #[serde(rename = "type")]
    kind: NamedResource,
}

#[derive(Debug, Deserialize)]
struct RawStat {
    base_stat: u32,
    stat: NamedResource,
}

#[derive(Debug, Deserialize)]
struct RawAbilitySlot {
    ability: NamedResource,
}

#[derive(Debug, Deserialize)]
struct RawMoveSlot {
    #[serde(rename = "move")]
    move_: NamedResource,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailResponse {
    id: u32,
    name: String,
    height: u32,
    weight: u32,
    base_experience: Option<u32>,
    sprites: RawSprites,
    types: Vec<RawTypeSlot>,
    stats: Vec<RawStat>,
    abilities: Vec<RawAbilitySlot>,
    moves: Vec<RawMoveSlot>,
    species: NamedResource,
}

impl From<DetailResponse> for DetailRecord {
    fn from(raw: DetailResponse) -> Self {
        let mut types = raw.types;
        types.sort_by_key(|t| t.slot);
        Self {
            id: raw.id,
            name: raw.name,
            height: raw.height,
            weight: raw.weight,
            base_experience: raw.base_experience,
            sprites: raw.sprites.into(),
            types: types.into_iter().map(|t| t.kind.name).collect(),
            stats: raw
                .stats
                .into_iter()
                .map(|s| Stat {
                    name: s.stat.name,
                    base: s.base_stat,
                })
                .collect(),
            abilities: raw.abilities.into_iter().map(|a| a.ability.name).collect(),
            moves: raw.moves.into_iter().map(|m| m.move_.name).collect(),
            species_name: raw.species.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawFlavorText {
    flavor_text: String,
    language: NamedResource,
}

#[derive(Debug, Deserialize)]
struct RawGenus {
    genus: String,
    language: NamedResource,
}

#[derive(Debug, Deserialize)]
struct RawLocator {
    url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpeciesResponse {
    id: u32,
    name: String,
    #[serde(default)]
    flavor_text_entries: Vec<RawFlavorText>,
    #[serde(default)]
    genera: Vec<RawGenus>,
    habitat: Option<NamedResource>,
    evolution_chain: Option<RawLocator>,
}

const ENGLISH: &str = "en";

impl From<SpeciesResponse> for SpeciesRecord {
    fn from(raw: SpeciesResponse) -> Self {
        let flavor_text = raw
            .flavor_text_entries
            .into_iter()
            .find(|e| e.language.name == ENGLISH)
            .map(|e| e.flavor_text.replace('\u{c}', " "));
        let genus = raw
            .genera
            .into_iter()
            .find(|g| g.language.name == ENGLISH)
            .map(|g| g.genus);
        Self {
            id: raw.id,
            name: raw.name,
            flavor_text,
            genus,
            habitat: raw.habitat.map(|h| h.name),
            evolution_chain: raw.evolution_chain.map(|c| c.url),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvolutionChainResponse {
    pub chain: EvolutionNode,
}

impl EvolutionChainResponse {
    /// Decode a chain of any depth. The recursion limit is lifted and the
    /// stack grows on demand while nested `evolves_to` arrays are read.
    pub(crate) fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let mut de = serde_json::Deserializer::from_slice(bytes);
        de.disable_recursion_limit();
        let raw = Self::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(raw)
    }
}

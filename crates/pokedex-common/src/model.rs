use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fallback artwork location used when a record carries no sprite URLs.
const ARTWORK_FALLBACK_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

/// A `{ name, url }` reference as PokeAPI returns it in list endpoints and nested fields.
///
/// For list entries the URL ends in the numeric id of the referenced item,
/// e.g. `https://pokeapi.co/api/v2/pokemon/25/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

impl NamedResource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Pagination envelope shared by all list endpoints.
///
/// `count` is the total number of items in the catalog, not the length of `results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Full detail record for one Pokémon.
///
/// The record is passed through as received. Commonly used fields are typed; every other
/// key lands in `extra`, as does a known key whose value is `null` or of an unexpected
/// type, so serializing the record reproduces the upstream JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PokemonDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_experience: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<PokemonTypeSlot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Vec<PokemonStat>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprites: Option<Sprites>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PokemonTypeSlot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<u8>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<NamedResource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PokemonStat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_stat: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stat: Option<NamedResource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sprites {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_shiny: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_shiny: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<OtherSprites>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", skip_serializing_if = "Option::is_none")]
    pub official_artwork: Option<Artwork>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Artwork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_default: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Move `key` out of `map` when its value decodes as `T`; otherwise leave it in place.
fn take_field<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = map.remove(key)?;
    match T::deserialize(&value) {
        Ok(typed) => Some(typed),
        Err(_) => {
            map.insert(key.to_string(), value);
            None
        }
    }
}

impl<'de> Deserialize<'de> for PokemonDetail {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra: Map<String, Value> = Map::deserialize(deserializer)?;
        Ok(Self {
            id: take_field(&mut extra, "id"),
            name: take_field(&mut extra, "name"),
            height: take_field(&mut extra, "height"),
            weight: take_field(&mut extra, "weight"),
            base_experience: take_field(&mut extra, "base_experience"),
            order: take_field(&mut extra, "order"),
            types: take_field(&mut extra, "types"),
            stats: take_field(&mut extra, "stats"),
            sprites: take_field(&mut extra, "sprites"),
            extra,
        })
    }
}

impl<'de> Deserialize<'de> for PokemonTypeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra: Map<String, Value> = Map::deserialize(deserializer)?;
        Ok(Self {
            slot: take_field(&mut extra, "slot"),
            kind: take_field(&mut extra, "type"),
            extra,
        })
    }
}

impl<'de> Deserialize<'de> for PokemonStat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra: Map<String, Value> = Map::deserialize(deserializer)?;
        Ok(Self {
            base_stat: take_field(&mut extra, "base_stat"),
            effort: take_field(&mut extra, "effort"),
            stat: take_field(&mut extra, "stat"),
            extra,
        })
    }
}

impl<'de> Deserialize<'de> for Sprites {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra: Map<String, Value> = Map::deserialize(deserializer)?;
        Ok(Self {
            front_default: take_field(&mut extra, "front_default"),
            back_default: take_field(&mut extra, "back_default"),
            front_shiny: take_field(&mut extra, "front_shiny"),
            back_shiny: take_field(&mut extra, "back_shiny"),
            other: take_field(&mut extra, "other"),
            extra,
        })
    }
}

impl<'de> Deserialize<'de> for OtherSprites {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra: Map<String, Value> = Map::deserialize(deserializer)?;
        Ok(Self {
            official_artwork: take_field(&mut extra, "official-artwork"),
            extra,
        })
    }
}

impl<'de> Deserialize<'de> for Artwork {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra: Map<String, Value> = Map::deserialize(deserializer)?;
        Ok(Self {
            front_default: take_field(&mut extra, "front_default"),
            extra,
        })
    }
}

impl PokemonDetail {
    /// Best image for display: official artwork, then the default front sprite, then the
    /// artwork repository URL derived from the id.
    pub fn preferred_sprite(&self) -> Option<String> {
        let sprites = self.sprites.as_ref();
        sprites
            .and_then(|s| s.other.as_ref())
            .and_then(|o| o.official_artwork.as_ref())
            .and_then(|a| a.front_default.clone())
            .or_else(|| sprites.and_then(|s| s.front_default.clone()))
            .or_else(|| self.id.map(fallback_artwork_url))
    }

    /// Base value of the stat called `name` (e.g. "hp", "special-attack").
    pub fn base_stat(&self, name: &str) -> Option<u32> {
        self.stats
            .as_deref()?
            .iter()
            .find(|s| s.stat.as_ref().is_some_and(|r| r.name == name))
            .and_then(|s| s.base_stat)
    }

    /// Type names in slot order.
    pub fn type_names(&self) -> Vec<&str> {
        let mut slots: Vec<&PokemonTypeSlot> = self.types.iter().flatten().collect();
        slots.sort_by_key(|t| t.slot.unwrap_or(u8::MAX));
        slots
            .into_iter()
            .filter_map(|t| t.kind.as_ref().map(|k| k.name.as_str()))
            .collect()
    }
}

pub fn fallback_artwork_url(id: u32) -> String {
    format!("{ARTWORK_FALLBACK_BASE}/{id}.png")
}

/// Minimal stand-in for a detail fetch that failed while errors were tolerated.
///
/// `id` is `None` only when the summary URL itself carried no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub name: String,
}

/// One slot of an enriched page.
///
/// Serialized untagged, so JSON consumers see either a full detail record or an
/// `{ id, name }` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PokemonEntry {
    Detail(PokemonDetail),
    Degraded(DegradedRecord),
}

impl PokemonEntry {
    pub fn id(&self) -> Option<u32> {
        match self {
            Self::Detail(d) => d.id,
            Self::Degraded(d) => d.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Detail(d) => d.name.as_deref(),
            Self::Degraded(d) => Some(d.name.as_str()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn as_detail(&self) -> Option<&PokemonDetail> {
        match self {
            Self::Detail(d) => Some(d),
            Self::Degraded(_) => None,
        }
    }

    /// Image to show for this slot. Degraded records fall back to the artwork URL by id.
    pub fn sprite(&self) -> Option<String> {
        match self {
            Self::Detail(d) => d.preferred_sprite(),
            Self::Degraded(d) => d.id.map(fallback_artwork_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIKACHU: &str = r#"{
        "id": 25,
        "name": "pikachu",
        "height": 4,
        "weight": 60,
        "abilities": [],
        "types": [
            { "slot": 1, "type": { "name": "electric", "url": "https://pokeapi.co/api/v2/type/13/" } }
        ],
        "stats": [
            { "base_stat": 35, "effort": 0, "stat": { "name": "hp", "url": "https://pokeapi.co/api/v2/stat/1/" } },
            { "base_stat": 90, "effort": 2, "stat": { "name": "speed", "url": "https://pokeapi.co/api/v2/stat/6/" } }
        ],
        "sprites": {
            "front_default": "https://img/front/25.png",
            "back_default": null,
            "other": { "official-artwork": { "front_default": "https://img/artwork/25.png" } }
        }
    }"#;

    #[test]
    fn test_detail_keeps_unmodeled_fields() {
        let detail: PokemonDetail = serde_json::from_str(PIKACHU).unwrap();
        assert_eq!(detail.id, Some(25));
        assert_eq!(detail.name.as_deref(), Some("pikachu"));
        assert_eq!(detail.height, Some(4));
        assert_eq!(detail.base_experience, None);
        assert_eq!(detail.extra.get("abilities"), Some(&serde_json::json!([])));
    }

    #[test]
    fn test_detail_accepts_empty_object() {
        let detail: PokemonDetail = serde_json::from_str("{}").unwrap();
        assert_eq!(detail, PokemonDetail::default());
    }

    #[test]
    fn test_preferred_sprite_fallback_order() {
        let detail: PokemonDetail = serde_json::from_str(PIKACHU).unwrap();
        assert_eq!(
            detail.preferred_sprite().as_deref(),
            Some("https://img/artwork/25.png")
        );

        let front_only = PokemonDetail {
            id: Some(25),
            sprites: Some(Sprites {
                front_default: Some("https://img/front/25.png".to_string()),
                ..Sprites::default()
            }),
            ..PokemonDetail::default()
        };
        assert_eq!(
            front_only.preferred_sprite().as_deref(),
            Some("https://img/front/25.png")
        );

        let bare = PokemonDetail {
            id: Some(7),
            ..PokemonDetail::default()
        };
        assert_eq!(bare.preferred_sprite(), Some(fallback_artwork_url(7)));
        assert!(bare.preferred_sprite().unwrap().ends_with("/official-artwork/7.png"));

        assert_eq!(PokemonDetail::default().preferred_sprite(), None);
    }

    #[test]
    fn test_base_stat_and_type_names() {
        let detail: PokemonDetail = serde_json::from_str(PIKACHU).unwrap();
        assert_eq!(detail.base_stat("hp"), Some(35));
        assert_eq!(detail.base_stat("speed"), Some(90));
        assert_eq!(detail.base_stat("attack"), None);
        assert_eq!(detail.type_names(), vec!["electric"]);
    }

    #[test]
    fn test_type_names_follow_slot_order() {
        let detail: PokemonDetail = serde_json::from_str(
            r#"{ "types": [
                { "slot": 2, "type": { "name": "poison", "url": "u" } },
                { "slot": 1, "type": { "name": "grass", "url": "u" } }
            ] }"#,
        )
        .unwrap();
        assert_eq!(detail.type_names(), vec!["grass", "poison"]);
    }

    #[test]
    fn test_page_tolerates_null_cursors_and_missing_results() {
        let page: Page<NamedResource> =
            serde_json::from_str(r#"{ "count": 1302, "next": null, "previous": null }"#).unwrap();
        assert_eq!(page.count, 1302);
        assert!(page.next.is_none());
        assert!(page.results.is_empty());
    }

    #[test]
    fn test_degraded_entry_serializes_as_partial_record() {
        let entry = PokemonEntry::Degraded(DegradedRecord {
            id: Some(2),
            name: "ivysaur".to_string(),
        });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 2, "name": "ivysaur" }));
        assert!(entry.is_degraded());
        assert_eq!(entry.id(), Some(2));
        assert_eq!(entry.name(), Some("ivysaur"));
        assert!(entry.as_detail().is_none());
    }

    #[test]
    fn test_detail_round_trips_as_received() {
        let raw = serde_json::json!({
            "id": 25,
            "name": "pikachu",
            "abilities": [{ "ability": { "name": "static", "url": "u" }, "is_hidden": false, "slot": 1 }],
            "species": { "name": "pikachu", "url": "https://pokeapi.co/api/v2/pokemon-species/25/" },
            "cries": { "latest": "https://cries/25.ogg" },
            "base_experience": null,
            "types": [{ "slot": 1, "type": { "name": "electric", "url": "u" }, "note": "x" }],
            "stats": [{ "base_stat": 35, "effort": 0, "stat": { "name": "hp", "url": "u" } }],
            "sprites": {
                "front_default": "f",
                "back_default": null,
                "front_female": null,
                "other": {
                    "home": { "front_default": "h" },
                    "official-artwork": { "front_default": "a", "front_shiny": "s" }
                }
            }
        });

        let detail: PokemonDetail = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(detail.id, Some(25));
        assert_eq!(detail.base_stat("hp"), Some(35));
        assert!(detail.extra.contains_key("abilities"));
        assert_eq!(serde_json::to_value(&detail).unwrap(), raw);
    }

    #[test]
    fn test_absent_sprite_fields_stay_absent() {
        let raw = serde_json::json!({ "id": 25, "sprites": { "front_default": "f" } });
        let detail: PokemonDetail = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&detail).unwrap(), raw);
    }

    #[test]
    fn test_unexpected_field_type_is_kept_not_rejected() {
        let raw = serde_json::json!({
            "id": 25,
            "name": "pikachu",
            "height": "four",
            "types": "electric",
            "sprites": { "front_default": 7 }
        });

        let detail: PokemonDetail = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(detail.id, Some(25));
        assert_eq!(detail.height, None);
        assert_eq!(detail.extra.get("height"), Some(&serde_json::json!("four")));
        assert!(detail.type_names().is_empty());
        assert_eq!(serde_json::to_value(&detail).unwrap(), raw);
    }

    #[test]
    fn test_entry_sprite() {
        let detail: PokemonDetail = serde_json::from_str(PIKACHU).unwrap();
        assert_eq!(
            PokemonEntry::Detail(detail).sprite().as_deref(),
            Some("https://img/artwork/25.png")
        );
        let degraded = PokemonEntry::Degraded(DegradedRecord {
            id: Some(2),
            name: "ivysaur".to_string(),
        });
        assert_eq!(degraded.sprite(), Some(fallback_artwork_url(2)));
        let unknown = PokemonEntry::Degraded(DegradedRecord {
            id: None,
            name: "missingno".to_string(),
        });
        assert_eq!(unknown.sprite(), None);
    }
}

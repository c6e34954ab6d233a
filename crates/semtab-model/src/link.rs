//! Knowledge-graph entity ids and cell-level hyperlink annotations.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::hash::{Hash, Hasher};

pub const WIKIDATA: &str = "wikidata";
pub const DBPEDIA: &str = "dbpedia";

/// An entity identifier tagged with the knowledge graph it belongs to.
///
/// **Equality and hashing only look at the identifier string**, so
/// `EntityId::new("Q5", "wikidata") == EntityId::new("Q5", "dbpedia")`.
/// Identifiers of different knowledge graphs are assumed to be disjoint and
/// the tag only makes provenance explicit. Code that must distinguish
/// provenance should use [`EntityId::same_kg_entity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityId {
    pub id: String,
    #[serde(rename = "type")]
    pub kg: String,
}

impl EntityId {
    pub fn new(id: impl Into<String>, kg: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kg: kg.into(),
        }
    }

    pub fn wikidata(id: impl Into<String>) -> Self {
        Self::new(id, WIKIDATA)
    }

    /// The wikidata NIL entity: a link that should resolve to nothing in wikidata.
    pub fn wikidata_nil() -> Self {
        Self::wikidata("Q0")
    }

    /// Raw identifier, without its knowledge-graph tag.
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Tag-aware comparison: same identifier *and* same knowledge graph.
    pub fn same_kg_entity(&self, other: &EntityId) -> bool {
        self.id == other.id && self.kg == other.kg
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

// ============================================================================
// Link
// ============================================================================

/// A link inside a table cell. A cell may hold several links because a link
/// does not have to cover the whole cell text.
///
/// `entities` holds one entity per target knowledge graph; empty means the
/// link should not resolve to any entity. A zero-width link (`start == end`)
/// historically marked "not a link".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub start: usize,
    /// Exclusive.
    pub end: usize,
    /// `None` when the text is not a hyperlink.
    pub url: Option<String>,
    pub entities: Vec<EntityId>,
}

#[derive(Serialize)]
struct LinkRecordRef<'a> {
    version: u8,
    start: usize,
    end: usize,
    url: &'a Option<String>,
    entities: &'a [EntityId],
}

#[derive(Deserialize)]
struct LinkRecordV2 {
    start: usize,
    end: usize,
    url: Option<String>,
    entities: Vec<EntityId>,
}

#[derive(Deserialize)]
struct LegacyLinkRecord {
    start: usize,
    end: usize,
    url: Option<String>,
    entity_id: Option<String>,
}

impl Link {
    pub fn new(start: usize, end: usize, url: Option<String>, entities: Vec<EntityId>) -> Self {
        debug_assert!(start <= end, "link start must not exceed end");
        Self {
            start,
            end,
            url,
            entities,
        }
    }

    pub fn is_empty_span(&self) -> bool {
        self.end <= self.start
    }

    /// Decode a link record, accepting the current (`version: 2`) and the
    /// legacy unversioned shape (single wikidata `entity_id`).
    pub fn from_record(value: Value) -> Result<Self> {
        let link = match value.get("version") {
            None | Some(Value::Null) => {
                let rec: LegacyLinkRecord = serde_json::from_value(value)?;
                Link {
                    start: rec.start,
                    end: rec.end,
                    url: rec.url,
                    entities: rec.entity_id.map(EntityId::wikidata).into_iter().collect(),
                }
            }
            Some(v) if v.as_u64() == Some(2) => {
                let rec: LinkRecordV2 = serde_json::from_value(value)?;
                Link {
                    start: rec.start,
                    end: rec.end,
                    url: rec.url,
                    entities: rec.entities,
                }
            }
            Some(other) => {
                return Err(ModelError::UnknownVersion {
                    kind: "link",
                    version: other.to_string(),
                })
            }
        };
        if link.start > link.end {
            return Err(ModelError::InvalidRecord(format!(
                "link start {} is after end {}",
                link.start, link.end
            )));
        }
        Ok(link)
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        LinkRecordRef {
            version: 2,
            start: self.start,
            end: self.end,
            url: &self.url,
            entities: &self.entities,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Link {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Link::from_record(value).map_err(serde::de::Error::custom)
    }
}

//! Page-level context of a table.

use crate::error::{ModelError, Result};
use crate::link::EntityId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A heading of the page the table was found in, with the content around it.
///
/// Content blocks are kept as opaque rich-text records: they are carried
/// through load/save untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentHierarchy {
    pub level: usize,
    pub heading: String,
    #[serde(default)]
    pub content_before: Vec<Value>,
    #[serde(default)]
    pub content_after: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub page_title: Option<String>,
    pub page_url: Option<String>,
    pub page_entities: Vec<EntityId>,
    pub content_hierarchy: Vec<ContentHierarchy>,
}

#[derive(Serialize)]
struct ContextRecordRef<'a> {
    version: u8,
    page_title: &'a Option<String>,
    page_url: &'a Option<String>,
    page_entities: &'a [EntityId],
    content_hierarchy: &'a [ContentHierarchy],
}

#[derive(Deserialize)]
struct ContextRecordV2 {
    page_title: Option<String>,
    page_url: Option<String>,
    page_entities: Vec<EntityId>,
    #[serde(default)]
    content_hierarchy: Vec<ContentHierarchy>,
}

#[derive(Deserialize)]
struct LegacyContextRecord {
    page_title: Option<String>,
    page_url: Option<String>,
    page_entity_id: Option<String>,
    #[serde(default)]
    content_hierarchy: Vec<ContentHierarchy>,
}

impl Context {
    /// Decode a context record: `version: 2`, or the legacy unversioned shape
    /// where a single `page_entity_id` names a wikidata entity.
    pub fn from_record(value: Value) -> Result<Self> {
        match value.get("version") {
            None | Some(Value::Null) => {
                let rec: LegacyContextRecord = serde_json::from_value(value)?;
                Ok(Context {
                    page_title: rec.page_title,
                    page_url: rec.page_url,
                    page_entities: rec
                        .page_entity_id
                        .map(EntityId::wikidata)
                        .into_iter()
                        .collect(),
                    content_hierarchy: rec.content_hierarchy,
                })
            }
            Some(v) if v.as_u64() == Some(2) => {
                let rec: ContextRecordV2 = serde_json::from_value(value)?;
                Ok(Context {
                    page_title: rec.page_title,
                    page_url: rec.page_url,
                    page_entities: rec.page_entities,
                    content_hierarchy: rec.content_hierarchy,
                })
            }
            Some(other) => Err(ModelError::UnknownVersion {
                kind: "context",
                version: other.to_string(),
            }),
        }
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ContextRecordRef {
            version: 2,
            page_title: &self.page_title,
            page_url: &self.page_url,
            page_entities: &self.page_entities,
            content_hierarchy: &self.content_hierarchy,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Context {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Context::from_record(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_context_with_page_entity() {
        let ctx = Context::from_record(json!({
            "page_title": "List of cities",
            "page_url": "https://en.wikipedia.org/wiki/List_of_cities",
            "page_entity_id": "Q515",
        }))
        .unwrap();
        assert_eq!(ctx.page_title.as_deref(), Some("List of cities"));
        assert_eq!(ctx.page_entities, vec![EntityId::wikidata("Q515")]);
        assert!(ctx.content_hierarchy.is_empty());
    }

    #[test]
    fn v2_context_round_trip() {
        let ctx = Context {
            page_title: Some("Rivers".to_string()),
            page_url: None,
            page_entities: vec![EntityId::new("Q4022", "wikidata")],
            content_hierarchy: vec![ContentHierarchy {
                level: 1,
                heading: "Longest rivers".to_string(),
                content_before: vec![json!({"text": "intro"})],
                content_after: vec![],
            }],
        };
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["version"], 2);
        assert_eq!(Context::from_record(value).unwrap(), ctx);
    }

    #[test]
    fn unknown_context_version() {
        let err = Context::from_record(json!({"version": "1"})).unwrap_err();
        assert!(matches!(err, ModelError::UnknownVersion { kind: "context", .. }));
    }
}

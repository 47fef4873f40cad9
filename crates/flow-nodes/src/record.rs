//! JSON:API resource decoding
//!
//! Records arrive as resource objects:
//!
//! ```json
//! {"id": 12, "type": "Asset",
//!  "attributes": {"code": "hero"},
//!  "relationships": {"project": {"data": {"type": "Project", "id": 1, "name": "Demo"}}}}
//! ```
//!
//! wrapped in a `{"data": ...}` envelope holding one object or an array.

use crate::entity::EntityType;
use crate::error::RecordError;
use flow_fields::AttributeMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One entity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default)]
    pub relationships: Map<String, Value>,
}

impl Record {
    /// Create record without relationships
    #[must_use]
    pub fn new(entity_type: impl Into<String>, id: i64, attributes: AttributeMap) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            attributes,
            relationships: Map::new(),
        }
    }

    /// Attach a to-one relationship
    #[must_use]
    pub fn with_link(mut self, name: &str, entity_type: &str, id: i64, label: Option<&str>) -> Self {
        let mut data = json!({"type": entity_type, "id": id});
        if let (Some(label), Some(object)) = (label, data.as_object_mut()) {
            object.insert("name".into(), Value::from(label));
        }
        self.relationships
            .insert(name.to_string(), json!({ "data": data }));
        self
    }

    /// Attach a to-many relationship of named links
    #[must_use]
    pub fn with_links(mut self, name: &str, links: &[(&str, i64, &str)]) -> Self {
        let data: Vec<Value> = links
            .iter()
            .map(|(entity_type, id, label)| json!({"type": entity_type, "id": id, "name": label}))
            .collect();
        self.relationships
            .insert(name.to_string(), json!({ "data": data }));
        self
    }

    /// Decode one resource object
    ///
    /// # Errors
    /// Returns error if `id` or `type` is missing or malformed
    pub fn from_resource(value: &Value) -> Result<Self, RecordError> {
        let object = value.as_object().ok_or(RecordError::Envelope {
            expected: "a resource object",
        })?;

        let id = parse_id(object.get("id").ok_or(RecordError::MissingMember("id"))?)?;
        let entity_type = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(RecordError::MissingMember("type"))?
            .to_string();

        let attributes = object
            .get("attributes")
            .and_then(Value::as_object)
            .map(AttributeMap::from_json_object)
            .unwrap_or_default();
        let relationships = object
            .get("relationships")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            id,
            entity_type,
            attributes,
            relationships,
        })
    }

    /// Known entity type, if the type name is in the catalog
    #[must_use]
    pub fn kind(&self) -> Option<EntityType> {
        self.entity_type.parse().ok()
    }

    /// Non-empty string attribute
    #[inline]
    #[must_use]
    pub fn text(&self, attribute: &str) -> Option<&str> {
        self.attributes.text(attribute)
    }

    /// `name`, else `code`, else `"{Type} {id}"`
    #[must_use]
    pub fn display_name(&self) -> String {
        self.text("name")
            .or_else(|| self.text("code"))
            .map_or_else(|| format!("{} {}", self.entity_type, self.id), ToString::to_string)
    }

    /// `data` member of a relationship
    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&Value> {
        self.relationships
            .get(name)
            .and_then(|r| r.get("data"))
            .filter(|d| !d.is_null())
    }

    /// Id of a to-one relationship
    #[must_use]
    pub fn relationship_id(&self, name: &str) -> Option<i64> {
        self.relationship(name)
            .and_then(|d| d.get("id"))
            .and_then(|id| parse_id(id).ok())
    }

    /// Display name of a to-one relationship
    #[must_use]
    pub fn relationship_name(&self, name: &str) -> Option<&str> {
        self.relationship(name)
            .and_then(|d| d.get("name"))
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
    }

    /// Display names of a to-many relationship, in order
    #[must_use]
    pub fn relationship_names(&self, name: &str) -> Vec<&str> {
        self.relationship(name)
            .and_then(Value::as_array)
            .map(|links| {
                links
                    .iter()
                    .filter_map(|l| l.get("name").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Re-encode as a resource object
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.entity_type,
            "attributes": self.attributes.to_json(),
            "relationships": Value::Object(self.relationships.clone()),
        })
    }
}

fn parse_id(value: &Value) -> Result<i64, RecordError> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| RecordError::InvalidId(value.to_string()))
}

/// Decode a collection response (`{"data": [...]}`)
///
/// A missing or null `data` member is an empty collection.
///
/// # Errors
/// Returns error if the body is not JSON or an item is malformed
pub fn parse_collection(body: &str) -> Result<Vec<Record>, RecordError> {
    let document: Value = serde_json::from_str(body)?;
    parse_collection_value(&document)
}

/// Decode an already-parsed collection response
///
/// # Errors
/// Returns error if `data` is not an array or an item is malformed
pub fn parse_collection_value(document: &Value) -> Result<Vec<Record>, RecordError> {
    match document.get("data") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(Record::from_resource).collect(),
        Some(_) => Err(RecordError::Envelope {
            expected: "an array",
        }),
    }
}

/// Decode a single-resource response (`{"data": {...}}`)
///
/// # Errors
/// Returns error if the body is not JSON, `data` is absent, or the
/// resource is malformed
pub fn parse_single(body: &str) -> Result<Record, RecordError> {
    let document: Value = serde_json::from_str(body)?;
    match document.get("data") {
        Some(data @ Value::Object(_)) => Record::from_resource(data),
        _ => Err(RecordError::Envelope {
            expected: "a resource object",
        }),
    }
}

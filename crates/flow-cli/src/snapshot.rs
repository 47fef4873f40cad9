//! File-backed stand-ins for the host and the remote service

use flow_fields::{AttributeMap, FieldDirection, FieldName, FieldRegistry, FieldSpec, RegistryError};
use flow_nodes::{parse_collection, EntityType, ListQuery, Record, RecordSource, SourceError};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
struct SnapshotField {
    value: Option<String>,
    placeholder: Option<String>,
    direction: FieldDirection,
}

/// Node field set loaded from a JSON object of `name -> value`
#[derive(Debug, Clone, Default)]
pub(crate) struct SnapshotRegistry {
    fields: IndexMap<FieldName, SnapshotField>,
    connected: BTreeSet<FieldName>,
}

impl SnapshotRegistry {
    /// Build from a JSON object; non-string values are stored as JSON text
    pub(crate) fn from_json(object: &Map<String, Value>, connected: &[String]) -> Self {
        let fields = object
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (
                    FieldName::from(name.as_str()),
                    SnapshotField {
                        value: Some(value),
                        placeholder: None,
                        direction: FieldDirection::Output,
                    },
                )
            })
            .collect();
        Self {
            fields,
            connected: connected.iter().map(|n| FieldName::from(n.as_str())).collect(),
        }
    }

    /// Current fields as JSON; inputs show their placeholder
    pub(crate) fn to_json(&self) -> Value {
        let fields = self
            .fields
            .iter()
            .map(|(name, field)| {
                let shown = match field.direction {
                    FieldDirection::Output => field.value.clone(),
                    FieldDirection::Input => field.placeholder.clone(),
                };
                (name.to_string(), shown.map_or(Value::Null, Value::String))
            })
            .collect();
        Value::Object(fields)
    }
}

impl FieldRegistry for SnapshotRegistry {
    fn field_names(&self) -> Result<BTreeSet<FieldName>, RegistryError> {
        Ok(self.fields.keys().cloned().collect())
    }

    fn field_value(&self, name: &FieldName) -> Option<String> {
        self.fields.get(name).and_then(|f| f.value.clone())
    }

    fn field_placeholder(&self, name: &FieldName) -> Option<String> {
        self.fields.get(name).and_then(|f| f.placeholder.clone())
    }

    fn add_field(&mut self, spec: FieldSpec) -> Result<(), RegistryError> {
        if self.fields.contains_key(&spec.name) {
            return Err(RegistryError::AlreadyExists(spec.name));
        }
        self.fields.insert(
            spec.name,
            SnapshotField {
                value: spec.default_value,
                placeholder: spec.placeholder,
                direction: spec.direction,
            },
        );
        Ok(())
    }

    fn set_field_value(&mut self, name: &FieldName, value: &str) -> Result<(), RegistryError> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.clone()))?;
        field.value = Some(value.to_string());
        Ok(())
    }

    fn set_field_placeholder(&mut self, name: &FieldName, placeholder: &str) -> Result<(), RegistryError> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.clone()))?;
        field.placeholder = Some(placeholder.to_string());
        Ok(())
    }

    fn remove_field(&mut self, name: &FieldName) -> Result<(), RegistryError> {
        self.fields
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(name.clone()))
    }

    fn is_connected(&self, name: &FieldName) -> Result<bool, RegistryError> {
        Ok(self.connected.contains(name))
    }
}

/// Records read from a saved collection response
#[derive(Debug, Clone, Default)]
pub(crate) struct SnapshotSource {
    records: Vec<Record>,
}

impl SnapshotSource {
    /// Parse a `{"data": [...]}` body
    pub(crate) fn parse(body: &str) -> Result<Self, SourceError> {
        Ok(Self {
            records: parse_collection(body)?,
        })
    }

    fn find(&self, entity_type: EntityType, id: i64) -> Option<&Record> {
        let name = entity_type.name();
        self.records.iter().find(|r| r.entity_type == name && r.id == id)
    }
}

impl RecordSource for SnapshotSource {
    fn list(&self, query: &ListQuery) -> Result<Vec<Record>, SourceError> {
        let name = query.entity_type.name();
        Ok(self
            .records
            .iter()
            .filter(|r| r.entity_type == name)
            .cloned()
            .collect())
    }

    fn fetch(&self, entity_type: EntityType, id: i64, _fields: &[String]) -> Result<Record, SourceError> {
        self.find(entity_type, id).cloned().ok_or(SourceError::NotFound {
            entity_type: entity_type.name(),
            id,
        })
    }

    fn update(&self, entity_type: EntityType, id: i64, _changes: &AttributeMap) -> Result<Record, SourceError> {
        Err(SourceError::Status {
            status: 405,
            message: format!("snapshot of {entity_type} {id} is read-only"),
        })
    }

    fn create(&self, entity_type: EntityType, _attributes: &AttributeMap) -> Result<Record, SourceError> {
        Err(SourceError::Status {
            status: 405,
            message: format!("snapshot cannot create {entity_type} records"),
        })
    }
}

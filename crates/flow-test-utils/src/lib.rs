//! Testing utilities for the flow workspace
//!
//! In-memory host doubles and record fixtures shared by integration tests.

#![allow(missing_docs)]

use flow_fields::{
    AttributeMap, ChangeSink, FieldDirection, FieldName, FieldRegistry, FieldSpec, RegistryError,
};
use flow_nodes::{EntityType, ListQuery, ProgressSink, Record, RecordSource, SourceError};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

/// One field held by [`MemoryRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldField {
    pub value: Option<String>,
    pub placeholder: Option<String>,
    pub tooltip: String,
    pub direction: FieldDirection,
}

/// Call counters of [`MemoryRegistry`]; rejected calls count too
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryCalls {
    pub added: usize,
    pub values_set: usize,
    pub placeholders_set: usize,
    pub removed: usize,
}

impl RegistryCalls {
    /// Count of calls that changed the field set or a field
    pub fn mutations(&self) -> usize {
        self.added + self.values_set + self.placeholders_set + self.removed
    }
}

/// Field registry kept in memory, with failure injection
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    fields: BTreeMap<FieldName, HeldField>,
    connected: BTreeSet<FieldName>,
    unknown_connectivity: BTreeSet<FieldName>,
    rejecting: BTreeSet<(&'static str, FieldName)>,
    listing_fails: bool,
    pub calls: RegistryCalls,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding output fields with the given values
    pub fn with_outputs(fields: &[(&str, &str)]) -> Self {
        let mut registry = Self::new();
        for (name, value) in fields {
            registry.insert_output(name, value);
        }
        registry
    }

    /// Add an output field without counting a call
    pub fn insert_output(&mut self, name: &str, value: &str) {
        self.fields.insert(
            FieldName::from(name),
            HeldField {
                value: Some(value.to_string()),
                placeholder: None,
                tooltip: String::new(),
                direction: FieldDirection::Output,
            },
        );
    }

    /// Add an input field without counting a call
    pub fn insert_input(&mut self, name: &str, value: &str, placeholder: &str) {
        self.fields.insert(
            FieldName::from(name),
            HeldField {
                value: Some(value.to_string()),
                placeholder: Some(placeholder.to_string()),
                tooltip: String::new(),
                direction: FieldDirection::Input,
            },
        );
    }

    /// Mark a field as wired
    pub fn connect(&mut self, name: &str) {
        self.connected.insert(FieldName::from(name));
    }

    /// Make the connectivity check of a field fail
    pub fn fail_connectivity(&mut self, name: &str) {
        self.unknown_connectivity.insert(FieldName::from(name));
    }

    /// Make `operation` ("add", "set_value", "set_placeholder", "remove") fail on a field
    pub fn reject(&mut self, operation: &'static str, name: &str) {
        self.rejecting.insert((operation, FieldName::from(name)));
    }

    /// Make field listing fail
    pub fn fail_listing(&mut self) {
        self.listing_fails = true;
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.keys().map(ToString::to_string).collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&HeldField> {
        self.fields.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|f| f.value.as_deref())
    }

    pub fn placeholder(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|f| f.placeholder.as_deref())
    }

    /// Simulate the user typing into an input
    pub fn type_into(&mut self, name: &str, value: &str) {
        if let Some(field) = self.fields.get_mut(name) {
            field.value = Some(value.to_string());
        }
    }

    fn check(&self, operation: &'static str, name: &FieldName) -> Result<(), RegistryError> {
        if self.rejecting.contains(&(operation, name.clone())) {
            return Err(RegistryError::rejected(operation, name.clone(), "injected failure"));
        }
        Ok(())
    }
}

impl FieldRegistry for MemoryRegistry {
    fn field_names(&self) -> Result<BTreeSet<FieldName>, RegistryError> {
        if self.listing_fails {
            return Err(RegistryError::Unavailable("injected listing failure".into()));
        }
        Ok(self.fields.keys().cloned().collect())
    }

    fn field_value(&self, name: &FieldName) -> Option<String> {
        self.fields.get(name).and_then(|f| f.value.clone())
    }

    fn field_placeholder(&self, name: &FieldName) -> Option<String> {
        self.fields.get(name).and_then(|f| f.placeholder.clone())
    }

    fn add_field(&mut self, spec: FieldSpec) -> Result<(), RegistryError> {
        self.calls.added += 1;
        self.check("add", &spec.name)?;
        if self.fields.contains_key(&spec.name) {
            return Err(RegistryError::AlreadyExists(spec.name));
        }
        self.fields.insert(
            spec.name,
            HeldField {
                value: spec.default_value,
                placeholder: spec.placeholder,
                tooltip: spec.tooltip,
                direction: spec.direction,
            },
        );
        Ok(())
    }

    fn set_field_value(&mut self, name: &FieldName, value: &str) -> Result<(), RegistryError> {
        self.calls.values_set += 1;
        self.check("set_value", name)?;
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.clone()))?;
        field.value = Some(value.to_string());
        Ok(())
    }

    fn set_field_placeholder(
        &mut self,
        name: &FieldName,
        placeholder: &str,
    ) -> Result<(), RegistryError> {
        self.calls.placeholders_set += 1;
        self.check("set_placeholder", name)?;
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.clone()))?;
        field.placeholder = Some(placeholder.to_string());
        Ok(())
    }

    fn remove_field(&mut self, name: &FieldName) -> Result<(), RegistryError> {
        self.calls.removed += 1;
        self.check("remove", name)?;
        self.fields
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.clone()))?;
        Ok(())
    }

    fn is_connected(&self, name: &FieldName) -> Result<bool, RegistryError> {
        if self.unknown_connectivity.contains(name) {
            return Err(RegistryError::Unavailable("injected connectivity failure".into()));
        }
        Ok(self.connected.contains(name))
    }
}

/// Sink remembering every change event in order
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<(String, String)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest value reported for a field
    pub fn last(&self, name: &str) -> Option<&str> {
        self.events
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Names in reporting order
    pub fn names(&self) -> Vec<&str> {
        self.events.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl ChangeSink for RecordingSink {
    fn field_changed(&mut self, name: &FieldName, value: &str) {
        self.events.push((name.to_string(), value.to_string()));
    }
}

/// Progress sink remembering stage events as text
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    pub events: Vec<String>,
}

impl ProgressSink for RecordingProgress {
    fn stage_started(&mut self, index: usize, total: usize, name: &str) {
        self.events.push(format!("start {}/{} {}", index + 1, total, name));
    }

    fn stage_finished(&mut self, index: usize, total: usize, name: &str) {
        self.events.push(format!("done {}/{} {}", index + 1, total, name));
    }

    fn stage_failed(&mut self, index: usize, total: usize, name: &str, error: &str) {
        self.events.push(format!("fail {}/{} {}: {}", index + 1, total, name, error));
    }
}

/// Record source backed by a fixed set of records
///
/// Listing returns every record of the queried type in insertion order;
/// updates are merged into the stored record. Created records get the next
/// id above every stored one.
#[derive(Debug, Default)]
pub struct StaticSource {
    records: RefCell<Vec<Record>>,
    pub failing: bool,
    pub queries: RefCell<Vec<ListQuery>>,
    pub updates: RefCell<Vec<(EntityType, i64, AttributeMap)>>,
    pub created: RefCell<Vec<(EntityType, AttributeMap)>>,
}

impl StaticSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: RefCell::new(records),
            ..Self::default()
        }
    }

    /// Source whose every call fails with a transport error
    pub fn offline() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Replace the stored records
    pub fn replace(&self, records: Vec<Record>) {
        *self.records.borrow_mut() = records;
    }

    pub fn record(&self, entity_type: EntityType, id: i64) -> Option<Record> {
        let name = entity_type.name();
        self.records
            .borrow()
            .iter()
            .find(|r| r.entity_type == name && r.id == id)
            .cloned()
    }

    fn guard(&self) -> Result<(), SourceError> {
        if self.failing {
            return Err(SourceError::Transport("source offline".into()));
        }
        Ok(())
    }
}

impl RecordSource for StaticSource {
    fn list(&self, query: &ListQuery) -> Result<Vec<Record>, SourceError> {
        self.queries.borrow_mut().push(query.clone());
        self.guard()?;
        let name = query.entity_type.name();
        Ok(self
            .records
            .borrow()
            .iter()
            .filter(|r| r.entity_type == name)
            .cloned()
            .collect())
    }

    fn fetch(&self, entity_type: EntityType, id: i64, _fields: &[String]) -> Result<Record, SourceError> {
        self.guard()?;
        self.record(entity_type, id).ok_or(SourceError::NotFound {
            entity_type: entity_type.name(),
            id,
        })
    }

    fn update(&self, entity_type: EntityType, id: i64, changes: &AttributeMap) -> Result<Record, SourceError> {
        self.guard()?;
        self.updates
            .borrow_mut()
            .push((entity_type, id, changes.clone()));
        let name = entity_type.name();
        let mut records = self.records.borrow_mut();
        let record = records
            .iter_mut()
            .find(|r| r.entity_type == name && r.id == id)
            .ok_or(SourceError::NotFound {
                entity_type: name.clone(),
                id,
            })?;
        for (attribute, value) in changes.iter() {
            record.attributes.insert(attribute, value.clone());
        }
        Ok(record.clone())
    }

    fn create(&self, entity_type: EntityType, attributes: &AttributeMap) -> Result<Record, SourceError> {
        self.guard()?;
        self.created
            .borrow_mut()
            .push((entity_type, attributes.clone()));
        let mut records = self.records.borrow_mut();
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let record = Record::new(entity_type.name(), id, attributes.clone());
        records.push(record.clone());
        Ok(record)
    }
}

/// Asset record fixture
pub fn asset(id: i64, code: &str, asset_type: &str) -> Record {
    Record::new(
        "Asset",
        id,
        AttributeMap::new()
            .with("code", code)
            .with("sg_asset_type", asset_type)
            .with("sg_status_list", "ip")
            .with("description", format!("{code} asset")),
    )
}

/// Project record fixture
pub fn project(id: i64, name: &str, template: bool) -> Record {
    Record::new(
        "Project",
        id,
        AttributeMap::new()
            .with("name", name)
            .with("is_template", template)
            .with("sg_status", "Active"),
    )
}

/// Task record fixture linked to an asset
pub fn task(id: i64, content: &str, asset_id: i64) -> Record {
    Record::new(
        "Task",
        id,
        AttributeMap::new()
            .with("content", content)
            .with("sg_status_list", "wtg"),
    )
    .with_link("entity", "Asset", asset_id, None)
}

/// Step record fixture
pub fn step(id: i64, short_name: &str, code: &str) -> Record {
    Record::new(
        "Step",
        id,
        AttributeMap::new()
            .with("short_name", short_name)
            .with("code", code)
            .with("entity_type", "Asset"),
    )
}

/// User record fixture
pub fn user(id: i64, name: &str, email: &str) -> Record {
    Record::new(
        "HumanUser",
        id,
        AttributeMap::new().with("name", name).with("email", email),
    )
}

/// Attribute map from name/value pairs
pub fn attributes(pairs: &[(&str, &str)]) -> AttributeMap {
    pairs
        .iter()
        .map(|(name, value)| (*name, flow_fields::AttributeValue::from(*value)))
        .collect()
}

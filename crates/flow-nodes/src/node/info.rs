//! Entity info node
//!
//! Fetches one record, fills the fixed outputs, and exposes every record
//! attribute as a dynamic output field.

use super::{publish_output, resolve_target, HOST_CONTROL_FIELDS};
use crate::config::FlowConfig;
use crate::entity::{EntitySelector, EntityType};
use crate::error::NodeError;
use crate::record::Record;
use crate::source::RecordSource;
use flow_fields::{ChangeSink, FieldRegistry, ReconcileReport, Reconciler};
use serde_json::{json, Value};

/// Input fields of the node
pub const INFO_INPUTS: [&str; 3] = ["entity_type", "entity_id", "fields"];

/// Fixed output fields of the node
pub const INFO_OUTPUTS: [&str; 6] = [
    "entity_url",
    "entity_id_output",
    "entity_name",
    "entity_code",
    "entity_type_output",
    "entity_data",
];

/// What to fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoRequest {
    /// Type; unknown triggers detection
    pub target: EntitySelector,
    /// Record id
    pub entity_id: Option<i64>,
    /// Attributes to request; empty uses the type's defaults
    pub fields: Vec<String>,
}

impl InfoRequest {
    /// Request a record of known type
    #[must_use]
    pub fn new(entity_type: EntityType, id: i64) -> Self {
        Self {
            target: EntitySelector::Known(entity_type),
            entity_id: Some(id),
            fields: Vec::new(),
        }
    }

    /// Request a record whose type must be detected
    #[must_use]
    pub fn detect(id: i64) -> Self {
        Self {
            entity_id: Some(id),
            ..Self::default()
        }
    }

    /// Parse a comma-separated field list
    #[must_use]
    pub fn with_field_list(mut self, fields: &str) -> Self {
        self.fields = fields
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(ToString::to_string)
            .collect();
        self
    }
}

/// Result of a refresh
#[derive(Debug, Clone)]
pub struct InfoOutcome {
    pub entity_type: EntityType,
    pub record: Record,
    pub report: ReconcileReport,
}

/// Summary object published on `entity_data`
#[must_use]
pub fn entity_summary(record: &Record) -> Value {
    let text = |name: &str| record.text(name).unwrap_or_default();
    json!({
        "id": record.id,
        "type": record.entity_type,
        "name": record.display_name(),
        "code": text("code"),
        "description": text("description"),
        "created_at": text("created_at"),
        "updated_at": text("updated_at"),
        "attributes": record.attributes.to_json(),
        "relationships": Value::Object(record.relationships.clone()),
    })
}

/// Entity info node
#[derive(Debug, Clone)]
pub struct EntityInfoNode {
    config: FlowConfig,
    reconciler: Reconciler,
}

impl EntityInfoNode {
    /// Create node; inputs, fixed outputs and host control fields are static
    #[must_use]
    pub fn new(config: FlowConfig) -> Self {
        let reconciler = Reconciler::display("Entity")
            .with_static(INFO_INPUTS)
            .with_static(INFO_OUTPUTS)
            .with_static(HOST_CONTROL_FIELDS);
        Self { config, reconciler }
    }

    /// Reconciler in use
    #[inline]
    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Fetch the record and bring every output up to date
    ///
    /// # Errors
    /// Returns error when the id is missing, the type cannot be detected,
    /// the fetch fails, or the field listing fails. Fields are untouched in
    /// every one of these cases except a successful detection, which
    /// publishes the detected `entity_type`.
    pub fn refresh<S, R, K>(
        &self,
        request: &InfoRequest,
        source: &S,
        registry: &mut R,
        sink: &mut K,
    ) -> Result<InfoOutcome, NodeError>
    where
        S: RecordSource + ?Sized,
        R: FieldRegistry + ?Sized,
        K: ChangeSink + ?Sized,
    {
        let id = request.entity_id.ok_or(NodeError::MissingEntityId)?;
        let entity_type = resolve_target(request.target, id, source, registry, sink)?;

        let fields: Vec<String> = if request.fields.is_empty() {
            entity_type.default_fields().into_iter().map(ToString::to_string).collect()
        } else {
            request.fields.clone()
        };

        let record = source.fetch(entity_type, id, &fields).map_err(|err| {
            tracing::error!("failed to fetch {} {}: {}", entity_type, id, err);
            err
        })?;

        // Nothing is written unless the field set can be listed.
        self.reconciler.plan(&*registry, &record.attributes)?;

        let outputs = [
            ("entity_url", self.config.detail_url(&record.entity_type, record.id)),
            ("entity_id_output", record.id.to_string()),
            ("entity_name", record.display_name()),
            ("entity_code", record.text("code").unwrap_or_default().to_string()),
            ("entity_type_output", record.entity_type.clone()),
            ("entity_data", entity_summary(&record).to_string()),
        ];
        for (name, value) in &outputs {
            publish_output(registry, sink, name, value);
        }

        let report = self.reconciler.reconcile(registry, sink, &record.attributes)?;
        tracing::info!("retrieved {} {}", entity_type, id);

        Ok(InfoOutcome {
            entity_type,
            record,
            report,
        })
    }
}

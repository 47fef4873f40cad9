//! Entity edit node
//!
//! Exposes the editable attributes of a record as empty input fields whose
//! placeholder shows the current value. Whatever the user types becomes the
//! update payload; untouched fields are left out.

use super::{publish_output, resolve_target, HOST_CONTROL_FIELDS};
use crate::config::FlowConfig;
use crate::entity::{EntitySelector, EntityType};
use crate::error::NodeError;
use crate::record::Record;
use crate::source::RecordSource;
use flow_fields::{AttributeMap, ChangeSink, FieldName, FieldRegistry, ReconcileReport, Reconciler};

/// Fixed fields of the node
pub const EDIT_STATIC_FIELDS: [&str; 4] = ["entity_url", "updated_entity", "entity_type", "entity_id"];

/// Entity edit node
#[derive(Debug, Clone)]
pub struct EntityEditNode {
    config: FlowConfig,
    reconciler: Reconciler,
}

impl EntityEditNode {
    /// Create node; read-only attributes are never exposed
    #[must_use]
    pub fn new(config: FlowConfig) -> Self {
        let reconciler = Reconciler::edit("Entity")
            .with_static(EDIT_STATIC_FIELDS)
            .with_static(HOST_CONTROL_FIELDS);
        Self { config, reconciler }
    }

    /// Reconciler in use
    #[inline]
    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Load the record and expose its editable attributes
    ///
    /// # Errors
    /// Returns error when the id is missing, detection or fetch fails, or
    /// the field listing fails; fields are left as they were
    pub fn load<S, R, K>(
        &self,
        target: EntitySelector,
        entity_id: Option<i64>,
        source: &S,
        registry: &mut R,
        sink: &mut K,
    ) -> Result<ReconcileReport, NodeError>
    where
        S: RecordSource + ?Sized,
        R: FieldRegistry + ?Sized,
        K: ChangeSink + ?Sized,
    {
        let id = entity_id.ok_or(NodeError::MissingEntityId)?;
        let entity_type = resolve_target(target, id, source, registry, sink)?;
        let fields: Vec<String> = entity_type
            .default_fields()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        let record = source.fetch(entity_type, id, &fields)?;

        if record.attributes.is_empty() {
            tracing::warn!("no attributes found for {} {}", entity_type, id);
        }
        let report = self.reconciler.reconcile(registry, sink, &record.attributes)?;
        publish_output(
            registry,
            sink,
            "entity_url",
            &self.config.detail_url(&entity_type.name(), id),
        );
        Ok(report)
    }

    /// Values typed into dynamic inputs; `None` when nothing was entered
    ///
    /// A registry that cannot be listed yields `None`.
    #[must_use]
    pub fn pending_update<R: FieldRegistry + ?Sized>(&self, registry: &R) -> Option<AttributeMap> {
        match self.reconciler.collect_edits(registry) {
            Ok(edits) if edits.is_empty() => None,
            Ok(edits) => Some(edits),
            Err(err) => {
                tracing::error!("cannot collect edits: {}", err);
                None
            }
        }
    }

    /// Send pending edits, publish the updated record, refresh placeholders
    ///
    /// Submitted inputs are cleared once the update succeeds.
    /// Returns `Ok(None)` without calling the source when nothing was
    /// entered.
    ///
    /// # Errors
    /// Returns error if the update is rejected; fields are left as they were
    pub fn submit<S, R, K>(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        source: &S,
        registry: &mut R,
        sink: &mut K,
    ) -> Result<Option<Record>, NodeError>
    where
        S: RecordSource + ?Sized,
        R: FieldRegistry + ?Sized,
        K: ChangeSink + ?Sized,
    {
        let Some(changes) = self.pending_update(&*registry) else {
            tracing::warn!("no fields to update on {} {}", entity_type, entity_id);
            return Ok(None);
        };

        tracing::info!(
            "updating {} {} with {} field(s)",
            entity_type,
            entity_id,
            changes.len()
        );
        let updated = source.update(entity_type, entity_id, &changes)?;
        publish_output(registry, sink, "updated_entity", &updated.to_json().to_string());

        for (name, _) in changes.iter() {
            if let Err(err) = registry.set_field_value(&FieldName::from(name), "") {
                tracing::warn!("failed to clear input '{}': {}", name, err);
            }
        }

        self.load(
            EntitySelector::Known(entity_type),
            Some(entity_id),
            source,
            registry,
            sink,
        )?;
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_fields::{ReconcileMode, DEFAULT_READ_ONLY};

    #[test]
    fn edit_node_protects_fixed_and_host_fields() {
        let node = EntityEditNode::new(FlowConfig::default());
        let reconciler = node.reconciler();

        assert_eq!(reconciler.mode(), ReconcileMode::Edit);
        for name in EDIT_STATIC_FIELDS.iter().chain(&HOST_CONTROL_FIELDS) {
            assert!(reconciler.is_static(&FieldName::from(*name)), "{name}");
        }
        let desired = reconciler.desired(
            &AttributeMap::new()
                .with("id", 4)
                .with("updated_at", "2024-01-01")
                .with("code", "hero"),
        );
        assert!(DEFAULT_READ_ONLY.iter().all(|n| !desired.contains(n)));
        assert!(desired.contains("code"));
    }
}

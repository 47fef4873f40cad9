//! Node adapters
//!
//! Each node owns its own selector / reconciler state; the host field
//! registry and change sink are passed in per call. Callers serialize calls
//! per node instance.

mod create_task;
mod edit;
mod info;
mod list;

pub use create_task::{
    task_payload, TaskCreateNode, TaskRequest, DEFAULT_TASK_STATUS, TASK_OUTPUTS, TASK_STATUSES,
};
pub use edit::{EntityEditNode, EDIT_STATIC_FIELDS};
pub use info::{entity_summary, EntityInfoNode, InfoOutcome, InfoRequest, INFO_INPUTS, INFO_OUTPUTS};
pub use list::ListNode;

use crate::entity::{EntitySelector, EntityType};
use crate::error::NodeError;
use crate::source::{detect_entity_type, RecordSource};
use flow_fields::{ChangeSink, FieldName, FieldRegistry};

/// Execution-control fields every host node carries
pub const HOST_CONTROL_FIELDS: [&str; 4] = ["exec_in", "exec_out", "execution_environment", "job_group"];

/// Write a static output and notify the sink
///
/// A rejected write is logged; the notification is still sent so the UI
/// shows the new value.
pub(crate) fn publish_output<R, K>(registry: &mut R, sink: &mut K, name: &str, value: &str)
where
    R: FieldRegistry + ?Sized,
    K: ChangeSink + ?Sized,
{
    let field = FieldName::from(name);
    if let Err(err) = registry.set_field_value(&field, value) {
        tracing::error!("failed to set output '{}': {}", field, err);
    }
    sink.field_changed(&field, value);
}

/// Resolve the entity type, detecting it when unknown
///
/// A detected type is pushed to the `entity_type` field.
pub(crate) fn resolve_target<S, R, K>(
    target: EntitySelector,
    id: i64,
    source: &S,
    registry: &mut R,
    sink: &mut K,
) -> Result<EntityType, NodeError>
where
    S: RecordSource + ?Sized,
    R: FieldRegistry + ?Sized,
    K: ChangeSink + ?Sized,
{
    match target {
        EntitySelector::Known(entity_type) => Ok(entity_type),
        EntitySelector::Unknown => {
            let detected = detect_entity_type(source, id)?;
            publish_output(registry, sink, "entity_type", &detected.name());
            Ok(detected)
        }
    }
}

//! Host collaborator interfaces
//!
//! The node-graph host owns a node's fields. The reconciler only talks to it
//! through [`FieldRegistry`] and pushes UI refreshes through [`ChangeSink`].
//! One registry value is bound to one node instance; callers serialize
//! reconciliations per node.

use crate::error::RegistryError;
use crate::field::{FieldName, FieldSpec};
use std::collections::BTreeSet;

/// Field registry of a single node
#[cfg_attr(test, mockall::automock)]
pub trait FieldRegistry {
    /// Names of every field currently attached to the node
    ///
    /// # Errors
    /// Returns error if the host cannot be queried
    fn field_names(&self) -> Result<BTreeSet<FieldName>, RegistryError>;

    /// Currently held value, if any
    fn field_value(&self, name: &FieldName) -> Option<String>;

    /// Currently shown placeholder hint, if any
    fn field_placeholder(&self, name: &FieldName) -> Option<String>;

    /// Register a new field
    ///
    /// # Errors
    /// Returns error if the host rejects the field
    fn add_field(&mut self, spec: FieldSpec) -> Result<(), RegistryError>;

    /// Set a field's value
    ///
    /// # Errors
    /// Returns error if the host rejects the value
    fn set_field_value(&mut self, name: &FieldName, value: &str) -> Result<(), RegistryError>;

    /// Set a field's placeholder hint
    ///
    /// # Errors
    /// Returns error if the host rejects the update
    fn set_field_placeholder(
        &mut self,
        name: &FieldName,
        placeholder: &str,
    ) -> Result<(), RegistryError>;

    /// Remove a field
    ///
    /// # Errors
    /// Returns error if the host refuses to remove it
    fn remove_field(&mut self, name: &FieldName) -> Result<(), RegistryError>;

    /// Whether the field has any incoming or outgoing wiring
    ///
    /// # Errors
    /// Returns error if connectivity cannot be determined; callers treat
    /// that as connected
    fn is_connected(&self, name: &FieldName) -> Result<bool, RegistryError>;
}

/// Destination for "field X changed to value Y" events
#[cfg_attr(test, mockall::automock)]
pub trait ChangeSink {
    /// Report a changed field value
    fn field_changed(&mut self, name: &FieldName, value: &str);
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn field_changed(&mut self, _name: &FieldName, _value: &str) {}
}

/// Connectivity with the fail-closed rule applied
///
/// A failing connectivity check counts as connected.
pub(crate) fn connected_or_assume<R: FieldRegistry + ?Sized>(registry: &R, name: &FieldName) -> bool {
    match registry.is_connected(name) {
        Ok(connected) => connected,
        Err(err) => {
            tracing::warn!("connectivity check for '{}' failed, assuming connected: {}", name, err);
            true
        }
    }
}

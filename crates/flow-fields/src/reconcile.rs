//! Dynamic field reconciliation
//!
//! Keeps a node's dynamic fields in step with the attribute set of the
//! latest fetched record:
//! - **update** fields present on both sides whose normalized value changed
//! - **create** fields for attributes the node does not expose yet
//! - **delete** fields whose attribute disappeared, unless the field is wired
//!
//! Static fields are never touched. Every per-field operation is independent;
//! a failing one is logged and recorded in the [`ReconcileReport`] while the
//! rest proceed.

use crate::attribute::{AttributeMap, AttributeValue};
use crate::error::{ReconcileError, RegistryError};
use crate::field::{FieldName, FieldSpec};
use crate::registry::{connected_or_assume, ChangeSink, FieldRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Attributes hidden from edit reconciliation by default
pub const DEFAULT_READ_ONLY: [&str; 3] = ["id", "created_at", "updated_at"];

/// How dynamic fields are exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Output fields whose value shows the attribute
    #[default]
    Display,
    /// Input fields left empty; the placeholder shows the current attribute
    /// value and an empty input means "leave unchanged"
    Edit,
}

/// Reconciler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerOptions {
    /// Exposure mode
    pub mode: ReconcileMode,
    /// Fields fixed at node construction
    pub static_fields: BTreeSet<FieldName>,
    /// Noun used in display tooltips (`"{subject} attribute: {name}"`)
    pub subject: String,
    /// Attribute names never exposed as dynamic fields
    pub excluded_attributes: Vec<String>,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            mode: ReconcileMode::Display,
            static_fields: BTreeSet::new(),
            subject: "Entity".to_string(),
            excluded_attributes: Vec::new(),
        }
    }
}

/// Per-field operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAction {
    /// Register a new field
    Create,
    /// Refresh an existing field
    Update,
    /// Remove a stale field
    Delete,
}

/// Field-level diff between the registry and a desired attribute set
///
/// `update` holds candidates only; whether a value actually changed is
/// decided against the registry when the plan is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilePlan {
    /// Present on both sides (desired order)
    pub update: Vec<FieldName>,
    /// Desired but not registered (desired order)
    pub create: Vec<FieldName>,
    /// Registered but no longer desired (sorted)
    pub delete: Vec<FieldName>,
}

impl ReconcilePlan {
    /// Check if plan has nothing to create or delete
    #[inline]
    #[must_use]
    pub fn is_structurally_empty(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }
}

/// Compute the diff between registered and desired fields
///
/// Static names are removed from both sides first, so a static field is
/// never scheduled for creation or deletion even when the record carries an
/// attribute of the same name.
#[must_use]
pub fn plan(
    current: &BTreeSet<FieldName>,
    static_fields: &BTreeSet<FieldName>,
    desired: &AttributeMap,
) -> ReconcilePlan {
    let current_dynamic: BTreeSet<&FieldName> = current.difference(static_fields).collect();
    let desired_names: Vec<FieldName> = desired
        .iter()
        .map(|(name, _)| FieldName::from(name))
        .filter(|name| !static_fields.contains(name))
        .collect();

    let (update, create): (Vec<FieldName>, Vec<FieldName>) = desired_names
        .iter()
        .cloned()
        .partition(|name| current_dynamic.contains(name));

    let delete = current_dynamic
        .into_iter()
        .filter(|name| !desired.contains(name.as_str()))
        .cloned()
        .collect();

    ReconcilePlan {
        update,
        create,
        delete,
    }
}

/// A per-field failure recorded during reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    /// Affected field
    pub field: FieldName,
    /// Operation that failed
    pub action: FieldAction,
    /// Host error
    pub error: RegistryError,
}

/// Outcome of one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Fields registered
    pub created: Vec<FieldName>,
    /// Fields whose value (or placeholder) changed
    pub updated: Vec<FieldName>,
    /// Fields already holding the desired value
    pub unchanged: Vec<FieldName>,
    /// Fields removed
    pub deleted: Vec<FieldName>,
    /// Stale fields kept because they are wired (or connectivity is unknown)
    pub preserved: Vec<FieldName>,
    /// Operations the host rejected
    pub failures: Vec<FieldFailure>,
}

impl ReconcileReport {
    /// Number of successful registry mutations
    #[inline]
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }

    /// Check if no operation failed
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, field: &FieldName, action: FieldAction, error: RegistryError) {
        tracing::error!("failed to {:?} field '{}': {}", action, field, error);
        self.failures.push(FieldFailure {
            field: field.clone(),
            action,
            error,
        });
    }
}

/// Dynamic field reconciler for one kind of node
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcilerOptions,
}

impl Reconciler {
    /// Create reconciler from options
    #[inline]
    #[must_use]
    pub fn new(options: ReconcilerOptions) -> Self {
        Self { options }
    }

    /// Display reconciler; tooltips read `"{subject} attribute: {name}"`
    #[must_use]
    pub fn display(subject: impl Into<String>) -> Self {
        Self::new(ReconcilerOptions {
            mode: ReconcileMode::Display,
            subject: subject.into(),
            ..ReconcilerOptions::default()
        })
    }

    /// Edit reconciler hiding [`DEFAULT_READ_ONLY`] attributes
    #[must_use]
    pub fn edit(subject: impl Into<String>) -> Self {
        Self::new(ReconcilerOptions {
            mode: ReconcileMode::Edit,
            subject: subject.into(),
            excluded_attributes: DEFAULT_READ_ONLY.iter().map(ToString::to_string).collect(),
            ..ReconcilerOptions::default()
        })
    }

    /// Add protected static fields
    #[must_use]
    pub fn with_static<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<FieldName>,
    {
        self.options
            .static_fields
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Current options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ReconcilerOptions {
        &self.options
    }

    /// Exposure mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> ReconcileMode {
        self.options.mode
    }

    /// Check if a field is static
    #[inline]
    #[must_use]
    pub fn is_static(&self, name: &FieldName) -> bool {
        self.options.static_fields.contains(name)
    }

    /// Desired attribute set after removing excluded attributes
    #[must_use]
    pub fn desired(&self, attributes: &AttributeMap) -> AttributeMap {
        if self.options.excluded_attributes.is_empty() {
            attributes.clone()
        } else {
            attributes.without(&self.options.excluded_attributes)
        }
    }

    /// Diff the registry against `attributes` without mutating anything
    ///
    /// # Errors
    /// Returns error if the registry cannot list its fields
    pub fn plan<R: FieldRegistry + ?Sized>(
        &self,
        registry: &R,
        attributes: &AttributeMap,
    ) -> Result<ReconcilePlan, ReconcileError> {
        let current = registry.field_names().map_err(ReconcileError::ListFields)?;
        Ok(plan(
            &current,
            &self.options.static_fields,
            &self.desired(attributes),
        ))
    }

    /// Make the node's dynamic fields match `attributes`
    ///
    /// An empty attribute set deletes every unwired dynamic field.
    ///
    /// # Errors
    /// Returns [`ReconcileError::ListFields`] when the current field set is
    /// unknown; the registry is left untouched in that case. Per-field
    /// failures are reported in the returned [`ReconcileReport`] instead.
    pub fn reconcile<R, S>(
        &self,
        registry: &mut R,
        sink: &mut S,
        attributes: &AttributeMap,
    ) -> Result<ReconcileReport, ReconcileError>
    where
        R: FieldRegistry + ?Sized,
        S: ChangeSink + ?Sized,
    {
        let desired = self.desired(attributes);
        let current = registry.field_names().map_err(ReconcileError::ListFields)?;
        let plan = plan(&current, &self.options.static_fields, &desired);

        tracing::debug!(
            "reconcile plan: update {:?}, create {:?}, delete {:?}",
            plan.update,
            plan.create,
            plan.delete
        );

        let mut report = ReconcileReport::default();

        for name in &plan.update {
            let value = desired.normalized(name.as_str());
            self.update_field(registry, sink, name, &value, &mut report);
        }

        for name in &plan.create {
            let value = desired.normalized(name.as_str());
            self.create_field(registry, sink, name, value, &mut report);
        }

        for name in &plan.delete {
            if connected_or_assume(&*registry, name) {
                tracing::warn!("keeping stale field '{}': it has connections", name);
                report.preserved.push(name.clone());
                continue;
            }
            match registry.remove_field(name) {
                Ok(()) => report.deleted.push(name.clone()),
                Err(err) => report.fail(name, FieldAction::Delete, err),
            }
        }

        tracing::info!(
            "reconciled fields: {} created, {} updated, {} deleted, {} preserved, {} failed",
            report.created.len(),
            report.updated.len(),
            report.deleted.len(),
            report.preserved.len(),
            report.failures.len()
        );

        Ok(report)
    }

    /// Gather pending edits from dynamic input fields
    ///
    /// Only non-empty values are collected; an empty field means "leave
    /// unchanged".
    ///
    /// # Errors
    /// Returns error if the registry cannot list its fields
    pub fn collect_edits<R: FieldRegistry + ?Sized>(
        &self,
        registry: &R,
    ) -> Result<AttributeMap, ReconcileError> {
        let current = registry.field_names().map_err(ReconcileError::ListFields)?;
        Ok(current
            .difference(&self.options.static_fields)
            .filter_map(|name| {
                registry
                    .field_value(name)
                    .filter(|v| !v.is_empty())
                    .map(|v| (name.as_str().to_string(), AttributeValue::from(v)))
            })
            .collect())
    }

    fn update_field<R, S>(
        &self,
        registry: &mut R,
        sink: &mut S,
        name: &FieldName,
        value: &str,
        report: &mut ReconcileReport,
    ) where
        R: FieldRegistry + ?Sized,
        S: ChangeSink + ?Sized,
    {
        let held = match self.options.mode {
            ReconcileMode::Display => registry.field_value(name),
            ReconcileMode::Edit => registry.field_placeholder(name),
        }
        .unwrap_or_default();

        if held == value {
            report.unchanged.push(name.clone());
            return;
        }

        let result = match self.options.mode {
            ReconcileMode::Display => registry.set_field_value(name, value),
            ReconcileMode::Edit => registry.set_field_placeholder(name, value),
        };
        match result {
            Ok(()) => {
                tracing::debug!("updated '{}' from '{}' to '{}'", name, held, value);
                sink.field_changed(name, value);
                report.updated.push(name.clone());
            }
            Err(err) => report.fail(name, FieldAction::Update, err),
        }
    }

    fn create_field<R, S>(
        &self,
        registry: &mut R,
        sink: &mut S,
        name: &FieldName,
        value: String,
        report: &mut ReconcileReport,
    ) where
        R: FieldRegistry + ?Sized,
        S: ChangeSink + ?Sized,
    {
        let spec = match self.options.mode {
            ReconcileMode::Display => {
                let tooltip = format!("{} attribute: {}", self.options.subject, name);
                FieldSpec::output(name.clone(), value.clone(), tooltip)
            }
            ReconcileMode::Edit => {
                let tooltip = format!("Update {name} (leave empty to keep current value)");
                FieldSpec::input(name.clone(), value.clone(), tooltip)
            }
        };

        match registry.add_field(spec) {
            Ok(()) => {
                sink.field_changed(name, &value);
                report.created.push(name.clone());
            }
            Err(err) => report.fail(name, FieldAction::Create, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDirection;
    use crate::registry::{MockChangeSink, MockFieldRegistry, NullSink};
    use mockall::predicate::eq;

    fn names(list: &[&str]) -> BTreeSet<FieldName> {
        list.iter().map(|n| FieldName::from(*n)).collect()
    }

    #[test]
    fn plan_splits_update_create_delete() {
        let desired = AttributeMap::new().with("b", "1").with("c", "2");
        let plan = plan(&names(&["a", "b"]), &BTreeSet::new(), &desired);

        assert_eq!(plan.update, vec![FieldName::from("b")]);
        assert_eq!(plan.create, vec![FieldName::from("c")]);
        assert_eq!(plan.delete, vec![FieldName::from("a")]);
    }

    #[test]
    fn plan_never_touches_static_fields() {
        let desired = AttributeMap::new().with("id", 5).with("code", "hero");
        let plan = plan(&names(&["id", "entity_url"]), &names(&["id", "entity_url"]), &desired);

        assert_eq!(plan.create, vec![FieldName::from("code")]);
        assert!(plan.update.is_empty());
        assert!(plan.delete.is_empty());
    }

    #[test]
    fn plan_create_follows_desired_order() {
        let desired = AttributeMap::new().with("zeta", 1).with("alpha", 2);
        let plan = plan(&BTreeSet::new(), &BTreeSet::new(), &desired);
        assert_eq!(plan.create, vec![FieldName::from("zeta"), FieldName::from("alpha")]);
    }

    #[test]
    fn reconcile_scenario_delete_update_create() {
        let mut registry = MockFieldRegistry::new();
        registry
            .expect_field_names()
            .returning(|| Ok(names(&["a", "b"])));
        registry
            .expect_field_value()
            .with(eq(FieldName::from("b")))
            .returning(|_| Some("0".to_string()));
        registry
            .expect_set_field_value()
            .withf(|name, value| name.as_str() == "b" && value == "1")
            .times(1)
            .returning(|_, _| Ok(()));
        registry
            .expect_add_field()
            .withf(|spec| {
                spec.name.as_str() == "c"
                    && spec.default_value.as_deref() == Some("2")
                    && spec.direction == FieldDirection::Output
                    && spec.tooltip == "Asset attribute: c"
            })
            .times(1)
            .returning(|_| Ok(()));
        registry
            .expect_is_connected()
            .with(eq(FieldName::from("a")))
            .returning(|_| Ok(false));
        registry
            .expect_remove_field()
            .with(eq(FieldName::from("a")))
            .times(1)
            .returning(|_| Ok(()));

        let mut sink = MockChangeSink::new();
        sink.expect_field_changed().times(2).return_const(());

        let desired = AttributeMap::new().with("b", "1").with("c", "2");
        let report = Reconciler::display("Asset")
            .reconcile(&mut registry, &mut sink, &desired)
            .unwrap();

        assert_eq!(report.deleted, vec![FieldName::from("a")]);
        assert_eq!(report.updated, vec![FieldName::from("b")]);
        assert_eq!(report.created, vec![FieldName::from("c")]);
        assert_eq!(report.mutation_count(), 3);
    }

    #[test]
    fn connected_field_survives_empty_result() {
        let mut registry = MockFieldRegistry::new();
        registry.expect_field_names().returning(|| Ok(names(&["a"])));
        registry.expect_is_connected().returning(|_| Ok(true));
        registry.expect_remove_field().never();

        let report = Reconciler::display("Asset")
            .reconcile(&mut registry, &mut NullSink, &AttributeMap::new())
            .unwrap();

        assert_eq!(report.preserved, vec![FieldName::from("a")]);
        assert!(report.deleted.is_empty());
    }

    #[test]
    fn connectivity_error_preserves_and_continues() {
        let mut registry = MockFieldRegistry::new();
        registry
            .expect_field_names()
            .returning(|| Ok(names(&["broken", "loose"])));
        registry
            .expect_is_connected()
            .with(eq(FieldName::from("broken")))
            .returning(|_| Err(RegistryError::Unavailable("timeout".into())));
        registry
            .expect_is_connected()
            .with(eq(FieldName::from("loose")))
            .returning(|_| Ok(false));
        registry
            .expect_remove_field()
            .with(eq(FieldName::from("loose")))
            .times(1)
            .returning(|_| Ok(()));

        let report = Reconciler::display("Asset")
            .reconcile(&mut registry, &mut NullSink, &AttributeMap::new())
            .unwrap();

        assert_eq!(report.preserved, vec![FieldName::from("broken")]);
        assert_eq!(report.deleted, vec![FieldName::from("loose")]);
    }

    #[test]
    fn unchanged_value_is_skipped() {
        let mut registry = MockFieldRegistry::new();
        registry.expect_field_names().returning(|| Ok(names(&["code"])));
        registry
            .expect_field_value()
            .returning(|_| Some("hero".to_string()));
        registry.expect_set_field_value().never();

        let mut sink = MockChangeSink::new();
        sink.expect_field_changed().never();

        let desired = AttributeMap::new().with("code", "hero");
        let report = Reconciler::display("Asset")
            .reconcile(&mut registry, &mut sink, &desired)
            .unwrap();

        assert_eq!(report.unchanged, vec![FieldName::from("code")]);
        assert_eq!(report.mutation_count(), 0);
    }

    #[test]
    fn null_matches_empty_value() {
        let mut registry = MockFieldRegistry::new();
        registry.expect_field_names().returning(|| Ok(names(&["image"])));
        registry.expect_field_value().returning(|_| None);
        registry.expect_set_field_value().never();

        let desired = AttributeMap::new().with("image", AttributeValue::Null);
        let report = Reconciler::display("Asset")
            .reconcile(&mut registry, &mut NullSink, &desired)
            .unwrap();

        assert_eq!(report.unchanged.len(), 1);
    }

    #[test]
    fn failed_create_does_not_stop_others() {
        let mut registry = MockFieldRegistry::new();
        registry.expect_field_names().returning(|| Ok(BTreeSet::new()));
        registry
            .expect_add_field()
            .withf(|spec| spec.name.as_str() == "bad")
            .returning(|spec| Err(RegistryError::rejected("add", spec.name, "reserved")));
        registry
            .expect_add_field()
            .withf(|spec| spec.name.as_str() == "good")
            .returning(|_| Ok(()));

        let desired = AttributeMap::new().with("bad", "x").with("good", "y");
        let report = Reconciler::display("Asset")
            .reconcile(&mut registry, &mut NullSink, &desired)
            .unwrap();

        assert_eq!(report.created, vec![FieldName::from("good")]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].action, FieldAction::Create);
        assert!(!report.is_clean());
    }

    #[test]
    fn listing_failure_changes_nothing() {
        let mut registry = MockFieldRegistry::new();
        registry
            .expect_field_names()
            .returning(|| Err(RegistryError::Unavailable("host busy".into())));
        registry.expect_add_field().never();
        registry.expect_remove_field().never();

        let result = Reconciler::display("Asset").reconcile(
            &mut registry,
            &mut NullSink,
            &AttributeMap::new().with("code", "hero"),
        );

        assert!(matches!(result, Err(ReconcileError::ListFields(_))));
    }

    #[test]
    fn edit_mode_creates_inputs_with_placeholder() {
        let mut registry = MockFieldRegistry::new();
        registry.expect_field_names().returning(|| Ok(BTreeSet::new()));
        registry
            .expect_add_field()
            .withf(|spec| {
                spec.name.as_str() == "description"
                    && spec.direction == FieldDirection::Input
                    && spec.default_value.is_none()
                    && spec.placeholder.as_deref() == Some("old text")
                    && spec.tooltip == "Update description (leave empty to keep current value)"
            })
            .times(1)
            .returning(|_| Ok(()));

        let attrs = AttributeMap::new()
            .with("id", 7)
            .with("description", "old text")
            .with("updated_at", "2024-01-01");
        let report = Reconciler::edit("Task")
            .reconcile(&mut registry, &mut NullSink, &attrs)
            .unwrap();

        assert_eq!(report.created, vec![FieldName::from("description")]);
    }

    #[test]
    fn edit_mode_refreshes_placeholder_not_value() {
        let mut registry = MockFieldRegistry::new();
        registry
            .expect_field_names()
            .returning(|| Ok(names(&["description"])));
        registry
            .expect_field_placeholder()
            .returning(|_| Some("old".to_string()));
        registry.expect_set_field_value().never();
        registry
            .expect_set_field_placeholder()
            .withf(|_, placeholder| placeholder == "new")
            .times(1)
            .returning(|_, _| Ok(()));

        let attrs = AttributeMap::new().with("description", "new");
        let report = Reconciler::edit("Task")
            .reconcile(&mut registry, &mut NullSink, &attrs)
            .unwrap();

        assert_eq!(report.updated, vec![FieldName::from("description")]);
    }

    #[test]
    fn collect_edits_skips_empty_and_static() {
        let mut registry = MockFieldRegistry::new();
        registry
            .expect_field_names()
            .returning(|| Ok(names(&["entity_id", "code", "description"])));
        registry.expect_field_value().returning(|name| match name.as_str() {
            "code" => Some("hero_v2".to_string()),
            "description" => Some(String::new()),
            _ => Some("99".to_string()),
        });

        let edits = Reconciler::edit("Asset")
            .with_static(["entity_id"])
            .collect_edits(&registry)
            .unwrap();

        assert_eq!(edits.len(), 1);
        assert_eq!(edits.text("code"), Some("hero_v2"));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ReconcilerOptions =
            serde_json::from_str(r#"{"mode":"edit","static_fields":["entity_id"]}"#).unwrap();
        assert_eq!(options.mode, ReconcileMode::Edit);
        assert_eq!(options.subject, "Entity");
        assert!(options.static_fields.contains("entity_id"));
    }
}

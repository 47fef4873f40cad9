//! Reconciliation and selection properties over random field sets

use flow_fields::{
    resolve_selection, AttributeMap, AttributeValue, LabelMarker, NullSink,
    Reconciler, Selection, Sentinel,
};
use flow_test_utils::{attributes, MemoryRegistry, RecordingSink};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;

const NAMES: [&str; 8] = [
    "code",
    "description",
    "sg_status_list",
    "sg_asset_type",
    "entity_id",
    "entity_url",
    "tags",
    "due_date",
];
const STATIC: [&str; 2] = ["entity_id", "entity_url"];

fn attribute_map() -> impl Strategy<Value = AttributeMap> {
    proptest::collection::btree_map(
        proptest::sample::select(NAMES.to_vec()),
        prop_oneof![
            "[a-z]{0,6}".prop_map(AttributeValue::from),
            any::<bool>().prop_map(AttributeValue::from),
            (-1000i64..1000).prop_map(AttributeValue::from),
            Just(AttributeValue::from(None::<String>)),
        ],
        0..NAMES.len(),
    )
    .prop_map(|entries| entries.into_iter().collect())
}

fn registry_with(existing: &BTreeMap<&str, String>, connected: &[&str]) -> MemoryRegistry {
    let mut registry = MemoryRegistry::new();
    for name in STATIC {
        registry.insert_output(name, "static");
    }
    for (name, value) in existing {
        if !STATIC.contains(name) {
            registry.insert_output(name, value);
        }
    }
    for name in connected {
        registry.connect(name);
    }
    registry
}

fn existing_fields() -> impl Strategy<Value = BTreeMap<&'static str, String>> {
    proptest::collection::btree_map(proptest::sample::select(NAMES.to_vec()), "[a-z]{0,4}", 0..NAMES.len())
}

proptest! {
    #[test]
    fn prop_second_pass_is_a_no_op(existing in existing_fields(), desired in attribute_map()) {
        let reconciler = Reconciler::display("Asset").with_static(STATIC);
        let mut registry = registry_with(&existing, &[]);

        reconciler.reconcile(&mut registry, &mut NullSink, &desired).unwrap();
        let calls = registry.calls;
        let second = reconciler.reconcile(&mut registry, &mut NullSink, &desired).unwrap();

        prop_assert_eq!(registry.calls.mutations(), calls.mutations());
        prop_assert_eq!(second.mutation_count(), 0);
        prop_assert!(second.failures.is_empty());
    }

    #[test]
    fn prop_static_fields_never_change(existing in existing_fields(), desired in attribute_map()) {
        let reconciler = Reconciler::display("Asset").with_static(STATIC);
        let mut registry = registry_with(&existing, &[]);

        reconciler.reconcile(&mut registry, &mut NullSink, &desired).unwrap();

        for name in STATIC {
            prop_assert_eq!(registry.value(name), Some("static"));
        }
    }

    #[test]
    fn prop_every_desired_attribute_is_exposed(existing in existing_fields(), desired in attribute_map()) {
        let reconciler = Reconciler::display("Asset").with_static(STATIC);
        let mut registry = registry_with(&existing, &[]);

        reconciler.reconcile(&mut registry, &mut NullSink, &desired).unwrap();

        for (name, value) in desired.iter().filter(|(n, _)| !STATIC.contains(n)) {
            let expected = value.normalized();
            prop_assert_eq!(registry.value(name), Some(expected.as_str()));
        }
        for name in registry.names() {
            prop_assert!(STATIC.contains(&name.as_str()) || desired.contains(&name));
        }
    }

    #[test]
    fn prop_connected_fields_survive(
        existing in existing_fields(),
        desired in attribute_map(),
        wired in proptest::sample::subsequence(NAMES.to_vec(), 0..4),
    ) {
        let reconciler = Reconciler::display("Asset").with_static(STATIC);
        let mut registry = registry_with(&existing, &wired);

        reconciler.reconcile(&mut registry, &mut NullSink, &desired).unwrap();

        for name in existing.keys().filter(|n| wired.contains(*n)) {
            prop_assert!(registry.has(name));
        }
    }

    #[test]
    fn prop_selection_is_offered_or_sentinel(
        labels in proptest::collection::vec("[A-C][a-c]{0,2}", 0..5),
        previous in proptest::option::of("[A-C][a-c]{0,2}"),
    ) {
        let previous = previous.map_or(Selection::Sentinel(Sentinel::Unloaded), Selection::Label);
        let empty = Sentinel::Empty("assets".into());
        let got = resolve_selection(&labels, &previous, &[], empty.clone());

        match &got {
            Selection::Label(label) => prop_assert!(labels.contains(label)),
            Selection::Sentinel(sentinel) => {
                prop_assert!(labels.is_empty());
                prop_assert_eq!(sentinel, &empty);
            }
        }
        if let Some(label) = previous.as_label().filter(|l| labels.iter().any(|n| n == l)) {
            prop_assert_eq!(got.as_label(), Some(label));
        }
    }
}

#[test]
fn empty_result_clears_unwired_fields_only() {
    let reconciler = Reconciler::display("Asset").with_static(STATIC);
    let mut existing = BTreeMap::new();
    existing.insert("code", "hero".to_string());
    existing.insert("tags", "a".to_string());
    let mut registry = registry_with(&existing, &["tags"]);

    let report = reconciler
        .reconcile(&mut registry, &mut NullSink, &AttributeMap::new())
        .unwrap();

    assert_eq!(report.deleted.len(), 1);
    assert_eq!(report.preserved.len(), 1);
    assert_eq!(registry.names(), vec!["entity_id", "entity_url", "tags"]);
}

#[test]
fn unknown_connectivity_keeps_the_field() {
    let reconciler = Reconciler::display("Asset");
    let mut registry = MemoryRegistry::with_outputs(&[("code", "hero")]);
    registry.fail_connectivity("code");

    let report = reconciler
        .reconcile(&mut registry, &mut NullSink, &AttributeMap::new())
        .unwrap();

    assert!(registry.has("code"));
    assert_eq!(report.preserved.len(), 1);
}

#[test]
fn one_rejected_write_does_not_stop_the_rest() {
    let reconciler = Reconciler::display("Asset");
    let mut registry = MemoryRegistry::with_outputs(&[("code", "old"), ("stale", "x")]);
    registry.reject("set_value", "code");
    let mut sink = RecordingSink::new();

    let report = reconciler
        .reconcile(
            &mut registry,
            &mut sink,
            &attributes(&[("code", "new"), ("sg_status_list", "ip")]),
        )
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].field.as_str(), "code");
    assert_eq!(registry.value("code"), Some("old"));
    assert_eq!(registry.value("sg_status_list"), Some("ip"));
    assert!(!registry.has("stale"));
    assert_eq!(sink.names(), vec!["sg_status_list"]);
}

#[test]
fn listing_failure_touches_nothing() {
    let reconciler = Reconciler::display("Asset");
    let mut registry = MemoryRegistry::with_outputs(&[("code", "hero")]);
    registry.fail_listing();

    assert!(reconciler
        .reconcile(&mut registry, &mut NullSink, &attributes(&[("code", "villain")]))
        .is_err());
    assert_eq!(registry.calls.mutations(), 0);
}

#[test]
fn edit_mode_compares_placeholders() {
    let reconciler = Reconciler::edit("Asset");
    let mut registry = MemoryRegistry::new();
    registry.insert_input("code", "typed", "hero");

    let report = reconciler
        .reconcile(
            &mut registry,
            &mut NullSink,
            &attributes(&[("code", "hero"), ("id", "12")]),
        )
        .unwrap();

    assert_eq!(report.unchanged.len(), 1);
    assert!(!registry.has("id"));
    assert_eq!(
        reconciler.collect_edits(&registry).unwrap().text("code"),
        Some("typed")
    );
}

#[test]
fn template_marker_survives_reload() {
    let labels = vec!["Alpha".to_string(), "📋 Beta (Template)".to_string()];
    let got = resolve_selection(
        &labels,
        &Selection::Label("Beta".into()),
        &[LabelMarker::template()],
        Sentinel::Empty("projects".into()),
    );
    assert_eq!(got, Selection::Label("📋 Beta (Template)".into()));
}

#[test]
fn marked_selection_is_not_taken_by_a_namesake() {
    let labels = vec!["Alpha".to_string(), "📋 Alpha (Template)".to_string()];
    let got = resolve_selection(
        &labels,
        &Selection::Label("📋 Alpha (Template)".into()),
        &[LabelMarker::template()],
        Sentinel::Empty("projects".into()),
    );
    assert_eq!(got, Selection::Label("📋 Alpha (Template)".into()));
}

//! End-to-end node behavior against in-memory host doubles

use flow_fields::{AttributeMap, FieldDirection, FieldName, ReconcileError, Selection, Sentinel};
use flow_nodes::{
    EntityEditNode, EntityInfoNode, EntitySelector, EntityType, FlowConfig, InfoRequest,
    ListFilter, ListNode, ListingKind, NodeError, Record, SourceError, TaskCreateNode,
    TaskRequest, TemplateFilter, UploadBackend, UploadError, UploadJob, UploadRequest,
    UploadTicket, HOST_CONTROL_FIELDS, INFO_INPUTS, INFO_OUTPUTS, TASK_OUTPUTS,
};
use flow_test_utils::{
    asset, project, step, task, user, MemoryRegistry, RecordingProgress, RecordingSink,
    StaticSource,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn config() -> FlowConfig {
    FlowConfig::new("https://studio.example.com/api/v1", "0123456789abcdef")
}

fn names(list: &[&str]) -> Vec<FieldName> {
    list.iter().map(|n| FieldName::from(*n)).collect()
}

fn info_registry() -> MemoryRegistry {
    let mut registry = MemoryRegistry::new();
    for name in INFO_INPUTS.iter().chain(&INFO_OUTPUTS).chain(&HOST_CONTROL_FIELDS) {
        registry.insert_output(name, "");
    }
    registry
}

fn edit_registry() -> MemoryRegistry {
    MemoryRegistry::with_outputs(&[
        ("entity_url", ""),
        ("updated_entity", ""),
        ("entity_type", ""),
        ("entity_id", ""),
        ("exec_in", ""),
        ("exec_out", ""),
    ])
}

#[test]
fn info_refresh_exposes_attributes_and_fixed_outputs() {
    let source = StaticSource::new(vec![asset(12, "hero", "Character")]);
    let node = EntityInfoNode::new(config());
    let mut registry = info_registry();
    let mut sink = RecordingSink::new();

    let outcome = node
        .refresh(&InfoRequest::new(EntityType::Asset, 12), &source, &mut registry, &mut sink)
        .unwrap();

    assert_eq!(outcome.entity_type, EntityType::Asset);
    assert_eq!(
        outcome.report.created.len(),
        4,
        "code, sg_asset_type, sg_status_list, description"
    );
    assert_eq!(registry.value("code"), Some("hero"));
    assert_eq!(registry.value("entity_name"), Some("hero"));
    assert_eq!(registry.value("entity_id_output"), Some("12"));
    assert_eq!(
        registry.value("entity_url"),
        Some("https://studio.example.com/detail/Asset/12")
    );
    assert_eq!(
        registry.field("code").unwrap().tooltip,
        "Entity attribute: code"
    );

    let data: Value = serde_json::from_str(registry.value("entity_data").unwrap()).unwrap();
    assert_eq!(data["code"], json!("hero"));
    assert_eq!(data["attributes"]["sg_asset_type"], json!("Character"));
}

#[test]
fn info_refresh_follows_changing_record_shape() {
    let source = StaticSource::new(vec![asset(12, "hero", "Character")]);
    let node = EntityInfoNode::new(config());
    let mut registry = info_registry();
    let mut sink = RecordingSink::new();
    let request = InfoRequest::new(EntityType::Asset, 12);

    node.refresh(&request, &source, &mut registry, &mut sink).unwrap();
    registry.connect("description");

    source.replace(vec![Record::new(
        "Asset",
        12,
        AttributeMap::new()
            .with("code", "hero_v2")
            .with("sg_version_number", 3),
    )]);
    let report = node
        .refresh(&request, &source, &mut registry, &mut sink)
        .unwrap()
        .report;

    assert_eq!(report.updated, names(&["code"]));
    assert_eq!(report.created, names(&["sg_version_number"]));
    assert_eq!(report.deleted, names(&["sg_asset_type", "sg_status_list"]));
    assert_eq!(report.preserved, names(&["description"]));
    assert!(registry.has("description"));
    assert_eq!(registry.value("sg_version_number"), Some("3"));
    assert_eq!(sink.last("code"), Some("hero_v2"));
}

#[test]
fn info_refresh_is_idempotent() {
    let source = StaticSource::new(vec![asset(12, "hero", "Character")]);
    let node = EntityInfoNode::new(config());
    let mut registry = info_registry();
    let request = InfoRequest::new(EntityType::Asset, 12);

    node.refresh(&request, &source, &mut registry, &mut RecordingSink::new())
        .unwrap();
    let second = node
        .refresh(&request, &source, &mut registry, &mut RecordingSink::new())
        .unwrap();

    assert_eq!(second.report.mutation_count(), 0);
    assert_eq!(second.report.unchanged.len(), 4);
}

#[test]
fn info_refresh_leaves_fields_alone_when_listing_fails() {
    let source = StaticSource::new(vec![asset(12, "hero", "Character")]);
    let node = EntityInfoNode::new(config());
    let mut registry = info_registry();
    registry.fail_listing();
    let mut sink = RecordingSink::new();

    let err = node
        .refresh(&InfoRequest::new(EntityType::Asset, 12), &source, &mut registry, &mut sink)
        .unwrap_err();

    assert!(matches!(err, NodeError::Reconcile(ReconcileError::ListFields(_))));
    assert_eq!(registry.calls.mutations(), 0);
    assert!(sink.events.is_empty());
}

#[test]
fn info_refresh_detects_unknown_type() {
    let source = StaticSource::new(vec![task(40, "Model", 12)]);
    let node = EntityInfoNode::new(config());
    let mut registry = info_registry();
    let mut sink = RecordingSink::new();

    let outcome = node
        .refresh(&InfoRequest::detect(40), &source, &mut registry, &mut sink)
        .unwrap();

    assert_eq!(outcome.entity_type, EntityType::Task);
    assert_eq!(registry.value("entity_type"), Some("Task"));
    assert_eq!(sink.names().first(), Some(&"entity_type"));
}

#[test]
fn info_refresh_requires_an_id() {
    let source = StaticSource::new(Vec::new());
    let node = EntityInfoNode::new(config());
    let request = InfoRequest {
        target: EntitySelector::Known(EntityType::Shot),
        ..InfoRequest::default()
    };

    let err = node
        .refresh(&request, &source, &mut info_registry(), &mut RecordingSink::new())
        .unwrap_err();
    assert!(matches!(err, NodeError::MissingEntityId));
}

#[test]
fn edit_load_exposes_empty_inputs_with_placeholders() {
    let source = StaticSource::new(vec![asset(12, "hero", "Character")]);
    let node = EntityEditNode::new(config());
    let mut registry = edit_registry();
    let mut sink = RecordingSink::new();

    node.load(EntitySelector::Known(EntityType::Asset), Some(12), &source, &mut registry, &mut sink)
        .unwrap();

    let code = registry.field("code").unwrap();
    assert_eq!(code.direction, FieldDirection::Input);
    assert_eq!(code.value, None);
    assert_eq!(code.placeholder.as_deref(), Some("hero"));
    assert!(!registry.has("id"));
    assert_eq!(
        registry.value("entity_url"),
        Some("https://studio.example.com/detail/Asset/12")
    );
    assert!(node.pending_update(&registry).is_none());
}

#[test]
fn edit_submit_sends_only_typed_values() {
    let source = StaticSource::new(vec![asset(12, "hero", "Character")]);
    let node = EntityEditNode::new(config());
    let mut registry = edit_registry();
    let mut sink = RecordingSink::new();

    node.load(EntitySelector::Known(EntityType::Asset), Some(12), &source, &mut registry, &mut sink)
        .unwrap();
    registry.type_into("sg_status_list", "fin");

    let updated = node
        .submit(EntityType::Asset, 12, &source, &mut registry, &mut sink)
        .unwrap()
        .unwrap();

    let updates = source.updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].2.names().into_iter().collect::<Vec<_>>(), vec!["sg_status_list"]);
    assert_eq!(updated.text("sg_status_list"), Some("fin"));

    assert_eq!(registry.value("sg_status_list"), Some(""));
    assert_eq!(registry.placeholder("sg_status_list"), Some("fin"));
    let published: Value = serde_json::from_str(sink.last("updated_entity").unwrap()).unwrap();
    assert_eq!(published["attributes"]["sg_status_list"], json!("fin"));
}

#[test]
fn edit_submit_without_input_skips_the_source() {
    let source = StaticSource::new(vec![asset(12, "hero", "Character")]);
    let node = EntityEditNode::new(config());
    let mut registry = edit_registry();
    let mut sink = RecordingSink::new();

    node.load(EntitySelector::Known(EntityType::Asset), Some(12), &source, &mut registry, &mut sink)
        .unwrap();

    let result = node
        .submit(EntityType::Asset, 12, &source, &mut registry, &mut sink)
        .unwrap();
    assert!(result.is_none());
    assert!(source.updates.borrow().is_empty());
}

#[test]
fn project_list_hides_templates_by_default() {
    let source = StaticSource::new(vec![
        project(1, "Alpha", false),
        project(2, "Studio Template", true),
        project(3, "Beta", false),
    ]);
    let mut sink = RecordingSink::new();

    let mut node = ListNode::new(ListingKind::Projects);
    node.reload(&source, &mut sink).unwrap();
    assert_eq!(node.selector().choices().labels(), vec!["Alpha", "Beta"]);

    let mut with_templates = ListNode::new(ListingKind::Projects)
        .with_filter(ListFilter::default().with_templates(TemplateFilter::Include));
    with_templates.reload(&source, &mut sink).unwrap();
    assert_eq!(
        with_templates.selector().choices().labels(),
        vec!["Alpha", "📋 Studio Template (Template)", "Beta"]
    );
}

#[test]
fn template_pick_is_kept_over_namesake_project() {
    let source = StaticSource::new(vec![project(1, "Alpha", false), project(2, "Alpha", true)]);
    let mut sink = RecordingSink::new();

    let mut node = ListNode::new(ListingKind::Projects)
        .with_filter(ListFilter::default().with_templates(TemplateFilter::Include));
    node.reload(&source, &mut sink).unwrap();
    node.select("📋 Alpha (Template)", &mut sink).unwrap();
    node.reload(&source, &mut sink).unwrap();

    assert_eq!(node.selector().current_label(), "📋 Alpha (Template)");
    assert_eq!(sink.last("selected_project_id"), Some("2"));
}

#[test]
fn restored_selection_survives_reload() {
    let source = StaticSource::new(vec![user(1, "Ana", "ana@example.com"), user(2, "Ben", "ben@example.com")]);
    let mut sink = RecordingSink::new();

    let mut node = ListNode::new(ListingKind::Users);
    node.restore("Ben");
    node.reload(&source, &mut sink).unwrap();

    assert_eq!(node.selector().current_label(), "Ben");
    assert_eq!(sink.last("selected_user_id"), Some("2"));
    assert_eq!(
        node.selector().selected().unwrap().hint.as_ref().unwrap().subtitle.as_deref(),
        Some("ben@example.com")
    );
}

#[test]
fn vanished_selection_falls_back_to_first() {
    let source = StaticSource::new(vec![asset(1, "hero", "Character"), asset(2, "tree", "Prop")]);
    let mut sink = RecordingSink::new();

    let mut node = ListNode::new(ListingKind::Assets);
    node.reload(&source, &mut sink).unwrap();
    node.select("tree", &mut sink).unwrap();

    source.replace(vec![asset(1, "hero", "Character")]);
    node.reload(&source, &mut sink).unwrap();
    assert_eq!(node.selector().current_label(), "hero");
    assert_eq!(sink.last("selected_asset_id"), Some("1"));
}

#[test]
fn offline_listing_shows_failure_sentinel() {
    let source = StaticSource::offline();
    let mut sink = RecordingSink::new();

    let mut node = ListNode::new(ListingKind::Assets);
    assert!(node.reload(&source, &mut sink).is_err());
    assert_eq!(
        node.selector().selection(),
        &Selection::Sentinel(Sentinel::Failed("assets".into()))
    );
    assert_eq!(node.selector().options(), vec!["Failed to load assets".to_string()]);
}

#[derive(Default)]
struct FakeBackend {
    transferred: Vec<u8>,
    version_payload: Option<Value>,
}

impl UploadBackend for FakeBackend {
    fn request_upload(
        &mut self,
        _entity_type: EntityType,
        _entity_id: i64,
        file_name: &str,
    ) -> Result<UploadTicket, SourceError> {
        Ok(UploadTicket {
            upload_link: format!("https://uploads.example.com/{file_name}"),
            info: json!({"token": "t-1"}),
        })
    }

    fn transfer(&mut self, _ticket: &UploadTicket, _content_type: &str, bytes: &[u8]) -> Result<(), SourceError> {
        self.transferred = bytes.to_vec();
        Ok(())
    }

    fn complete_upload(
        &mut self,
        _entity_type: EntityType,
        _entity_id: i64,
        _ticket: &UploadTicket,
        _file_name: &str,
    ) -> Result<(), SourceError> {
        Ok(())
    }

    fn create_version(&mut self, payload: &Value) -> Result<Record, SourceError> {
        self.version_payload = Some(payload.clone());
        Ok(Record::new("Version", 900, AttributeMap::new()))
    }
}

#[test]
fn upload_from_workspace_url_reports_every_stage() {
    let workspace = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(workspace.path().join("renders")).unwrap();
    std::fs::write(workspace.path().join("renders/shot.mov"), b"frames").unwrap();

    let source = StaticSource::new(vec![Record::new("Shot", 55, AttributeMap::new())]);
    let request = UploadRequest {
        entity_id: Some(55),
        file_input: "http://localhost:8000/workspace/renders/./shot.mov?v=2".into(),
        ..UploadRequest::default()
    };
    let mut backend = FakeBackend::default();
    let mut progress = RecordingProgress::default();

    let outcome = UploadJob::new(request, config(), workspace.path())
        .run(&source, &mut backend, &mut progress)
        .unwrap();

    assert_eq!(outcome.entity_type, EntityType::Shot);
    assert_eq!(outcome.version_id, 900);
    assert_eq!(outcome.file_name, "shot.mov");
    assert_eq!(outcome.file_size, 6);
    assert_eq!(backend.transferred, b"frames");
    assert_eq!(
        backend.version_payload.unwrap()["description"],
        json!("Uploaded file: shot.mov")
    );
    assert_eq!(progress.events.len(), 10);
    assert_eq!(progress.events.last().map(String::as_str), Some("done 5/5 finalize"));
}

#[test]
fn upload_of_remote_file_stops_at_read() {
    let source = StaticSource::new(Vec::new());
    let request = UploadRequest {
        target: EntitySelector::Known(EntityType::Asset),
        entity_id: Some(1),
        file_input: "https://cdn.example.com/a.png".into(),
        ..UploadRequest::default()
    };
    let mut progress = RecordingProgress::default();

    let err = UploadJob::new(request, config(), "/tmp")
        .run(&source, &mut FakeBackend::default(), &mut progress)
        .unwrap_err();

    assert!(matches!(err, UploadError::Path(_)));
    assert!(progress.events.last().unwrap().starts_with("fail 2/5 read"));
}

fn task_registry() -> MemoryRegistry {
    let mut registry = MemoryRegistry::new();
    for name in TASK_OUTPUTS {
        registry.insert_output(name, "");
    }
    registry
}

#[test]
fn task_create_links_picked_step_and_assignee() {
    let source = StaticSource::new(vec![
        asset(12, "hero", "Character"),
        step(4, "Model", "MOD"),
        step(5, "Rig", "RIG"),
        user(7, "Ana", "ana@example.com"),
    ]);
    let mut registry = task_registry();
    let mut sink = RecordingSink::new();

    let mut node = TaskCreateNode::new(config());
    node.reload_steps(&source, &mut sink).unwrap();
    assert_eq!(sink.last("step_id"), Some("Model (MOD)"));
    node.pick_step("Rig (RIG)", &mut sink).unwrap();
    node.reload_assignees(Some(1), &source, &mut sink).unwrap();
    assert_eq!(sink.last("assignee_id"), Some("Ana"));

    let request = TaskRequest::new(1, EntityType::Asset, 12, "Rig hero").with_status("ip");
    let task = node.create(&request, &source, &mut registry, &mut sink).unwrap();

    assert_eq!(task.id, 13);
    assert_eq!(registry.value("task_id"), Some("13"));
    assert_eq!(registry.value("task_url"), Some("https://studio.example.com/detail/Task/13"));
    assert_eq!(sink.last("task_id"), Some("13"));
    let created: Value = serde_json::from_str(registry.value("created_task").unwrap()).unwrap();
    assert_eq!(created["attributes"]["content"], json!("Rig hero"));

    let sent = source.created.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, EntityType::Task);
    let payload = sent[0].1.to_json();
    assert_eq!(payload["step"], json!({"type": "Step", "id": 5}));
    assert_eq!(payload["task_assignees"], json!([{"type": "HumanUser", "id": 7}]));
    assert_eq!(payload["entity"], json!({"type": "Asset", "id": 12}));
    assert_eq!(payload["sg_status_list"], json!("ip"));
}

#[test]
fn task_create_without_selections_omits_step_and_assignee() {
    let source = StaticSource::new(vec![asset(12, "hero", "Character")]);
    let mut registry = task_registry();
    let mut sink = RecordingSink::new();

    let mut node = TaskCreateNode::new(config());
    node.reload_steps(&source, &mut sink).unwrap();
    assert_eq!(sink.last("step_id"), Some("No steps available"));

    node.create(
        &TaskRequest::new(1, EntityType::Asset, 12, "Model hero"),
        &source,
        &mut registry,
        &mut sink,
    )
    .unwrap();

    let payload = source.created.borrow()[0].1.clone();
    assert!(!payload.contains("step"));
    assert!(!payload.contains("task_assignees"));
    assert_eq!(payload.text("sg_status_list"), Some("wtg"));
}

#[test]
fn task_create_failure_writes_no_output() {
    let source = StaticSource::offline();
    let mut registry = task_registry();
    let mut sink = RecordingSink::new();

    let node = TaskCreateNode::new(config());
    let result = node.create(
        &TaskRequest::new(1, EntityType::Shot, 40, "Anim"),
        &source,
        &mut registry,
        &mut sink,
    );

    assert!(matches!(result, Err(NodeError::Source(SourceError::Transport(_)))));
    assert_eq!(registry.calls.mutations(), 0);
    assert!(sink.events.is_empty());
}

//! Task creation node
//!
//! Creates a Task linked to a project and an entity. The pipeline step and
//! the assignee come from two selectors loaded from the source; both are
//! optional and left out of the payload while a placeholder is shown.

use super::publish_output;
use crate::config::FlowConfig;
use crate::entity::EntityType;
use crate::error::NodeError;
use crate::label::{assignee_label, step_label};
use crate::record::Record;
use crate::source::{ListQuery, RecordSource};
use flow_fields::{
    build_choices, AttributeMap, ChangeSink, FieldRegistry, Selection, SelectorField,
};
use serde_json::json;

/// Statuses a new task may start in
pub const TASK_STATUSES: [&str; 6] = ["wtg", "ip", "fin", "rev", "hld", "na"];

/// Status used when none is given
pub const DEFAULT_TASK_STATUS: &str = "wtg";

/// Output fields written after a successful create
pub const TASK_OUTPUTS: [&str; 3] = ["created_task", "task_id", "task_url"];

/// What to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub project_id: Option<i64>,
    /// Type of the entity the task is for
    pub entity_type: EntityType,
    pub entity_id: Option<i64>,
    /// Task name
    pub content: String,
    /// Initial status; empty or missing means [`DEFAULT_TASK_STATUS`]
    pub status: Option<String>,
}

impl Default for TaskRequest {
    fn default() -> Self {
        Self {
            project_id: None,
            entity_type: EntityType::Asset,
            entity_id: None,
            content: String::new(),
            status: None,
        }
    }
}

impl TaskRequest {
    /// Task `content` on an entity inside a project
    #[must_use]
    pub fn new(project_id: i64, entity_type: EntityType, entity_id: i64, content: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id),
            entity_type,
            entity_id: Some(entity_id),
            content: content.into(),
            status: None,
        }
    }

    /// With initial status
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Attributes of the Task create call
///
/// # Errors
/// Returns error if the project, the entity id or the content is missing,
/// or the status is not in [`TASK_STATUSES`]
pub fn task_payload(
    request: &TaskRequest,
    step_id: Option<i64>,
    assignee_id: Option<i64>,
) -> Result<AttributeMap, NodeError> {
    let project_id = request.project_id.ok_or(NodeError::MissingInput("project_id"))?;
    let entity_id = request.entity_id.ok_or(NodeError::MissingEntityId)?;
    let content = request.content.trim();
    if content.is_empty() {
        return Err(NodeError::MissingInput("task_content"));
    }
    let status = request
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_TASK_STATUS);
    if !TASK_STATUSES.contains(&status) {
        return Err(NodeError::UnknownStatus(status.to_string()));
    }

    let mut payload = AttributeMap::new()
        .with("content", content)
        .with("project", json!({"type": "Project", "id": project_id}))
        .with("entity", json!({"type": request.entity_type.name(), "id": entity_id}))
        .with("sg_status_list", status);
    if let Some(id) = step_id {
        payload.insert("step", json!({"type": "Step", "id": id}));
    }
    if let Some(id) = assignee_id {
        payload.insert("task_assignees", json!([{"type": "HumanUser", "id": id}]));
    }
    Ok(payload)
}

/// Task creation node with step and assignee selectors
#[derive(Debug, Clone)]
pub struct TaskCreateNode {
    config: FlowConfig,
    steps: SelectorField<Record>,
    assignees: SelectorField<Record>,
}

impl TaskCreateNode {
    /// Create node with unloaded `step_id` and `assignee_id` selectors
    #[must_use]
    pub fn new(config: FlowConfig) -> Self {
        Self {
            config,
            steps: SelectorField::new("step_id", "steps"),
            assignees: SelectorField::new("assignee_id", "users"),
        }
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &SelectorField<Record> {
        &self.steps
    }

    #[inline]
    #[must_use]
    pub fn assignees(&self) -> &SelectorField<Record> {
        &self.assignees
    }

    /// Seed both selectors from the values the host holds
    pub fn restore(&mut self, step: &str, assignee: &str) {
        self.steps.restore(step);
        self.assignees.restore(assignee);
    }

    /// Reload the step choices
    ///
    /// # Errors
    /// Returns the source error; the selector then shows the failure
    /// placeholder
    pub fn reload_steps<S, K>(&mut self, source: &S, sink: &mut K) -> Result<&Selection, NodeError>
    where
        S: RecordSource + ?Sized,
        K: ChangeSink + ?Sized,
    {
        let query = ListQuery::new(EntityType::Step);
        reload_selector(&mut self.steps, &query, step_label, source, sink)?;
        Ok(self.steps.selection())
    }

    /// Reload the assignee choices, restricted to a project's members if given
    ///
    /// # Errors
    /// Returns the source error; the selector then shows the failure
    /// placeholder
    pub fn reload_assignees<S, K>(
        &mut self,
        project_id: Option<i64>,
        source: &S,
        sink: &mut K,
    ) -> Result<&Selection, NodeError>
    where
        S: RecordSource + ?Sized,
        K: ChangeSink + ?Sized,
    {
        let mut query = ListQuery::new(EntityType::HumanUser);
        if let Some(id) = project_id {
            query = query.with_filter("projects.Project.id", id.to_string());
        }
        reload_selector(&mut self.assignees, &query, assignee_label, source, sink)?;
        Ok(self.assignees.selection())
    }

    /// User picks a step
    ///
    /// # Errors
    /// Returns error if the label is not a current choice
    pub fn pick_step<K: ChangeSink + ?Sized>(&mut self, label: &str, sink: &mut K) -> Result<(), NodeError> {
        self.steps.pick(label)?;
        self.steps.publish(sink);
        Ok(())
    }

    /// User picks an assignee
    ///
    /// # Errors
    /// Returns error if the label is not a current choice
    pub fn pick_assignee<K: ChangeSink + ?Sized>(&mut self, label: &str, sink: &mut K) -> Result<(), NodeError> {
        self.assignees.pick(label)?;
        self.assignees.publish(sink);
        Ok(())
    }

    /// Create the task and publish [`TASK_OUTPUTS`]
    ///
    /// # Errors
    /// Returns error if the request is incomplete or the source rejects it;
    /// no output is written then
    pub fn create<S, R, K>(
        &self,
        request: &TaskRequest,
        source: &S,
        registry: &mut R,
        sink: &mut K,
    ) -> Result<Record, NodeError>
    where
        S: RecordSource + ?Sized,
        R: FieldRegistry + ?Sized,
        K: ChangeSink + ?Sized,
    {
        let step_id = self.steps.selected().map(|c| c.payload.id);
        let assignee_id = self.assignees.selected().map(|c| c.payload.id);
        let payload = task_payload(request, step_id, assignee_id)?;

        tracing::info!(
            "creating task '{}' on {} {:?}",
            request.content.trim(),
            request.entity_type,
            request.entity_id
        );
        let task = source.create(EntityType::Task, &payload).map_err(|err| {
            tracing::error!("failed to create task: {}", err);
            err
        })?;

        let outputs = [
            ("created_task", task.to_json().to_string()),
            ("task_id", task.id.to_string()),
            ("task_url", self.config.detail_url("Task", task.id)),
        ];
        for (name, value) in &outputs {
            publish_output(registry, sink, name, value);
        }
        tracing::info!("created task {}", task.id);
        Ok(task)
    }
}

fn reload_selector<S, K>(
    selector: &mut SelectorField<Record>,
    query: &ListQuery,
    label_of: fn(&Record) -> String,
    source: &S,
    sink: &mut K,
) -> Result<(), NodeError>
where
    S: RecordSource + ?Sized,
    K: ChangeSink + ?Sized,
{
    match source.list(query) {
        Ok(records) => {
            selector.load_succeeded(build_choices(&records, label_of, Record::clone));
            selector.publish(sink);
            Ok(())
        }
        Err(err) => {
            tracing::warn!("could not load {}: {}", selector.kind(), err);
            selector.load_failed();
            selector.publish(sink);
            Err(err.into())
        }
    }
}

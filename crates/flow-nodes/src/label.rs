//! Per-entity choice labelling
//!
//! Each listing kind decides how a record is labelled in a selector, which
//! hint it carries, and which records are offered at all.

use crate::entity::EntityType;
use crate::record::Record;
use flow_fields::{build_choices_with_hints, primary_label, ChoiceHint, ChoiceList, LabelMarker};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Asset type filter value that disables type filtering
pub const ALL_TYPES: &str = "All Types";

/// What a list node lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Assets,
    Projects,
    Tasks,
    Users,
}

impl ListingKind {
    /// Plural noun used in placeholders ("No assets available")
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::Assets => "assets",
            Self::Projects => "projects",
            Self::Tasks => "tasks",
            Self::Users => "users",
        }
    }

    /// Singular noun used in output field names (`selected_asset_id`)
    #[must_use]
    pub fn singular(self) -> &'static str {
        match self {
            Self::Assets => "asset",
            Self::Projects => "project",
            Self::Tasks => "task",
            Self::Users => "user",
        }
    }

    /// Entity type of the listed records
    #[must_use]
    pub fn entity_type(self) -> EntityType {
        match self {
            Self::Assets => EntityType::Asset,
            Self::Projects => EntityType::Project,
            Self::Tasks => EntityType::Task,
            Self::Users => EntityType::HumanUser,
        }
    }

    /// Markers stripped before matching a previous selection
    #[must_use]
    pub fn markers(self) -> Vec<LabelMarker> {
        match self {
            Self::Projects => vec![LabelMarker::template()],
            Self::Assets | Self::Tasks | Self::Users => Vec::new(),
        }
    }
}

impl Display for ListingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

impl FromStr for ListingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "assets" | "asset" => Ok(Self::Assets),
            "projects" | "project" => Ok(Self::Projects),
            "tasks" | "task" => Ok(Self::Tasks),
            "users" | "user" => Ok(Self::Users),
            other => Err(format!("unknown listing kind: {other}")),
        }
    }
}

/// Filter applied to listed records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    /// Only records linked to this project
    pub project_id: Option<i64>,
    /// Only assets of this `sg_asset_type`
    pub asset_type: Option<String>,
    /// Template handling for projects
    pub templates: TemplateFilter,
}

impl ListFilter {
    /// Restrict to a project
    #[must_use]
    pub fn with_project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Restrict to an asset type; [`ALL_TYPES`] or empty clears the filter
    #[must_use]
    pub fn with_asset_type(mut self, asset_type: &str) -> Self {
        self.asset_type = Some(asset_type)
            .filter(|t| !t.is_empty() && *t != ALL_TYPES)
            .map(ToString::to_string);
        self
    }

    /// Set template handling
    #[must_use]
    pub fn with_templates(mut self, templates: TemplateFilter) -> Self {
        self.templates = templates;
        self
    }
}

/// Which projects to offer with respect to templates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateFilter {
    /// Hide templates
    #[default]
    Exclude,
    /// Offer templates alongside regular projects
    Include,
    /// Offer templates only
    Only,
}

impl TemplateFilter {
    /// Build from the two host toggles; "only" wins over "show"
    #[must_use]
    pub fn from_toggles(show_templates: bool, only_templates: bool) -> Self {
        match (show_templates, only_templates) {
            (_, true) => Self::Only,
            (true, false) => Self::Include,
            (false, false) => Self::Exclude,
        }
    }

    /// Check if a record with the given template status is offered
    #[must_use]
    pub fn admits(self, is_template: bool) -> bool {
        match self {
            Self::Exclude => !is_template,
            Self::Include => true,
            Self::Only => is_template,
        }
    }
}

/// Whether a project record is a template
///
/// True when `template` or `is_template` is `true`, when `sg_type` or
/// `sg_status` equals `Template`, or when name or code contains "template"
/// in any case.
#[must_use]
pub fn is_template(record: &Record) -> bool {
    let flag = |name: &str| {
        record
            .attributes
            .get(name)
            .and_then(flow_fields::AttributeValue::as_bool)
            .unwrap_or(false)
    };
    let equals_template = |name: &str| record.text(name) == Some("Template");
    let mentions_template = |name: &str| {
        record
            .text(name)
            .is_some_and(|v| v.to_lowercase().contains("template"))
    };

    flag("template")
        || flag("is_template")
        || equals_template("sg_type")
        || equals_template("sg_status")
        || mentions_template("name")
        || mentions_template("code")
}

/// Label of an asset: code, else `"Asset {id}"`
#[must_use]
pub fn asset_label(record: &Record) -> String {
    primary_label(record.text("code"), None, "Asset", record.id)
}

/// Label of a project: name, else `"Project {id}"`, template-marked
#[must_use]
pub fn project_label(record: &Record) -> String {
    let name = primary_label(None, record.text("name"), "Project", record.id);
    LabelMarker::template().apply_if(is_template(record), &name)
}

/// Label of a task: `"{content} ({step}) - {status} - {assignees}"`
#[must_use]
pub fn task_label(record: &Record) -> String {
    let content = record
        .text("content")
        .map_or_else(|| format!("Task {}", record.id), ToString::to_string);
    let step = record.relationship_name("step").unwrap_or("Unknown Step");
    let status = record.text("sg_status_list").unwrap_or("Unknown");
    let assignees = record.relationship_names("task_assignees");
    let assignees = if assignees.is_empty() {
        "Unassigned".to_string()
    } else {
        assignees.join(", ")
    };
    format!("{content} ({step}) - {status} - {assignees}")
}

/// Label of a workflow step: `"{short_name} ({code})"`, code part optional
#[must_use]
pub fn step_label(record: &Record) -> String {
    let name = primary_label(None, record.text("short_name"), "Step", record.id);
    match record.text("code").filter(|c| !c.is_empty()) {
        Some(code) => format!("{name} ({code})"),
        None => name,
    }
}

/// Label of an assignee: `"{name} ({login})"`, login part optional
#[must_use]
pub fn assignee_label(record: &Record) -> String {
    let name = primary_label(None, record.text("name"), "User", record.id);
    match record.text("login").filter(|l| !l.is_empty()) {
        Some(login) => format!("{name} ({login})"),
        None => name,
    }
}

/// Label of a user: name, else login, else `"User {id}"`
#[must_use]
pub fn user_label(record: &Record) -> String {
    record
        .text("name")
        .or_else(|| record.text("login"))
        .map_or_else(|| format!("User {}", record.id), ToString::to_string)
}

fn asset_hint(record: &Record) -> Option<ChoiceHint> {
    let icon = record
        .text("sg_thumbnail")
        .or_else(|| record.text("image"))
        .map(ToString::to_string);
    Some(ChoiceHint::subtitle(record.text("sg_asset_type").unwrap_or("Unknown")).with_icon(icon))
}

fn project_hint(record: &Record) -> Option<ChoiceHint> {
    let icon = record
        .text("sg_thumbnail")
        .or_else(|| record.text("image"))
        .map(ToString::to_string);
    let hint = if is_template(record) {
        ChoiceHint::subtitle("(Template)")
    } else {
        ChoiceHint::default()
    };
    Some(hint.with_icon(icon)).filter(|h| h.icon.is_some() || h.subtitle.is_some())
}

fn user_hint(record: &Record) -> Option<ChoiceHint> {
    record.text("email").map(ChoiceHint::subtitle)
}

/// Filter records and build the choices of one listing kind
#[must_use]
pub fn listing_choices(kind: ListingKind, records: &[Record], filter: &ListFilter) -> ChoiceList<Record> {
    let offered: Vec<Record> = records
        .iter()
        .filter(|r| admits(kind, r, filter))
        .cloned()
        .collect();

    let payload = |r: &Record| r.clone();
    match kind {
        ListingKind::Assets => build_choices_with_hints(&offered, asset_label, payload, asset_hint),
        ListingKind::Projects => {
            build_choices_with_hints(&offered, project_label, payload, project_hint)
        }
        ListingKind::Tasks => build_choices_with_hints(&offered, task_label, payload, |_| None),
        ListingKind::Users => build_choices_with_hints(&offered, user_label, payload, user_hint),
    }
}

fn admits(kind: ListingKind, record: &Record, filter: &ListFilter) -> bool {
    match kind {
        ListingKind::Assets => {
            let in_project = filter
                .project_id
                .map_or(true, |id| record.relationship_id("project") == Some(id));
            let of_type = filter
                .asset_type
                .as_deref()
                .map_or(true, |t| record.text("sg_asset_type") == Some(t));
            in_project && of_type
        }
        ListingKind::Projects => filter.templates.admits(is_template(record)),
        ListingKind::Tasks | ListingKind::Users => true,
    }
}

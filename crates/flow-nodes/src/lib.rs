//! Flow Nodes
//!
//! Node adapters for a production-tracking REST service, built on
//! [`flow_fields`].
//!
//! # Core Concepts
//!
//! - [`Record`]: one decoded entity resource
//! - [`RecordSource`]: blocking access to the remote service
//! - [`ListNode`]: selector over assets, projects, tasks or users
//! - [`EntityInfoNode`]: exposes a record's attributes as outputs
//! - [`EntityEditNode`]: exposes a record's attributes as editable inputs
//! - [`TaskCreateNode`]: creates a task with a picked step and assignee
//! - [`UploadJob`]: staged media upload creating a version
//!
//! # Example
//!
//! ```rust,ignore
//! use flow_nodes::{EntityInfoNode, FlowConfig, InfoRequest};
//!
//! let config = FlowConfig::load(None)?;
//! let node = EntityInfoNode::new(config.shotgrid);
//! let outcome = node.refresh(&InfoRequest::detect(1234), &source, &mut registry, &mut sink)?;
//! println!("{} dynamic fields changed", outcome.report.mutation_count());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod entity;
mod error;
mod file_path;
mod label;
mod node;
mod progress;
mod record;
mod source;
mod upload;

pub use config::{
    ConfigFile, FlowConfig, DEFAULT_SCRIPT_NAME, ENV_API_KEY, ENV_SCRIPT_NAME, ENV_URL,
};
pub use entity::{EntitySelector, EntityType, COMMON_FIELDS, DETECTION_ORDER};
pub use error::{ConfigError, NodeError, PathError, RecordError, SourceError, UploadError};
pub use file_path::{guess_content_type, resolve_file_input, FileInfo, FileLocation};
pub use label::{
    asset_label, assignee_label, is_template, listing_choices, project_label, step_label,
    task_label, user_label, ListFilter, ListingKind, TemplateFilter, ALL_TYPES,
};
pub use node::{
    entity_summary, task_payload, EntityEditNode, EntityInfoNode, InfoOutcome, InfoRequest,
    ListNode, TaskCreateNode, TaskRequest, DEFAULT_TASK_STATUS, EDIT_STATIC_FIELDS,
    HOST_CONTROL_FIELDS, INFO_INPUTS, INFO_OUTPUTS, TASK_OUTPUTS, TASK_STATUSES,
};
pub use progress::{NoProgress, ProgressSink, StageError, StagedRun};
pub use record::{parse_collection, parse_collection_value, parse_single, Record};
pub use source::{detect_entity_type, ListQuery, RecordSource};
pub use upload::{
    version_payload, UploadBackend, UploadJob, UploadOutcome, UploadRequest, UploadTicket,
    UPLOAD_STAGES,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

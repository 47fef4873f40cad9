//! File upload as a Version
//!
//! Five stages: validate, read, prepare, upload, finalize. The HTTP side is
//! behind [`UploadBackend`].

use crate::config::FlowConfig;
use crate::entity::{EntitySelector, EntityType};
use crate::error::{SourceError, UploadError};
use crate::file_path::{guess_content_type, resolve_file_input, FileInfo};
use crate::progress::{ProgressSink, StagedRun};
use crate::record::Record;
use crate::source::{detect_entity_type, RecordSource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Stage names in execution order
pub const UPLOAD_STAGES: [&str; 5] = ["validate", "read", "prepare", "upload", "finalize"];

/// Upload slot handed out by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTicket {
    /// Pre-signed URL the bytes are sent to
    pub upload_link: String,
    /// Opaque server data echoed back on completion
    pub info: Value,
}

/// Server side of an upload
#[cfg_attr(test, mockall::automock)]
pub trait UploadBackend {
    /// Ask for an upload slot on a record
    ///
    /// # Errors
    /// Returns error if the server refuses
    fn request_upload(
        &mut self,
        entity_type: EntityType,
        entity_id: i64,
        file_name: &str,
    ) -> Result<UploadTicket, SourceError>;

    /// Send the file bytes
    ///
    /// # Errors
    /// Returns error if the transfer fails
    fn transfer(
        &mut self,
        ticket: &UploadTicket,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<(), SourceError>;

    /// Confirm a finished transfer
    ///
    /// # Errors
    /// Returns error if the server rejects the completion
    fn complete_upload(
        &mut self,
        entity_type: EntityType,
        entity_id: i64,
        ticket: &UploadTicket,
        file_name: &str,
    ) -> Result<(), SourceError>;

    /// Create the Version record
    ///
    /// # Errors
    /// Returns error if creation fails
    fn create_version(&mut self, payload: &Value) -> Result<Record, SourceError>;
}

/// What to upload where
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRequest {
    /// Target type; unknown triggers detection
    pub target: EntitySelector,
    /// Target record id
    pub entity_id: Option<i64>,
    /// Local path or workspace URL
    pub file_input: String,
    /// Name to upload under; defaults to the file's own name
    pub file_name: Option<String>,
    /// Version description
    pub description: Option<String>,
}

/// Result of a finished upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub version_id: i64,
    pub version_url: String,
    pub file_name: String,
    pub file_size: u64,
}

/// Body of the Version create call
#[must_use]
pub fn version_payload(
    file_name: &str,
    description: Option<&str>,
    entity_type: EntityType,
    entity_id: i64,
) -> Value {
    let description = description
        .filter(|d| !d.is_empty())
        .map_or_else(|| format!("Uploaded file: {file_name}"), ToString::to_string);
    json!({
        "code": file_name,
        "description": description,
        "entity": {"type": entity_type.name(), "id": entity_id},
        "sg_path_to_frames": file_name,
    })
}

#[derive(Debug, Default)]
struct UploadState {
    entity_type: Option<EntityType>,
    entity_id: i64,
    path: PathBuf,
    bytes: Vec<u8>,
    original_name: String,
    content_type: &'static str,
    final_name: String,
    version: Option<Record>,
    outcome: Option<UploadOutcome>,
}

/// One configured upload
#[derive(Debug, Clone)]
pub struct UploadJob {
    request: UploadRequest,
    config: FlowConfig,
    workspace: PathBuf,
}

impl UploadJob {
    /// Create job; workspace URLs resolve below `workspace`
    #[must_use]
    pub fn new(request: UploadRequest, config: FlowConfig, workspace: impl Into<PathBuf>) -> Self {
        Self {
            request,
            config,
            workspace: workspace.into(),
        }
    }

    /// Run all stages
    ///
    /// # Errors
    /// Returns the error of the first failing stage
    pub fn run<S, B, P>(
        &self,
        source: &S,
        backend: &mut B,
        progress: &mut P,
    ) -> Result<UploadOutcome, UploadError>
    where
        S: RecordSource + ?Sized,
        B: UploadBackend + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let request = &self.request;
        let workspace = self.workspace.as_path();
        let config = &self.config;
        let mut state = UploadState::default();

        StagedRun::<UploadState, UploadError>::new()
            .stage(UPLOAD_STAGES[0], move |state: &mut UploadState| {
                let id = request.entity_id.ok_or(UploadError::MissingEntityId)?;
                let entity_type = match request.target {
                    EntitySelector::Known(t) => t,
                    EntitySelector::Unknown => detect_entity_type(source, id)?,
                };
                state.entity_id = id;
                state.entity_type = Some(entity_type);
                Ok(())
            })
            .stage(UPLOAD_STAGES[1], move |state: &mut UploadState| {
                let path = resolve_file_input(&request.file_input, workspace)?.into_local()?;
                let info = FileInfo::inspect(&path)?;
                state.bytes = std::fs::read(&path).map_err(|source| UploadError::Read {
                    path: path.clone(),
                    source,
                })?;
                state.content_type = guess_content_type(&info.file_name);
                state.original_name = info.file_name;
                state.path = path;
                Ok(())
            })
            .stage(UPLOAD_STAGES[2], move |state: &mut UploadState| {
                state.final_name = request
                    .file_name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| state.original_name.clone());
                tracing::info!(
                    "uploading {} ({} bytes, {}) from {}",
                    state.final_name,
                    state.bytes.len(),
                    state.content_type,
                    state.path.display()
                );
                Ok(())
            })
            .stage(UPLOAD_STAGES[3], move |state: &mut UploadState| {
                let entity_type = state.entity_type.ok_or(UploadError::OutOfOrder("upload"))?;
                let id = state.entity_id;
                let ticket = backend.request_upload(entity_type, id, &state.final_name)?;
                backend.transfer(&ticket, state.content_type, &state.bytes)?;
                backend.complete_upload(entity_type, id, &ticket, &state.final_name)?;
                let payload = version_payload(
                    &state.final_name,
                    request.description.as_deref(),
                    entity_type,
                    id,
                );
                state.version = Some(backend.create_version(&payload)?);
                Ok(())
            })
            .stage(UPLOAD_STAGES[4], move |state: &mut UploadState| {
                let entity_type = state.entity_type.ok_or(UploadError::OutOfOrder("finalize"))?;
                let version_id = state
                    .version
                    .as_ref()
                    .map(|v| v.id)
                    .ok_or(UploadError::OutOfOrder("finalize"))?;
                let outcome = UploadOutcome {
                    entity_type,
                    entity_id: state.entity_id,
                    version_id,
                    version_url: config.detail_url("Version", version_id),
                    file_name: state.final_name.clone(),
                    file_size: state.bytes.len() as u64,
                };
                tracing::info!(
                    "uploaded {} to {} {} as version {}",
                    outcome.file_name,
                    entity_type,
                    outcome.entity_id,
                    version_id
                );
                state.outcome = Some(outcome);
                Ok(())
            })
            .run(&mut state, progress)
            .map_err(|e| e.source)?;

        state.outcome.ok_or(UploadError::OutOfOrder("finalize"))
    }
}

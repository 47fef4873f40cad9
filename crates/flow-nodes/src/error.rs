//! Error types for the node adapters

use flow_fields::{ReconcileError, SelectionError};
use std::path::PathBuf;

/// Configuration could not be loaded or is unusable
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required keys are missing
    #[error("configuration incomplete, missing: {}", missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },

    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Base URL is not an http(s) URL
    #[error("invalid base url '{0}': expected http:// or https://")]
    InvalidUrl(String),
}

impl ConfigError {
    /// Create read error
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

/// Malformed JSON:API payload
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Body is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level `data` member missing or of the wrong shape
    #[error("expected `data` to be {expected}")]
    Envelope { expected: &'static str },

    /// Resource object is missing a member
    #[error("resource object is missing `{0}`")]
    MissingMember(&'static str),

    /// Resource id is neither an integer nor an integer string
    #[error("invalid resource id: {0}")]
    InvalidId(String),

    /// Entity type name is not known
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),
}

/// Remote record source failed
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("request failed: {0}")]
    Transport(String),

    /// Server answered with an error status
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Requested record does not exist
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: i64 },

    /// Response could not be decoded
    #[error(transparent)]
    Decode(#[from] RecordError),

    /// No probed entity type has a record with this id
    #[error("could not detect entity type for id {0}")]
    Undetected(i64),
}

/// File input could not be resolved
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Input is empty
    #[error("no file input provided")]
    Empty,

    /// Resolved path does not exist
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Metadata lookup failed
    #[error("failed to inspect {path}: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input is a remote URL; downloading is the caller's concern
    #[error("remote file must be downloaded first: {0}")]
    Remote(String),
}

/// Upload job failed
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Entity id missing or invalid
    #[error("entity id is required")]
    MissingEntityId,

    /// File input problem
    #[error(transparent)]
    Path(#[from] PathError),

    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote side failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A stage needed output of an earlier stage that is missing
    #[error("upload stage '{0}' ran out of order")]
    OutOfOrder(&'static str),
}

/// Node operation failed before touching any field
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Remote fetch failed; fields were left as they were
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Field listing failed; fields were left as they were
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Pick rejected
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Node has no entity id to work on
    #[error("entity id is required")]
    MissingEntityId,

    /// A required input is empty
    #[error("{0} is required")]
    MissingInput(&'static str),

    /// Task status is not one the workflow knows
    #[error("unknown task status '{0}'")]
    UnknownStatus(String),
}

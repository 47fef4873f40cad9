//! Remote record source
//!
//! The HTTP client lives outside this crate. Nodes only see the blocking
//! [`RecordSource`] interface; timeouts and retries are the implementor's
//! concern.

use crate::entity::{EntityType, DETECTION_ORDER};
use crate::error::SourceError;
use crate::record::Record;
use flow_fields::AttributeMap;
use serde::{Deserialize, Serialize};

/// Query for a collection endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Collection to list
    pub entity_type: EntityType,
    /// Attributes to request; empty means the type's defaults
    pub fields: Vec<String>,
    /// `filter[...]` pairs, e.g. `("entity.Asset.id", "12")`
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    /// Query listing every record of a type with default fields
    #[must_use]
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            fields: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Request specific attributes
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add a filter
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Requested fields, falling back to the type's defaults
    #[must_use]
    pub fn effective_fields(&self) -> Vec<String> {
        if self.fields.is_empty() {
            self.entity_type
                .default_fields()
                .into_iter()
                .map(ToString::to_string)
                .collect()
        } else {
            self.fields.clone()
        }
    }
}

/// Blocking source of entity records
#[cfg_attr(test, mockall::automock)]
pub trait RecordSource {
    /// List records in source order
    ///
    /// # Errors
    /// Returns error if the request fails or the response is malformed
    fn list(&self, query: &ListQuery) -> Result<Vec<Record>, SourceError>;

    /// Fetch one record
    ///
    /// # Errors
    /// Returns [`SourceError::NotFound`] if no such record exists
    fn fetch(&self, entity_type: EntityType, id: i64, fields: &[String]) -> Result<Record, SourceError>;

    /// Write changed attributes and return the updated record
    ///
    /// # Errors
    /// Returns error if the server rejects the update
    fn update(&self, entity_type: EntityType, id: i64, changes: &AttributeMap) -> Result<Record, SourceError>;

    /// Create a record and return it as stored, id assigned
    ///
    /// Links are nested `{"type", "id"}` objects inside `attributes`.
    ///
    /// # Errors
    /// Returns error if the server rejects the payload
    fn create(&self, entity_type: EntityType, attributes: &AttributeMap) -> Result<Record, SourceError>;
}

/// Find the type of `id` by probing [`DETECTION_ORDER`]
///
/// The first type whose fetch succeeds wins; failing probes are skipped.
///
/// # Errors
/// Returns [`SourceError::Undetected`] when every probe fails
pub fn detect_entity_type<S: RecordSource + ?Sized>(source: &S, id: i64) -> Result<EntityType, SourceError> {
    let probe_fields = ["id".to_string()];
    for entity_type in DETECTION_ORDER {
        match source.fetch(entity_type, id, &probe_fields) {
            Ok(_) => {
                tracing::info!("detected entity type of {} as {}", id, entity_type);
                return Ok(entity_type);
            }
            Err(err) => tracing::debug!("probe {} {} failed: {}", entity_type, id, err),
        }
    }
    tracing::warn!("could not detect entity type for id {}", id);
    Err(SourceError::Undetected(id))
}

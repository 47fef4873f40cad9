//! Error types for field reconciliation
//!
//! Provides error handling for:
//! - Host registry operations (add/update/remove/connectivity)
//! - Reconciliation start-up (field listing)
//! - Selector picks

use crate::field::FieldName;

/// Host field registry rejected or failed an operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Field already registered
    #[error("field already exists: {0}")]
    AlreadyExists(FieldName),

    /// Field not registered
    #[error("field not found: {0}")]
    NotFound(FieldName),

    /// Host refused the operation
    #[error("host rejected {operation} on '{field}': {reason}")]
    Rejected {
        operation: &'static str,
        field: FieldName,
        reason: String,
    },

    /// Host (or its connection graph) is unreachable
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

impl RegistryError {
    /// Create rejection error
    pub fn rejected(
        operation: &'static str,
        field: impl Into<FieldName>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            operation,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Reconciliation could not run at all
///
/// Per-field failures never surface here; they are collected in the
/// [`ReconcileReport`](crate::ReconcileReport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Current field names could not be listed; nothing was changed
    #[error("could not list fields: {0}")]
    ListFields(#[source] RegistryError),
}

/// Errors when picking a selector choice
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// Label is not among the current choices
    #[error("'{0}' is not one of the current choices")]
    UnknownLabel(String),

    /// Selector holds no data (sentinel shown)
    #[error("no choices loaded")]
    NoChoices,
}

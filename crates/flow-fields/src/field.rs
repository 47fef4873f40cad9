//! Field identity and field declarations
//!
//! Provides [`FieldName`] for addressing a node's exposed fields and
//! [`FieldSpec`] for declaring a new dynamic field to the host registry.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

/// Name of an exposed field on a node
///
/// Unique within one node's field set. Opaque to the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldName(String);

impl FieldName {
    /// Create a field name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the owned string
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FieldName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which way data may flow through a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDirection {
    /// Field only produces values (read/display reconciliation)
    Output,
    /// Field only accepts values (edit reconciliation)
    Input,
}

impl FieldDirection {
    /// Whether the field may be wired as an output
    #[inline]
    #[must_use]
    pub fn output_allowed(self) -> bool {
        matches!(self, Self::Output)
    }

    /// Whether the field may be wired as an input
    #[inline]
    #[must_use]
    pub fn input_allowed(self) -> bool {
        matches!(self, Self::Input)
    }
}

/// Declared value type of a field
///
/// Dynamic fields are always strings; the other variants exist so hosts
/// can describe their static fields with the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Plain string value
    #[default]
    Text,
    /// Structured JSON value
    Json,
    /// Boolean toggle
    Bool,
}

impl ValueType {
    /// Host-facing type name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "str",
            Self::Json => "json",
            Self::Bool => "bool",
        }
    }
}

/// Declaration of a field to be registered on a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: FieldName,
    /// Initial value (`None` leaves the field empty)
    pub default_value: Option<String>,
    /// Hover text
    pub tooltip: String,
    /// Declared value type
    pub value_type: ValueType,
    /// Allowed direction
    pub direction: FieldDirection,
    /// Placeholder hint shown while the field is empty
    pub placeholder: Option<String>,
}

impl FieldSpec {
    /// Output-only string field carrying `value`
    #[must_use]
    pub fn output(name: FieldName, value: impl Into<String>, tooltip: impl Into<String>) -> Self {
        Self {
            name,
            default_value: Some(value.into()),
            tooltip: tooltip.into(),
            value_type: ValueType::Text,
            direction: FieldDirection::Output,
            placeholder: None,
        }
    }

    /// Input-only string field, empty, with `placeholder` as hint
    #[must_use]
    pub fn input(
        name: FieldName,
        placeholder: impl Into<String>,
        tooltip: impl Into<String>,
    ) -> Self {
        Self {
            name,
            default_value: None,
            tooltip: tooltip.into(),
            value_type: ValueType::Text,
            direction: FieldDirection::Input,
            placeholder: Some(placeholder.into()),
        }
    }

    /// Whether the field may be wired as an output
    #[inline]
    #[must_use]
    pub fn output_allowed(&self) -> bool {
        self.direction.output_allowed()
    }

    /// Whether the field may be wired as an input
    #[inline]
    #[must_use]
    pub fn input_allowed(&self) -> bool {
        self.direction.input_allowed()
    }
}

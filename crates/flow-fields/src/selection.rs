//! Selection preservation across reloads
//!
//! After a choice list is rebuilt, [`resolve_selection`] decides which label
//! becomes active: the previous one when it is still offered, otherwise the
//! first choice, otherwise a [`Sentinel`]. The result is always either a
//! sentinel or a label of the new list.

use crate::choice::{strip_markers, LabelMarker};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Placeholder shown instead of a real choice
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "sentinel", content = "kind", rename_all = "snake_case")]
pub enum Sentinel {
    /// Nothing loaded yet
    Unloaded,
    /// Last load returned no records (`kind` is a plural noun: "assets")
    Empty(String),
    /// Last load failed
    Failed(String),
}

impl Sentinel {
    /// Host-facing placeholder text
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Unloaded => "Reload to see options".to_string(),
            Self::Empty(kind) => format!("No {kind} available"),
            Self::Failed(kind) => format!("Failed to load {kind}"),
        }
    }

    /// Recognize a placeholder text for the given kind
    #[must_use]
    pub fn recognize(raw: &str, kind: &str) -> Option<Self> {
        [
            Self::Unloaded,
            Self::Empty(kind.to_string()),
            Self::Failed(kind.to_string()),
        ]
        .into_iter()
        .find(|s| s.label() == raw)
    }
}

impl Display for Sentinel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Active value of a selector field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// A real choice label
    Label(String),
    /// A placeholder
    Sentinel(Sentinel),
}

impl Selection {
    /// Interpret a raw host value for a selector of `kind`
    ///
    /// Empty strings and placeholder texts become sentinels.
    #[must_use]
    pub fn parse(raw: &str, kind: &str) -> Self {
        if raw.is_empty() {
            return Self::Sentinel(Sentinel::Unloaded);
        }
        Sentinel::recognize(raw, kind).map_or_else(|| Self::Label(raw.to_string()), Self::Sentinel)
    }

    /// Label, if a real choice is selected
    #[inline]
    #[must_use]
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Self::Label(label) => Some(label),
            Self::Sentinel(_) => None,
        }
    }

    /// Check for a placeholder
    #[inline]
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel(_))
    }

    /// Host-facing text
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            Self::Label(label) => label.clone(),
            Self::Sentinel(sentinel) => sentinel.label(),
        }
    }
}

/// Pick the active label after a reload
///
/// - previous is a sentinel/empty → first new label, or `empty`
/// - previous equals a new label → that label
/// - previous with markers stripped equals a new label → that label
/// - both sides stripped are equal → that label
/// - otherwise → first new label, or `empty`
///
/// Each step takes the first match and runs only when the earlier steps
/// found nothing, so a marked label never loses to an unmarked namesake.
#[must_use]
pub fn resolve_selection(
    new_labels: &[String],
    previous: &Selection,
    markers: &[LabelMarker],
    empty: Sentinel,
) -> Selection {
    let fallback = || {
        new_labels
            .first()
            .map_or_else(|| Selection::Sentinel(empty.clone()), |l| Selection::Label(l.clone()))
    };

    let Some(previous) = previous.as_label().filter(|l| !l.is_empty()) else {
        return fallback();
    };

    let wanted = strip_markers(previous, markers);
    new_labels
        .iter()
        .find(|label| label.as_str() == previous)
        .or_else(|| new_labels.iter().find(|label| label.as_str() == wanted))
        .or_else(|| {
            new_labels
                .iter()
                .find(|label| strip_markers(label, markers) == wanted)
        })
        .map_or_else(fallback, |label| Selection::Label(label.clone()))
}

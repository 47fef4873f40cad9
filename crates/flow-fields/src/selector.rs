//! Selector field state
//!
//! A [`SelectorField`] is owned by one node instance and holds the choices of
//! its last load together with the active selection.
//!
//! ```text
//!            load ok, empty                 load ok, data / pick
//!   NoData <----------------- * -----------------> HasSelection
//!      ^                                                |
//!      +------------------ load failed -----------------+
//! ```

use crate::choice::{Choice, ChoiceList, LabelMarker};
use crate::error::SelectionError;
use crate::field::FieldName;
use crate::registry::ChangeSink;
use crate::selection::{resolve_selection, Selection, Sentinel};

/// Coarse selector state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    /// Sentinel shown
    NoData,
    /// A real choice is selected
    HasSelection,
}

/// Choices and selection of a single selector field
#[derive(Debug, Clone)]
pub struct SelectorField<P> {
    field: FieldName,
    kind: String,
    markers: Vec<LabelMarker>,
    choices: ChoiceList<P>,
    selection: Selection,
}

impl<P> SelectorField<P> {
    /// Create an unloaded selector
    ///
    /// `kind` is the plural noun used in placeholder texts ("assets").
    #[must_use]
    pub fn new(field: impl Into<FieldName>, kind: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: kind.into(),
            markers: Vec::new(),
            choices: ChoiceList::new(),
            selection: Selection::Sentinel(Sentinel::Unloaded),
        }
    }

    /// Label markers stripped before matching a previous selection
    #[must_use]
    pub fn with_markers(mut self, markers: impl IntoIterator<Item = LabelMarker>) -> Self {
        self.markers = markers.into_iter().collect();
        self
    }

    /// Seed the previous selection from the value the host holds
    pub fn restore(&mut self, raw: &str) {
        self.selection = Selection::parse(raw, &self.kind);
    }

    /// Replace the choices after a successful load and re-resolve selection
    pub fn load_succeeded(&mut self, choices: ChoiceList<P>) -> &Selection {
        let labels = choices.labels();
        self.selection = resolve_selection(
            &labels,
            &self.selection,
            &self.markers,
            Sentinel::Empty(self.kind.clone()),
        );
        self.choices = choices;
        tracing::debug!(
            "{} loaded {} {}, selected '{}'",
            self.field,
            self.choices.len(),
            self.kind,
            self.selection.display_text()
        );
        &self.selection
    }

    /// Drop the choices after a failed load
    pub fn load_failed(&mut self) {
        self.choices = ChoiceList::new();
        self.selection = Selection::Sentinel(Sentinel::Failed(self.kind.clone()));
    }

    /// User picks a label
    ///
    /// # Errors
    /// Returns error if nothing is loaded or the label is not a current choice
    pub fn pick(&mut self, label: &str) -> Result<&Choice<P>, SelectionError> {
        if self.choices.is_empty() {
            return Err(SelectionError::NoChoices);
        }
        let choice = self
            .choices
            .find(label)
            .ok_or_else(|| SelectionError::UnknownLabel(label.to_string()))?;
        self.selection = Selection::Label(choice.label.clone());
        Ok(choice)
    }

    /// Currently selected choice (first with the selected label)
    #[must_use]
    pub fn selected(&self) -> Option<&Choice<P>> {
        self.selection
            .as_label()
            .and_then(|label| self.choices.find(label))
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SelectorState {
        if self.selected().is_some() {
            SelectorState::HasSelection
        } else {
            SelectorState::NoData
        }
    }

    /// Host-facing text of the selection
    #[must_use]
    pub fn current_label(&self) -> String {
        self.selection.display_text()
    }

    /// Options to show; a lone sentinel when nothing is loaded
    #[must_use]
    pub fn options(&self) -> Vec<String> {
        if self.choices.is_empty() {
            vec![self.current_label()]
        } else {
            self.choices.labels()
        }
    }

    /// Active selection
    #[inline]
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Loaded choices
    #[inline]
    #[must_use]
    pub fn choices(&self) -> &ChoiceList<P> {
        &self.choices
    }

    /// Selector field name
    #[inline]
    #[must_use]
    pub fn field(&self) -> &FieldName {
        &self.field
    }

    /// Plural noun of the listed records
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Push the current selection to the sink
    pub fn publish<S: ChangeSink + ?Sized>(&self, sink: &mut S) {
        sink.field_changed(&self.field, &self.current_label());
    }
}

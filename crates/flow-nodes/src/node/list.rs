//! Selector node over one listing kind

use crate::error::NodeError;
use crate::label::{listing_choices, ListFilter, ListingKind};
use crate::record::Record;
use crate::source::{ListQuery, RecordSource};
use flow_fields::{ChangeSink, Choice, FieldName, Selection, SelectorField};

/// List node: loads records, offers them as choices, publishes the pick
#[derive(Debug, Clone)]
pub struct ListNode {
    kind: ListingKind,
    filter: ListFilter,
    parent: Option<(String, i64)>,
    selector: SelectorField<Record>,
}

impl ListNode {
    /// Create node with an unloaded selector named `selected_{kind}`
    #[must_use]
    pub fn new(kind: ListingKind) -> Self {
        let selector = SelectorField::new(format!("selected_{}", kind.singular()), kind.noun())
            .with_markers(kind.markers());
        Self {
            kind,
            filter: ListFilter::default(),
            parent: None,
            selector,
        }
    }

    /// With record filter
    #[must_use]
    pub fn with_filter(mut self, filter: ListFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Only list records linked to a parent entity (tasks of an asset)
    #[must_use]
    pub fn with_parent(mut self, entity_type: impl Into<String>, id: i64) -> Self {
        self.parent = Some((entity_type.into(), id));
        self
    }

    /// Listing kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ListingKind {
        self.kind
    }

    /// Selector state
    #[inline]
    #[must_use]
    pub fn selector(&self) -> &SelectorField<Record> {
        &self.selector
    }

    /// Output carrying the selected record id
    #[must_use]
    pub fn id_field(&self) -> FieldName {
        FieldName::from(format!("selected_{}_id", self.kind.singular()))
    }

    /// Output carrying the selected record as JSON
    #[must_use]
    pub fn data_field(&self) -> FieldName {
        FieldName::from(format!("selected_{}_data", self.kind.singular()))
    }

    /// Seed the previous selection from the host's stored value
    pub fn restore(&mut self, raw: &str) {
        self.selector.restore(raw);
    }

    fn query(&self) -> ListQuery {
        let mut query = ListQuery::new(self.kind.entity_type());
        if let Some((entity_type, id)) = &self.parent {
            query = query.with_filter(format!("entity.{entity_type}.id"), id.to_string());
        }
        query
    }

    /// Fetch, rebuild choices, re-resolve the selection, publish
    ///
    /// # Errors
    /// Returns the source error; the selector then shows the failure
    /// placeholder and holds no choices
    pub fn reload<S, K>(&mut self, source: &S, sink: &mut K) -> Result<&Selection, NodeError>
    where
        S: RecordSource + ?Sized,
        K: ChangeSink + ?Sized,
    {
        match source.list(&self.query()) {
            Ok(records) => {
                let choices = listing_choices(self.kind, &records, &self.filter);
                tracing::info!("retrieved {} {}, offering {}", records.len(), self.kind, choices.len());
                self.selector.load_succeeded(choices);
                self.publish(sink);
                Ok(self.selector.selection())
            }
            Err(err) => {
                tracing::error!("failed to load {}: {}", self.kind, err);
                self.selector.load_failed();
                self.publish(sink);
                Err(err.into())
            }
        }
    }

    /// User picks a label; publishes id and data of the picked record
    ///
    /// # Errors
    /// Returns error if the label is not a current choice
    pub fn select<K: ChangeSink + ?Sized>(
        &mut self,
        label: &str,
        sink: &mut K,
    ) -> Result<&Choice<Record>, NodeError> {
        self.selector.pick(label)?;
        self.publish(sink);
        self.selector
            .selected()
            .ok_or_else(|| NodeError::Selection(flow_fields::SelectionError::UnknownLabel(label.to_string())))
    }

    fn publish<K: ChangeSink + ?Sized>(&self, sink: &mut K) {
        self.selector.publish(sink);
        let (id, data) = self.selector.selected().map_or_else(
            || (String::new(), String::new()),
            |choice| (choice.payload.id.to_string(), choice.payload.to_json().to_string()),
        );
        sink.field_changed(&self.id_field(), &id);
        sink.field_changed(&self.data_field(), &data);
    }
}

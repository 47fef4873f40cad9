//! Flow Fields
//!
//! Keeps a node's exposed fields in step with a result set whose shape
//! changes at runtime, without severing wiring made in the host graph.
//!
//! # Core Concepts
//!
//! - [`FieldRegistry`]: host-owned field set of one node
//! - [`Reconciler`]: diffs the registry against an [`AttributeMap`] and
//!   applies create / update / delete, preserving connected fields
//! - [`ChoiceList`]: ordered selector options built from records
//! - [`resolve_selection`]: keeps a still-valid selection across reloads
//! - [`SelectorField`]: per-node selector state (choices + selection)
//!
//! # Example
//!
//! ```rust,ignore
//! use flow_fields::{AttributeMap, NullSink, Reconciler};
//!
//! let reconciler = Reconciler::display("Asset").with_static(["entity_id"]);
//! let attributes = AttributeMap::new().with("code", "hero").with("sg_status", "ip");
//!
//! let report = reconciler.reconcile(&mut registry, &mut NullSink, &attributes)?;
//! println!("{} mutations", report.mutation_count());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod attribute;
mod choice;
mod error;
mod field;
mod reconcile;
mod registry;
mod selection;
mod selector;

pub use attribute::{AttributeMap, AttributeValue};
pub use choice::{
    build_choices, build_choices_with_hints, primary_label, strip_markers, Choice, ChoiceHint,
    ChoiceList, LabelMarker,
};
pub use error::{ReconcileError, RegistryError, SelectionError};
pub use field::{FieldDirection, FieldName, FieldSpec, ValueType};
pub use reconcile::{
    plan, FieldAction, FieldFailure, ReconcileMode, ReconcilePlan, ReconcileReport, Reconciler,
    ReconcilerOptions, DEFAULT_READ_ONLY,
};
pub use registry::{ChangeSink, FieldRegistry, NullSink};
pub use selection::{resolve_selection, Selection, Sentinel};
pub use selector::{SelectorField, SelectorState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

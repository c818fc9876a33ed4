//! Editing layer for the state-chart model
//!
//! Wraps a [`StateChart`] in an edit session ([`ChartEditState`]) whose
//! mutations are discrete, reversible [`EditCommand`]s built by the
//! [`CommandFactory`], pushed onto an undo/redo stack, and mirrored to
//! listeners as [`ChartEvent`]s.

mod editor;
pub use editor::*;

// Re-export all necessary types from sme_core
pub use sme_core::{
    ChartEvent, ClearedEndpoint, DetachedSubtree, Element, ElementFlags, ElementId, ElementKind, Endpoint, ModelError, PropertyKey, PropertyValue, StateChart,
    TransitionData, Traversal, TreeWalker, VisitResult,
};

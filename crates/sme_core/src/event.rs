use serde::{Deserialize, Serialize};

use crate::{ElementId, PropertyKey};

/// Change notification emitted after a mutation of the chart.
///
/// A plain observable stream instead of a toolkit item-model: the editing
/// layer derives these from executed and reversed commands and hands them to
/// whatever presentation layer is listening.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartEvent {
    /// An element (possibly a whole subtree) appeared in the tree
    ElementCreated { id: ElementId, parent: Option<ElementId> },
    /// An element and all of its descendants left the tree
    ElementRemoved { id: ElementId },
    /// An element moved to a different parent
    ElementReparented {
        id: ElementId,
        old_parent: Option<ElementId>,
        new_parent: Option<ElementId>,
    },
    /// A single property of an element changed
    PropertyChanged { id: ElementId, key: PropertyKey },
    /// The entire tree root was replaced
    RootChanged,
}

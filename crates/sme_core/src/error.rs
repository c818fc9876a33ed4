//! Error types for the state-chart model

use thiserror::Error;

use crate::{ElementId, ElementKind, PropertyKey};

pub type Result<T> = std::result::Result<T, ModelError>;

/// Error type for model mutations and lookups.
///
/// Every mutation checks its preconditions before touching the tree, so a
/// returned error always means the tree is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The target id does not resolve in the current tree (removed, or from
    /// another chart)
    #[error("element {id} is not part of the tree")]
    StaleReference { id: ElementId },

    /// The mutation would break the single-root/single-parent invariant or
    /// introduce a cycle
    #[error("structural violation: {message}")]
    StructuralViolation { message: String },

    /// The element has the wrong kind for the operation
    #[error("element {id} is a {actual}, expected a {expected}")]
    KindMismatch {
        id: ElementId,
        actual: ElementKind,
        expected: &'static str,
    },

    /// The property key does not exist on elements of this kind
    #[error("property '{key}' does not apply to {kind} elements")]
    PropertyNotApplicable { key: PropertyKey, kind: ElementKind },

    /// The property value has the wrong shape for the key
    #[error("property '{key}' cannot hold a {shape} value")]
    PropertyTypeMismatch { key: PropertyKey, shape: &'static str },
}

impl ModelError {
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        ModelError::StructuralViolation { message: message.into() }
    }
}

use thiserror::Error;

use sme_core::ModelError;

pub type Result<T> = std::result::Result<T, EditError>;

/// Error type for command construction and execution.
///
/// A failed execution leaves the chart unchanged; model-level failures
/// (stale references, structural violations) pass through unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A caller-completed command was executed before it was filled in
    #[error("command is not ready to execute: missing {0}")]
    IncompleteCommand(&'static str),
}

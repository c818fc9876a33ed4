//! Session state for the chart editor
//!
//! Contains all data needed to restore an editing session, including:
//! - The chart itself
//! - Undo/redo stack
//! - Selection
//! - Dirty flag

use serde::{Deserialize, Serialize};

use sme_core::{ElementId, StateChart};

use super::{ChartEditState, ChartUndoStack};

/// Session state for the chart editor
///
/// This struct contains everything needed to fully restore an editing session.
/// It is serialized to disk when the app exits and restored on startup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChartEditorSessionState {
    /// Version for future compatibility
    #[serde(default = "default_version")]
    pub version: u32,

    /// The chart being edited
    pub chart: StateChart,

    /// The undo/redo stack
    pub undo_stack: ChartUndoStack,

    /// Currently selected element (if any)
    #[serde(default)]
    pub selected_element: Option<ElementId>,

    /// Whether the document has unsaved changes
    #[serde(default)]
    pub is_dirty: bool,
}

fn default_version() -> u32 {
    1
}

impl ChartEditorSessionState {
    /// Create a new empty session state
    pub fn new() -> Self {
        Self {
            version: default_version(),
            ..Self::default()
        }
    }

    /// Snapshot an edit state
    pub fn capture(state: &ChartEditState) -> Self {
        let undo_stack = state
            .get_undo_stack()
            .lock()
            .map(|stack| stack.clone())
            .unwrap_or_default();
        Self {
            version: default_version(),
            chart: state.get_chart().clone(),
            undo_stack,
            selected_element: state.selected_element(),
            is_dirty: state.is_dirty(),
        }
    }

    /// Rebuild an edit state from this snapshot
    pub fn restore(self) -> ChartEditState {
        let mut state = ChartEditState::from_chart(self.chart);
        if let Ok(mut stack) = state.get_undo_stack().lock() {
            *stack = self.undo_stack;
        }
        state.set_selected_element(self.selected_element);
        state.set_is_dirty(self.is_dirty);
        state
    }
}

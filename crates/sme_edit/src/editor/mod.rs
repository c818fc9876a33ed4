//! Edit session over a [`StateChart`]
//!
//! [`ChartEditState`] owns the chart, the undo/redo stack and the listener
//! list. Mutations go through [`ChartEditState::apply`] with commands built by
//! [`CommandFactory`]; multi-command gestures are grouped with
//! [`ChartEditState::begin_atomic_undo`].

use std::sync::{Arc, Mutex};

use sme_core::{ChartEvent, ElementId, StateChart};

mod command_factory;
pub use command_factory::*;

mod editor_error;
pub use editor_error::*;

pub mod undo_stack;
pub use undo_stack::*;

pub mod undo_operation;
pub use undo_operation::*;

pub mod session_state;
pub use session_state::*;

/// Callback invoked after every committed chart change
pub type ChartListener = Box<dyn Fn(&ChartEvent)>;

pub struct ChartEditState {
    chart: StateChart,
    undo_stack: Arc<Mutex<ChartUndoStack>>,
    listeners: Vec<ChartListener>,

    is_dirty: bool,
    selected_element: Option<ElementId>,
}

impl Default for ChartEditState {
    fn default() -> Self {
        Self {
            chart: StateChart::new(),
            undo_stack: Arc::new(Mutex::new(ChartUndoStack::new())),
            listeners: Vec::new(),
            is_dirty: false,
            selected_element: None,
        }
    }
}

impl std::fmt::Debug for ChartEditState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartEditState")
            .field("chart", &self.chart)
            .field("undo_stack", &self.undo_stack)
            .field("is_dirty", &self.is_dirty)
            .field("selected_element", &self.selected_element)
            .finish_non_exhaustive()
    }
}

impl ChartEditState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chart(chart: StateChart) -> Self {
        Self { chart, ..Self::default() }
    }

    pub fn get_chart(&self) -> &StateChart {
        &self.chart
    }

    /// Direct mutable access. Changes made through this bypass the undo
    /// stack and listeners.
    pub fn get_chart_mut(&mut self) -> &mut StateChart {
        &mut self.chart
    }

    pub fn selected_element(&self) -> Option<ElementId> {
        self.selected_element
    }

    pub fn set_selected_element(&mut self, element: Option<ElementId>) {
        self.selected_element = element;
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn set_is_dirty(&mut self, dirty: bool) {
        self.is_dirty = dirty;
    }

    /// Register a change listener. Listeners fire after the chart has been
    /// mutated, in registration order.
    pub fn add_listener(&mut self, listener: ChartListener) {
        self.listeners.push(listener);
    }

    fn emit_all(&self, events: &[ChartEvent]) {
        for event in events {
            for listener in &self.listeners {
                listener(event);
            }
        }
    }

    /// Execute a command, push it onto the undo stack and notify listeners.
    ///
    /// A fresh command invalidates the redo branch. On failure the chart is
    /// unchanged and nothing is pushed.
    pub fn apply(&mut self, mut op: EditCommand) -> Result<()> {
        op.redo(self)?;
        let events = op.redo_events();
        if let Ok(mut stack) = self.undo_stack.lock() {
            stack.clear_redo();
        }
        self.push_plain_undo(op);
        self.emit_all(&events);
        Ok(())
    }

    /// Push an already-executed command without touching the redo branch
    pub fn push_plain_undo(&mut self, op: EditCommand) {
        if op.changes_data() {
            self.is_dirty = true;
        }
        if let Ok(mut stack) = self.undo_stack.lock() {
            stack.push(op);
        }
    }

    pub fn undo_stack_len(&self) -> usize {
        self.undo_stack.lock().map(|stack| stack.undo_len()).unwrap_or(0)
    }

    pub fn get_undo_stack(&self) -> Arc<Mutex<ChartUndoStack>> {
        self.undo_stack.clone()
    }

    /// Start grouping subsequent commands into one undo step.
    ///
    /// Commands applied while the guard is alive collapse into a single
    /// atomic command when it drops (or when [`AtomicUndoGuard::end`] runs).
    pub fn begin_atomic_undo(&mut self, description: impl Into<String>) -> AtomicUndoGuard {
        if let Ok(mut stack) = self.undo_stack.lock() {
            stack.clear_redo();
        }
        AtomicUndoGuard::new(self.undo_stack.clone(), description.into())
    }
}

impl UndoState for ChartEditState {
    fn undo_description(&self) -> Option<String> {
        self.undo_stack.lock().ok().and_then(|stack| stack.undo_description())
    }

    fn can_undo(&self) -> bool {
        self.undo_stack.lock().map(|stack| stack.can_undo()).unwrap_or(false)
    }

    fn undo(&mut self) -> Result<()> {
        let Some(mut op) = self.undo_stack.lock().ok().and_then(|mut stack| stack.pop_undo()) else {
            return Ok(());
        };
        match op.undo(self) {
            Ok(()) => {
                self.is_dirty = true;
                self.emit_all(&op.undo_events());
                if let Ok(mut stack) = self.undo_stack.lock() {
                    stack.push_redo(op);
                }
                Ok(())
            }
            Err(err) => {
                // a command that was never reversed stays undoable, not redoable
                if let Ok(mut stack) = self.undo_stack.lock() {
                    stack.push(op);
                }
                Err(err)
            }
        }
    }

    fn redo_description(&self) -> Option<String> {
        self.undo_stack.lock().ok().and_then(|stack| stack.redo_description())
    }

    fn can_redo(&self) -> bool {
        self.undo_stack.lock().map(|stack| stack.can_redo()).unwrap_or(false)
    }

    fn redo(&mut self) -> Result<()> {
        let Some(mut op) = self.undo_stack.lock().ok().and_then(|mut stack| stack.pop_redo()) else {
            return Ok(());
        };
        match op.redo(self) {
            Ok(()) => {
                self.is_dirty = true;
                self.emit_all(&op.redo_events());
                if let Ok(mut stack) = self.undo_stack.lock() {
                    stack.push(op);
                }
                Ok(())
            }
            Err(err) => {
                if let Ok(mut stack) = self.undo_stack.lock() {
                    stack.push_redo(op);
                }
                Err(err)
            }
        }
    }
}

/// Collects the commands pushed since its creation into one atomic undo step.
pub struct AtomicUndoGuard {
    base_count: usize,
    description: String,
    undo_stack: Arc<Mutex<ChartUndoStack>>,
    ended: bool,
}

impl AtomicUndoGuard {
    fn new(undo_stack: Arc<Mutex<ChartUndoStack>>, description: String) -> Self {
        let base_count = undo_stack.lock().map(|stack| stack.undo_len()).unwrap_or(0);
        Self {
            base_count,
            description,
            undo_stack,
            ended: false,
        }
    }

    /// Close the group now instead of at scope end
    pub fn end(mut self) {
        self.end_action();
    }

    /// Drop every command recorded since the guard was created, without
    /// undoing them
    pub fn discard(mut self) {
        self.ended = true;
        if let Ok(mut stack) = self.undo_stack.lock() {
            while stack.undo_len() > self.base_count {
                stack.pop_undo();
            }
        }
    }

    fn end_action(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        let Ok(mut stack) = self.undo_stack.lock() else {
            return;
        };
        let count = stack.undo_len().saturating_sub(self.base_count);
        if count == 0 {
            return;
        }

        let mut commands = Vec::with_capacity(count);
        for _ in 0..count {
            if let Some(op) = stack.pop_undo() {
                commands.push(op);
            }
        }
        commands.reverse();

        if commands.len() == 1 {
            // no point wrapping a single command
            if let Some(op) = commands.pop() {
                stack.push(op);
            }
        } else {
            stack.push(EditCommand::Atomic {
                description: std::mem::take(&mut self.description),
                commands,
            });
        }
    }
}

impl Drop for AtomicUndoGuard {
    fn drop(&mut self) {
        self.end_action();
    }
}

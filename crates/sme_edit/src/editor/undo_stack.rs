//! Undo stack for the chart editor

use serde::{Deserialize, Serialize};

use crate::Result;

use super::EditCommand;

/// Trait for types that support undo/redo operations
pub trait UndoState {
    /// Get description of the next undo operation
    fn undo_description(&self) -> Option<String>;

    /// Check if undo is available
    fn can_undo(&self) -> bool;

    /// Perform undo operation
    fn undo(&mut self) -> Result<()>;

    /// Get description of the next redo operation
    fn redo_description(&self) -> Option<String>;

    /// Check if redo is available
    fn can_redo(&self) -> bool;

    /// Perform redo operation
    fn redo(&mut self) -> Result<()>;
}

/// Undo/redo stack holding executed [`EditCommand`]s.
///
/// The stack itself never executes anything; pushing does not clear the redo
/// branch (the edit state does that explicitly when a fresh command is
/// applied, so a redone command can be re-pushed unchanged).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChartUndoStack {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
}

impl ChartUndoStack {
    /// Create a new empty undo stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an executed command onto the undo stack
    pub fn push(&mut self, op: EditCommand) {
        self.undo_stack.push(op);
    }

    /// Pop the most recent command from the undo stack
    pub fn pop_undo(&mut self) -> Option<EditCommand> {
        self.undo_stack.pop()
    }

    /// Push a reversed command onto the redo stack
    pub fn push_redo(&mut self, op: EditCommand) {
        self.redo_stack.push(op);
    }

    /// Pop a command from the redo stack
    pub fn pop_redo(&mut self) -> Option<EditCommand> {
        self.redo_stack.pop()
    }

    /// Get the number of undoable commands
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redoable commands
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get description of the next undo command
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|op| op.description())
    }

    /// Get description of the next redo command
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|op| op.description())
    }

    /// Clear both stacks
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Drop the redo branch (a fresh edit invalidates it)
    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    pub fn undo_stack(&self) -> &[EditCommand] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[EditCommand] {
        &self.redo_stack
    }
}

//! Chart edit commands as a serializable enum
//!
//! One variant per mutation intent. Each command captures the prior state it
//! needs on first execution, so `redo` followed by `undo` restores the chart
//! exactly (structure, ids, child order, properties).

use serde::{Deserialize, Serialize};

use sme_core::{ChartEvent, DetachedSubtree, ElementFlags, ElementId, ElementKind, Endpoint, ModelError, PropertyKey, PropertyValue, StateChart};

use super::ChartEditState;
use crate::{EditError, Result};

/// Reversible mutation of the chart backing a [`ChartEditState`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EditCommand {
    /// Atomic group: redone in order, undone in reverse, one undo step
    Atomic { description: String, commands: Vec<EditCommand> },

    /// Instantiate a new element under `parent`
    CreateElement {
        kind: ElementKind,
        parent: ElementId,
        /// Id of the created element (filled on first execution)
        created: Option<ElementId>,
        /// Subtree captured by undo, reinserted on redo to keep the same id
        removed: Option<DetachedSubtree>,
    },

    /// Remove an element and its whole subtree
    DeleteElement {
        element: ElementId,
        /// Parent at removal time (for change notification)
        parent: Option<ElementId>,
        /// Removed subtree, retained for undo
        detached: Option<DetachedSubtree>,
    },

    /// Set a single typed property
    ModifyProperty {
        element: ElementId,
        key: PropertyKey,
        value: PropertyValue,
        /// Prior value (captured on execution)
        old: Option<PropertyValue>,
        description: String,
    },

    /// Apply a batch of property writes as one undo step
    ModifyProperties {
        element: ElementId,
        values: Vec<(PropertyKey, PropertyValue)>,
        old: Vec<(PropertyKey, PropertyValue)>,
    },

    /// Composite label/flags edit, filled in by the caller before execution
    ModifyElement {
        element: ElementId,
        label: Option<String>,
        flags: Option<ElementFlags>,
        old_label: Option<String>,
        old_flags: Option<ElementFlags>,
    },

    /// Rewire a transition's endpoints, filled in by the caller
    ModifyTransition {
        transition: ElementId,
        source: Option<ElementId>,
        target: Option<ElementId>,
        old_source: Option<ElementId>,
        old_target: Option<ElementId>,
    },

    /// Move an element (with subtree) to a new parent, supplied at execution
    /// time via [`EditCommand::set_new_parent`]
    ReparentElement {
        element: ElementId,
        new_parent: Option<ElementId>,
        index: Option<usize>,
        old_parent: Option<ElementId>,
        old_index: usize,
    },

    /// Swap the entire tree for another one
    ChangeRoot { chart: StateChart },
}

impl EditCommand {
    /// Description for UI display (undo/redo menus)
    pub fn description(&self) -> String {
        match self {
            EditCommand::Atomic { description, .. } => description.clone(),
            EditCommand::CreateElement { kind, .. } => format!("Create {kind}"),
            EditCommand::DeleteElement { .. } => "Delete element".to_string(),
            EditCommand::ModifyProperty { description, key, .. } => {
                if description.is_empty() {
                    format!("Change {key}")
                } else {
                    description.clone()
                }
            }
            EditCommand::ModifyProperties { .. } => "Change properties".to_string(),
            EditCommand::ModifyElement { .. } => "Edit element".to_string(),
            EditCommand::ModifyTransition { .. } => "Rewire transition".to_string(),
            EditCommand::ReparentElement { .. } => "Move element".to_string(),
            EditCommand::ChangeRoot { .. } => "Change state machine".to_string(),
        }
    }

    /// Whether this command changes document data (affects the dirty flag)
    pub fn changes_data(&self) -> bool {
        match self {
            EditCommand::Atomic { commands, .. } => commands.iter().any(|op| op.changes_data()),
            _ => true,
        }
    }

    /// Fill in the label for a caller-completed [`EditCommand::ModifyElement`]
    pub fn set_label(&mut self, new_label: impl Into<String>) {
        if let EditCommand::ModifyElement { label, .. } = self {
            *label = Some(new_label.into());
        } else {
            log::warn!("set_label called on {}", self.description());
        }
    }

    /// Fill in the flags for a caller-completed [`EditCommand::ModifyElement`]
    pub fn set_flags(&mut self, new_flags: ElementFlags) {
        if let EditCommand::ModifyElement { flags, .. } = self {
            *flags = Some(new_flags);
        } else {
            log::warn!("set_flags called on {}", self.description());
        }
    }

    /// Fill in the endpoints for a caller-completed [`EditCommand::ModifyTransition`]
    pub fn set_endpoints(&mut self, new_source: Option<ElementId>, new_target: Option<ElementId>) {
        if let EditCommand::ModifyTransition { source, target, .. } = self {
            *source = new_source;
            *target = new_target;
        } else {
            log::warn!("set_endpoints called on {}", self.description());
        }
    }

    /// Supply the drop target for a [`EditCommand::ReparentElement`]
    pub fn set_new_parent(&mut self, parent: ElementId, position: Option<usize>) {
        if let EditCommand::ReparentElement { new_parent, index, .. } = self {
            *new_parent = Some(parent);
            *index = position;
        } else {
            log::warn!("set_new_parent called on {}", self.description());
        }
    }

    /// Execute (or re-execute) the command against the edit state.
    ///
    /// On failure the chart is left unchanged.
    pub fn redo(&mut self, state: &mut ChartEditState) -> Result<()> {
        match self {
            EditCommand::Atomic { commands, .. } => {
                for i in 0..commands.len() {
                    if let Err(err) = commands[i].redo(state) {
                        // all-or-nothing: roll back the applied prefix
                        for done in commands[..i].iter_mut().rev() {
                            if let Err(rollback) = done.undo(state) {
                                log::warn!("atomic rollback failed: {rollback}");
                            }
                        }
                        return Err(err);
                    }
                }
                Ok(())
            }
            EditCommand::CreateElement {
                kind,
                parent,
                created,
                removed,
            } => {
                if let Some(detached) = removed.take() {
                    let keep = detached.clone();
                    if let Err(err) = state.get_chart_mut().reinsert_subtree(detached) {
                        // keep the captured subtree so the command stays retryable
                        *removed = Some(keep);
                        return Err(err.into());
                    }
                } else {
                    *created = Some(state.get_chart_mut().create_element(*kind, *parent)?);
                }
                Ok(())
            }
            EditCommand::DeleteElement { element, parent, detached } => {
                let chart = state.get_chart_mut();
                if !chart.contains(*element) {
                    return Err(ModelError::StaleReference { id: *element }.into());
                }
                *parent = chart.parent_of(*element);
                *detached = Some(chart.remove_subtree(*element)?);
                Ok(())
            }
            EditCommand::ModifyProperty { element, key, value, old, .. } => {
                let prior = state.get_chart_mut().set_property(*element, *key, value.clone())?;
                *old = Some(prior);
                Ok(())
            }
            EditCommand::ModifyProperties { element, values, old } => {
                let chart = state.get_chart_mut();
                let mut applied = Vec::with_capacity(values.len());
                for (key, value) in values.iter() {
                    match chart.set_property(*element, *key, value.clone()) {
                        Ok(prior) => applied.push((*key, prior)),
                        Err(err) => {
                            for (key, prior) in applied.into_iter().rev() {
                                if let Err(rollback) = chart.set_property(*element, key, prior) {
                                    log::warn!("property batch rollback failed: {rollback}");
                                }
                            }
                            return Err(err.into());
                        }
                    }
                }
                *old = applied;
                Ok(())
            }
            EditCommand::ModifyElement {
                element,
                label,
                flags,
                old_label,
                old_flags,
            } => {
                let target = state
                    .get_chart_mut()
                    .element_mut(*element)
                    .ok_or(ModelError::StaleReference { id: *element })?;
                if let Some(new_label) = label {
                    *old_label = Some(std::mem::replace(&mut target.label, new_label.clone()));
                }
                if let Some(new_flags) = flags {
                    *old_flags = Some(std::mem::replace(&mut target.flags, *new_flags));
                }
                Ok(())
            }
            EditCommand::ModifyTransition {
                transition,
                source,
                target,
                old_source,
                old_target,
            } => {
                let chart = state.get_chart_mut();
                let prior_source = chart.set_transition_endpoint(*transition, Endpoint::Source, *source)?;
                match chart.set_transition_endpoint(*transition, Endpoint::Target, *target) {
                    Ok(prior_target) => {
                        *old_source = prior_source;
                        *old_target = prior_target;
                        Ok(())
                    }
                    Err(err) => {
                        if let Err(rollback) = chart.set_transition_endpoint(*transition, Endpoint::Source, prior_source) {
                            log::warn!("endpoint rollback failed: {rollback}");
                        }
                        Err(err.into())
                    }
                }
            }
            EditCommand::ReparentElement {
                element,
                new_parent,
                index,
                old_parent,
                old_index,
            } => {
                let Some(parent) = *new_parent else {
                    return Err(EditError::IncompleteCommand("reparent target"));
                };
                let chart = state.get_chart_mut();
                let position = chart.position_in_parent(*element);
                chart.reparent(*element, parent, *index)?;
                if let Some((prior_parent, prior_index)) = position {
                    *old_parent = Some(prior_parent);
                    *old_index = prior_index;
                }
                Ok(())
            }
            EditCommand::ChangeRoot { chart } => {
                let incoming = std::mem::take(chart);
                *chart = state.get_chart_mut().replace(incoming);
                Ok(())
            }
        }
    }

    /// Reverse the command, restoring the chart to its pre-execution state.
    ///
    /// On failure the captured prior state is kept, so the reversal can be
    /// retried once the obstacle is gone.
    pub fn undo(&mut self, state: &mut ChartEditState) -> Result<()> {
        match self {
            EditCommand::Atomic { commands, .. } => {
                for i in (0..commands.len()).rev() {
                    if let Err(err) = commands[i].undo(state) {
                        // all-or-nothing: re-execute the already-undone suffix
                        for done in commands[i + 1..].iter_mut() {
                            if let Err(rollback) = done.redo(state) {
                                log::warn!("atomic rollback failed: {rollback}");
                            }
                        }
                        return Err(err);
                    }
                }
                Ok(())
            }
            EditCommand::CreateElement { created, removed, .. } => {
                if let Some(id) = *created {
                    *removed = Some(state.get_chart_mut().remove_subtree(id)?);
                } else {
                    log::warn!("undo of a create command that never executed");
                }
                Ok(())
            }
            EditCommand::DeleteElement { detached, .. } => {
                if let Some(subtree) = detached.take() {
                    let keep = subtree.clone();
                    if let Err(err) = state.get_chart_mut().reinsert_subtree(subtree) {
                        *detached = Some(keep);
                        return Err(err.into());
                    }
                } else {
                    log::warn!("undo of a delete command that never executed");
                }
                Ok(())
            }
            EditCommand::ModifyProperty { element, key, old, .. } => {
                if let Some(prior) = old.take() {
                    if let Err(err) = state.get_chart_mut().set_property(*element, *key, prior.clone()) {
                        *old = Some(prior);
                        return Err(err.into());
                    }
                }
                Ok(())
            }
            EditCommand::ModifyProperties { element, values, old } => {
                let chart = state.get_chart_mut();
                for i in (0..old.len()).rev() {
                    let (key, prior) = old[i].clone();
                    if let Err(err) = chart.set_property(*element, key, prior) {
                        // re-apply the new values already restored past `i`
                        for (key, value) in values[i + 1..].iter() {
                            if let Err(rollback) = chart.set_property(*element, *key, value.clone()) {
                                log::warn!("property batch rollback failed: {rollback}");
                            }
                        }
                        return Err(err.into());
                    }
                }
                old.clear();
                Ok(())
            }
            EditCommand::ModifyElement {
                element, old_label, old_flags, ..
            } => {
                let target = state
                    .get_chart_mut()
                    .element_mut(*element)
                    .ok_or(ModelError::StaleReference { id: *element })?;
                if let Some(prior_label) = old_label.take() {
                    target.label = prior_label;
                }
                if let Some(prior_flags) = old_flags.take() {
                    target.flags = prior_flags;
                }
                Ok(())
            }
            EditCommand::ModifyTransition {
                transition,
                old_source,
                old_target,
                ..
            } => {
                let chart = state.get_chart_mut();
                let prior_source = chart.set_transition_endpoint(*transition, Endpoint::Source, *old_source)?;
                if let Err(err) = chart.set_transition_endpoint(*transition, Endpoint::Target, *old_target) {
                    if let Err(rollback) = chart.set_transition_endpoint(*transition, Endpoint::Source, prior_source) {
                        log::warn!("endpoint rollback failed: {rollback}");
                    }
                    return Err(err.into());
                }
                Ok(())
            }
            EditCommand::ReparentElement {
                element, old_parent, old_index, ..
            } => {
                if let Some(prior_parent) = *old_parent {
                    state.get_chart_mut().reparent(*element, prior_parent, Some(*old_index))?;
                } else {
                    log::warn!("undo of a reparent command that never executed");
                }
                Ok(())
            }
            EditCommand::ChangeRoot { chart } => {
                let incoming = std::mem::take(chart);
                *chart = state.get_chart_mut().replace(incoming);
                Ok(())
            }
        }
    }

    /// Change notifications for a completed execution
    pub fn redo_events(&self) -> Vec<ChartEvent> {
        match self {
            EditCommand::Atomic { commands, .. } => commands.iter().flat_map(|op| op.redo_events()).collect(),
            EditCommand::CreateElement { parent, created, .. } => created
                .map(|id| {
                    vec![ChartEvent::ElementCreated {
                        id,
                        parent: Some(*parent),
                    }]
                })
                .unwrap_or_default(),
            EditCommand::DeleteElement { element, .. } => vec![ChartEvent::ElementRemoved { id: *element }],
            EditCommand::ModifyProperty { element, key, .. } => vec![ChartEvent::PropertyChanged { id: *element, key: *key }],
            EditCommand::ModifyProperties { element, values, .. } => values
                .iter()
                .map(|(key, _)| ChartEvent::PropertyChanged { id: *element, key: *key })
                .collect(),
            EditCommand::ModifyElement { element, label, flags, .. } => {
                let mut events = Vec::new();
                if label.is_some() {
                    events.push(ChartEvent::PropertyChanged {
                        id: *element,
                        key: PropertyKey::Label,
                    });
                }
                if flags.is_some() {
                    events.push(ChartEvent::PropertyChanged {
                        id: *element,
                        key: PropertyKey::Flags,
                    });
                }
                events
            }
            EditCommand::ModifyTransition { transition, .. } => vec![
                ChartEvent::PropertyChanged {
                    id: *transition,
                    key: PropertyKey::SourceState,
                },
                ChartEvent::PropertyChanged {
                    id: *transition,
                    key: PropertyKey::TargetState,
                },
            ],
            EditCommand::ReparentElement {
                element,
                new_parent,
                old_parent,
                ..
            } => vec![ChartEvent::ElementReparented {
                id: *element,
                old_parent: *old_parent,
                new_parent: *new_parent,
            }],
            EditCommand::ChangeRoot { .. } => vec![ChartEvent::RootChanged],
        }
    }

    /// Change notifications for a completed reversal
    pub fn undo_events(&self) -> Vec<ChartEvent> {
        match self {
            EditCommand::Atomic { commands, .. } => commands.iter().rev().flat_map(|op| op.undo_events()).collect(),
            EditCommand::CreateElement { created, .. } => created.map(|id| vec![ChartEvent::ElementRemoved { id }]).unwrap_or_default(),
            EditCommand::DeleteElement { element, parent, .. } => vec![ChartEvent::ElementCreated {
                id: *element,
                parent: *parent,
            }],
            EditCommand::ReparentElement {
                element,
                new_parent,
                old_parent,
                ..
            } => vec![ChartEvent::ElementReparented {
                id: *element,
                old_parent: *new_parent,
                new_parent: *old_parent,
            }],
            EditCommand::ChangeRoot { .. } => vec![ChartEvent::RootChanged],
            // property-shaped commands notify the same keys in both directions
            _ => self.redo_events(),
        }
    }
}

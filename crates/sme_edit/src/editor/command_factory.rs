//! Construction-time validation for edit commands
//!
//! The factory checks a command's references against the current chart before
//! handing it out, so callers hold a command that is known to be executable
//! (barring concurrent edits between construction and
//! [`apply`](super::ChartEditState::apply)).

use sme_core::{validate_property, ElementId, ElementKind, ModelError, PropertyKey, PropertyValue, StateChart};

use super::{EditCommand, Result};

pub struct CommandFactory;

impl CommandFactory {
    /// Command that instantiates a new `kind` element under `parent`
    pub fn create_element(chart: &StateChart, kind: ElementKind, parent: ElementId) -> Result<EditCommand> {
        let parent_element = chart.element(parent).ok_or(ModelError::StaleReference { id: parent })?;
        if !parent_element.kind().is_state() {
            return Err(ModelError::KindMismatch {
                id: parent,
                actual: parent_element.kind(),
                expected: "state",
            }
            .into());
        }
        Ok(EditCommand::CreateElement {
            kind,
            parent,
            created: None,
            removed: None,
        })
    }

    /// Command that removes `element` and its whole subtree
    pub fn delete_element(chart: &StateChart, element: ElementId) -> Result<EditCommand> {
        if !chart.contains(element) {
            return Err(ModelError::StaleReference { id: element }.into());
        }
        Ok(EditCommand::DeleteElement {
            element,
            parent: None,
            detached: None,
        })
    }

    /// Command that sets one typed property on `element`
    pub fn modify_property(chart: &StateChart, element: ElementId, key: PropertyKey, value: PropertyValue) -> Result<EditCommand> {
        let target = chart.element(element).ok_or(ModelError::StaleReference { id: element })?;
        validate_property(target, key, &value)?;
        Ok(EditCommand::ModifyProperty {
            element,
            key,
            value,
            old: None,
            description: String::new(),
        })
    }

    /// Like [`CommandFactory::modify_property`] with a custom undo-menu label
    pub fn modify_property_described(
        chart: &StateChart,
        element: ElementId,
        key: PropertyKey,
        value: PropertyValue,
        description: impl Into<String>,
    ) -> Result<EditCommand> {
        let mut op = Self::modify_property(chart, element, key, value)?;
        if let EditCommand::ModifyProperty { description: slot, .. } = &mut op {
            *slot = description.into();
        }
        Ok(op)
    }

    /// Command that applies several property writes as one undo step
    pub fn modify_properties(chart: &StateChart, element: ElementId, values: Vec<(PropertyKey, PropertyValue)>) -> Result<EditCommand> {
        let target = chart.element(element).ok_or(ModelError::StaleReference { id: element })?;
        for (key, value) in &values {
            validate_property(target, *key, value)?;
        }
        Ok(EditCommand::ModifyProperties {
            element,
            values,
            old: Vec::new(),
        })
    }

    /// Label/flags edit; fill in the changes with [`EditCommand::set_label`]
    /// and [`EditCommand::set_flags`] before applying
    pub fn modify_element(chart: &StateChart, element: ElementId) -> Result<EditCommand> {
        if !chart.contains(element) {
            return Err(ModelError::StaleReference { id: element }.into());
        }
        Ok(EditCommand::ModifyElement {
            element,
            label: None,
            flags: None,
            old_label: None,
            old_flags: None,
        })
    }

    /// Endpoint rewiring; fill in the new endpoints with
    /// [`EditCommand::set_endpoints`] before applying
    pub fn modify_transition(chart: &StateChart, transition: ElementId) -> Result<EditCommand> {
        let target = chart.element(transition).ok_or(ModelError::StaleReference { id: transition })?;
        if !target.kind().is_transition() {
            return Err(ModelError::KindMismatch {
                id: transition,
                actual: target.kind(),
                expected: "transition",
            }
            .into());
        }
        Ok(EditCommand::ModifyTransition {
            transition,
            source: None,
            target: None,
            old_source: None,
            old_target: None,
        })
    }

    /// Subtree move; supply the drop target with
    /// [`EditCommand::set_new_parent`] before applying
    pub fn reparent_element(chart: &StateChart, element: ElementId) -> Result<EditCommand> {
        if !chart.contains(element) {
            return Err(ModelError::StaleReference { id: element }.into());
        }
        Ok(EditCommand::ReparentElement {
            element,
            new_parent: None,
            index: None,
            old_parent: None,
            old_index: 0,
        })
    }

    /// Command that swaps the whole chart for `chart`
    pub fn change_root(chart: StateChart) -> EditCommand {
        EditCommand::ChangeRoot { chart }
    }
}

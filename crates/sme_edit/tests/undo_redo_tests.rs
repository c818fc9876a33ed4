//! Tests for undo/redo stack behavior, atomic grouping and change
//! notification.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use sme_edit::{ChartEditState, ChartEvent, CommandFactory, ElementId, ElementKind, PropertyKey, PropertyValue, StateChart, UndoState};

/// Helper to build an edit state with a root machine and one child state
fn simple_state() -> (ChartEditState, ElementId, ElementId) {
    let mut chart = StateChart::new();
    let root = chart.create_root(ElementKind::StateMachine).unwrap();
    let a = chart.create_element(ElementKind::State, root).unwrap();
    (ChartEditState::from_chart(chart), root, a)
}

fn rename(state: &mut ChartEditState, element: ElementId, label: &str) {
    let op = CommandFactory::modify_property(state.get_chart(), element, PropertyKey::Label, PropertyValue::from(label)).unwrap();
    state.apply(op).unwrap();
}

// ============================================================================
// Stack Behavior
// ============================================================================

#[test]
fn test_undo_and_redo_on_empty_stacks_are_harmless() {
    let (mut state, ..) = simple_state();
    assert!(!state.can_undo());
    assert!(!state.can_redo());
    state.undo().unwrap();
    state.redo().unwrap();
    assert_eq!(state.undo_stack_len(), 0);
}

#[test]
fn test_fresh_command_invalidates_the_redo_branch() {
    let (mut state, _root, a) = simple_state();

    rename(&mut state, a, "first");
    state.undo().unwrap();
    assert!(state.can_redo());

    rename(&mut state, a, "second");
    assert!(!state.can_redo());
    assert_eq!(state.get_chart().element(a).unwrap().label, "second");
}

#[test]
fn test_undo_descriptions_name_the_command() {
    let (mut state, root, a) = simple_state();

    rename(&mut state, a, "first");
    assert_eq!(state.undo_description(), Some("Change label".to_string()));

    let op = CommandFactory::create_element(state.get_chart(), ElementKind::State, root).unwrap();
    state.apply(op).unwrap();
    assert_eq!(state.undo_description(), Some("Create state".to_string()));

    state.undo().unwrap();
    assert_eq!(state.redo_description(), Some("Create state".to_string()));
}

#[test]
fn test_interleaved_undo_redo_sequence() {
    let (mut state, _root, a) = simple_state();

    rename(&mut state, a, "one");
    rename(&mut state, a, "two");
    rename(&mut state, a, "three");
    assert_eq!(state.undo_stack_len(), 3);

    state.undo().unwrap();
    state.undo().unwrap();
    assert_eq!(state.get_chart().element(a).unwrap().label, "one");

    state.redo().unwrap();
    assert_eq!(state.get_chart().element(a).unwrap().label, "two");

    state.undo().unwrap();
    state.undo().unwrap();
    assert_eq!(state.get_chart().element(a).unwrap().label, "");
    assert!(!state.can_undo());
}

// ============================================================================
// Dirty Flag
// ============================================================================

#[test]
fn test_apply_and_undo_mark_the_document_dirty() {
    let (mut state, _root, a) = simple_state();
    assert!(!state.is_dirty());

    rename(&mut state, a, "named");
    assert!(state.is_dirty());

    state.set_is_dirty(false);
    state.undo().unwrap();
    assert!(state.is_dirty());
}

// ============================================================================
// Atomic Grouping
// ============================================================================

#[test]
fn test_atomic_guard_collapses_commands_into_one_step() {
    let (mut state, root, a) = simple_state();
    let before = state.get_chart().clone();

    let guard = state.begin_atomic_undo("Add labeled state");
    let op = CommandFactory::create_element(state.get_chart(), ElementKind::State, root).unwrap();
    state.apply(op).unwrap();
    rename(&mut state, a, "grouped");
    guard.end();

    assert_eq!(state.undo_stack_len(), 1);
    assert_eq!(state.undo_description(), Some("Add labeled state".to_string()));

    state.undo().unwrap();
    assert_eq!(*state.get_chart(), before);

    state.redo().unwrap();
    assert_eq!(state.get_chart().children_of(root).len(), 2);
    assert_eq!(state.get_chart().element(a).unwrap().label, "grouped");
}

#[test]
fn test_atomic_guard_closes_on_drop() {
    let (mut state, _root, a) = simple_state();
    {
        let _guard = state.begin_atomic_undo("Rename twice");
        rename(&mut state, a, "one");
        rename(&mut state, a, "two");
    }
    assert_eq!(state.undo_stack_len(), 1);

    state.undo().unwrap();
    assert_eq!(state.get_chart().element(a).unwrap().label, "");
}

#[test]
fn test_atomic_guard_with_one_command_keeps_it_unwrapped() {
    let (mut state, _root, a) = simple_state();
    let guard = state.begin_atomic_undo("Group of one");
    rename(&mut state, a, "solo");
    guard.end();

    assert_eq!(state.undo_stack_len(), 1);
    assert_eq!(state.undo_description(), Some("Change label".to_string()));
}

#[test]
fn test_atomic_guard_with_no_commands_pushes_nothing() {
    let (mut state, ..) = simple_state();
    let guard = state.begin_atomic_undo("Nothing happened");
    guard.end();
    assert_eq!(state.undo_stack_len(), 0);
}

#[test]
fn test_atomic_guard_discard_forgets_the_group() {
    let (mut state, _root, a) = simple_state();
    rename(&mut state, a, "kept");

    let guard = state.begin_atomic_undo("Abandoned gesture");
    rename(&mut state, a, "discarded");
    guard.discard();

    // the commands are forgotten, not reverted
    assert_eq!(state.undo_stack_len(), 1);
    assert_eq!(state.get_chart().element(a).unwrap().label, "discarded");
    assert_eq!(state.undo_description(), Some("Change label".to_string()));
}

// ============================================================================
// Failure Containment
// ============================================================================

#[test]
fn test_failed_undo_keeps_the_command_on_the_undo_stack() {
    let (mut state, _root, a) = simple_state();
    rename(&mut state, a, "named");

    // the target vanishes behind the undo stack's back
    state.get_chart_mut().remove_subtree(a).unwrap();

    assert!(state.undo().is_err());
    assert!(!state.can_redo());
    assert!(state.can_undo());
    assert_eq!(state.undo_description(), Some("Change label".to_string()));
}

#[test]
fn test_failed_undo_preserves_the_captured_prior_value() {
    let (mut state, _root, a) = simple_state();
    rename(&mut state, a, "named");

    let detached = state.get_chart_mut().remove_subtree(a).unwrap();
    assert!(state.undo().is_err());

    // once the element is back, the same undo succeeds with the original value
    state.get_chart_mut().reinsert_subtree(detached).unwrap();
    state.undo().unwrap();
    assert_eq!(state.get_chart().element(a).unwrap().label, "");
    assert!(state.can_redo());
}

#[test]
fn test_failed_redo_keeps_the_command_on_the_redo_stack() {
    let (mut state, _root, a) = simple_state();
    rename(&mut state, a, "named");
    state.undo().unwrap();

    let detached = state.get_chart_mut().remove_subtree(a).unwrap();
    assert!(state.redo().is_err());
    assert!(state.can_redo());
    assert!(!state.can_undo());

    state.get_chart_mut().reinsert_subtree(detached).unwrap();
    state.redo().unwrap();
    assert_eq!(state.get_chart().element(a).unwrap().label, "named");
}

#[test]
fn test_failed_undo_of_a_delete_keeps_the_subtree() {
    let (mut state, root, a) = simple_state();
    let op = CommandFactory::delete_element(state.get_chart(), a).unwrap();
    state.apply(op).unwrap();

    // block the reinsertion point, then clear it again
    let blocker = state.get_chart_mut().remove_subtree(root).unwrap();
    assert!(state.undo().is_err());
    state.get_chart_mut().reinsert_subtree(blocker).unwrap();

    state.undo().unwrap();
    assert!(state.get_chart().contains(a));
    assert_eq!(state.get_chart().children_of(root), &[a]);
}

#[test]
fn test_atomic_undo_failure_rolls_the_group_forward() {
    let (mut state, root, a) = simple_state();
    let b = state.get_chart_mut().create_element(ElementKind::State, root).unwrap();

    {
        let _guard = state.begin_atomic_undo("Rename and delete");
        rename(&mut state, a, "renamed");
        let op = CommandFactory::delete_element(state.get_chart(), b).unwrap();
        state.apply(op).unwrap();
    }
    assert_eq!(state.undo_stack_len(), 1);

    // a vanishes behind the stack's back, so undoing the group fails midway
    state.get_chart_mut().remove_subtree(a).unwrap();
    assert!(state.undo().is_err());

    // the already-undone deletion was re-executed: the group holds together
    assert!(!state.get_chart().contains(b));
    assert!(state.can_undo());
    assert!(!state.can_redo());
}

// ============================================================================
// Change Notification
// ============================================================================

fn recording_state() -> (ChartEditState, ElementId, ElementId, Rc<RefCell<Vec<ChartEvent>>>) {
    let (mut state, root, a) = simple_state();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    state.add_listener(Box::new(move |event| sink.borrow_mut().push(event.clone())));
    (state, root, a, events)
}

#[test]
fn test_apply_notifies_listeners() {
    let (mut state, root, _a, events) = recording_state();

    let op = CommandFactory::create_element(state.get_chart(), ElementKind::State, root).unwrap();
    state.apply(op).unwrap();
    let created = *state.get_chart().children_of(root).last().unwrap();

    assert_eq!(
        events.borrow().as_slice(),
        &[ChartEvent::ElementCreated {
            id: created,
            parent: Some(root)
        }]
    );
}

#[test]
fn test_undo_notifies_the_reverse_event() {
    let (mut state, _root, a, events) = recording_state();

    rename(&mut state, a, "named");
    state.undo().unwrap();

    let expected = ChartEvent::PropertyChanged { id: a, key: PropertyKey::Label };
    assert_eq!(events.borrow().as_slice(), &[expected.clone(), expected]);
}

#[test]
fn test_reparent_events_swap_parents_on_undo() {
    let (mut state, root, a, events) = recording_state();
    let b = state.get_chart_mut().create_element(ElementKind::State, a).unwrap();

    let mut op = CommandFactory::reparent_element(state.get_chart(), b).unwrap();
    op.set_new_parent(root, None);
    state.apply(op).unwrap();
    state.undo().unwrap();

    assert_eq!(
        events.borrow().as_slice(),
        &[
            ChartEvent::ElementReparented {
                id: b,
                old_parent: Some(a),
                new_parent: Some(root),
            },
            ChartEvent::ElementReparented {
                id: b,
                old_parent: Some(root),
                new_parent: Some(a),
            },
        ]
    );
}

#[test]
fn test_failed_apply_emits_nothing() {
    let (mut state, _root, a, events) = recording_state();

    let op = CommandFactory::reparent_element(state.get_chart(), a).unwrap();
    assert!(state.apply(op).is_err());
    assert!(events.borrow().is_empty());
}

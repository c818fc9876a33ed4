//! Tests for the edit commands: every command must restore the chart exactly
//! on undo, including element ids, child order and transition endpoints.

use pretty_assertions::assert_eq;
use sme_edit::{
    ChartEditState, CommandFactory, EditError, ElementFlags, ElementId, ElementKind, Endpoint, ModelError, PropertyKey, PropertyValue, StateChart, UndoState,
};

/// Helper to build an edit state over the canonical sample chart:
/// root machine > state A > (state B, transition T: B -> A)
fn sample_state() -> (ChartEditState, ElementId, ElementId, ElementId, ElementId) {
    let mut chart = StateChart::new();
    let root = chart.create_root(ElementKind::StateMachine).unwrap();
    let a = chart.create_element(ElementKind::State, root).unwrap();
    let b = chart.create_element(ElementKind::State, a).unwrap();
    let t = chart.create_element(ElementKind::Transition, a).unwrap();
    chart.set_transition_endpoint(t, Endpoint::Source, Some(b)).unwrap();
    chart.set_transition_endpoint(t, Endpoint::Target, Some(a)).unwrap();
    (ChartEditState::from_chart(chart), root, a, b, t)
}

// ============================================================================
// Create Element
// ============================================================================

#[test]
fn test_create_element_round_trip() {
    let (mut state, root, ..) = sample_state();
    let before = state.get_chart().clone();

    let op = CommandFactory::create_element(state.get_chart(), ElementKind::State, root).unwrap();
    state.apply(op).unwrap();
    let after = state.get_chart().clone();
    assert_eq!(state.get_chart().children_of(root).len(), 2);

    state.undo().unwrap();
    assert_eq!(*state.get_chart(), before);

    state.redo().unwrap();
    assert_eq!(*state.get_chart(), after);
}

#[test]
fn test_create_keeps_the_same_id_across_redo() {
    let (mut state, root, ..) = sample_state();

    let op = CommandFactory::create_element(state.get_chart(), ElementKind::FinalState, root).unwrap();
    state.apply(op).unwrap();
    let created = *state.get_chart().children_of(root).last().unwrap();

    state.undo().unwrap();
    assert!(!state.get_chart().contains(created));

    state.redo().unwrap();
    assert!(state.get_chart().contains(created));
    assert_eq!(state.get_chart().element(created).unwrap().kind(), ElementKind::FinalState);
}

#[test]
fn test_create_under_transition_is_rejected_at_construction() {
    let (state, _root, _a, _b, t) = sample_state();
    let err = CommandFactory::create_element(state.get_chart(), ElementKind::State, t).unwrap_err();
    assert!(matches!(err, EditError::Model(ModelError::KindMismatch { .. })));
}

#[test]
fn test_create_under_stale_parent_is_rejected() {
    let (mut state, _root, a, ..) = sample_state();
    let op = CommandFactory::delete_element(state.get_chart(), a).unwrap();
    state.apply(op).unwrap();

    let err = CommandFactory::create_element(state.get_chart(), ElementKind::State, a).unwrap_err();
    assert_eq!(err, EditError::Model(ModelError::StaleReference { id: a }));
}

// ============================================================================
// Delete Element
// ============================================================================

#[test]
fn test_delete_subtree_round_trip() {
    let (mut state, root, a, ..) = sample_state();
    let before = state.get_chart().clone();

    let op = CommandFactory::delete_element(state.get_chart(), a).unwrap();
    state.apply(op).unwrap();
    assert_eq!(state.get_chart().len(), 1);
    assert!(state.get_chart().children_of(root).is_empty());

    state.undo().unwrap();
    assert_eq!(*state.get_chart(), before);
}

#[test]
fn test_delete_restores_cleared_endpoints_on_undo() {
    let (mut state, _root, _a, b, t) = sample_state();

    // deleting B clears T's source, which referenced it
    let op = CommandFactory::delete_element(state.get_chart(), b).unwrap();
    state.apply(op).unwrap();
    assert_eq!(state.get_chart().element(t).unwrap().source(), None);

    state.undo().unwrap();
    assert_eq!(state.get_chart().element(t).unwrap().source(), Some(b));
}

#[test]
fn test_delete_root_and_undo() {
    let (mut state, root, ..) = sample_state();
    let before = state.get_chart().clone();

    let op = CommandFactory::delete_element(state.get_chart(), root).unwrap();
    state.apply(op).unwrap();
    assert!(state.get_chart().is_empty());
    assert_eq!(state.get_chart().root(), None);

    state.undo().unwrap();
    assert_eq!(*state.get_chart(), before);
    assert_eq!(state.get_chart().root(), Some(root));
}

// ============================================================================
// Modify Property
// ============================================================================

#[test]
fn test_modify_label_round_trip() {
    let (mut state, _root, a, ..) = sample_state();

    let op = CommandFactory::modify_property(state.get_chart(), a, PropertyKey::Label, PropertyValue::from("Running")).unwrap();
    state.apply(op).unwrap();
    assert_eq!(state.get_chart().element(a).unwrap().label, "Running");

    state.undo().unwrap();
    assert_eq!(state.get_chart().element(a).unwrap().label, "");

    state.redo().unwrap();
    assert_eq!(state.get_chart().element(a).unwrap().label, "Running");
}

#[test]
fn test_modify_guard_applies_only_to_transitions() {
    let (state, _root, a, _b, t) = sample_state();

    let err = CommandFactory::modify_property(state.get_chart(), a, PropertyKey::Guard, PropertyValue::from("x > 0")).unwrap_err();
    assert!(matches!(err, EditError::Model(ModelError::PropertyNotApplicable { .. })));

    assert!(CommandFactory::modify_property(state.get_chart(), t, PropertyKey::Guard, PropertyValue::from("x > 0")).is_ok());
}

#[test]
fn test_modify_property_rejects_wrong_value_shape() {
    let (state, _root, a, ..) = sample_state();
    let err = CommandFactory::modify_property(state.get_chart(), a, PropertyKey::Label, PropertyValue::Millis(5)).unwrap_err();
    assert!(matches!(err, EditError::Model(ModelError::PropertyTypeMismatch { .. })));
}

#[test]
fn test_modify_properties_batch_is_one_undo_step() {
    let (mut state, _root, _a, _b, t) = sample_state();
    let before = state.get_chart().clone();

    let op = CommandFactory::modify_properties(
        state.get_chart(),
        t,
        vec![
            (PropertyKey::Guard, PropertyValue::from("armed")),
            (PropertyKey::Signal, PropertyValue::from("fire")),
        ],
    )
    .unwrap();
    state.apply(op).unwrap();
    assert_eq!(state.undo_stack_len(), 1);
    assert_eq!(state.get_chart().property(t, PropertyKey::Guard), Some(PropertyValue::from("armed")));
    assert_eq!(state.get_chart().property(t, PropertyKey::Signal), Some(PropertyValue::from("fire")));

    state.undo().unwrap();
    assert_eq!(*state.get_chart(), before);
}

// ============================================================================
// Modify Element
// ============================================================================

#[test]
fn test_modify_element_label_and_flags() {
    let (mut state, _root, a, ..) = sample_state();
    let before = state.get_chart().clone();

    let mut op = CommandFactory::modify_element(state.get_chart(), a).unwrap();
    op.set_label("Idle");
    op.set_flags(ElementFlags::SELECTABLE);
    state.apply(op).unwrap();
    assert_eq!(state.get_chart().element(a).unwrap().label, "Idle");
    assert_eq!(state.get_chart().element(a).unwrap().flags, ElementFlags::SELECTABLE);

    state.undo().unwrap();
    assert_eq!(*state.get_chart(), before);
}

// ============================================================================
// Modify Transition
// ============================================================================

#[test]
fn test_rewire_transition_round_trip() {
    let (mut state, _root, a, b, t) = sample_state();
    let before = state.get_chart().clone();

    let mut op = CommandFactory::modify_transition(state.get_chart(), t).unwrap();
    op.set_endpoints(Some(a), Some(b));
    state.apply(op).unwrap();
    assert_eq!(state.get_chart().element(t).unwrap().source(), Some(a));
    assert_eq!(state.get_chart().element(t).unwrap().target(), Some(b));

    state.undo().unwrap();
    assert_eq!(*state.get_chart(), before);
}

#[test]
fn test_rewire_rejects_non_transition_targets() {
    let (state, _root, a, ..) = sample_state();
    let err = CommandFactory::modify_transition(state.get_chart(), a).unwrap_err();
    assert!(matches!(err, EditError::Model(ModelError::KindMismatch { .. })));
}

#[test]
fn test_rewire_to_a_transition_endpoint_fails_and_leaves_chart_unchanged() {
    let (mut state, _root, _a, _b, t) = sample_state();
    let before = state.get_chart().clone();

    let mut op = CommandFactory::modify_transition(state.get_chart(), t).unwrap();
    // a transition cannot be the source of another transition
    op.set_endpoints(Some(t), None);
    let err = state.apply(op).unwrap_err();
    assert!(matches!(err, EditError::Model(ModelError::KindMismatch { .. })));
    assert_eq!(*state.get_chart(), before);
    assert_eq!(state.undo_stack_len(), 0);
}

// ============================================================================
// Reparent Element
// ============================================================================

#[test]
fn test_reparent_moves_subtree_and_undoes_to_old_position() {
    let (mut state, root, a, b, _t) = sample_state();
    let before = state.get_chart().clone();

    let mut op = CommandFactory::reparent_element(state.get_chart(), b).unwrap();
    op.set_new_parent(root, None);
    state.apply(op).unwrap();
    assert_eq!(state.get_chart().parent_of(b), Some(root));
    assert_eq!(state.get_chart().children_of(root), &[a, b]);

    state.undo().unwrap();
    assert_eq!(*state.get_chart(), before);
    assert_eq!(state.get_chart().children_of(a)[0], b);
}

#[test]
fn test_reparent_under_own_descendant_fails_cleanly() {
    let (mut state, _root, a, b, _t) = sample_state();
    let before = state.get_chart().clone();

    let mut op = CommandFactory::reparent_element(state.get_chart(), a).unwrap();
    op.set_new_parent(b, None);
    let err = state.apply(op).unwrap_err();
    assert!(matches!(err, EditError::Model(ModelError::StructuralViolation { .. })));
    assert_eq!(*state.get_chart(), before);
    assert_eq!(state.undo_stack_len(), 0);
}

#[test]
fn test_reparent_without_a_target_is_incomplete() {
    let (mut state, _root, _a, b, _t) = sample_state();
    let op = CommandFactory::reparent_element(state.get_chart(), b).unwrap();
    let err = state.apply(op).unwrap_err();
    assert_eq!(err, EditError::IncompleteCommand("reparent target"));
}

// ============================================================================
// Change Root
// ============================================================================

#[test]
fn test_change_root_swaps_the_whole_chart() {
    let (mut state, ..) = sample_state();
    let before = state.get_chart().clone();

    let mut replacement = StateChart::new();
    replacement.create_root(ElementKind::StateMachine).unwrap();
    let expected = replacement.clone();

    state.apply(CommandFactory::change_root(replacement)).unwrap();
    assert_eq!(*state.get_chart(), expected);

    state.undo().unwrap();
    assert_eq!(*state.get_chart(), before);

    state.redo().unwrap();
    assert_eq!(*state.get_chart(), expected);
}

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    read_property, write_plain_property, Element, ElementId, ElementKind, Endpoint, ModelError, PropertyKey, PropertyValue, Result, Traversal, TreeWalker,
    VisitResult,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Node {
    element: Element,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// The state-chart tree: an arena addressed by stable [`ElementId`]s.
///
/// Parent/child links are maintained by the container itself. There is a
/// single root, every other node has exactly one parent, and child order is
/// part of the observable state. All mutations check their preconditions
/// first; a returned error means the tree is untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateChart {
    nodes: HashMap<ElementId, Node>,
    root: Option<ElementId>,
    next_id: u64,
}

// The id counter is not observable state: a chart that went through an
// edit-and-undo cycle still compares equal to its former self.
impl PartialEq for StateChart {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.nodes == other.nodes
    }
}

/// A subtree removed from a chart, with everything needed to put it back
/// exactly where it was: the nodes (same ids, same child order), the old
/// attachment point, and the transition endpoints outside the subtree that
/// were cleared because they referenced a removed state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetachedSubtree {
    root: ElementId,
    parent: Option<ElementId>,
    index: usize,
    nodes: Vec<(ElementId, Node)>,
    cleared: Vec<ClearedEndpoint>,
}

impl DetachedSubtree {
    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Record of a transition endpoint cleared during a subtree removal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearedEndpoint {
    pub transition: ElementId,
    pub endpoint: Endpoint,
    pub state: ElementId,
}

impl StateChart {
    pub fn new() -> Self {
        StateChart::default()
    }

    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(&id).map(|node| &node.element)
    }

    /// Mutable element access. Labels and flags may be edited directly;
    /// endpoints stay behind [`StateChart::set_transition_endpoint`].
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.nodes.get_mut(&id).map(|node| &mut node.element)
    }

    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    pub fn children_of(&self, id: ElementId) -> &[ElementId] {
        self.nodes.get(&id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// The element's parent and its position among that parent's children.
    pub fn position_in_parent(&self, id: ElementId) -> Option<(ElementId, usize)> {
        let parent = self.parent_of(id)?;
        let index = self.children_of(parent).iter().position(|child| *child == id)?;
        Some((parent, index))
    }

    /// Whether `id` lies strictly inside the subtree rooted at `ancestor`.
    pub fn is_descendant_of(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent_of(parent);
        }
        false
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create the tree root. Fails if a root already exists or `kind` is not
    /// a state kind.
    pub fn create_root(&mut self, kind: ElementKind) -> Result<ElementId> {
        if let Some(root) = self.root {
            return Err(ModelError::structural(format!("chart already has root {root}")));
        }
        if !kind.is_state() {
            return Err(ModelError::structural(format!("a {kind} cannot be the tree root")));
        }
        let id = self.alloc();
        self.nodes.insert(
            id,
            Node {
                element: Element::new(kind),
                parent: None,
                children: Vec::new(),
            },
        );
        self.root = Some(id);
        Ok(id)
    }

    /// Create a new element as the last child of `parent`.
    pub fn create_element(&mut self, kind: ElementKind, parent: ElementId) -> Result<ElementId> {
        let parent_kind = self.require(parent)?.element.kind();
        if !parent_kind.is_state() {
            return Err(ModelError::KindMismatch {
                id: parent,
                actual: parent_kind,
                expected: "state",
            });
        }
        let id = self.alloc();
        self.nodes.insert(
            id,
            Node {
                element: Element::new(kind),
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------------

    /// Remove `id` and its whole subtree.
    ///
    /// Transition endpoints elsewhere in the tree that pointed into the
    /// removed subtree are cleared, so no back-reference resolves to a gone
    /// element. The returned [`DetachedSubtree`] reinserts everything
    /// identically via [`StateChart::reinsert_subtree`].
    pub fn remove_subtree(&mut self, id: ElementId) -> Result<DetachedSubtree> {
        self.require(id)?;
        let subtree_ids = self.collect_subtree(id);
        let removed: HashSet<ElementId> = subtree_ids.iter().copied().collect();

        let parent = self.parent_of(id);
        let index = match parent {
            Some(parent_id) => {
                let position = match self.children_of(parent_id).iter().position(|child| *child == id) {
                    Some(position) => position,
                    None => {
                        // a node's parent must list it as a child
                        debug_assert!(false, "parent {parent_id} does not list {id} as a child");
                        log::warn!("remove_subtree: parent {parent_id} does not list {id} as a child");
                        0
                    }
                };
                if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                    if position < parent_node.children.len() {
                        parent_node.children.remove(position);
                    }
                }
                position
            }
            None => {
                self.root = None;
                0
            }
        };

        let mut nodes = Vec::with_capacity(subtree_ids.len());
        for subtree_id in subtree_ids {
            if let Some(node) = self.nodes.remove(&subtree_id) {
                nodes.push((subtree_id, node));
            }
        }

        // Deterministic pre-order scan of what is left for dangling endpoints.
        let mut dangling = Vec::new();
        self.walk(Traversal::PreOrder, &mut |remaining| {
            if let Some(element) = self.element(remaining) {
                for endpoint in [Endpoint::Source, Endpoint::Target] {
                    if let Some(state) = element.endpoint(endpoint) {
                        if removed.contains(&state) {
                            dangling.push(ClearedEndpoint {
                                transition: remaining,
                                endpoint,
                                state,
                            });
                        }
                    }
                }
            }
            VisitResult::Recurse
        });
        for entry in &dangling {
            if let Some(element) = self.element_mut(entry.transition) {
                element.set_endpoint_raw(entry.endpoint, None);
            }
        }

        Ok(DetachedSubtree {
            root: id,
            parent,
            index,
            nodes,
            cleared: dangling,
        })
    }

    /// Exact inverse of [`StateChart::remove_subtree`].
    pub fn reinsert_subtree(&mut self, detached: DetachedSubtree) -> Result<()> {
        let DetachedSubtree {
            root,
            parent,
            index,
            nodes,
            cleared,
        } = detached;

        for (id, _) in &nodes {
            if self.nodes.contains_key(id) {
                return Err(ModelError::structural(format!("element {id} is already part of the tree")));
            }
        }
        match parent {
            Some(parent_id) => {
                let parent_kind = self.require(parent_id)?.element.kind();
                if !parent_kind.is_state() {
                    return Err(ModelError::KindMismatch {
                        id: parent_id,
                        actual: parent_kind,
                        expected: "state",
                    });
                }
            }
            None => {
                if let Some(existing) = self.root {
                    return Err(ModelError::structural(format!("chart already has root {existing}")));
                }
            }
        }

        for (id, node) in nodes {
            self.nodes.insert(id, node);
        }
        match parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                    let position = index.min(parent_node.children.len());
                    parent_node.children.insert(position, root);
                }
            }
            None => self.root = Some(root),
        }

        for entry in cleared {
            if let Some(element) = self.element_mut(entry.transition) {
                element.set_endpoint_raw(entry.endpoint, Some(entry.state));
            } else {
                log::warn!("reinsert_subtree: transition {} vanished, endpoint not restored", entry.transition);
            }
        }
        Ok(())
    }

    /// Move `id` (with its subtree) under `new_parent`, at `index` among its
    /// children (appended when `None`).
    ///
    /// Atomic: either the element is detached and reattached, or the tree is
    /// unchanged. Reparenting an element under itself is a no-op; under one
    /// of its own descendants it fails with a structural violation.
    pub fn reparent(&mut self, id: ElementId, new_parent: ElementId, index: Option<usize>) -> Result<()> {
        self.require(id)?;
        let parent_kind = self.require(new_parent)?.element.kind();
        if id == new_parent {
            return Ok(());
        }
        if !parent_kind.is_state() {
            return Err(ModelError::KindMismatch {
                id: new_parent,
                actual: parent_kind,
                expected: "state",
            });
        }
        if self.root == Some(id) {
            return Err(ModelError::structural(format!("cannot reparent the root {id}")));
        }
        if self.is_descendant_of(new_parent, id) {
            return Err(ModelError::structural(format!("{new_parent} is a descendant of {id}")));
        }

        if let Some((old_parent, old_index)) = self.position_in_parent(id) {
            if let Some(parent_node) = self.nodes.get_mut(&old_parent) {
                parent_node.children.remove(old_index);
            }
        }
        if let Some(parent_node) = self.nodes.get_mut(&new_parent) {
            let position = index.unwrap_or(parent_node.children.len()).min(parent_node.children.len());
            parent_node.children.insert(position, id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(new_parent);
        }
        Ok(())
    }

    /// Replace the whole tree, returning the previous one.
    pub fn replace(&mut self, new: StateChart) -> StateChart {
        std::mem::replace(self, new)
    }

    // ------------------------------------------------------------------
    // Properties and endpoints
    // ------------------------------------------------------------------

    /// Rewire one endpoint of a transition, returning the prior reference.
    /// The new state, when given, must be a state in this tree.
    pub fn set_transition_endpoint(&mut self, transition: ElementId, endpoint: Endpoint, state: Option<ElementId>) -> Result<Option<ElementId>> {
        let transition_kind = self.require(transition)?.element.kind();
        if !transition_kind.is_transition() {
            return Err(ModelError::KindMismatch {
                id: transition,
                actual: transition_kind,
                expected: "transition",
            });
        }
        if let Some(state_id) = state {
            let state_kind = self.require(state_id)?.element.kind();
            if !state_kind.is_state() {
                return Err(ModelError::KindMismatch {
                    id: state_id,
                    actual: state_kind,
                    expected: "state",
                });
            }
        }
        let old = self
            .nodes
            .get_mut(&transition)
            .map(|node| node.element.set_endpoint_raw(endpoint, state))
            .unwrap_or(None);
        Ok(old)
    }

    /// Set a single typed property, returning the prior value for reversal.
    pub fn set_property(&mut self, id: ElementId, key: PropertyKey, value: PropertyValue) -> Result<PropertyValue> {
        match key {
            PropertyKey::SourceState | PropertyKey::TargetState => {
                let PropertyValue::ElementRef(state) = value else {
                    return Err(ModelError::PropertyTypeMismatch { key, shape: value.shape() });
                };
                let endpoint = if key == PropertyKey::SourceState { Endpoint::Source } else { Endpoint::Target };
                let old = self.set_transition_endpoint(id, endpoint, state)?;
                Ok(PropertyValue::ElementRef(old))
            }
            _ => {
                let node = self.nodes.get_mut(&id).ok_or(ModelError::StaleReference { id })?;
                write_plain_property(&mut node.element, key, value)
            }
        }
    }

    /// Read a property. `None` when the id is stale or the key does not
    /// apply to the element's kind.
    pub fn property(&self, id: ElementId, key: PropertyKey) -> Option<PropertyValue> {
        self.element(id).and_then(|element| read_property(element, key))
    }

    // ------------------------------------------------------------------
    // Traversal and queries
    // ------------------------------------------------------------------

    /// Walk the whole tree from the root.
    pub fn walk<V: FnMut(ElementId) -> VisitResult>(&self, traversal: Traversal, visit: &mut V) -> bool {
        TreeWalker::new(traversal).walk_items(self.root, &|id| self.child_list(id), visit)
    }

    /// Walk the subtree rooted at `start` (including `start`).
    pub fn walk_from<V: FnMut(ElementId) -> VisitResult>(&self, traversal: Traversal, start: ElementId, visit: &mut V) -> bool {
        let start = self.contains(start).then_some(start);
        TreeWalker::new(traversal).walk_items(start, &|id| self.child_list(id), visit)
    }

    /// Walk all descendants of the root, excluding the root itself.
    pub fn walk_children<V: FnMut(ElementId) -> VisitResult>(&self, traversal: Traversal, visit: &mut V) -> bool {
        TreeWalker::new(traversal).walk_children(self.root, &|id| self.child_list(id), visit)
    }

    /// First element (pre-order) whose label matches exactly.
    pub fn find_by_label(&self, label: &str) -> Option<ElementId> {
        let mut found = None;
        self.walk(Traversal::PreOrder, &mut |id| {
            match self.element(id) {
                Some(element) if element.label == label => {
                    found = Some(id);
                    VisitResult::Stop
                }
                _ => VisitResult::Recurse,
            }
        });
        found
    }

    /// All transitions in the subtree rooted at `id`, in pre-order.
    pub fn transitions_in_subtree(&self, id: ElementId) -> Vec<ElementId> {
        let mut transitions = Vec::new();
        self.walk_from(Traversal::PreOrder, id, &mut |candidate| {
            if let Some(element) = self.element(candidate) {
                if element.kind().is_transition() {
                    transitions.push(candidate);
                }
            }
            VisitResult::Recurse
        });
        transitions
    }

    /// Subtree ids in pre-order, starting with `id` itself.
    pub fn collect_subtree(&self, id: ElementId) -> Vec<ElementId> {
        let mut ids = Vec::new();
        self.walk_from(Traversal::PreOrder, id, &mut |subtree_id| {
            ids.push(subtree_id);
            VisitResult::Recurse
        });
        ids
    }

    // ------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------

    fn alloc(&mut self) -> ElementId {
        let id = ElementId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn require(&self, id: ElementId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(ModelError::StaleReference { id })
    }

    fn child_list(&self, id: ElementId) -> Vec<ElementId> {
        self.children_of(id).to_vec()
    }
}

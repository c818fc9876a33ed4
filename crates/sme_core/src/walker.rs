//! Generic depth-first tree traversal
//!
//! Works over any ownership tree: the walker only needs a "children of item"
//! accessor, nothing about the concrete node type. Each walk is independent;
//! the walker itself only stores the traversal order.

/// Outcome of visiting one node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisitResult {
    /// Skip this node's children and continue with the next sibling
    Continue,
    /// Descend into this node's children
    Recurse,
    /// Abort the entire walk
    Stop,
}

/// Traversal order, fixed at walker construction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Traversal {
    /// Visit a node before its children
    #[default]
    PreOrder,
    /// Visit a node after its children. Children are always descended into
    /// (their parent's visit outcome is not known yet); only [`VisitResult::Stop`]
    /// changes the flow.
    PostOrder,
}

/// Depth-first walker over a tree of `T`.
///
/// Children are visited in exactly the order the accessor returns them. The
/// walker assumes an ownership tree: no cycles, no node under two parents.
#[derive(Copy, Clone, Debug, Default)]
pub struct TreeWalker {
    traversal: Traversal,
}

impl TreeWalker {
    pub fn new(traversal: Traversal) -> Self {
        TreeWalker { traversal }
    }

    pub fn pre_order() -> Self {
        TreeWalker::new(Traversal::PreOrder)
    }

    pub fn post_order() -> Self {
        TreeWalker::new(Traversal::PostOrder)
    }

    pub fn traversal(&self) -> Traversal {
        self.traversal
    }

    /// Walk `item` and all of its descendants.
    ///
    /// Returns `true` when the walk ran to completion, `false` when it was
    /// aborted by [`VisitResult::Stop`] or when `item` is `None`.
    pub fn walk_items<T, C, V>(&self, item: Option<T>, children: &C, visit: &mut V) -> bool
    where
        T: Copy,
        C: Fn(T) -> Vec<T>,
        V: FnMut(T) -> VisitResult,
    {
        let Some(item) = item else {
            return false;
        };
        self.walk_node(item, children, visit)
    }

    /// Same as [`TreeWalker::walk_items`], but never visits `item` itself.
    pub fn walk_children<T, C, V>(&self, item: Option<T>, children: &C, visit: &mut V) -> bool
    where
        T: Copy,
        C: Fn(T) -> Vec<T>,
        V: FnMut(T) -> VisitResult,
    {
        let Some(item) = item else {
            return false;
        };
        for child in children(item) {
            if !self.walk_node(child, children, visit) {
                return false;
            }
        }
        true
    }

    /// Fallible form of [`TreeWalker::walk_items`]: an error returned by the
    /// visit closure aborts the walk and propagates unmodified.
    pub fn try_walk_items<T, C, V, E>(&self, item: Option<T>, children: &C, visit: &mut V) -> Result<bool, E>
    where
        T: Copy,
        C: Fn(T) -> Vec<T>,
        V: FnMut(T) -> Result<VisitResult, E>,
    {
        let Some(item) = item else {
            return Ok(false);
        };
        self.try_walk_node(item, children, visit)
    }

    /// Fallible form of [`TreeWalker::walk_children`].
    pub fn try_walk_children<T, C, V, E>(&self, item: Option<T>, children: &C, visit: &mut V) -> Result<bool, E>
    where
        T: Copy,
        C: Fn(T) -> Vec<T>,
        V: FnMut(T) -> Result<VisitResult, E>,
    {
        let Some(item) = item else {
            return Ok(false);
        };
        for child in children(item) {
            if !self.try_walk_node(child, children, visit)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn walk_node<T, C, V>(&self, item: T, children: &C, visit: &mut V) -> bool
    where
        T: Copy,
        C: Fn(T) -> Vec<T>,
        V: FnMut(T) -> VisitResult,
    {
        match self.traversal {
            Traversal::PreOrder => match visit(item) {
                VisitResult::Stop => false,
                VisitResult::Continue => true,
                VisitResult::Recurse => {
                    for child in children(item) {
                        if !self.walk_node(child, children, visit) {
                            return false;
                        }
                    }
                    true
                }
            },
            Traversal::PostOrder => {
                for child in children(item) {
                    if !self.walk_node(child, children, visit) {
                        return false;
                    }
                }
                visit(item) != VisitResult::Stop
            }
        }
    }

    fn try_walk_node<T, C, V, E>(&self, item: T, children: &C, visit: &mut V) -> Result<bool, E>
    where
        T: Copy,
        C: Fn(T) -> Vec<T>,
        V: FnMut(T) -> Result<VisitResult, E>,
    {
        match self.traversal {
            Traversal::PreOrder => match visit(item)? {
                VisitResult::Stop => Ok(false),
                VisitResult::Continue => Ok(true),
                VisitResult::Recurse => {
                    for child in children(item) {
                        if !self.try_walk_node(child, children, visit)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
            },
            Traversal::PostOrder => {
                for child in children(item) {
                    if !self.try_walk_node(child, children, visit)? {
                        return Ok(false);
                    }
                }
                Ok(visit(item)? != VisitResult::Stop)
            }
        }
    }
}

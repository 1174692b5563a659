//! Fiber records and the arena that owns them.
//!
//! Both the committed tree and the work-in-progress tree live in one
//! [`FiberArena`]. Tree links (`parent`, `child`, `sibling`) and the
//! cross-tree `alternate` link are plain indices; the arena owns every
//! fiber and releases a whole tree once it has been replaced.

use std::fmt;
use std::rc::Rc;

use crate::element::{ComponentFn, ElementType, Props};
use crate::hooks::HookRecord;
use crate::host::{NodeId, NodeKind};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FiberId(usize);

impl fmt::Debug for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectTag {
    Placement,
    Update,
    Deletion,
}

#[derive(Clone)]
pub(crate) enum FiberKind {
    /// The fiber wrapping a render container. Its host node is the container.
    Root,
    Host(Rc<str>),
    Text,
    Component(ComponentFn),
}

impl FiberKind {
    pub(crate) fn from_element(kind: &ElementType) -> Self {
        match kind {
            ElementType::Host(tag) => FiberKind::Host(Rc::clone(tag)),
            ElementType::Component(render) => FiberKind::Component(*render),
            ElementType::Text => FiberKind::Text,
        }
    }

    /// Same type as the descriptor: the only test the positional diff uses.
    pub(crate) fn matches(&self, kind: &ElementType) -> bool {
        match (self, kind) {
            (FiberKind::Host(a), ElementType::Host(b)) => a == b,
            (FiberKind::Component(a), ElementType::Component(b)) => *a as usize == *b as usize,
            (FiberKind::Text, ElementType::Text) => true,
            _ => false,
        }
    }

    pub(crate) fn node_kind(&self) -> Option<NodeKind> {
        match self {
            FiberKind::Host(tag) => Some(NodeKind::Element(Rc::clone(tag))),
            FiberKind::Text => Some(NodeKind::Text),
            FiberKind::Root | FiberKind::Component(_) => None,
        }
    }
}

impl fmt::Debug for FiberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiberKind::Root => f.write_str("Root"),
            FiberKind::Host(tag) => write!(f, "<{tag}>"),
            FiberKind::Text => f.write_str("Text"),
            FiberKind::Component(render) => write!(f, "Component({:#x})", *render as usize),
        }
    }
}

pub(crate) struct Fiber {
    pub(crate) kind: FiberKind,
    pub(crate) props: Rc<Props>,
    pub(crate) dom: Option<NodeId>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect: Option<EffectTag>,
    pub(crate) hooks: Vec<HookRecord>,
}

impl Fiber {
    pub(crate) fn new(kind: FiberKind, props: Rc<Props>, parent: Option<FiberId>) -> Self {
        Self {
            kind,
            props,
            dom: None,
            parent,
            child: None,
            sibling: None,
            alternate: None,
            effect: None,
            hooks: Vec::new(),
        }
    }
}

#[derive(Default)]
pub(crate) struct FiberArena {
    slots: Vec<Option<Fiber>>,
    free: Vec<usize>,
}

impl FiberArena {
    pub(crate) fn alloc(&mut self, fiber: Fiber) -> FiberId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(fiber);
                FiberId(index)
            }
            None => {
                self.slots.push(Some(fiber));
                FiberId(self.slots.len() - 1)
            }
        }
    }

    pub(crate) fn get(&self, id: FiberId) -> &Fiber {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("dangling fiber {id:?}"))
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> &mut Fiber {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("dangling fiber {id:?}"))
    }

    pub(crate) fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Pre-order successor: first child, else the nearest sibling found by
    /// walking up through the ancestors. `None` once the walk climbs past
    /// the root.
    pub(crate) fn next_in_preorder(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.get(id);
        if fiber.child.is_some() {
            return fiber.child;
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.get(current);
            if fiber.sibling.is_some() {
                return fiber.sibling;
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Every fiber reachable from `root` through child and sibling links
    /// below it, `root` included.
    pub(crate) fn subtree(&self, root: FiberId) -> Vec<FiberId> {
        let mut visited = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            visited.push(id);
            let mut child = self.get(id).child;
            while let Some(current) = child {
                stack.push(current);
                child = self.get(current).sibling;
            }
        }
        visited
    }

    pub(crate) fn release_tree(&mut self, root: FiberId) {
        for id in self.subtree(root) {
            if let Some(slot) = self.slots.get_mut(id.0) {
                if slot.take().is_some() {
                    self.free.push(id.0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(arena: &mut FiberArena, tag: &str, parent: Option<FiberId>) -> FiberId {
        arena.alloc(Fiber::new(
            FiberKind::Host(Rc::from(tag)),
            Rc::new(Props::new()),
            parent,
        ))
    }

    fn link(arena: &mut FiberArena, parent: FiberId, children: &[FiberId]) {
        arena.get_mut(parent).child = children.first().copied();
        for pair in children.windows(2) {
            arena.get_mut(pair[0]).sibling = Some(pair[1]);
        }
    }

    #[test]
    fn preorder_visits_child_then_sibling_then_uncle() {
        let mut arena = FiberArena::default();
        let root = host(&mut arena, "root", None);
        let a = host(&mut arena, "a", Some(root));
        let b = host(&mut arena, "b", Some(root));
        let a1 = host(&mut arena, "a1", Some(a));
        let a2 = host(&mut arena, "a2", Some(a));
        link(&mut arena, root, &[a, b]);
        link(&mut arena, a, &[a1, a2]);

        let mut order = vec![root];
        let mut cursor = arena.next_in_preorder(root);
        while let Some(id) = cursor {
            order.push(id);
            cursor = arena.next_in_preorder(id);
        }
        assert_eq!(order, vec![root, a, a1, a2, b]);
    }

    #[test]
    fn released_slots_are_reused() {
        let mut arena = FiberArena::default();
        let root = host(&mut arena, "root", None);
        let child = host(&mut arena, "child", Some(root));
        link(&mut arena, root, &[child]);
        assert_eq!(arena.live_count(), 2);

        arena.release_tree(root);
        assert_eq!(arena.live_count(), 0);

        let again = host(&mut arena, "again", None);
        assert!(again == root || again == child);
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    #[should_panic(expected = "dangling fiber")]
    fn released_fiber_cannot_be_read() {
        let mut arena = FiberArena::default();
        let root = host(&mut arena, "root", None);
        arena.release_tree(root);
        let _ = arena.get(root);
    }
}

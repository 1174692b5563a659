use std::rc::Rc;

use crate::element::Element;
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId, FiberKind};

/// Diffs the children of `wip` against its alternate's children, index by
/// index.
///
/// Same type at the same position becomes an update that keeps the old host
/// node. Anything else places a fresh fiber for the new element and marks
/// the old fiber for deletion. Reordered lists are not detected: there are
/// no keys, so `[A, B] -> [B, A]` is two updates.
pub(crate) fn reconcile_children(
    fibers: &mut FiberArena,
    deletions: &mut Vec<FiberId>,
    wip: FiberId,
    elements: &[Element],
) {
    let mut old_fiber = fibers
        .get(wip)
        .alternate
        .and_then(|alternate| fibers.get(alternate).child);
    let mut previous: Option<FiberId> = None;
    let mut index = 0;

    while index < elements.len() || old_fiber.is_some() {
        let element = elements.get(index);
        let same_type = match (element, old_fiber) {
            (Some(element), Some(old)) => fibers.get(old).kind.matches(element.kind()),
            _ => false,
        };

        let new_fiber = match (element, old_fiber) {
            (Some(element), Some(old)) if same_type => {
                let old_dom = fibers.get(old).dom;
                let kind = fibers.get(old).kind.clone();
                let mut fiber = Fiber::new(kind, Rc::clone(element.props()), Some(wip));
                fiber.dom = old_dom;
                fiber.alternate = Some(old);
                fiber.effect = Some(EffectTag::Update);
                Some(fibers.alloc(fiber))
            }
            _ => {
                let placed = element.map(|element| {
                    let mut fiber = Fiber::new(
                        FiberKind::from_element(element.kind()),
                        Rc::clone(element.props()),
                        Some(wip),
                    );
                    fiber.effect = Some(EffectTag::Placement);
                    fibers.alloc(fiber)
                });
                if let Some(old) = old_fiber {
                    fibers.get_mut(old).effect = Some(EffectTag::Deletion);
                    deletions.push(old);
                }
                placed
            }
        };

        if let Some(old) = old_fiber {
            old_fiber = fibers.get(old).sibling;
        }

        if let Some(new_fiber) = new_fiber {
            match previous {
                Some(previous) => fibers.get_mut(previous).sibling = Some(new_fiber),
                None => fibers.get_mut(wip).child = Some(new_fiber),
            }
            previous = Some(new_fiber);
        }
        index += 1;
    }
}

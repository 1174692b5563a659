use crate::element::{event_name, is_event, is_property, PropValue, Props};
use crate::fiber::{EffectTag, FiberArena, FiberId};
use crate::host::{HostError, HostTree, NodeId};

/// Effect counts of one committed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
}

/// Applies every effect of a finished work-in-progress tree: deletions
/// first, then placements and updates in pre-order.
pub(crate) fn commit_root<H: HostTree + ?Sized>(
    host: &mut H,
    fibers: &FiberArena,
    deletions: &[FiberId],
    root: FiberId,
) -> Result<CommitStats, HostError> {
    let mut stats = CommitStats::default();
    for &fiber in deletions {
        commit_deletion(host, fibers, fiber)?;
        stats.deletions += 1;
    }

    let mut cursor = fibers.get(root).child;
    while let Some(id) = cursor {
        let fiber = fibers.get(id);
        match fiber.effect {
            Some(EffectTag::Placement) => {
                if let Some(dom) = fiber.dom {
                    let parent = host_parent(fibers, id);
                    host.append_child(parent, dom)?;
                }
                stats.placements += 1;
            }
            Some(EffectTag::Update) => {
                if let (Some(dom), Some(alternate)) = (fiber.dom, fiber.alternate) {
                    update_host_node(host, dom, &fibers.get(alternate).props, &fiber.props)?;
                }
                stats.updates += 1;
            }
            Some(EffectTag::Deletion) | None => {}
        }
        cursor = fibers.next_in_preorder(id);
    }
    Ok(stats)
}

/// Removes the first host node found down the child chain of `fiber`.
/// Component fibers own no node, so deletion descends through them.
fn commit_deletion<H: HostTree + ?Sized>(
    host: &mut H,
    fibers: &FiberArena,
    fiber: FiberId,
) -> Result<(), HostError> {
    let mut cursor = Some(fiber);
    while let Some(id) = cursor {
        if let Some(dom) = fibers.get(id).dom {
            let parent = host_parent(fibers, id);
            return host.remove_child(parent, dom);
        }
        cursor = fibers.get(id).child;
    }
    Ok(())
}

/// Host node of the nearest ancestor that owns one.
fn host_parent(fibers: &FiberArena, fiber: FiberId) -> NodeId {
    let mut cursor = fibers.get(fiber).parent;
    while let Some(id) = cursor {
        let ancestor = fibers.get(id);
        if let Some(dom) = ancestor.dom {
            return dom;
        }
        cursor = ancestor.parent;
    }
    panic!("fiber {fiber:?} has no host-bearing ancestor")
}

/// Brings `node` from `prev` props to `next` props.
pub(crate) fn update_host_node<H: HostTree + ?Sized>(
    host: &mut H,
    node: NodeId,
    prev: &Props,
    next: &Props,
) -> Result<(), HostError> {
    for (name, value) in prev.attributes().filter(|(name, _)| is_event(name)) {
        if let PropValue::Handler(handler) = value {
            if next.get(name) != Some(value) {
                host.remove_event_listener(node, &event_name(name), handler)?;
            }
        }
    }

    for (name, _) in prev.attributes().filter(|(name, _)| is_property(name)) {
        if !next.contains(name) {
            host.remove_property(node, name)?;
        }
    }

    for (name, value) in next.attributes().filter(|(name, _)| is_property(name)) {
        if prev.get(name) != Some(value) {
            host.set_property(node, name, value)?;
        }
    }

    for (name, value) in next.attributes().filter(|(name, _)| is_event(name)) {
        match value {
            PropValue::Handler(handler) if prev.get(name) != Some(value) => {
                host.add_event_listener(node, &event_name(name), handler.clone())?;
            }
            PropValue::Handler(_) => {}
            other => log::warn!("ignoring non-handler value {other:?} bound to event prop {name}"),
        }
    }
    Ok(())
}

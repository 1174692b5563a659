use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::commit::{commit_root, update_host_node, CommitStats};
use crate::element::{ComponentFn, Element, Props};
use crate::fiber::{Fiber, FiberArena, FiberId, FiberKind};
use crate::hooks::render_with_hooks;
use crate::host::{HostError, HostTree, NodeId};
use crate::platform::Deadline;
use crate::reconciler::reconcile_children;
use crate::runtime::{DefaultScheduler, Runtime};

/// The work loop yields once less than this much of the slice is left.
pub const YIELD_THRESHOLD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing to do.
    Idle,
    /// A pass is in flight and will continue in a later slice.
    Yielded,
    /// A pass finished and its effects reached the host tree.
    Committed,
}

/// Owns the host tree, both fiber trees and the render state of one root.
pub struct Renderer<H: HostTree> {
    host: H,
    fibers: FiberArena,
    runtime: Runtime,
    current_root: Option<FiberId>,
    wip_root: Option<FiberId>,
    next_unit_of_work: Option<FiberId>,
    deletions: Vec<FiberId>,
    pending_render: Option<(Element, NodeId)>,
    last_commit: Option<CommitStats>,
}

impl<H: HostTree> Renderer<H> {
    pub fn new(host: H) -> Self {
        Self::with_runtime(host, Runtime::new(Arc::new(DefaultScheduler)))
    }

    pub fn with_runtime(host: H, runtime: Runtime) -> Self {
        Self {
            host,
            fibers: FiberArena::default(),
            runtime,
            current_root: None,
            wip_root: None,
            next_unit_of_work: None,
            deletions: Vec::new(),
            pending_render: None,
            last_commit: None,
        }
    }

    /// Schedules `element` to be rendered into `container`.
    ///
    /// The pass starts right away when nothing is in flight; otherwise it
    /// starts once the in-flight pass has committed.
    pub fn render(&mut self, element: Element, container: NodeId) {
        if self.wip_root.is_some() {
            log::debug!("render requested while a pass is in flight; deferring");
            self.pending_render = Some((element, container));
        } else {
            let props = Rc::new(Props::new().with_children(vec![element]));
            self.begin_pass(props, container);
        }
        self.runtime.request_idle_callback();
    }

    /// One idle slice: performs units of work until none remain or the
    /// deadline runs low, commits a finished pass, and asks the scheduler
    /// for the next slice in every case.
    ///
    /// A host error drops the in-flight pass. Mutations already applied to
    /// the host stay; nothing is replayed by later slices.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, HostError> {
        let result = self.run_slice(deadline);
        if let Err(err) = &result {
            log::warn!("dropping render pass after host error: {err}");
            self.abandon_pass();
        }
        self.runtime.request_idle_callback();
        result
    }

    /// Whether a pass is in flight or waiting to start.
    pub fn has_pending_work(&self) -> bool {
        self.wip_root.is_some()
            || self.pending_render.is_some()
            || (self.current_root.is_some() && self.runtime.has_render_request())
    }

    pub fn is_rendering(&self) -> bool {
        self.wip_root.is_some()
    }

    pub fn last_commit(&self) -> Option<CommitStats> {
        self.last_commit
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Fibers currently allocated across the committed and in-flight trees.
    pub fn fiber_count(&self) -> usize {
        self.fibers.live_count()
    }

    fn run_slice(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, HostError> {
        self.start_pending_pass();

        while let Some(fiber) = self.next_unit_of_work {
            self.next_unit_of_work = self.perform_unit_of_work(fiber)?;
            if deadline.time_remaining() < YIELD_THRESHOLD {
                break;
            }
        }

        match (self.next_unit_of_work, self.wip_root) {
            (None, Some(root)) => {
                self.commit(root)?;
                Ok(WorkStatus::Committed)
            }
            (Some(_), _) => Ok(WorkStatus::Yielded),
            (None, None) => Ok(WorkStatus::Idle),
        }
    }

    /// Forgets the work-in-progress tree. The committed tree stays current.
    fn abandon_pass(&mut self) {
        self.next_unit_of_work = None;
        if let Some(root) = self.wip_root.take() {
            self.fibers.release_tree(root);
        }
        for id in self.deletions.drain(..) {
            self.fibers.get_mut(id).effect = None;
        }
    }

    fn begin_pass(&mut self, props: Rc<Props>, container: NodeId) {
        let mut root = Fiber::new(FiberKind::Root, props, None);
        root.dom = Some(container);
        root.alternate = self.current_root;
        let root = self.fibers.alloc(root);
        self.wip_root = Some(root);
        self.next_unit_of_work = Some(root);
        self.deletions.clear();
    }

    fn start_pending_pass(&mut self) {
        if self.wip_root.is_some() {
            return;
        }
        if let Some((element, container)) = self.pending_render.take() {
            self.runtime.take_render_request();
            let props = Rc::new(Props::new().with_children(vec![element]));
            self.begin_pass(props, container);
            return;
        }
        let Some(current) = self.current_root else {
            return;
        };
        if self.runtime.take_render_request() {
            let root = self.fibers.get(current);
            let props = Rc::clone(&root.props);
            let container = root
                .dom
                .unwrap_or_else(|| panic!("committed root {current:?} lost its container"));
            log::debug!("starting render pass for a state update");
            self.begin_pass(props, container);
        }
    }

    fn perform_unit_of_work(&mut self, fiber: FiberId) -> Result<Option<FiberId>, HostError> {
        let kind = self.fibers.get(fiber).kind.clone();
        log::trace!("unit of work {fiber:?} {kind:?}");
        match kind {
            FiberKind::Component(render) => self.update_function_component(fiber, render),
            FiberKind::Root | FiberKind::Host(_) | FiberKind::Text => {
                self.update_host_component(fiber)?
            }
        }
        Ok(self.fibers.next_in_preorder(fiber))
    }

    fn update_function_component(&mut self, fiber: FiberId, render: ComponentFn) {
        let (props, previous) = {
            let node = self.fibers.get(fiber);
            let previous = node
                .alternate
                .map(|alternate| self.fibers.get(alternate).hooks.clone())
                .unwrap_or_default();
            (Rc::clone(&node.props), previous)
        };
        let (child, hooks) = render_with_hooks(previous, self.runtime.handle(), || render(&props));
        self.fibers.get_mut(fiber).hooks = hooks;
        reconcile_children(
            &mut self.fibers,
            &mut self.deletions,
            fiber,
            std::slice::from_ref(&child),
        );
    }

    fn update_host_component(&mut self, fiber: FiberId) -> Result<(), HostError> {
        let node = self.fibers.get(fiber);
        let props = Rc::clone(&node.props);
        if node.dom.is_none() {
            if let Some(kind) = node.kind.node_kind() {
                let dom = self.host.create_node(&kind);
                update_host_node(&mut self.host, dom, &Props::default(), &props)?;
                self.fibers.get_mut(fiber).dom = Some(dom);
            }
        }
        reconcile_children(&mut self.fibers, &mut self.deletions, fiber, props.children());
        Ok(())
    }

    fn commit(&mut self, root: FiberId) -> Result<(), HostError> {
        let stats = commit_root(&mut self.host, &self.fibers, &self.deletions, root)?;
        log::debug!(
            "committed pass: {} placed, {} updated, {} deleted",
            stats.placements,
            stats.updates,
            stats.deletions
        );

        let previous = self.current_root.replace(root);
        self.wip_root = None;
        self.deletions.clear();
        if let Some(previous) = previous {
            self.fibers.release_tree(previous);
        }
        for id in self.fibers.subtree(root) {
            let fiber = self.fibers.get_mut(id);
            fiber.alternate = None;
            fiber.effect = None;
        }
        self.last_commit = Some(stats);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/renderer_tests.rs"]
mod tests;

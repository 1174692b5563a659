//! Headless harness for exercising renderers in tests and benches.

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::commit::CommitStats;
use crate::element::Element;
use crate::host::{HostError, NodeId};
use crate::memory_host::MemoryHost;
use crate::platform::{Deadline, IdleScheduler};
use crate::renderer::{Renderer, WorkStatus};
use crate::runtime::Runtime;

/// Deadline that never runs out.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Deadline that expires after `units` checks, i.e. after that many units
/// of work in one slice.
#[derive(Debug)]
pub struct StepDeadline {
    remaining: Cell<usize>,
}

impl StepDeadline {
    pub fn new(units: usize) -> Self {
        Self {
            remaining: Cell::new(units),
        }
    }
}

impl Deadline for StepDeadline {
    fn time_remaining(&self) -> Duration {
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        if left == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1)
        }
    }
}

/// Scheduler that counts idle-callback requests.
#[derive(Debug, Default)]
pub struct CountingScheduler {
    requests: AtomicUsize,
}

impl CountingScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl IdleScheduler for CountingScheduler {
    fn request_idle_callback(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Renderer over a [`MemoryHost`] with a `root` container, driven to
/// completion with unbounded slices.
pub struct TestRenderer {
    renderer: Renderer<MemoryHost>,
    container: NodeId,
    scheduler: Arc<CountingScheduler>,
}

impl TestRenderer {
    pub fn new() -> Self {
        let scheduler = Arc::new(CountingScheduler::default());
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        host.take_ops();
        Self {
            renderer: Renderer::with_runtime(host, Runtime::new(scheduler.clone())),
            container,
            scheduler,
        }
    }

    /// Renders `element` into the container and pumps until idle.
    pub fn render(&mut self, element: Element) -> Result<CommitStats, HostError> {
        self.renderer.render(element, self.container);
        self.pump_until_idle()?;
        Ok(self.renderer.last_commit().unwrap_or_default())
    }

    /// Runs slices until no pass is in flight or waiting. Returns how many
    /// passes were committed.
    pub fn pump_until_idle(&mut self) -> Result<usize, HostError> {
        let mut committed = 0;
        while self.renderer.has_pending_work() {
            if self.renderer.work_loop(&Unbounded)? == WorkStatus::Committed {
                committed += 1;
            }
        }
        Ok(committed)
    }

    /// Fires `event` at the first element tagged `tag` under the container.
    pub fn dispatch(&self, tag: &str, event: &str) -> usize {
        let host = self.renderer.host();
        host.find_by_tag(self.container, tag)
            .map_or(0, |target| host.dispatch_event(target, event))
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn host(&self) -> &MemoryHost {
        self.renderer.host()
    }

    pub fn host_mut(&mut self) -> &mut MemoryHost {
        self.renderer.host_mut()
    }

    pub fn renderer(&self) -> &Renderer<MemoryHost> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<MemoryHost> {
        &mut self.renderer
    }

    pub fn scheduler(&self) -> &CountingScheduler {
        &self.scheduler
    }

    /// Text of the whole rendered tree.
    pub fn text(&self) -> String {
        self.host().text_content(self.container)
    }
}

impl Default for TestRenderer {
    fn default() -> Self {
        Self::new()
    }
}

use std::time::Duration;

use fiber_core::{Element, HostTree, MemoryHost, NodeId, Renderer, WorkStatus};
use fiber_runtime_std::StdRuntime;

/// Slice budget used when none is configured, one 60 Hz frame.
pub const DEFAULT_FRAME_BUDGET: Duration = Duration::from_millis(16);

/// Owns a renderer, its std runtime and the container it renders into, and
/// feeds it wall-clock idle slices.
pub struct AppShell<H: HostTree> {
    runtime: StdRuntime,
    renderer: Renderer<H>,
    container: NodeId,
    frame_budget: Duration,
    slices: u64,
}

impl<H: HostTree> AppShell<H> {
    /// Schedules `content` into `container`. Nothing reaches the host until
    /// the first [`AppShell::update`].
    pub fn new(host: H, container: NodeId, content: Element) -> Self {
        let runtime = StdRuntime::new();
        let mut renderer = Renderer::with_runtime(host, runtime.runtime());
        renderer.render(content, container);
        Self {
            runtime,
            renderer,
            container,
            frame_budget: DEFAULT_FRAME_BUDGET,
            slices: 0,
        }
    }

    pub fn with_frame_budget(mut self, budget: Duration) -> Self {
        self.frame_budget = budget;
        self
    }

    pub fn frame_budget(&self) -> Duration {
        self.frame_budget
    }

    /// Replaces the whole content of the container.
    pub fn render(&mut self, content: Element) {
        self.renderer.render(content, self.container);
    }

    pub fn should_render(&self) -> bool {
        self.renderer.has_pending_work()
    }

    /// Runs one idle slice. Returns `None` when the host rejected a
    /// mutation; the failure is logged.
    pub fn update(&mut self) -> Option<WorkStatus> {
        self.runtime.take_idle_request();
        self.slices += 1;
        let deadline = self.runtime.deadline(self.frame_budget);
        match self.renderer.work_loop(&deadline) {
            Ok(status) => Some(status),
            Err(err) => {
                log::error!("render slice failed: {err}");
                None
            }
        }
    }

    /// Runs slices until no work is left or a slice fails. Returns how many
    /// slices ran.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while self.should_render() {
            ran += 1;
            if self.update().is_none() {
                break;
            }
        }
        ran
    }

    /// Slices run since the shell was created.
    pub fn slices(&self) -> u64 {
        self.slices
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn host(&self) -> &H {
        self.renderer.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.renderer.host_mut()
    }

    pub fn runtime(&self) -> &StdRuntime {
        &self.runtime
    }
}

impl AppShell<MemoryHost> {
    /// Shell over a fresh [`MemoryHost`] with a `root` container.
    pub fn headless(content: Element) -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        Self::new(host, container, content)
    }

    /// Fires `event` at the first element tagged `tag`. Returns how many
    /// listeners ran.
    pub fn dispatch(&self, tag: &str, event: &str) -> usize {
        let host = self.renderer.host();
        match host.find_by_tag(self.container, tag) {
            Some(target) => host.dispatch_event(target, event),
            None => {
                log::warn!("no <{tag}> to receive {event}");
                0
            }
        }
    }

    pub fn dump_tree(&self) -> String {
        self.renderer.host().dump_tree(Some(self.container))
    }

    pub fn log_debug_info(&self) {
        log::info!(
            "current tree after {} slices, {} fibers:\n{}",
            self.slices,
            self.renderer.fiber_count(),
            self.dump_tree()
        );
    }
}

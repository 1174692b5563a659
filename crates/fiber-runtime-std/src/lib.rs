//! Standard runtime services backed by Rust's `std` library.
//!
//! Hosts construct a [`StdRuntime`], give its [`Runtime`] to
//! [`fiber_core::Renderer`], and run a slice with
//! [`StdRuntime::deadline`] whenever [`StdRuntime::take_idle_request`]
//! reports that the renderer asked for one.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use fiber_core::{Clock, Deadline, IdleScheduler, Runtime};

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Idle scheduler for hosts that poll.
///
/// The renderer asks for a slice after every `work_loop` call and on every
/// `render` or state update. Requests collapse into one pending flag; an
/// optional waker lets a blocked event loop notice them.
pub struct StdScheduler {
    idle_requested: AtomicBool,
    idle_waker: RwLock<Option<Waker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            idle_requested: AtomicBool::new(false),
            idle_waker: RwLock::new(None),
        }
    }

    /// Clears the pending request, returning whether there was one.
    pub fn take_idle_request(&self) -> bool {
        self.idle_requested.swap(false, Ordering::SeqCst)
    }

    /// Called on every slice request, from whichever thread made it.
    pub fn set_idle_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .idle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    pub fn clear_idle_waker(&self) {
        *self
            .idle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .idle_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("idle_requested", &self.idle_requested.load(Ordering::SeqCst))
            .finish()
    }
}

impl IdleScheduler for StdScheduler {
    fn request_idle_callback(&self) {
        self.idle_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Monotonic wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn elapsed(&self, since: Self::Instant) -> Duration {
        since.elapsed()
    }
}

/// Slice that started when it was created and may run for `budget`, as
/// measured by `clock`.
pub struct ClockDeadline<C: Clock = StdClock> {
    clock: C,
    start: C::Instant,
    budget: Duration,
}

impl<C: Clock> ClockDeadline<C> {
    pub fn new(clock: C, budget: Duration) -> Self {
        let start = clock.now();
        Self {
            clock,
            start,
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl ClockDeadline {
    pub fn starting_now(budget: Duration) -> Self {
        Self::new(StdClock, budget)
    }
}

impl<C: Clock> Deadline for ClockDeadline<C> {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.clock.elapsed(self.start))
    }
}

impl<C: Clock> fmt::Debug for ClockDeadline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockDeadline")
            .field("budget", &self.budget)
            .field("remaining", &self.time_remaining())
            .finish()
    }
}

/// Standard scheduler and clock bundled with the [`Runtime`] they drive.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    clock: StdClock,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            scheduler,
            clock: StdClock,
            runtime,
        }
    }

    /// Runtime to hand to [`fiber_core::Renderer::with_runtime`].
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    /// Starts a slice of `budget` on this runtime's clock.
    pub fn deadline(&self, budget: Duration) -> ClockDeadline {
        ClockDeadline::new(self.clock, budget)
    }

    pub fn take_idle_request(&self) -> bool {
        self.scheduler.take_idle_request()
    }

    pub fn set_idle_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_idle_waker(waker);
    }

    pub fn clear_idle_waker(&self) {
        self.scheduler.clear_idle_waker();
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

//! Platform abstraction traits for the render loop.
//!
//! The engine never blocks or spawns: it asks the host for an idle
//! callback, and the host later calls back into the renderer with a
//! [`Deadline`] describing how much of the current slice is left.

use std::time::Duration;

/// Requests idle slices from the host.
///
/// Implementations only record the request (or wake the host loop); the
/// host then calls `Renderer::work_loop` when it has time to spare. They
/// must be safe to use from multiple threads.
pub trait IdleScheduler: Send + Sync {
    /// Ask the host to invoke the work loop again in a future idle period.
    fn request_idle_callback(&self);
}

/// Remaining budget of the idle slice the work loop is running in.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

/// Time source a wall-clock [`Deadline`] measures its slice against.
pub trait Clock: Send + Sync {
    type Instant: Copy + Send + Sync;

    fn now(&self) -> Self::Instant;

    fn elapsed(&self, since: Self::Instant) -> Duration;
}

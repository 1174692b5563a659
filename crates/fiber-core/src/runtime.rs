use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::IdleScheduler;

struct RuntimeInner {
    scheduler: Arc<dyn IdleScheduler>,
    render_requested: Cell<bool>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn IdleScheduler>) -> Self {
        Self {
            scheduler,
            render_requested: Cell::new(false),
        }
    }

    fn request_idle_callback(&self) {
        self.scheduler.request_idle_callback();
    }

    fn request_render(&self) {
        self.render_requested.set(true);
        self.request_idle_callback();
    }
}

/// Shared scheduling state between a renderer and the state setters handed
/// out to components.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn IdleScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn request_idle_callback(&self) {
        self.inner.request_idle_callback();
    }

    /// Whether a state update asked for a new root pass that has not started.
    pub fn has_render_request(&self) -> bool {
        self.inner.render_requested.get()
    }

    pub(crate) fn take_render_request(&self) -> bool {
        self.inner.render_requested.replace(false)
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl IdleScheduler for DefaultScheduler {
    fn request_idle_callback(&self) {}
}

/// Non-owning handle held by state setters. Requests made after the
/// renderer is dropped are ignored.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn request_render(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.request_render();
        }
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

//! Positional state hooks for function components.
//!
//! While a component function runs, the renderer installs a [`HookFrame`]
//! holding the records of the fiber's alternate and the records produced
//! so far. The Nth [`use_state`] call in the body reads and writes slot N.
//! Components must call hooks in the same order and number on every render;
//! the engine does not check this.

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::thread_local;

use crate::runtime::RuntimeHandle;

type Update = Box<dyn FnOnce(Box<dyn Any>) -> Box<dyn Any>>;
type UpdateQueue = Rc<RefCell<VecDeque<Update>>>;

/// One state slot of a component fiber.
///
/// The state is rebuilt every render; the queue is shared by every record
/// of the same slot, so an update enqueued while a pass is already past
/// this component is folded in by the next pass.
#[derive(Clone)]
pub(crate) struct HookRecord {
    state: Rc<dyn Any>,
    queue: UpdateQueue,
}

pub(crate) struct HookFrame {
    previous: Vec<HookRecord>,
    hooks: Vec<HookRecord>,
    runtime: RuntimeHandle,
}

thread_local! {
    static HOOK_FRAMES: RefCell<Vec<HookFrame>> = RefCell::new(Vec::new());
}

struct FrameGuard;

impl Drop for FrameGuard {
    fn drop(&mut self) {
        HOOK_FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

/// Runs `render` with a hook frame seeded from `previous` and returns what
/// it produced together with the new hook records.
pub(crate) fn render_with_hooks<R>(
    previous: Vec<HookRecord>,
    runtime: RuntimeHandle,
    render: impl FnOnce() -> R,
) -> (R, Vec<HookRecord>) {
    HOOK_FRAMES.with(|frames| {
        frames.borrow_mut().push(HookFrame {
            previous,
            hooks: Vec::new(),
            runtime,
        })
    });
    let guard = FrameGuard;
    let output = render();
    let hooks = HOOK_FRAMES.with(|frames| {
        frames
            .borrow_mut()
            .last_mut()
            .map(|frame| std::mem::take(&mut frame.hooks))
            .unwrap_or_default()
    });
    drop(guard);
    (output, hooks)
}

/// Returns the current value of this state slot and a setter for it.
///
/// On the first render the slot holds `initial`. Afterwards it starts from
/// the previous render's value and applies every queued update in the
/// order they were enqueued.
///
/// # Panics
///
/// Panics when called outside a component render.
pub fn use_state<T: Clone + 'static>(initial: T) -> (T, SetState<T>) {
    let (previous, runtime, index) = HOOK_FRAMES.with(|frames| {
        let frames = frames.borrow();
        let frame = frames
            .last()
            .expect("use_state called outside of a component render");
        let index = frame.hooks.len();
        (
            frame.previous.get(index).cloned(),
            frame.runtime.clone(),
            index,
        )
    });

    let (mut value, queue) = match previous {
        Some(record) => {
            let value = record
                .state
                .downcast_ref::<T>()
                .unwrap_or_else(|| panic!("hook {index} changed type between renders"))
                .clone();
            (value, record.queue)
        }
        None => (initial, UpdateQueue::default()),
    };

    let pending: Vec<Update> = queue.borrow_mut().drain(..).collect();
    for update in pending {
        value = *update(Box::new(value))
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("hook {index} update produced a different type"));
    }

    let record = HookRecord {
        state: Rc::new(value.clone()),
        queue: Rc::clone(&queue),
    };
    HOOK_FRAMES.with(|frames| {
        if let Some(frame) = frames.borrow_mut().last_mut() {
            frame.hooks.push(record);
        }
    });

    let setter = SetState {
        queue,
        runtime,
        _marker: PhantomData,
    };
    (value, setter)
}

/// Enqueues updates for one state slot and schedules a new root pass.
pub struct SetState<T> {
    queue: UpdateQueue,
    runtime: RuntimeHandle,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
            runtime: self.runtime.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> SetState<T> {
    /// Queues `update` and requests a render. The new value is computed the
    /// next time the owning component renders, not here.
    pub fn update(&self, update: impl FnOnce(T) -> T + 'static) {
        self.queue
            .borrow_mut()
            .push_back(Box::new(move |value: Box<dyn Any>| {
                let current = value
                    .downcast::<T>()
                    .unwrap_or_else(|_| panic!("state update applied to a different type"));
                Box::new(update(*current)) as Box<dyn Any>
            }));
        self.runtime.request_render();
    }

    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Updates enqueued but not yet folded by a render.
    pub fn pending_updates(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("pending", &self.queue.borrow().len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;

#![doc = r"Core of the Fiber-RS rendering engine: descriptors, fibers, the positional reconciler, the interruptible work loop, the commit phase and state hooks."]

pub mod collections;
pub mod element;
pub mod host;
pub mod memory_host;
pub mod platform;
pub mod runtime;
pub mod testing;

mod commit;
mod fiber;
mod hooks;
mod reconciler;
mod renderer;

pub use commit::CommitStats;
pub use element::{
    component, create_element, text, ComponentFn, Element, ElementType, EventHandler, PropValue,
    Props, CHILDREN_KEY, TEXT_VALUE_KEY,
};
pub use fiber::EffectTag;
pub use hooks::{use_state, SetState};
pub use host::{HostError, HostEvent, HostTree, NodeId, NodeKind};
pub use memory_host::{HostOp, MemoryHost};
pub use platform::{Clock, Deadline, IdleScheduler};
pub use renderer::{Renderer, WorkStatus, YIELD_THRESHOLD};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};

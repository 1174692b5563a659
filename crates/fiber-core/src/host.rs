//! The host tree seam: the small set of mutations the engine drives.

use std::fmt;
use std::rc::Rc;

use crate::element::{EventHandler, PropValue};

pub type NodeId = usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element(Rc<str>),
    Text,
}

/// Event delivered to listeners registered through props.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostEvent {
    pub name: String,
    pub target: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Missing { id: NodeId },
    NotAChild { parent: NodeId, child: NodeId },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Missing { id } => write!(f, "host node {id} missing"),
            HostError::NotAChild { parent, child } => {
                write!(f, "host node {child} is not a child of {parent}")
            }
        }
    }
}

impl std::error::Error for HostError {}

/// Mutable host tree the commit phase writes into.
///
/// Nodes are created during rendering (detached) and only attached or
/// detached during commit.
pub trait HostTree {
    fn create_node(&mut self, kind: &NodeKind) -> NodeId;
    fn set_property(&mut self, node: NodeId, name: &str, value: &PropValue)
        -> Result<(), HostError>;
    fn remove_property(&mut self, node: NodeId, name: &str) -> Result<(), HostError>;
    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), HostError>;
    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;
}

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::collections::map::HashMap;
use crate::element::{EventHandler, PropValue, TEXT_VALUE_KEY};
use crate::host::{HostError, HostEvent, HostTree, NodeId, NodeKind};

/// One recorded host mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum HostOp {
    Create { id: NodeId, kind: NodeKind },
    SetProperty { id: NodeId, name: String, value: PropValue },
    RemoveProperty { id: NodeId, name: String },
    AddListener { id: NodeId, event: String },
    RemoveListener { id: NodeId, event: String },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
}

impl HostOp {
    /// Whether the op changes tree shape rather than node contents.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            HostOp::Create { .. } | HostOp::AppendChild { .. } | HostOp::RemoveChild { .. }
        )
    }
}

struct HostNode {
    kind: NodeKind,
    properties: IndexMap<String, PropValue>,
    listeners: HashMap<String, Vec<EventHandler>>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl HostNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            properties: IndexMap::new(),
            listeners: HashMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

/// In-memory document used by tests, benches and headless apps.
///
/// Nodes are never freed: a detached node stays addressable, mirroring how
/// a document keeps removed nodes alive while something references them.
/// Every mutation is appended to an op log that callers can drain.
#[derive(Default)]
pub struct MemoryHost {
    nodes: Vec<HostNode>,
    ops: Vec<HostOp>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached element node to render into.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.create_node(&NodeKind::Element(tag.into()))
    }

    fn node(&self, id: NodeId) -> Result<&HostNode, HostError> {
        self.nodes.get(id).ok_or(HostError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut HostNode, HostError> {
        self.nodes.get_mut(id).ok_or(HostError::Missing { id })
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|node| &node.kind)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub fn property(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.nodes.get(id).and_then(|node| node.properties.get(name))
    }

    pub fn listener_count(&self, id: NodeId, event: &str) -> usize {
        self.nodes
            .get(id)
            .and_then(|node| node.listeners.get(event))
            .map_or(0, Vec::len)
    }

    /// Concatenated text of every attached text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut output = String::new();
        self.collect_text(id, &mut output);
        output
    }

    fn collect_text(&self, id: NodeId, output: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.kind == NodeKind::Text {
            if let Some(value) = node.properties.get(TEXT_VALUE_KEY) {
                let _ = write!(output, "{value}");
            }
        }
        for &child in &node.children {
            self.collect_text(child, output);
        }
    }

    /// First attached element below `root` (inclusive) with the given tag.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        let node = self.nodes.get(root)?;
        if matches!(&node.kind, NodeKind::Element(name) if &**name == tag) {
            return Some(root);
        }
        node.children
            .iter()
            .find_map(|&child| self.find_by_tag(child, tag))
    }

    /// Fires `event` at `target` and bubbles it through the attached
    /// ancestors. Returns how many listeners ran.
    pub fn dispatch_event(&self, target: NodeId, event: &str) -> usize {
        let host_event = HostEvent {
            name: event.to_owned(),
            target,
        };
        let mut invoked = 0;
        let mut cursor = Some(target);
        while let Some(id) = cursor {
            let Some(node) = self.nodes.get(id) else {
                break;
            };
            let handlers = node.listeners.get(event).cloned().unwrap_or_default();
            for handler in handlers {
                handler.call(&host_event);
                invoked += 1;
            }
            cursor = node.parent;
        }
        invoked
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(node) = self.nodes.get(id) else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
            return;
        };
        match &node.kind {
            NodeKind::Text => {
                let value = node
                    .properties
                    .get(TEXT_VALUE_KEY)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let _ = writeln!(output, "{indent}[{id}] {value:?}");
            }
            NodeKind::Element(tag) => {
                let _ = write!(output, "{indent}[{id}] <{tag}");
                for (name, value) in &node.properties {
                    let _ = write!(output, " {name}={value}");
                }
                let mut events: Vec<&str> = node
                    .listeners
                    .iter()
                    .filter(|(_, handlers)| !handlers.is_empty())
                    .map(|(event, _)| event.as_str())
                    .collect();
                events.sort_unstable();
                for event in events {
                    let _ = write!(output, " @{event}");
                }
                output.push_str(">\n");
            }
        }
        for &child in &node.children {
            self.dump_node(output, child, depth + 1);
        }
    }
}

impl HostTree for MemoryHost {
    fn create_node(&mut self, kind: &NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(HostNode::new(kind.clone()));
        self.ops.push(HostOp::Create {
            id,
            kind: kind.clone(),
        });
        id
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        self.node_mut(node)?
            .properties
            .insert(name.to_owned(), value.clone());
        self.ops.push(HostOp::SetProperty {
            id: node,
            name: name.to_owned(),
            value: value.clone(),
        });
        Ok(())
    }

    fn remove_property(&mut self, node: NodeId, name: &str) -> Result<(), HostError> {
        self.node_mut(node)?.properties.shift_remove(name);
        self.ops.push(HostOp::RemoveProperty {
            id: node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), HostError> {
        self.node_mut(node)?
            .listeners
            .entry(event.to_owned())
            .or_default()
            .push(handler);
        self.ops.push(HostOp::AddListener {
            id: node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        if let Some(handlers) = self.node_mut(node)?.listeners.get_mut(event) {
            if let Some(index) = handlers.iter().position(|existing| existing == handler) {
                handlers.remove(index);
            }
        }
        self.ops.push(HostOp::RemoveListener {
            id: node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.node(parent)?;
        if let Some(previous) = self.node(child)?.parent {
            self.node_mut(previous)?
                .children
                .retain(|&existing| existing != child);
        }
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        self.ops.push(HostOp::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        let children = &mut self.node_mut(parent)?.children;
        let index = children
            .iter()
            .position(|&existing| existing == child)
            .ok_or(HostError::NotAChild { parent, child })?;
        children.remove(index);
        self.node_mut(child)?.parent = None;
        self.ops.push(HostOp::RemoveChild { parent, child });
        Ok(())
    }
}

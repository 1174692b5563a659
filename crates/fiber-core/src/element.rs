//! Immutable element descriptors and the factory functions that build them.
//!
//! An [`Element`] is produced once per render pass for every declared node
//! and never mutated afterwards. Cloning is cheap: the props live behind an
//! [`Rc`].

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::host::HostEvent;

/// Reserved props key for the child list. Never assigned to a host node.
pub const CHILDREN_KEY: &str = "children";

/// Property carrying the content of a text element.
pub const TEXT_VALUE_KEY: &str = "nodeValue";

const EVENT_PREFIX: &str = "on";

/// A function component: receives its props, returns the element it renders.
pub type ComponentFn = fn(&Props) -> Element;

#[derive(Clone)]
pub enum ElementType {
    /// A host tag such as `div` or `h1`.
    Host(Rc<str>),
    Component(ComponentFn),
    /// Placeholder type for raw primitive children.
    Text,
}

impl PartialEq for ElementType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ElementType::Host(a), ElementType::Host(b)) => a == b,
            (ElementType::Component(a), ElementType::Component(b)) => *a as usize == *b as usize,
            (ElementType::Text, ElementType::Text) => true,
            _ => false,
        }
    }
}

impl Eq for ElementType {}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Host(tag) => write!(f, "Host({tag})"),
            ElementType::Component(render) => write!(f, "Component({:#x})", *render as usize),
            ElementType::Text => f.write_str("Text"),
        }
    }
}

/// Event listener stored in props. Two handlers are equal only when they
/// are the same allocation, so a closure rebuilt on every render counts as
/// a change.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&HostEvent)>);

impl EventHandler {
    pub fn new(handler: impl Fn(&HostEvent) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &HostEvent) {
        (self.0)(event)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
}

impl PropValue {
    pub fn handler(handler: impl Fn(&HostEvent) + 'static) -> Self {
        PropValue::Handler(EventHandler::new(handler))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => f.write_str(value),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Handler(_) => f.write_str("[handler]"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(i64::from(value))
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<u32> for PropValue {
    fn from(value: u32) -> Self {
        PropValue::Int(i64::from(value))
    }
}

/// Saturates at `i64::MAX`.
impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

/// Named attributes in declaration order plus the ordered child list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    attributes: IndexMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Binds `handler` to `event`, stored under `on<event>`.
    pub fn on(self, event: &str, handler: impl Fn(&HostEvent) + 'static) -> Self {
        self.with(format!("{EVENT_PREFIX}{event}"), PropValue::handler(handler))
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub(crate) fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }
}

/// Whether a props key binds an event listener.
pub fn is_event(name: &str) -> bool {
    name.starts_with(EVENT_PREFIX)
}

/// Whether a props key is assigned to the host node as a plain property.
pub fn is_property(name: &str) -> bool {
    name != CHILDREN_KEY && !is_event(name)
}

/// Host event name for an event key: `onClick` listens for `click`.
pub fn event_name(name: &str) -> String {
    name[EVENT_PREFIX.len()..].to_lowercase()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    kind: ElementType,
    props: Rc<Props>,
}

impl Element {
    pub fn new(kind: ElementType, props: Props) -> Self {
        Self {
            kind,
            props: Rc::new(props),
        }
    }

    pub fn kind(&self) -> &ElementType {
        &self.kind
    }

    pub fn props(&self) -> &Rc<Props> {
        &self.props
    }
}

/// Builds a host element. Children are stored under the reserved slot in
/// the order given.
pub fn create_element(tag: &str, props: Props, children: Vec<Element>) -> Element {
    Element::new(ElementType::Host(Rc::from(tag)), props.with_children(children))
}

/// Builds an element rendered by a function component.
pub fn component(render: ComponentFn, props: Props) -> Element {
    Element::new(ElementType::Component(render), props)
}

/// Wraps a primitive into a text element with no children.
pub fn text(value: impl Into<PropValue>) -> Element {
    Element::new(ElementType::Text, Props::new().with(TEXT_VALUE_KEY, value))
}

macro_rules! text_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Element {
                fn from(value: $ty) -> Self {
                    text(value)
                }
            }
        )*
    };
}

text_from!(&str, String, i32, i64, u32, usize, f64, bool);

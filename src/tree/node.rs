//! Tree model - the tagged node variants the walker pattern-matches on.
//!
//! A tree description is a [`VNode`]: plain elements and text are data the
//! traversal descends into; streams, components and state-mappers are
//! terminal placeholders the traversal stops at. The enum discriminant *is*
//! the structural-identity marker: there is no way to smuggle an untagged
//! host object into the tree, and classification never duck-types.
//!
//! Element and component payloads live behind `Rc`, which gives nodes the
//! reference identity the combination engine's unchanged-value bail-out
//! compares by: cloning a `VNode` is cheap and preserves identity.
//!
//! # Example
//!
//! ```ignore
//! use trellis::tree::{el, fragment, text};
//! use trellis::stream::EventStream;
//!
//! let name$ = EventStream::of(text("world"));
//! let tree = el("div", [], vec![
//!     text("hello "),
//!     name$.into(),
//! ]);
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::channel::{Component, StateValue};
use crate::scope::Scope;
use crate::stream::EventStream;

/// Tag used for grouping-only elements.
pub const FRAGMENT_TAG: &str = "";

// =============================================================================
// Node Variants
// =============================================================================

/// A state-mapper: a pure function applied against the ambient state
/// stream. The walker resolves it into a stream placeholder.
pub type StateMapper = Rc<dyn Fn(&StateValue) -> VNode>;

/// One node of a tree description.
#[derive(Clone)]
pub enum VNode {
    /// A host element (or fragment): tag, props, children.
    Element(Rc<Element>),
    /// A text leaf.
    Text(Rc<str>),
    /// A live stream of nodes; terminal placeholder.
    Stream(EventStream<VNode>),
    /// A component invocation; terminal placeholder.
    Component(Rc<ComponentNode>),
    /// A state-mapper; terminal placeholder, resolved against the ambient
    /// state stream during traversal.
    StateMapper(StateMapper),
}

impl VNode {
    /// Reference identity: do the two handles point at the same node?
    ///
    /// This is the comparison the combination engine bails out on - a
    /// structurally equal but distinct node is *not* the same node.
    pub fn ref_eq(a: &Self, b: &Self) -> bool {
        match (a, b) {
            (Self::Element(x), Self::Element(y)) => Rc::ptr_eq(x, y),
            (Self::Text(x), Self::Text(y)) => Rc::ptr_eq(x, y),
            (Self::Stream(x), Self::Stream(y)) => x.same_stream(y),
            (Self::Component(x), Self::Component(y)) => Rc::ptr_eq(x, y),
            (Self::StateMapper(x), Self::StateMapper(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }

    pub fn as_element(&self) -> Option<&Rc<Element>> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The author-written key of this node, if it carries one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Element(el) => el.key.as_deref(),
            Self::Component(cmp) => cmp.key.as_deref(),
            _ => None,
        }
    }

    /// Shallow node kind name, for warnings.
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::Element(_) => "element",
            Self::Text(_) => "text",
            Self::Stream(_) => "stream",
            Self::Component(_) => "component",
            Self::StateMapper(_) => "state-mapper",
        }
    }
}

impl std::fmt::Debug for VNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Element(el) => f
                .debug_struct("Element")
                .field("tag", &el.tag)
                .field("key", &el.key)
                .field("props", &el.props.keys().collect::<Vec<_>>())
                .field("children", &el.children)
                .finish(),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Component(_) => f.write_str("Component(..)"),
            Self::StateMapper(_) => f.write_str("StateMapper(..)"),
        }
    }
}

impl From<EventStream<VNode>> for VNode {
    fn from(stream: EventStream<VNode>) -> Self {
        Self::Stream(stream)
    }
}

impl From<&str> for VNode {
    fn from(s: &str) -> Self {
        text(s)
    }
}

// =============================================================================
// Element
// =============================================================================

/// Condition attached to an element: the element renders only while the
/// condition holds. The walker rewrites conditional elements into dynamic
/// component placeholders.
#[derive(Clone)]
pub enum Cond {
    /// Static condition.
    Value(bool),
    /// Live condition stream.
    Stream(EventStream<bool>),
    /// Condition derived from the ambient state.
    Mapper(Rc<dyn Fn(&StateValue) -> bool>),
}

/// A host element: tag, optional identity key, optional scope/condition,
/// props and children. Props values are full nodes, so streams and
/// components can sit in prop position as well as child position.
#[derive(Clone, Default)]
pub struct Element {
    pub tag: String,
    pub key: Option<String>,
    /// Explicit state scope for the whole subtree under this element.
    pub scope: Option<Scope>,
    /// Render-only-while condition.
    pub cond: Option<Cond>,
    pub props: BTreeMap<String, VNode>,
    pub children: Vec<VNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn is_fragment(&self) -> bool {
        self.tag == FRAGMENT_TAG
    }

    pub fn into_node(self) -> VNode {
        VNode::Element(Rc::new(self))
    }
}

// =============================================================================
// Component Node
// =============================================================================

/// A component invocation embedded in the tree.
#[derive(Clone)]
pub struct ComponentNode {
    pub component: Component,
    pub key: Option<String>,
    /// Explicit state scope; `None` means auto-isolation.
    pub scope: Option<Scope>,
    /// Escape hatch: receive the outer channels unmodified. Used when a
    /// component must observe state shared with siblings or ancestors.
    pub noscope: bool,
    pub props: BTreeMap<String, VNode>,
    pub children: Vec<VNode>,
}

impl ComponentNode {
    pub fn new(component: Component) -> Self {
        Self {
            component,
            key: None,
            scope: None,
            noscope: false,
            props: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_noscope(mut self) -> Self {
        self.noscope = true;
        self
    }

    pub fn with_children(mut self, children: Vec<VNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<VNode>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn into_node(self) -> VNode {
        VNode::Component(Rc::new(self))
    }
}

// =============================================================================
// Builders
// =============================================================================

/// A text leaf.
pub fn text(s: impl AsRef<str>) -> VNode {
    VNode::Text(Rc::from(s.as_ref()))
}

/// A host element node.
pub fn el<const N: usize>(
    tag: impl Into<String>,
    props: [(&str, VNode); N],
    children: Vec<VNode>,
) -> VNode {
    let mut element = Element::new(tag);
    for (name, value) in props {
        element.props.insert(name.to_string(), value);
    }
    element.children = children;
    element.into_node()
}

/// A grouping-only element.
pub fn fragment(children: Vec<VNode>) -> VNode {
    let mut element = Element::new(FRAGMENT_TAG);
    element.children = children;
    element.into_node()
}

/// A component placeholder with default (auto) isolation.
pub fn component(
    f: impl Fn(&crate::channel::Sources) -> Result<crate::channel::Out, crate::error::ComposeError>
    + 'static,
) -> VNode {
    ComponentNode::new(Rc::new(f)).into_node()
}

/// A state-mapper node: `f` is applied to every ambient state value and
/// its result is rendered in place.
pub fn map_state(f: impl Fn(&StateValue) -> VNode + 'static) -> VNode {
    VNode::StateMapper(Rc::new(f))
}

// =============================================================================
// Tests
// =============================================================================

//! Channels - the named-stream contract between components and the engine.
//!
//! A component is any function `&Sources -> Result<Out, ComposeError>`.
//! [`Sources`] is the map of named input streams (plus the state channel and
//! the props bag the engine threads through); [`Sinks`] is the map of named
//! output streams. Every channel carries [`SinkValue`] payloads; the
//! reserved tree-output channel carries only [`SinkValue::View`].
//!
//! # Example
//!
//! ```ignore
//! use trellis::channel::{Out, Sinks, SinkValue, Sources};
//! use trellis::tree::text;
//!
//! // Full channel-map form:
//! let cmp = trellis::channel::component_fn(|_sources: &Sources| {
//!     let mut sinks = Sinks::new();
//!     sinks.insert("view", trellis::stream::EventStream::of(
//!         SinkValue::View(text("hello")),
//!     ));
//!     Ok(Out::Sinks(sinks))
//! });
//!
//! // Bare-node shorthand:
//! let shorthand = trellis::channel::component_fn(|_| Ok(Out::View(text("hi"))));
//! ```

mod store;

pub use store::StateStore;

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::ComposeError;
use crate::stream::EventStream;
use crate::tree::VNode;

/// Dynamic value carried by state and generic channels.
pub type StateValue = serde_json::Value;

/// Name of the conventional state channel.
pub const STATE_CHANNEL: &str = "state";

// =============================================================================
// Payloads
// =============================================================================

/// A state reducer: maps the previous state to the next one.
pub type Reducer = Rc<dyn Fn(&StateValue) -> StateValue>;

/// Payload of a channel emission.
#[derive(Clone)]
pub enum SinkValue {
    /// A plain dynamic value (e.g. an outgoing request description).
    Value(StateValue),
    /// A state reducer. The scoping layer rewrites these when a component
    /// is isolated, so reducers always apply to the right state slice.
    Reducer(Reducer),
    /// A resolved renderable tree. Only the tree-output channel carries
    /// these.
    View(VNode),
}

impl SinkValue {
    /// Convenience constructor for reducer payloads.
    pub fn reducer(f: impl Fn(&StateValue) -> StateValue + 'static) -> Self {
        Self::Reducer(Rc::new(f))
    }

    pub fn as_view(&self) -> Option<&VNode> {
        match self {
            Self::View(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&StateValue> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl std::fmt::Debug for SinkValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Reducer(_) => f.write_str("Reducer(..)"),
            Self::View(_) => f.write_str("View(..)"),
        }
    }
}

// =============================================================================
// Component Contract
// =============================================================================

/// Component output: a full channel map, or one of the shorthand forms
/// resolved by the engine (see `compose::shorthand`).
pub enum Out {
    /// Full channel map.
    Sinks(Sinks),
    /// Bare renderable node; sinks default to empty, sources to the
    /// invoking component's sources.
    View(VNode),
    /// Node plus explicit event sinks.
    ViewWithSinks(VNode, Sinks),
    /// Node, event sinks, and an override for the input channel set.
    Full(VNode, Sinks, Sources),
}

/// A component: invoked with sources, produces an output form.
pub type Component = Rc<dyn Fn(&Sources) -> Result<Out, ComposeError>>;

/// Wrap a closure as a [`Component`].
pub fn component_fn(f: impl Fn(&Sources) -> Result<Out, ComposeError> + 'static) -> Component {
    Rc::new(f)
}

// =============================================================================
// State Channel
// =============================================================================

/// The ambient state input: a stream of state values with memory.
#[derive(Clone)]
#[derive(Debug)]
pub struct StateChannel {
    /// The ambient state stream. Emits the current state immediately on
    /// subscription (memory semantics) and again on every update.
    pub stream: EventStream<StateValue>,
}

impl StateChannel {
    pub fn new(stream: EventStream<StateValue>) -> Self {
        Self { stream }
    }
}

// =============================================================================
// Props Bag
// =============================================================================

/// Props and children the engine passes to an invoked component, alongside
/// the regular channels. Props are not a channel: they are static per
/// component instance.
#[derive(Clone, Default)]
pub struct PropsBag {
    pub props: BTreeMap<String, VNode>,
    pub children: Vec<VNode>,
    pub key: Option<String>,
}

// =============================================================================
// Sources
// =============================================================================

/// Named input streams handed to a component.
#[derive(Clone, Default)]
pub struct Sources {
    channels: BTreeMap<String, EventStream<SinkValue>>,
    state: Option<StateChannel>,
    props: Option<Rc<PropsBag>>,
}

impl std::fmt::Debug for Sources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sources").finish_non_exhaustive()
    }
}

impl Sources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a named input channel.
    pub fn with_channel(mut self, name: impl Into<String>, stream: EventStream<SinkValue>) -> Self {
        self.channels.insert(name.into(), stream);
        self
    }

    /// Attach the ambient state channel.
    pub fn with_state(mut self, state: StateChannel) -> Self {
        self.state = Some(state);
        self
    }

    pub(crate) fn with_props(&self, props: PropsBag) -> Self {
        let mut next = self.clone();
        next.props = Some(Rc::new(props));
        next
    }

    pub(crate) fn replace_state(&self, state: StateChannel) -> Self {
        let mut next = self.clone();
        next.state = Some(state);
        next
    }

    pub fn channel(&self, name: &str) -> Option<&EventStream<SinkValue>> {
        self.channels.get(name)
    }

    /// Names of the generic channels (state and props excluded).
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// The state channel, if attached.
    pub fn state_opt(&self) -> Option<&StateChannel> {
        self.state.as_ref()
    }

    /// The state channel, required. Missing state is fatal at first
    /// access: it means state scoping or a state mapper was used in a
    /// tree composed without a state source.
    pub fn state(&self) -> Result<&StateChannel, ComposeError> {
        self.state
            .as_ref()
            .ok_or_else(|| ComposeError::MissingChannel(STATE_CHANNEL.into()))
    }

    /// Props bag for the current component instance, if any.
    pub fn props(&self) -> Option<&PropsBag> {
        self.props.as_deref()
    }

    pub fn prop(&self, name: &str) -> Option<&VNode> {
        self.props.as_ref().and_then(|bag| bag.props.get(name))
    }

    /// Children passed to the current component instance.
    pub fn children(&self) -> Vec<VNode> {
        self.props
            .as_ref()
            .map(|bag| bag.children.clone())
            .unwrap_or_default()
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Named output streams produced by a component or by the engine.
#[derive(Clone, Default)]
pub struct Sinks {
    channels: BTreeMap<String, EventStream<SinkValue>>,
}

impl Sinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, stream: EventStream<SinkValue>) {
        self.channels.insert(name.into(), stream);
    }

    pub fn with_channel(mut self, name: impl Into<String>, stream: EventStream<SinkValue>) -> Self {
        self.insert(name, stream);
        self
    }

    pub fn channel(&self, name: &str) -> Option<&EventStream<SinkValue>> {
        self.channels.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventStream<SinkValue>)> {
        self.channels.iter().map(|(name, s)| (name.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// The tree-output stream, filtered down to view payloads.
    ///
    /// A missing tree channel yields a never-emitting stream (the parent
    /// combination will gate on it). Non-view payloads on the tree channel
    /// violate the channel contract and are dropped with a warning.
    pub fn view_stream(&self, tree_channel: &str) -> EventStream<VNode> {
        match self.channel(tree_channel) {
            Some(stream) => stream.filter_map(|payload| match payload {
                SinkValue::View(node) => Some(node.clone()),
                other => {
                    eprintln!(
                        "[trellis] non-view payload on tree channel dropped: {other:?}"
                    );
                    None
                }
            }),
            None => EventStream::never(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

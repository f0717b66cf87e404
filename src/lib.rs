//! # trellis
//!
//! Reactive component composition for stream-driven view trees.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! fine-grained reactivity.
//!
//! ## Architecture
//!
//! A component is a function from named input streams ([`Sources`]) to named
//! output streams ([`Sinks`]). Composition takes a static tree description
//! with reactive placeholders embedded in it - streams, components, state
//! mappers - and flattens the whole thing into one sink map:
//!
//! ```text
//! VNode tree → walker → placeholders → combine / merge → Sinks
//! ```
//!
//! The tree-output channel carries fully resolved trees, gated until every
//! placeholder has produced a value and re-emitted on every change. All
//! other channels are the interleaved event output of every component in
//! the tree. State is a single ambient stream; components are isolated
//! into their own slice of it automatically, or explicitly via lenses.
//!
//! ## Modules
//!
//! - [`tree`] - Node types, builders, the placeholder walker
//! - [`stream`] - Push streams over signals, combine/merge combinators
//! - [`channel`] - Sources, sinks, payloads, the state store
//! - [`scope`] - State lenses and isolation
//! - [`compose`] - The engine: composition, shorthands, dynamic components

pub mod channel;
pub mod compose;
pub mod config;
pub mod error;
pub mod scope;
pub mod stream;
pub mod tree;
pub mod util;

// Re-export commonly used items
pub use channel::{
    component_fn, Component, Out, PropsBag, Reducer, SinkValue, Sinks, Sources, StateChannel,
    StateStore, StateValue, STATE_CHANNEL,
};
pub use compose::{
    compose, conditional_component, dynamic_component, scope_component, wrap_in_component,
    Composer, Discriminant,
};
pub use config::{ComposeConfig, DEFAULT_TREE_CHANNEL};
pub use error::ComposeError;
pub use scope::{path_lens, Scope, StateLens};
pub use stream::{combine_latest, merge_streams, Cleanup, EventStream};
pub use tree::{
    component, el, fragment, map_state, text, ComponentNode, Cond, Element, VNode, FRAGMENT_TAG,
};
pub use util::{select_event, set_at_path, value_at_path};

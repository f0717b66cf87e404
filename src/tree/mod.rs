//! Tree descriptions and the placeholder walker.

pub mod node;
pub mod path;
pub(crate) mod walk;

pub use node::{
    component, el, fragment, map_state, text, ComponentNode, Cond, Element, StateMapper, VNode,
    FRAGMENT_TAG,
};
pub use path::{path_to_string, PathSeg};

pub(crate) use path::{read_at, write_at};
pub(crate) use walk::{traverse, Placeholder, PlaceholderKind};

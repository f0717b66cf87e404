//! The composition engine and its helpers.

mod dynamic;
mod engine;
mod shorthand;
mod sinks;

pub use dynamic::{conditional_component, dynamic_component, Discriminant, KeyFn, Selector};
pub use engine::Composer;
pub use shorthand::{scope_component, wrap_in_component};

pub(crate) use shorthand::resolve_shorthand;

use crate::channel::{Sinks, Sources};
use crate::config::ComposeConfig;
use crate::error::ComposeError;
use crate::tree::VNode;

/// Compose a tree with the default configuration. Shorthand for building
/// a [`Composer`] when no custom combinators or tree channel are needed.
pub fn compose(tree: VNode, sources: &Sources) -> Result<Sinks, ComposeError> {
    Composer::new(ComposeConfig::default()).compose(tree, sources)
}

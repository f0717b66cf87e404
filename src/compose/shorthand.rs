//! Shorthand resolution - normalizing component output forms.
//!
//! Components may return a full channel map or one of three shorthands:
//! a bare node, a node plus event sinks, or a node plus sinks plus a
//! sources override. Resolution happens once per invocation, before
//! isolation: after it, the engine only ever sees a channel map.

use std::rc::Rc;

use crate::channel::{Component, Out, Sinks, Sources};
use crate::error::ComposeError;
use crate::tree::{fragment, VNode};

use super::engine::Composer;

/// A component normalized to the full channel-map contract.
pub(crate) type ResolvedComponent = Rc<dyn Fn(&Sources) -> Result<Sinks, ComposeError>>;

/// Normalize `cmp` so every output form reaches the engine as sinks.
/// Node-bearing shorthands recurse into a nested composition of the node,
/// with the declared event sinks (if any) aggregated alongside.
pub(crate) fn resolve_shorthand(composer: &Composer, cmp: Component) -> ResolvedComponent {
    let composer = composer.clone();
    Rc::new(move |sources| match cmp(sources)? {
        Out::Sinks(sinks) => Ok(sinks),
        Out::View(node) => composer.compose_with(lift(node), None, sources),
        Out::ViewWithSinks(node, sinks) => composer.compose_with(lift(node), Some(sinks), sources),
        Out::Full(node, sinks, overrides) => {
            composer.compose_with(lift(node), Some(sinks), &overrides)
        }
    })
}

// A bare text return is a valid shorthand; composition roots are always
// elements, so lift it into a fragment.
fn lift(node: VNode) -> VNode {
    match node {
        text @ VNode::Text(_) => fragment(vec![text]),
        other => other,
    }
}

/// Lift static nodes into a component that renders them. Used by the
/// walker for scoped/conditional element rewrites, and handy on its own
/// for attaching a scope or props to plain markup.
pub fn wrap_in_component(values: Vec<VNode>) -> Component {
    Rc::new(move |_sources| Ok(Out::View(fragment(values.clone()))))
}

/// A pass-through container component: renders the children it was given.
/// Attach an explicit scope to its node to re-scope a subtree without
/// introducing markup.
pub fn scope_component() -> Component {
    Rc::new(|sources: &Sources| Ok(Out::View(fragment(sources.children()))))
}

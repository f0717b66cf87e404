//! Tree walker - pre-order discovery of reactive placeholders.
//!
//! The walker descends a static [`VNode`] tree and records every position
//! whose content is not known until runtime: embedded streams, state
//! mappers, and component nodes. Static elements and text are passed over.
//! Traversal never mutates the input tree; conditional and scoped elements
//! are rewritten into equivalent component nodes on the fly, leaving the
//! original untouched.

use crate::channel::{Sinks, Sources};
use crate::compose::{conditional_component, wrap_in_component, Composer};
use crate::error::ComposeError;
use crate::tree::node::{ComponentNode, Element, VNode};
use crate::tree::path::PathSeg;

use std::rc::Rc;

// ============================================================================
// Placeholders
// ============================================================================

/// A reactive position discovered in the tree.
pub(crate) struct Placeholder {
    /// The node occupying the position (post-rewrite).
    pub node: VNode,
    /// Path from the traversal root to the position.
    pub path: Vec<PathSeg>,
    pub kind: PlaceholderKind,
}

impl std::fmt::Debug for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Placeholder")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

pub(crate) enum PlaceholderKind {
    /// An embedded stream of tree fragments (state mappers resolve to
    /// this kind as well).
    Stream,
    /// An invoked component; its sinks feed both the tree output and the
    /// sink aggregation of the enclosing composition.
    Component { sinks: Sinks },
}

// ============================================================================
// Traversal
// ============================================================================

/// Walks `root` in pre-order and returns every placeholder found, with
/// components already invoked. Traversal does not descend into the props
/// or children of a component node; those belong to the component's own
/// composition.
pub(crate) fn traverse(
    composer: &Composer,
    sources: &Sources,
    instance_id: u64,
    root: &VNode,
) -> Result<Vec<Placeholder>, ComposeError> {
    let mut found = Vec::new();
    let mut path = Vec::new();
    visit(composer, sources, instance_id, root, &mut path, &mut found)?;
    Ok(found)
}

fn visit(
    composer: &Composer,
    sources: &Sources,
    instance_id: u64,
    node: &VNode,
    path: &mut Vec<PathSeg>,
    found: &mut Vec<Placeholder>,
) -> Result<(), ComposeError> {
    // Conditional and scoped elements become component nodes before
    // classification; the rewrite is pure and local.
    let rewritten;
    let node = match node {
        VNode::Element(el) if el.cond.is_some() || el.scope.is_some() => {
            rewritten = rewrite_element(composer, el);
            &rewritten
        }
        other => other,
    };

    match node {
        VNode::Text(_) => {}
        VNode::Stream(_) => {
            found.push(Placeholder {
                node: node.clone(),
                path: path.clone(),
                kind: PlaceholderKind::Stream,
            });
        }
        VNode::StateMapper(map) => {
            // A state mapper is a stream placeholder over the ambient
            // state channel; without one it cannot resolve.
            let state = sources.state()?;
            let map = map.clone();
            let stream = state.stream.map(move |value| map(value));
            found.push(Placeholder {
                node: VNode::Stream(stream),
                path: path.clone(),
                kind: PlaceholderKind::Stream,
            });
        }
        VNode::Component(cmp) => {
            let sinks = composer.invoke_node(cmp, path, instance_id, sources)?;
            found.push(Placeholder {
                node: node.clone(),
                path: path.clone(),
                kind: PlaceholderKind::Component { sinks },
            });
        }
        VNode::Element(el) => {
            for (name, value) in &el.props {
                path.push(PathSeg::Prop(name.clone()));
                visit(composer, sources, instance_id, value, path, found)?;
                path.pop();
            }
            for (index, child) in el.children.iter().enumerate() {
                path.push(PathSeg::Child(index));
                visit(composer, sources, instance_id, child, path, found)?;
                path.pop();
            }
        }
    }

    Ok(())
}

// ============================================================================
// Element rewrites
// ============================================================================

/// Rewrites a conditional or scoped element into a component node. A
/// conditional element keeps its scope on the inner copy, so the scope
/// applies only while the branch is live.
fn rewrite_element(composer: &Composer, el: &Rc<Element>) -> VNode {
    let mut inner = Element::clone(el);

    if let Some(cond) = inner.cond.take() {
        let then_cmp = wrap_in_component(vec![VNode::Element(Rc::new(inner))]);
        let mut node = ComponentNode::new(conditional_component(composer, cond, then_cmp, None));
        node.key = el.key.clone();
        node.into_node()
    } else {
        let scope = inner.scope.take();
        let mut node = ComponentNode::new(wrap_in_component(vec![VNode::Element(Rc::new(inner))]));
        node.key = el.key.clone();
        node.scope = scope;
        node.into_node()
    }
}

//! Composition engine - walking, invoking, combining.
//!
//! [`Composer::compose`] turns a static tree description plus named input
//! channels into named output channels. The tree-output channel carries a
//! stream of fully resolved trees: every placeholder replaced by its
//! latest value, gated until each placeholder has produced at least one.
//! All other channels are merged component event output.
//!
//! Invocation recurses through here: a component returning a node
//! shorthand composes that node as a nested tree, with a fresh instance
//! id drawn from the same counter, so auto-partition keys stay unique
//! across the whole run.

use std::cell::Cell;
use std::rc::Rc;

use crate::channel::{Component, PropsBag, Out, SinkValue, Sinks, Sources};
use crate::config::ComposeConfig;
use crate::error::ComposeError;
use crate::scope::{auto_lens, scope_sinks, scope_sources, Isolation, Scope};
use crate::stream::EventStream;
use crate::tree::{
    fragment, path_to_string, read_at, traverse, write_at, ComponentNode, PathSeg, Placeholder,
    PlaceholderKind, VNode,
};

use super::shorthand::resolve_shorthand;
use super::sinks::aggregate_sinks;

// ============================================================================
// Composer
// ============================================================================

/// The composition engine. Cheap to clone; clones share the instance-id
/// counter, so nested and repeated compositions never collide on
/// auto-generated keys.
#[derive(Clone)]
pub struct Composer {
    config: ComposeConfig,
    ids: Rc<Cell<u64>>,
}

impl Composer {
    pub fn new(config: ComposeConfig) -> Self {
        Self {
            config,
            ids: Rc::new(Cell::new(0)),
        }
    }

    pub fn config(&self) -> &ComposeConfig {
        &self.config
    }

    fn next_instance_id(&self) -> u64 {
        let id = self.ids.get() + 1;
        self.ids.set(id);
        id
    }

    /// Compose a tree against the given sources. The returned sinks hold
    /// the tree-output channel plus the merged event channels of every
    /// component in the tree.
    pub fn compose(&self, tree: VNode, sources: &Sources) -> Result<Sinks, ComposeError> {
        self.compose_with(tree, None, sources)
    }

    /// Compose with extra event sinks aggregated in (the node-plus-sinks
    /// shorthand forms land here).
    pub(crate) fn compose_with(
        &self,
        tree: VNode,
        event_sinks: Option<Sinks>,
        sources: &Sources,
    ) -> Result<Sinks, ComposeError> {
        let instance_id = self.next_instance_id();

        // Wrapping in a fragment gives the root itself an addressable
        // position, so a tree that *is* a placeholder still works.
        let root = fragment(vec![tree]);
        let placeholders = traverse(self, sources, instance_id, &root)?;

        let view = self.build_view_stream(instance_id, root, &placeholders);
        let mut sinks = aggregate_sinks(&self.config, event_sinks, &placeholders);
        sinks.insert(
            self.config.tree_channel.clone(),
            view.map(|node| SinkValue::View(node.clone())),
        );
        Ok(sinks)
    }

    /// Wrap a component so it always runs under the given explicit scope,
    /// wherever it is later placed.
    pub fn isolate(&self, cmp: Component, scope: Scope) -> Component {
        let composer = self.clone();
        Rc::new(move |sources: &Sources| {
            let resolved = resolve_shorthand(&composer, cmp.clone());
            let isolation = Isolation::Explicit(scope.clone().into_lens());
            let inner = scope_sources(sources, &isolation)?;
            Ok(Out::Sinks(scope_sinks(resolved(&inner)?, &isolation)))
        })
    }

    // ------------------------------------------------------------------------
    // Invocation
    // ------------------------------------------------------------------------

    /// Invoke a component placeholder found at `path`: resolve shorthands,
    /// apply isolation, thread the props bag.
    pub(crate) fn invoke_node(
        &self,
        node: &ComponentNode,
        path: &[PathSeg],
        instance_id: u64,
        sources: &Sources,
    ) -> Result<Sinks, ComposeError> {
        let isolation = if node.noscope {
            Isolation::None
        } else if let Some(scope) = &node.scope {
            Isolation::Explicit(scope.clone().into_lens())
        } else {
            Isolation::Auto(auto_lens(auto_scope_key(instance_id, path)))
        };

        let child_sources = scope_sources(sources, &isolation)?.with_props(PropsBag {
            props: node.props.clone(),
            children: node.children.clone(),
            key: node.key.clone(),
        });

        let resolved = resolve_shorthand(self, node.component.clone());
        Ok(scope_sinks(resolved(&child_sources)?, &isolation))
    }

    // ------------------------------------------------------------------------
    // Tree combination
    // ------------------------------------------------------------------------

    /// Combine the placeholder signal streams into the resolved-tree
    /// stream. Each emission rewrites only the placeholder positions whose
    /// value actually changed (by reference), shallow-cloning the spine
    /// above them; untouched siblings keep their identity.
    fn build_view_stream(
        &self,
        instance_id: u64,
        root: VNode,
        placeholders: &[Placeholder],
    ) -> EventStream<VNode> {
        let signals: Vec<EventStream<VNode>> = placeholders
            .iter()
            .map(|p| match &p.kind {
                PlaceholderKind::Component { sinks } => sinks.view_stream(&self.config.tree_channel),
                PlaceholderKind::Stream => match &p.node {
                    VNode::Stream(stream) => stream.clone(),
                    other => {
                        eprintln!(
                            "[trellis] stream placeholder holds a {} node; ignoring",
                            other.kind_name()
                        );
                        EventStream::never()
                    }
                },
            })
            .collect();

        struct WriteRecord {
            path: Vec<PathSeg>,
            /// Key assigned to unkeyed element values arriving here. An
            /// author key on the original placeholder wins; otherwise a
            /// generated key tied to the instance and position.
            key: String,
            last: Option<VNode>,
        }

        let mut records: Vec<WriteRecord> = placeholders
            .iter()
            .map(|p| WriteRecord {
                path: p.path.clone(),
                key: p
                    .node
                    .key()
                    .map(String::from)
                    .unwrap_or_else(|| auto_node_key(instance_id, &p.path)),
                last: None,
            })
            .collect();

        let combined = (self.config.combine)(signals);
        let mut current = root;
        combined.map(move |values| {
            for (value, record) in values.iter().zip(records.iter_mut()) {
                let unchanged = record
                    .last
                    .as_ref()
                    .is_some_and(|last| VNode::ref_eq(last, value));
                if unchanged {
                    continue;
                }
                record.last = Some(value.clone());
                current = write_at(&current, &record.path, keyed(value, &record.key));
            }
            // Unwrap the addressing fragment.
            read_at(&current, &[PathSeg::Child(0)])
                .cloned()
                .unwrap_or_else(|| current.clone())
        })
    }
}

/// Partition key for auto-isolation of the component at `path`.
fn auto_scope_key(instance_id: u64, path: &[PathSeg]) -> String {
    format!("scope-{instance_id}-{}", path_to_string(path))
}

/// Stable identity key for the resolved value at a placeholder position.
fn auto_node_key(instance_id: u64, path: &[PathSeg]) -> String {
    format!("key-{instance_id}-{}", path_to_string(path))
}

/// Assign `key` to an unkeyed element value; keyed values and non-element
/// values pass through.
fn keyed(value: &VNode, key: &str) -> VNode {
    match value {
        VNode::Element(el) if el.key.is_none() => {
            let mut el = (**el).clone();
            el.key = Some(key.to_string());
            el.into_node()
        }
        other => other.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================

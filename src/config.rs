//! Engine configuration - the reserved tree channel and the combinators.
//!
//! The combinators are injection points, not implementation details: any
//! conforming pair (all-must-emit-before-first for the tree side,
//! first-to-emit-wins for the sink side) is substitutable. The defaults are
//! [`crate::stream::combine_latest`] and [`crate::stream::merge_streams`].

use std::rc::Rc;

use crate::channel::SinkValue;
use crate::stream::{combine_latest, merge_streams, EventStream};
use crate::tree::VNode;

/// Default name of the reserved tree-output channel.
pub const DEFAULT_TREE_CHANNEL: &str = "view";

/// Combines the per-placeholder signal streams into a stream of value
/// tuples; must gate until every constituent has emitted.
pub type CombineFn = Rc<dyn Fn(Vec<EventStream<VNode>>) -> EventStream<Vec<VNode>>>;

/// Interleaves same-named sink streams into one.
pub type MergeFn = Rc<dyn Fn(Vec<EventStream<SinkValue>>) -> EventStream<SinkValue>>;

/// Static configuration for a composition engine.
#[derive(Clone)]
pub struct ComposeConfig {
    /// Name of the reserved channel carrying the combined tree output.
    pub tree_channel: String,
    pub combine: CombineFn,
    pub merge: MergeFn,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            tree_channel: DEFAULT_TREE_CHANNEL.to_string(),
            combine: Rc::new(combine_latest),
            merge: Rc::new(merge_streams),
        }
    }
}

impl ComposeConfig {
    /// Default combinators with a custom tree channel name.
    pub fn with_tree_channel(name: impl Into<String>) -> Self {
        Self {
            tree_channel: name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ComposeConfig::default();
        assert_eq!(config.tree_channel, "view");
    }

    #[test]
    fn test_custom_tree_channel() {
        let config = ComposeConfig::with_tree_channel("dom");
        assert_eq!(config.tree_channel, "dom");
    }
}

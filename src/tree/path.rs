//! Paths - locating and replacing nodes inside a tree.
//!
//! A path is the ordered list of property-access steps from the tree root
//! to a node. Paths serve two jobs: writing resolved placeholder values
//! back into the tree, and deriving stable synthetic identity keys.
//!
//! [`write_at`] shallow-clones every ancestor along the path and nothing
//! else. Untouched subtrees keep their `Rc` identity across emissions,
//! while every ancestor of a changed node gets a fresh identity, so a host
//! renderer comparing references sees exactly the spine that changed.

use std::rc::Rc;

use super::node::{Element, VNode};

// =============================================================================
// Path Segments
// =============================================================================

/// One step of a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSeg {
    /// Index into an element's children.
    Child(usize),
    /// Named prop of an element.
    Prop(String),
}

impl std::fmt::Display for PathSeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Child(idx) => write!(f, "{idx}"),
            Self::Prop(name) => f.write_str(name),
        }
    }
}

/// Dotted rendering of a path, used in synthetic keys and warnings.
pub fn path_to_string(path: &[PathSeg]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

// =============================================================================
// Read / Write
// =============================================================================

/// The node at `path`, if the path is still valid for this tree.
pub fn read_at<'a>(root: &'a VNode, path: &[PathSeg]) -> Option<&'a VNode> {
    let mut node = root;
    for seg in path {
        let element = node.as_element()?;
        node = match seg {
            PathSeg::Child(idx) => element.children.get(*idx)?,
            PathSeg::Prop(name) => element.props.get(name)?,
        };
    }
    Some(node)
}

/// Replace the node at `path`, shallow-cloning every ancestor.
///
/// Returns the new root. Siblings of the spine keep their identity; each
/// ancestor element is cloned exactly once. Paths always descend through
/// elements; a path that no longer matches the tree leaves it untouched
/// (with a warning), which can only happen on engine misuse.
pub fn write_at(root: &VNode, path: &[PathSeg], value: VNode) -> VNode {
    if path.is_empty() {
        return value;
    }
    let Some(element) = root.as_element() else {
        eprintln!(
            "[trellis] cannot write through a {} node at remaining path '{}'",
            root.kind_name(),
            path_to_string(path)
        );
        return root.clone();
    };

    let mut cloned: Element = (**element).clone();
    match &path[0] {
        PathSeg::Child(idx) => {
            if let Some(child) = element.children.get(*idx) {
                cloned.children[*idx] = write_at(child, &path[1..], value);
            }
        }
        PathSeg::Prop(name) => {
            if let Some(prop) = element.props.get(name) {
                let replaced = write_at(prop, &path[1..], value);
                cloned.props.insert(name.clone(), replaced);
            }
        }
    }
    VNode::Element(Rc::new(cloned))
}

// =============================================================================
// Tests
// =============================================================================

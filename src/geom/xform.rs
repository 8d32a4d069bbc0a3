//! Node transform flattening.
//!
//! With the hierarchy kept, each exported node is expressed relative to its
//! nearest exported ancestor; nodes that are not exported are skipped over.
//! Otherwise every node carries its world transform.

use std::collections::HashSet;

use crate::scene::{NodeId, SceneProvider};
use crate::util::Affine3A;

/// Exported node with its final transform.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportNode {
    pub node: NodeId,
    /// Nearest exported ancestor the transform is relative to.
    pub parent: Option<NodeId>,
    pub transform: Affine3A,
}

/// Nearest ancestor of `node` that is in `exported`.
pub fn nearest_exported_ancestor<S: SceneProvider + ?Sized>(
    scene: &S,
    node: NodeId,
    exported: &HashSet<NodeId>,
) -> Option<NodeId> {
    let mut cursor = scene.parent(node);
    while let Some(ancestor) = cursor {
        if exported.contains(&ancestor) {
            return Some(ancestor);
        }
        cursor = scene.parent(ancestor);
    }
    None
}

/// Final transforms for a complete set of exported nodes.
///
/// `nodes` must hold every exported node; ancestors are only matched
/// against this set.
pub fn flatten_transforms<S: SceneProvider + ?Sized>(
    scene: &S,
    nodes: &[NodeId],
    keep_hierarchy: bool,
) -> Vec<ExportNode> {
    let exported: HashSet<NodeId> = nodes.iter().copied().collect();

    nodes
        .iter()
        .map(|&node| {
            let world = scene.world_transform(node);
            let parent = if keep_hierarchy {
                nearest_exported_ancestor(scene, node, &exported)
            } else {
                None
            };
            // Column vectors: local = parent_world^-1 * world.
            let transform = match parent {
                Some(p) => scene.world_transform(p).inverse() * world,
                None => world,
            };
            ExportNode { node, parent, transform }
        })
        .collect()
}

// regtrav.rs - Capture tree traversal.

use bitflags::bitflags;

use crate::region::CaptureTree;

bitflags! {
    /// When the traversal callback fires for a node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TraverseAt: u32 {
        /// Before the node's children.
        const FIRST = 1;
        /// After the node's children.
        const LAST = 2;
        const BOTH = Self::FIRST.bits() | Self::LAST.bits();
    }
}

fn traverse_node<F>(tree: &CaptureTree, index: usize, at: TraverseAt, callback: &mut F, level: usize) -> i32
where
    F: FnMut(usize, usize, usize, usize, TraverseAt) -> i32,
{
    let Some(node) = tree.node(index) else {
        return 0;
    };
    let (beg, end) = node.span.unwrap_or((0, 0));

    if at.contains(TraverseAt::FIRST) {
        let r = callback(node.group, beg, end, level, TraverseAt::FIRST);
        if r != 0 {
            return r;
        }
    }

    for &child in &node.children {
        let r = traverse_node(tree, child, at, callback, level + 1);
        if r != 0 {
            return r;
        }
    }

    if at.contains(TraverseAt::LAST) {
        let r = callback(node.group, beg, end, level, TraverseAt::LAST);
        if r != 0 {
            return r;
        }
    }

    0
}

/// Walk `tree` depth first from the root.
/// Callback receives (group, beg, end, level, at) and returns 0 to continue;
/// any other value stops the walk and is returned.
pub fn capture_tree_traverse<F>(tree: &CaptureTree, at: TraverseAt, mut callback: F) -> i32
where
    F: FnMut(usize, usize, usize, usize, TraverseAt) -> i32,
{
    traverse_node(tree, 0, at, &mut callback, 0)
}

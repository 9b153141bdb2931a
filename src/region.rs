// region.rs - Match results.
// Flat group spans in UTF-16 units plus the optional capture tree.

pub const REGION_NOTPOS: i32 = -1;

/// One capture-group instance in the capture tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTreeNode {
    pub group: usize,
    /// Entered through a recursive call.
    pub recursion: bool,
    /// Entered inside a lookaround body.
    pub in_lookaround: bool,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Unset until the group's tail is reached.
    pub span: Option<(usize, usize)>,
}

/// Nested record of every capture made on the successful path.
/// Node 0 is the root and stands for group 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTree {
    nodes: Vec<CaptureTreeNode>,
}

impl CaptureTree {
    pub fn root(&self) -> &CaptureTreeNode {
        &self.nodes[0]
    }

    pub fn node(&self, index: usize) -> Option<&CaptureTreeNode> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[CaptureTreeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Child nodes of `index` in creation order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = &CaptureTreeNode> + '_ {
        self.nodes
            .get(index)
            .into_iter()
            .flat_map(move |n| n.children.iter().map(move |&c| &self.nodes[c]))
    }

    pub(crate) fn map_spans(&mut self, f: impl Fn(usize) -> usize) {
        for node in &mut self.nodes {
            node.span = node.span.map(|(b, e)| (f(b), f(e)));
        }
    }
}

/// Saved builder position, see [`TreeBuilder::mark`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeMark {
    len: usize,
    cursor: usize,
}

/// Capture tree under construction during a match.
#[derive(Debug, Clone)]
pub(crate) struct TreeBuilder {
    tree: CaptureTree,
    cursor: usize,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        TreeBuilder {
            tree: CaptureTree {
                nodes: vec![CaptureTreeNode {
                    group: 0,
                    recursion: false,
                    in_lookaround: false,
                    parent: None,
                    children: Vec::new(),
                    span: None,
                }],
            },
            cursor: 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.tree.nodes.truncate(1);
        self.tree.nodes[0].children.clear();
        self.tree.nodes[0].span = None;
        self.cursor = 0;
    }

    /// Append a node as the last child of the cursor and descend into it.
    pub(crate) fn open(&mut self, group: usize, recursion: bool, in_lookaround: bool) {
        let index = self.tree.nodes.len();
        self.tree.nodes.push(CaptureTreeNode {
            group,
            recursion,
            in_lookaround,
            parent: Some(self.cursor),
            children: Vec::new(),
            span: None,
        });
        self.tree.nodes[self.cursor].children.push(index);
        self.cursor = index;
    }

    /// Stamp the cursor node and move back to its parent. Returns what
    /// [`TreeBuilder::reopen`] needs to undo this.
    pub(crate) fn close(&mut self, beg: usize, end: usize) -> (usize, Option<(usize, usize)>) {
        let index = self.cursor;
        let node = &mut self.tree.nodes[index];
        let prev = node.span.replace((beg, end));
        self.cursor = node.parent.unwrap_or(0);
        (index, prev)
    }

    pub(crate) fn reopen(&mut self, undo: (usize, Option<(usize, usize)>)) {
        let (index, prev) = undo;
        self.tree.nodes[index].span = prev;
        self.cursor = index;
    }

    pub(crate) fn mark(&self) -> TreeMark {
        TreeMark {
            len: self.tree.nodes.len(),
            cursor: self.cursor,
        }
    }

    /// Detach and drop every node created after `mark`.
    pub(crate) fn rollback(&mut self, mark: TreeMark) {
        if self.tree.nodes.len() > mark.len {
            self.tree.nodes.truncate(mark.len);
            for node in &mut self.tree.nodes {
                node.children.retain(|&c| c < mark.len);
            }
        }
        self.cursor = mark.cursor;
    }

    pub(crate) fn finish(&self, beg: usize, end: usize) -> CaptureTree {
        let mut tree = self.tree.clone();
        tree.nodes[0].span = Some((beg, end));
        tree
    }
}

/// Group spans of one match. Spans are UTF-16 unit offsets; unset
/// groups hold [`REGION_NOTPOS`] in both arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    pub beg: Vec<i32>,
    pub end: Vec<i32>,
    pub tree: Option<CaptureTree>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an interleaved `[beg0, end0, beg1, end1, ...]` array.
    pub(crate) fn from_groups(groups: &[i32], tree: Option<CaptureTree>) -> Self {
        Region {
            beg: groups.iter().step_by(2).copied().collect(),
            end: groups.iter().skip(1).step_by(2).copied().collect(),
            tree,
        }
    }

    pub fn len(&self) -> usize {
        self.beg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beg.is_empty()
    }

    /// Span of `group`, if it participated in the match.
    pub fn span(&self, group: usize) -> Option<(usize, usize)> {
        let beg = *self.beg.get(group)?;
        let end = *self.end.get(group)?;
        (beg != REGION_NOTPOS).then_some((beg as usize, end as usize))
    }

    pub fn clear(&mut self) {
        for i in 0..self.beg.len() {
            self.beg[i] = REGION_NOTPOS;
            self.end[i] = REGION_NOTPOS;
        }
        self.tree = None;
    }

    pub fn resize(&mut self, n: usize) {
        self.beg.resize(n, REGION_NOTPOS);
        self.end.resize(n, REGION_NOTPOS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_spans() {
        let r = Region::from_groups(&[0, 5, -1, -1, 2, 3], None);
        assert_eq!(r.len(), 3);
        assert_eq!(r.span(0), Some((0, 5)));
        assert_eq!(r.span(1), None);
        assert_eq!(r.span(2), Some((2, 3)));
        assert_eq!(r.span(9), None);
    }

    #[test]
    fn region_clear_and_resize() {
        let mut r = Region::from_groups(&[0, 1], None);
        r.resize(2);
        assert_eq!(r.span(1), None);
        r.clear();
        assert_eq!(r.span(0), None);
    }

    #[test]
    fn builder_open_close_rollback() {
        let mut b = TreeBuilder::new();
        b.open(1, false, false);
        let m = b.mark();
        b.open(2, true, false);
        let undo = b.close(1, 2);
        assert_eq!(b.tree.nodes[2].span, Some((1, 2)));
        b.reopen(undo);
        assert_eq!(b.tree.nodes[2].span, None);
        b.rollback(m);
        assert_eq!(b.tree.len(), 2);
        assert!(b.tree.nodes[1].children.is_empty());
        b.close(0, 3);
        let tree = b.finish(0, 3);
        assert_eq!(tree.root().span, Some((0, 3)));
        let kids: Vec<_> = tree.children(0).map(|n| n.group).collect();
        assert_eq!(kids, vec![1]);
    }
}

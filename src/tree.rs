//! The n-ary syntax tree (C2): an arena of owned nodes, explicit-stack
//! post-order traversal, and the structural `check()` validation.
//!
//! Per spec §9's design notes, the tree is represented as owning children
//! vectors rather than the source implementation's cyclic
//! parent/first-child/prev/next sibling graph — the function pass only
//! ever needs post-order traversal and adjacent-child iteration, both of
//! which are trivial on owned vectors, and no node needs a persistent
//! sibling pointer.

use std::borrow::Cow;
use std::collections::HashSet;

use ptree::{Style, TreeItem};

use crate::error::MalformedTree;
use crate::posset::{Limits, Position};

pub type NodeId = usize;

/// Identifies a counted-range node among all range nodes in a tree.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct RangeIndex(pub usize);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum UnaryKind {
    Opt,
    Star,
    Plus,
    /// Identity operator, preserved to keep a named scope (spec §3).
    Neutral,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NaryKind {
    Concat,
    Alternation,
    Interleave,
}

#[derive(Debug, Clone)]
pub enum Node {
    Symbol { value: String, pos: Position },
    /// The distinguished empty symbol (ε). Always at position 0.
    Empty,
    Unary { kind: UnaryKind, child: NodeId },
    Range { limits: Limits, child: NodeId, range_id: RangeIndex },
    Nary { kind: NaryKind, children: Vec<NodeId> },
}

/// An n-ary syntax tree over symbol/empty leaves and the operators from
/// spec §3. Positions are allocated 1-upward for non-empty symbols as
/// leaves are created; position 0 is reserved for the empty symbol
/// regardless of whether one is ever allocated.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    next_pos: Position,
    range_count: usize,
}

impl Tree {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), root: None, next_pos: 1, range_count: 0 }
    }

    pub fn alloc_symbol(&mut self, value: impl Into<String>) -> NodeId {
        let pos = self.next_pos;
        self.next_pos += 1;
        self.nodes.push(Node::Symbol { value: value.into(), pos });
        self.nodes.len() - 1
    }

    pub fn alloc_empty(&mut self) -> NodeId {
        self.nodes.push(Node::Empty);
        self.nodes.len() - 1
    }

    pub fn alloc_unary(&mut self, kind: UnaryKind, child: NodeId) -> NodeId {
        self.nodes.push(Node::Unary { kind, child });
        self.nodes.len() - 1
    }

    pub fn alloc_range(&mut self, limits: Limits, child: NodeId) -> NodeId {
        let range_id = RangeIndex(self.range_count);
        self.range_count += 1;
        self.nodes.push(Node::Range { limits, child, range_id });
        self.nodes.len() - 1
    }

    pub fn alloc_nary(&mut self, kind: NaryKind, children: Vec<NodeId>) -> NodeId {
        self.nodes.push(Node::Nary { kind, children });
        self.nodes.len() - 1
    }

    /// Extend an existing n-ary node's children in place, used by the
    /// expression builders to flatten associative chains (`a,b,c`
    /// produces one ternary `,` node, never a binarized nesting).
    pub fn extend_nary(&mut self, id: NodeId, child: NodeId) {
        match &mut self.nodes[id] {
            Node::Nary { children, .. } => children.push(child),
            _ => panic!("extend_nary called on a non n-ary node"),
        }
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Largest position assigned to a non-empty symbol (`N` in spec §3);
    /// `0` if the expression has no symbols at all.
    pub fn max_position(&self) -> Position {
        self.next_pos - 1
    }

    pub fn num_ranges(&self) -> usize {
        self.range_count
    }

    /// Public counterpart of `children_of`, for the `ptree` dump view.
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children_of(id)
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        match &self.nodes[id] {
            Node::Symbol { .. } | Node::Empty => Vec::new(),
            Node::Unary { child, .. } => vec![*child],
            Node::Range { child, .. } => vec![*child],
            Node::Nary { children, .. } => children.clone(),
        }
    }

    /// Post-order node ids, computed with an explicit frame stack (no
    /// recursion, no parent-pointer mutation) — see spec §9's first Open
    /// Question.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return order;
        };

        struct Frame {
            id: NodeId,
            children: Vec<NodeId>,
            next: usize,
        }

        let mut stack = vec![Frame { id: root, children: self.children_of(root), next: 0 }];
        while let Some(frame) = stack.last_mut() {
            if frame.next < frame.children.len() {
                let child = frame.children[frame.next];
                frame.next += 1;
                stack.push(Frame { id: child, children: self.children_of(child), next: 0 });
            } else {
                order.push(frame.id);
                stack.pop();
            }
        }
        order
    }

    fn is_symbol_or_optional_symbol(&self, id: NodeId) -> bool {
        match &self.nodes[id] {
            Node::Symbol { .. } => true,
            Node::Unary { kind: UnaryKind::Opt, child } => {
                matches!(self.nodes[*child], Node::Symbol { .. })
            }
            _ => false,
        }
    }

    /// Structural validation (spec §4.2): every unary node has exactly one
    /// child (guaranteed by construction), every n-ary node has at least
    /// two, and an interleave node is both the tree root and has only
    /// symbol / `?`-wrapped-symbol children.
    pub fn check(&self) -> Result<(), MalformedTree> {
        let root = self.root.ok_or_else(|| MalformedTree::new("tree has no root"))?;
        for (id, node) in self.nodes.iter().enumerate() {
            if let Node::Nary { kind, children } = node {
                if children.len() < 2 {
                    return Err(MalformedTree::new(format!(
                        "n-ary operator has {} operand(s), at least 2 required",
                        children.len()
                    )));
                }
                if *kind == NaryKind::Interleave {
                    if id != root {
                        return Err(MalformedTree::new(
                            "interleave ('&') operator must be placed at the tree root",
                        ));
                    }
                    for &child in children {
                        if !self.is_symbol_or_optional_symbol(child) {
                            return Err(MalformedTree::new(
                                "interleave children must be symbols or '?'-wrapped symbols",
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// All `(position, symbol string)` pairs for non-empty symbol leaves.
    pub fn symbols(&self) -> impl Iterator<Item = (Position, &str)> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Symbol { value, pos } => Some((*pos, value.as_str())),
            _ => None,
        })
    }

    /// The set of unique symbol strings occurring in the expression (spec
    /// §3's alphabet companion set, for a driver to enumerate).
    pub fn unique_symbol_strings(&self) -> HashSet<String> {
        self.symbols().map(|(_, s)| s.to_owned()).collect()
    }

    /// Render the tree as an indented diagram, for debugging. Returns a
    /// string rather than writing to a process-wide sink — the caller
    /// decides where it goes.
    pub fn dump(&self) -> String {
        match self.root {
            Some(root) => self.dump_from(root),
            None => String::new(),
        }
    }

    /// Like `dump`, but rooted at an arbitrary node — useful to preview
    /// a builder's in-progress tree before `Tree::root` is installed.
    pub fn dump_from(&self, node: NodeId) -> String {
        let mut buf = Vec::new();
        let view = TreeView { tree: self, node };
        let _ = ptree::write_tree(&view, &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// A `position -> symbol string` lookup table, indexed `0..=N`. Index
    /// `0` (the reserved empty-symbol position) is always `None`.
    pub fn symbol_table(&self) -> Vec<Option<String>> {
        let mut table = vec![None; self.max_position() as usize + 1];
        for (pos, value) in self.symbols() {
            table[pos as usize] = Some(value.to_owned());
        }
        table
    }
}

/// A `ptree::TreeItem` view over one node of a `Tree`, used by
/// `Tree::dump`/`Tree::dump_from`.
#[derive(Clone)]
struct TreeView<'a> {
    tree: &'a Tree,
    node: NodeId,
}

impl TreeView<'_> {
    fn label(&self) -> String {
        match self.tree.node(self.node) {
            Node::Symbol { value, pos } => format!("{value} @{pos}"),
            Node::Empty => "<empty>".to_owned(),
            Node::Unary { kind, .. } => match kind {
                UnaryKind::Opt => "?".to_owned(),
                UnaryKind::Star => "*".to_owned(),
                UnaryKind::Plus => "+".to_owned(),
                UnaryKind::Neutral => "neutral".to_owned(),
            },
            Node::Range { limits, range_id, .. } => {
                let max = if limits.is_infinite() { "*".to_owned() } else { limits.max.to_string() };
                format!("[{},{}] (range {})", limits.min, max, range_id.0)
            }
            Node::Nary { kind, .. } => match kind {
                NaryKind::Concat => ",".to_owned(),
                NaryKind::Alternation => "|".to_owned(),
                NaryKind::Interleave => "&".to_owned(),
            },
        }
    }
}

impl<'a> TreeItem for TreeView<'a> {
    type Child = TreeView<'a>;

    fn write_self<W: std::io::Write>(&self, f: &mut W, style: &Style) -> std::io::Result<()> {
        write!(f, "{}", style.paint(self.label()))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(
            self.tree
                .child_ids(self.node)
                .into_iter()
                .map(|node| TreeView { tree: self.tree, node })
                .collect::<Vec<_>>(),
        )
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn post_order_visits_children_before_parent() {
        let mut tree = Tree::new();
        let a = tree.alloc_symbol("a");
        let b = tree.alloc_symbol("b");
        let concat = tree.alloc_nary(NaryKind::Concat, vec![a, b]);
        tree.set_root(concat);

        let order = tree.post_order();
        assert_eq!(order, vec![a, b, concat]);
    }

    #[test]
    fn check_rejects_short_nary() {
        let mut tree = Tree::new();
        let a = tree.alloc_symbol("a");
        let concat = tree.alloc_nary(NaryKind::Concat, vec![a]);
        tree.set_root(concat);
        assert!(tree.check().is_err());
    }

    #[test]
    fn check_rejects_non_root_interleave() {
        let mut tree = Tree::new();
        let a = tree.alloc_symbol("a");
        let b = tree.alloc_symbol("b");
        let interleave = tree.alloc_nary(NaryKind::Interleave, vec![a, b]);
        let c = tree.alloc_symbol("c");
        let root = tree.alloc_nary(NaryKind::Concat, vec![interleave, c]);
        tree.set_root(root);
        assert!(tree.check().is_err());
    }

    #[test]
    fn dump_renders_node_labels() {
        let mut tree = Tree::new();
        let a = tree.alloc_symbol("a");
        let b = tree.alloc_symbol("b");
        let root = tree.alloc_nary(NaryKind::Concat, vec![a, b]);
        tree.set_root(root);
        let rendered = tree.dump();
        assert!(rendered.contains('a'));
        assert!(rendered.contains('b'));
    }

    #[test]
    fn check_rejects_interleave_non_symbol_child() {
        let mut tree = Tree::new();
        let a = tree.alloc_symbol("a");
        let b = tree.alloc_symbol("b");
        let concat = tree.alloc_nary(NaryKind::Concat, vec![a, b]);
        let interleave = tree.alloc_nary(NaryKind::Interleave, vec![concat, b]);
        tree.set_root(interleave);
        assert!(tree.check().is_err());
    }
}

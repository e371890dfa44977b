//! Expression builder (C3): two stack-machine disciplines over `Tree`,
//! both implementing the same operation set.
//!
//! `ReversePolishDriver` pushes an operator before its operands (prefix
//! style) and closes n-ary operators with an explicit `pop()`; unary
//! operators close themselves as soon as their single operand arrives.
//! `DirectDriver` is infix: operands and binary operators interleave
//! (`a, and(), b, and(), c`), with `push()`/`pop()` marking explicit
//! grouping boundaries. Both coalesce associative chains — `a,b,c`
//! produces one ternary concatenation node, never a binarized nesting.

use crate::error::BadLimits;
use crate::posset::{Limits, Reduction};
use crate::tree::{NaryKind, Node, NodeId, Tree, UnaryKind};

/// The operation set both drivers expose (spec §4.3 / §6).
pub trait ExpressionBuilder {
    fn symbol(&mut self, value: &str);
    /// The distinguished empty symbol (ε), resolving spec §9's third
    /// Open Question explicitly rather than accepting `symbol("")`.
    fn epsilon(&mut self);
    fn opt(&mut self);
    fn star(&mut self);
    fn plus(&mut self);
    fn range(&mut self, min: i64, max: i64) -> Result<(), BadLimits>;
    fn neutral(&mut self);
    fn and(&mut self);
    fn or(&mut self);
    fn all(&mut self);
    fn push(&mut self);
    fn pop(&mut self);
}

fn apply_reduction(tree: &mut Tree, child: NodeId, reduction: Reduction) -> NodeId {
    match reduction {
        Reduction::Opt => tree.alloc_unary(UnaryKind::Opt, child),
        Reduction::Star => tree.alloc_unary(UnaryKind::Star, child),
        Reduction::Plus => tree.alloc_unary(UnaryKind::Plus, child),
        Reduction::Neutral => tree.alloc_unary(UnaryKind::Neutral, child),
        Reduction::Range(limits) => tree.alloc_range(limits, child),
    }
}

/// Extend `existing` with `new` under `kind` if `existing` is already an
/// n-ary node of that kind (associative coalescing); otherwise allocate
/// a fresh binary n-ary node.
fn combine(tree: &mut Tree, kind: NaryKind, existing: NodeId, new: NodeId) -> NodeId {
    if matches!(tree.node(existing), Node::Nary { kind: k, .. } if *k == kind) {
        tree.extend_nary(existing, new);
        existing
    } else {
        tree.alloc_nary(kind, vec![existing, new])
    }
}

enum Frame {
    /// An n-ary operator opened by `and`/`or`/`all`, collecting operands
    /// until the matching `pop()`.
    Nary { kind: NaryKind, children: Vec<NodeId> },
    /// A unary operator opened by `opt`/`star`/`plus`/`range`/`neutral`,
    /// closing itself the instant its one operand is supplied.
    Unary { reduction: Reduction },
}

/// "Operator pushed before its operands" driver, e.g. an operator stream
/// `and(); symbol(a); symbol(b); pop();` builds `and(a, b)`.
pub struct ReversePolishDriver {
    tree: Tree,
    stack: Vec<Frame>,
    result: Option<NodeId>,
}

impl ReversePolishDriver {
    pub fn new() -> Self {
        Self { tree: Tree::new(), stack: Vec::new(), result: None }
    }

    pub fn into_tree(mut self) -> Tree {
        if let Some(root) = self.result {
            self.tree.set_root(root);
        }
        self.tree
    }

    /// The tree built so far, for debug inspection without consuming the
    /// driver.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The in-progress top-level node, if any operand has been supplied
    /// yet — for debug inspection without consuming the driver.
    pub fn current_root(&self) -> Option<NodeId> {
        self.result
    }

    /// Route a completed operand to wherever the builder currently sits:
    /// fold it through any immediately-open unary frames, then either
    /// feed it to the open n-ary frame's child list or, if the stack is
    /// empty, record it as the (tentative) top-level result.
    fn push_operand(&mut self, mut id: NodeId) {
        loop {
            match self.stack.last() {
                Some(Frame::Unary { .. }) => {
                    let Some(Frame::Unary { reduction }) = self.stack.pop() else {
                        unreachable!()
                    };
                    id = apply_reduction(&mut self.tree, id, reduction);
                }
                Some(Frame::Nary { .. }) => {
                    let Some(Frame::Nary { children, .. }) = self.stack.last_mut() else {
                        unreachable!()
                    };
                    children.push(id);
                    return;
                }
                None => {
                    self.result = Some(id);
                    return;
                }
            }
        }
    }
}

impl ExpressionBuilder for ReversePolishDriver {
    fn symbol(&mut self, value: &str) {
        let id = self.tree.alloc_symbol(value);
        self.push_operand(id);
    }

    fn epsilon(&mut self) {
        let id = self.tree.alloc_empty();
        self.push_operand(id);
    }

    fn opt(&mut self) {
        self.stack.push(Frame::Unary { reduction: Reduction::Opt });
    }

    fn star(&mut self) {
        self.stack.push(Frame::Unary { reduction: Reduction::Star });
    }

    fn plus(&mut self) {
        self.stack.push(Frame::Unary { reduction: Reduction::Plus });
    }

    fn range(&mut self, min: i64, max: i64) -> Result<(), BadLimits> {
        let limits = Limits::new(min, max)?;
        self.stack.push(Frame::Unary { reduction: limits.reduce() });
        Ok(())
    }

    fn neutral(&mut self) {
        self.stack.push(Frame::Unary { reduction: Reduction::Neutral });
    }

    fn and(&mut self) {
        self.stack.push(Frame::Nary { kind: NaryKind::Concat, children: Vec::new() });
    }

    fn or(&mut self) {
        self.stack.push(Frame::Nary { kind: NaryKind::Alternation, children: Vec::new() });
    }

    fn all(&mut self) {
        self.stack.push(Frame::Nary { kind: NaryKind::Interleave, children: Vec::new() });
    }

    fn push(&mut self) {}

    fn pop(&mut self) {
        let Some(Frame::Nary { kind, children }) = self.stack.pop() else {
            panic!("pop() with no open n-ary operator");
        };
        let node = self.tree.alloc_nary(kind, children);
        self.push_operand(node);
    }
}

impl Default for ReversePolishDriver {
    fn default() -> Self {
        Self::new()
    }
}

struct Group {
    /// The n-ary kind most recently introduced by `and`/`or`/`all` within
    /// this group; the *next* operand combines with `node` under it.
    kind: Option<NaryKind>,
    /// The expression built so far at this grouping level.
    node: Option<NodeId>,
}

/// Infix driver: operands and binary operators interleave, `push()` opens
/// a parenthesized subgroup and `pop()` closes it back into the parent
/// group as a single operand.
pub struct DirectDriver {
    tree: Tree,
    groups: Vec<Group>,
}

impl DirectDriver {
    pub fn new() -> Self {
        Self { tree: Tree::new(), groups: vec![Group { kind: None, node: None }] }
    }

    pub fn into_tree(mut self) -> Tree {
        if let Some(group) = self.groups.pop() {
            if let Some(root) = group.node {
                self.tree.set_root(root);
            }
        }
        self.tree
    }

    /// The tree built so far, for debug inspection without consuming the
    /// driver. The top-level group's root, if any, is not yet installed
    /// as `Tree::root` (that happens in `into_tree`).
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The in-progress top-level group's node, if any operand has been
    /// supplied yet — for debug inspection without consuming the driver.
    pub fn current_root(&self) -> Option<NodeId> {
        self.groups.first().and_then(|g| g.node)
    }

    fn push_operand(&mut self, id: NodeId) {
        let top = self.groups.last_mut().expect("DirectDriver has no open group");
        top.node = Some(match top.node.take() {
            None => id,
            Some(existing) => {
                let kind = top.kind.expect("operand supplied without a preceding operator");
                combine(&mut self.tree, kind, existing, id)
            }
        });
    }

    fn wrap_last(&mut self, reduction: Reduction) {
        let top = self.groups.last_mut().expect("DirectDriver has no open group");
        let child = top.node.take().expect("unary operator has no preceding operand");
        let node = apply_reduction(&mut self.tree, child, reduction);
        top.node = Some(node);
    }
}

impl ExpressionBuilder for DirectDriver {
    fn symbol(&mut self, value: &str) {
        let id = self.tree.alloc_symbol(value);
        self.push_operand(id);
    }

    fn epsilon(&mut self) {
        let id = self.tree.alloc_empty();
        self.push_operand(id);
    }

    fn opt(&mut self) {
        self.wrap_last(Reduction::Opt);
    }

    fn star(&mut self) {
        self.wrap_last(Reduction::Star);
    }

    fn plus(&mut self) {
        self.wrap_last(Reduction::Plus);
    }

    fn range(&mut self, min: i64, max: i64) -> Result<(), BadLimits> {
        let limits = Limits::new(min, max)?;
        self.wrap_last(limits.reduce());
        Ok(())
    }

    fn neutral(&mut self) {
        self.wrap_last(Reduction::Neutral);
    }

    fn and(&mut self) {
        self.groups.last_mut().expect("no open group").kind = Some(NaryKind::Concat);
    }

    fn or(&mut self) {
        self.groups.last_mut().expect("no open group").kind = Some(NaryKind::Alternation);
    }

    fn all(&mut self) {
        self.groups.last_mut().expect("no open group").kind = Some(NaryKind::Interleave);
    }

    fn push(&mut self) {
        self.groups.push(Group { kind: None, node: None });
    }

    fn pop(&mut self) {
        let finished = self.groups.pop().expect("pop() with no open group");
        if self.groups.is_empty() {
            panic!("pop() would close the implicit top-level group");
        }
        let id = finished.node.expect("pop() on an empty group");
        self.push_operand(id);
    }
}

impl Default for DirectDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn reverse_polish_builds_ternary_concat() {
        let mut b = ReversePolishDriver::new();
        b.and();
        b.symbol("a");
        b.symbol("b");
        b.symbol("c");
        b.pop();
        let tree = b.into_tree();
        let root = tree.root().unwrap();
        match tree.node(root) {
            Node::Nary { kind: NaryKind::Concat, children } => assert_eq!(children.len(), 3),
            other => panic!("expected ternary concat, got {:?}", other),
        }
    }

    #[test]
    fn reverse_polish_unary_wraps_immediate_operand() {
        let mut b = ReversePolishDriver::new();
        b.star();
        b.symbol("a");
        let tree = b.into_tree();
        let root = tree.root().unwrap();
        assert!(matches!(tree.node(root), Node::Unary { kind: UnaryKind::Star, .. }));
    }

    #[test]
    fn direct_driver_coalesces_associative_chain() {
        let mut b = DirectDriver::new();
        b.symbol("a");
        b.and();
        b.symbol("b");
        b.and();
        b.symbol("c");
        let tree = b.into_tree();
        let root = tree.root().unwrap();
        match tree.node(root) {
            Node::Nary { kind: NaryKind::Concat, children } => assert_eq!(children.len(), 3),
            other => panic!("expected ternary concat, got {:?}", other),
        }
    }

    #[test]
    fn direct_driver_group_closes_into_single_operand() {
        let mut b = DirectDriver::new();
        b.push();
        b.symbol("a");
        b.or();
        b.symbol("b");
        b.pop();
        b.star();
        let tree = b.into_tree();
        let root = tree.root().unwrap();
        let Node::Unary { kind: UnaryKind::Star, child } = tree.node(root) else {
            panic!("expected a starred group");
        };
        match tree.node(*child) {
            Node::Nary { kind: NaryKind::Alternation, children } => assert_eq!(children.len(), 2),
            other => panic!("expected alternation, got {:?}", other),
        }
    }

    #[test]
    fn direct_driver_mixed_operators_do_not_coalesce() {
        let mut b = DirectDriver::new();
        b.symbol("a");
        b.and();
        b.symbol("b");
        b.or();
        b.symbol("c");
        let tree = b.into_tree();
        let root = tree.root().unwrap();
        match tree.node(root) {
            Node::Nary { kind: NaryKind::Alternation, children } => {
                assert_eq!(children.len(), 2);
                match tree.node(children[0]) {
                    Node::Nary { kind: NaryKind::Concat, children } => assert_eq!(children.len(), 2),
                    other => panic!("expected nested concat, got {:?}", other),
                }
            }
            other => panic!("expected top-level alternation, got {:?}", other),
        }
    }
}

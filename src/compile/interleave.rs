//! Interleave compiler (C7): applies only when the tree root is `&`
//! (spec §4.7). `Tree::check()` has already rejected non-root placement
//! and non-symbol children before this runs.

use std::collections::HashMap;

use crate::error::AmbiguousContentModel;
use crate::tree::{Node, NodeId, Tree, UnaryKind};

#[derive(Debug, Clone)]
pub struct InterleaveAutomaton {
    /// Per-child-index symbol string, in declaration order.
    symbols: Vec<String>,
    /// Per-child-index optionality (`?`-wrapped symbol).
    optional: Vec<bool>,
    by_symbol: HashMap<String, usize>,
}

impl InterleaveAutomaton {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.by_symbol.get(symbol).copied()
    }

    pub fn is_optional(&self, index: usize) -> bool {
        self.optional[index]
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }
}

fn leaf_symbol(tree: &Tree, child: NodeId) -> (&str, bool) {
    match tree.node(child) {
        Node::Symbol { value, .. } => (value.as_str(), false),
        Node::Unary { kind: UnaryKind::Opt, child } => match tree.node(*child) {
            Node::Symbol { value, .. } => (value.as_str(), true),
            other => panic!("interleave child not a symbol after check(): {:?}", other),
        },
        other => panic!("interleave child not a symbol after check(): {:?}", other),
    }
}

pub fn compile(tree: &Tree) -> Result<InterleaveAutomaton, AmbiguousContentModel> {
    let root = tree.root().expect("compile() requires a rooted tree");
    let Node::Nary { children, .. } = tree.node(root) else {
        panic!("interleave compile() called on a non-interleave root");
    };

    let mut symbols = Vec::with_capacity(children.len());
    let mut optional = Vec::with_capacity(children.len());
    let mut by_symbol = HashMap::with_capacity(children.len());

    for (index, &child) in children.iter().enumerate() {
        let (symbol, is_optional) = leaf_symbol(tree, child);
        if by_symbol.contains_key(symbol) {
            return Err(AmbiguousContentModel::interleave_symbol(symbol));
        }
        by_symbol.insert(symbol.to_owned(), index);
        symbols.push(symbol.to_owned());
        optional.push(is_optional);
    }

    Ok(InterleaveAutomaton { symbols, optional, by_symbol })
}

#[cfg(test)]
mod __tests__ {
    use super::*;
    use crate::tree::NaryKind;

    #[test]
    fn compiles_required_and_optional_children() {
        let mut tree = Tree::new();
        let a = tree.alloc_symbol("a");
        let b = tree.alloc_symbol("b");
        let b_opt = tree.alloc_unary(UnaryKind::Opt, b);
        let root = tree.alloc_nary(NaryKind::Interleave, vec![a, b_opt]);
        tree.set_root(root);

        let automaton = compile(&tree).unwrap();
        assert_eq!(automaton.len(), 2);
        assert_eq!(automaton.index_of("a"), Some(0));
        assert!(!automaton.is_optional(0));
        assert_eq!(automaton.index_of("b"), Some(1));
        assert!(automaton.is_optional(1));
    }

    #[test]
    fn duplicate_symbol_is_ambiguous() {
        let mut tree = Tree::new();
        let a1 = tree.alloc_symbol("a");
        let a2 = tree.alloc_symbol("a");
        let root = tree.alloc_nary(NaryKind::Interleave, vec![a1, a2]);
        tree.set_root(root);
        assert!(compile(&tree).is_err());
    }
}

//! Function computation (C4): the single post-order pass that fills
//! `nullable`/`firstpos`/`lastpos`/`followpos`/`internalpos` and detects
//! range ambiguity.
//!
//! Per spec §9's design note, range-pair ambiguity detection is folded
//! into this same pass rather than split into a second traversal, since
//! it needs both `lastpos` and `firstpos` of every range node exactly
//! when they become available here. The DFA compilers in `compile::`
//! consume the `startRanges`/`endRanges`/`range_pairs` side tables this
//! pass produces.

use std::collections::HashMap;

use crate::error::AmbiguousContentModel;
use crate::posset::{Position, PosSet};
use crate::tree::{NaryKind, Node, NodeId, RangeIndex, Tree, UnaryKind};

/// Per-node derived attributes, indexed by `NodeId`.
#[derive(Debug, Clone, Default)]
struct NodeAttrs {
    nullable: bool,
    firstpos: PosSet,
    lastpos: PosSet,
    internalpos: PosSet,
}

/// The result of the function pass: per-node attributes plus the
/// position-indexed side tables the DFA compilers need. Kept outside the
/// tree's own node storage (spec §9: "position-indexed side tables...
/// should not be stored inside the node") to avoid mutable aliasing
/// between the function pass and the later compile stages.
#[derive(Debug, Clone)]
pub struct Functions {
    attrs: Vec<NodeAttrs>,
    /// `followpos[p]`, indexed by position `0..=N`.
    followpos: Vec<PosSet>,
    /// `startRanges[p]`: indices of ranges whose `firstpos` contains `p`.
    start_ranges: Vec<Vec<RangeIndex>>,
    /// `endRanges[p]`: indices of ranges whose `lastpos` contains `p`.
    end_ranges: Vec<Vec<RangeIndex>>,
    /// `(from, to) -> range`, for every `from in lastpos(r)`, `to in
    /// firstpos(r)`, across all range nodes `r`. Injective by
    /// construction — a collision here is the range-ambiguity case of
    /// spec invariant 5.
    range_pairs: HashMap<(Position, Position), RangeIndex>,
    /// Range node ids and their owning `NodeId`, indexed by `RangeIndex`.
    range_nodes: Vec<NodeId>,
}

impl Functions {
    pub fn nullable(&self, id: NodeId) -> bool {
        self.attrs[id].nullable
    }

    pub fn firstpos(&self, id: NodeId) -> &PosSet {
        &self.attrs[id].firstpos
    }

    pub fn lastpos(&self, id: NodeId) -> &PosSet {
        &self.attrs[id].lastpos
    }

    pub fn internalpos(&self, id: NodeId) -> &PosSet {
        &self.attrs[id].internalpos
    }

    pub fn followpos(&self, pos: Position) -> &PosSet {
        &self.followpos[pos as usize]
    }

    pub fn start_ranges(&self, pos: Position) -> &[RangeIndex] {
        self.start_ranges.get(pos as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn end_ranges(&self, pos: Position) -> &[RangeIndex] {
        self.end_ranges.get(pos as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn range_pair(&self, from: Position, to: Position) -> Option<RangeIndex> {
        self.range_pairs.get(&(from, to)).copied()
    }

    pub fn range_node(&self, range: RangeIndex) -> NodeId {
        self.range_nodes[range.0]
    }

    pub fn range_internalpos(&self, range: RangeIndex) -> &PosSet {
        self.internalpos(self.range_nodes[range.0])
    }

    pub fn num_ranges(&self) -> usize {
        self.range_nodes.len()
    }
}

/// Run the function pass over `tree`, rooted at `tree.root()`.
pub fn compute(tree: &Tree) -> Result<Functions, AmbiguousContentModel> {
    let n = tree.len();
    let max_pos = tree.max_position();
    let mut attrs = vec![NodeAttrs::default(); n];
    let mut followpos = vec![PosSet::new(); max_pos as usize + 1];
    let mut start_ranges = vec![Vec::new(); max_pos as usize + 1];
    let mut end_ranges = vec![Vec::new(); max_pos as usize + 1];
    let mut range_pairs: HashMap<(Position, Position), RangeIndex> = HashMap::new();
    let mut range_nodes = vec![0usize; tree.num_ranges()];

    for id in tree.post_order() {
        match tree.node(id).clone() {
            Node::Symbol { pos, .. } => {
                attrs[id] = NodeAttrs {
                    nullable: false,
                    firstpos: PosSet::singleton(pos),
                    lastpos: PosSet::singleton(pos),
                    internalpos: PosSet::singleton(pos),
                };
            }
            Node::Empty => {
                attrs[id] = NodeAttrs {
                    nullable: true,
                    firstpos: PosSet::new(),
                    lastpos: PosSet::new(),
                    internalpos: PosSet::new(),
                };
            }
            Node::Unary { kind, child } => {
                let child_attrs = attrs[child].clone();
                let nullable = match kind {
                    UnaryKind::Opt => true,
                    UnaryKind::Neutral => child_attrs.nullable,
                    UnaryKind::Star => true,
                    UnaryKind::Plus => child_attrs.nullable,
                };
                if matches!(kind, UnaryKind::Star | UnaryKind::Plus) {
                    for p in child_attrs.lastpos.iter() {
                        followpos[p as usize].union(&child_attrs.firstpos);
                    }
                }
                attrs[id] = NodeAttrs {
                    nullable,
                    firstpos: child_attrs.firstpos,
                    lastpos: child_attrs.lastpos,
                    internalpos: child_attrs.internalpos,
                };
            }
            Node::Range { limits, child, range_id } => {
                let child_attrs = attrs[child].clone();
                range_nodes[range_id.0] = id;
                let nullable = limits.min == 0 || child_attrs.nullable;

                for p in child_attrs.lastpos.iter() {
                    followpos[p as usize].union(&child_attrs.firstpos);
                }

                for p in child_attrs.firstpos.iter() {
                    start_ranges[p as usize].push(range_id);
                }
                for p in child_attrs.lastpos.iter() {
                    end_ranges[p as usize].push(range_id);
                }

                for from in child_attrs.lastpos.iter() {
                    for to in child_attrs.firstpos.iter() {
                        match range_pairs.get(&(from, to)) {
                            Some(existing) if *existing != range_id => {
                                return Err(AmbiguousContentModel::range_boundary());
                            }
                            _ => {
                                range_pairs.insert((from, to), range_id);
                            }
                        }
                    }
                }

                attrs[id] = NodeAttrs {
                    nullable,
                    firstpos: child_attrs.firstpos,
                    lastpos: child_attrs.lastpos,
                    internalpos: child_attrs.internalpos,
                };
            }
            Node::Nary { kind, children } => match kind {
                NaryKind::Alternation => {
                    let mut firstpos = PosSet::new();
                    let mut lastpos = PosSet::new();
                    let mut internalpos = PosSet::new();
                    let mut nullable = false;
                    for &child in &children {
                        let c = &attrs[child];
                        firstpos.union(&c.firstpos);
                        lastpos.union(&c.lastpos);
                        internalpos.union(&c.internalpos);
                        nullable |= c.nullable;
                    }
                    attrs[id] = NodeAttrs { nullable, firstpos, lastpos, internalpos };
                }
                NaryKind::Interleave => {
                    // Interleave is compiled by its own dedicated variant
                    // (C7) and never reached by the plain/ranges DFA
                    // compilers, but we still need closed attributes for
                    // invariant checking and for any (rejected) nested
                    // occurrence.
                    let mut firstpos = PosSet::new();
                    let mut lastpos = PosSet::new();
                    let mut internalpos = PosSet::new();
                    let mut nullable = true;
                    for &child in &children {
                        let c = &attrs[child];
                        firstpos.union(&c.firstpos);
                        lastpos.union(&c.lastpos);
                        internalpos.union(&c.internalpos);
                        nullable &= c.nullable;
                    }
                    attrs[id] = NodeAttrs { nullable, firstpos, lastpos, internalpos };
                }
                NaryKind::Concat => {
                    let mut firstpos = PosSet::new();
                    let mut internalpos = PosSet::new();
                    let mut prefix_nullable = true;
                    for &child in &children {
                        let c = &attrs[child];
                        internalpos.union(&c.internalpos);
                        if prefix_nullable {
                            firstpos.union(&c.firstpos);
                        }
                        if !c.nullable {
                            prefix_nullable = false;
                        }
                    }

                    let mut lastpos = PosSet::new();
                    let mut suffix_nullable = true;
                    for &child in children.iter().rev() {
                        let c = &attrs[child];
                        if suffix_nullable {
                            lastpos.union(&c.lastpos);
                        }
                        if !c.nullable {
                            suffix_nullable = false;
                        }
                    }

                    let nullable = children.iter().all(|&c| attrs[c].nullable);

                    // followpos: maintain a running lastpos that folds in
                    // every nullable child seen so far, so a chain like
                    // `a,b?,c` still links `followpos(a)` to
                    // `firstpos(c)` when `b` is skipped (spec §4.4: "for
                    // every adjacent pair (l,r) and every p in lastpos of
                    // the left-prefix through l").
                    if let Some((&first, rest)) = children.split_first() {
                        let mut running_last = attrs[first].lastpos.clone();
                        for &child in rest {
                            let c = &attrs[child];
                            for p in running_last.iter() {
                                followpos[p as usize].union(&c.firstpos);
                            }
                            if c.nullable {
                                running_last.union(&c.lastpos);
                            } else {
                                running_last = c.lastpos.clone();
                            }
                        }
                    }

                    attrs[id] = NodeAttrs { nullable, firstpos, lastpos, internalpos };
                }
            },
        }
    }

    Ok(Functions { attrs, followpos, start_ranges, end_ranges, range_pairs, range_nodes })
}

#[cfg(test)]
mod __tests__ {
    use super::*;
    use crate::posset::Limits;

    #[test]
    fn concat_followpos_skips_optional_middle_child() {
        // a, b?, c
        let mut tree = Tree::new();
        let a = tree.alloc_symbol("a");
        let b = tree.alloc_symbol("b");
        let b_opt = tree.alloc_unary(UnaryKind::Opt, b);
        let c = tree.alloc_symbol("c");
        let root = tree.alloc_nary(NaryKind::Concat, vec![a, b_opt, c]);
        tree.set_root(root);

        let funcs = compute(&tree).unwrap();
        // positions: a=1, b=2, c=3
        assert!(funcs.followpos(1).contains(2));
        assert!(funcs.followpos(1).contains(3));
        assert!(funcs.followpos(2).contains(3));
        assert!(!funcs.nullable(root));
    }

    #[test]
    fn star_loops_followpos_to_firstpos() {
        let mut tree = Tree::new();
        let a = tree.alloc_symbol("a");
        let star = tree.alloc_unary(UnaryKind::Star, a);
        tree.set_root(star);
        let funcs = compute(&tree).unwrap();
        assert!(funcs.followpos(1).contains(1));
        assert!(funcs.nullable(star));
    }

    #[test]
    fn range_pair_collision_is_ambiguous() {
        // a[2,2] nested directly inside an outer [1,2] range: both range
        // nodes share position 1 as their own (lastpos, firstpos)
        // boundary, so the inner range registers (1,1) -> inner, then the
        // outer range's identical self-pair collides against a different
        // range id.
        let mut tree = Tree::new();
        let a = tree.alloc_symbol("a");
        let inner = tree.alloc_range(Limits::new(2, 2).unwrap(), a);
        let outer = tree.alloc_range(Limits::new(1, 2).unwrap(), inner);
        tree.set_root(outer);
        assert!(compute(&tree).is_err());
    }
}

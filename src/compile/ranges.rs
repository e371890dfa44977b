//! Counted-range DFA compiler (C6): same state/edge enumeration as the
//! plain compiler (states are positions `0..=N`), but every edge also
//! carries a transition *kind* recording which range counters must be
//! initialized, checked, or both, when that edge is taken.

use std::collections::HashMap;

use crate::error::AmbiguousContentModel;
use crate::functions::Functions;
use crate::posset::{Limits, Position, PosSet};
use crate::tree::{NodeId, RangeIndex, Tree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Valid(Position),
    ToStart(Position, Vec<RangeIndex>),
    FromEnd(Position, Vec<RangeIndex>),
    FromEndToStartNoInc(Position, Vec<RangeIndex>, Vec<RangeIndex>),
    /// `checks`, `inits`, and the range whose counter is incremented
    /// before either list is consulted.
    FromEndToStartInc(Position, Vec<RangeIndex>, Vec<RangeIndex>, RangeIndex),
}

impl Transition {
    pub fn target(&self) -> Position {
        match self {
            Transition::Valid(to)
            | Transition::ToStart(to, _)
            | Transition::FromEnd(to, _)
            | Transition::FromEndToStartNoInc(to, _, _)
            | Transition::FromEndToStartInc(to, _, _, _) => *to,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RangesAutomaton {
    table: Vec<HashMap<String, Transition>>,
    finals: PosSet,
    final_checks: HashMap<Position, Vec<RangeIndex>>,
    range_limits: Vec<Limits>,
}

impl RangesAutomaton {
    pub fn start(&self) -> Position {
        0
    }

    pub fn num_ranges(&self) -> usize {
        self.range_limits.len()
    }

    pub fn limits(&self, range: RangeIndex) -> &Limits {
        &self.range_limits[range.0]
    }

    pub fn is_final_state(&self, state: Position) -> bool {
        self.finals.contains(state)
    }

    /// Ranges that must pass `check()` for the cursor to accept while at
    /// `state`; empty if `state` is not a final state at all.
    pub fn accept_checks(&self, state: Position) -> &[RangeIndex] {
        self.final_checks.get(&state).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn step(&self, state: Position, symbol: &str) -> Option<&Transition> {
        self.table[state as usize].get(symbol)
    }

    pub fn valid_symbols(&self, state: Position) -> impl Iterator<Item = &str> {
        self.table[state as usize].keys().map(String::as_str)
    }
}

/// Drop range indices the edge `(from, to)` does not actually cross: a
/// range index `i` is dropped if `node` already lies inside `range_i`'s
/// own span, or if it is explicitly `skip`ped (the edge's own
/// close-and-reopen range, handled separately as `FromEndToStartInc`).
fn relevant(
    candidates: &[RangeIndex],
    node: Position,
    skip: Option<RangeIndex>,
    funcs: &Functions,
) -> Vec<RangeIndex> {
    candidates
        .iter()
        .copied()
        .filter(|&r| Some(r) != skip && !funcs.range_internalpos(r).contains(node))
        .collect()
}

fn classify(from: Position, to: Position, funcs: &Functions) -> Transition {
    let sr = funcs.start_ranges(to);
    let er = funcs.end_ranges(from);

    if let Some(r) = funcs.range_pair(from, to) {
        let checks = relevant(er, to, Some(r), funcs);
        let inits = relevant(sr, from, Some(r), funcs);
        return Transition::FromEndToStartInc(to, checks, inits, r);
    }

    let checks = relevant(er, to, None, funcs);
    let inits = relevant(sr, from, None, funcs);
    match (checks.is_empty(), inits.is_empty()) {
        (true, true) => Transition::Valid(to),
        (true, false) => Transition::ToStart(to, inits),
        (false, true) => Transition::FromEnd(to, checks),
        (false, false) => Transition::FromEndToStartNoInc(to, checks, inits),
    }
}

fn insert_edge(
    table: &mut [HashMap<String, Transition>],
    from: Position,
    symbol: &str,
    transition: Transition,
) -> Result<(), AmbiguousContentModel> {
    match table[from as usize].get(symbol) {
        Some(existing) if *existing != transition => {
            Err(AmbiguousContentModel::transition(symbol))
        }
        _ => {
            table[from as usize].insert(symbol.to_owned(), transition);
            Ok(())
        }
    }
}

fn range_limits_table(tree: &Tree, funcs: &Functions) -> Vec<Limits> {
    (0..funcs.num_ranges())
        .map(|i| {
            let node_id: NodeId = funcs.range_node(RangeIndex(i));
            match tree.node(node_id) {
                crate::tree::Node::Range { limits, .. } => *limits,
                other => unreachable!("range_node did not point at a Range node: {:?}", other),
            }
        })
        .collect()
}

pub fn compile(tree: &Tree, funcs: &Functions) -> Result<RangesAutomaton, AmbiguousContentModel> {
    let root = tree.root().expect("compile() requires a rooted tree");
    let n = tree.max_position();
    let symbols = tree.symbol_table();
    let mut table: Vec<HashMap<String, Transition>> = vec![HashMap::new(); n as usize + 1];

    for to in funcs.firstpos(root).iter() {
        if let Some(Some(symbol)) = symbols.get(to as usize) {
            let transition = classify(0, to, funcs);
            insert_edge(&mut table, 0, symbol, transition)?;
        }
    }
    for from in 1..=n {
        for to in funcs.followpos(from).iter() {
            if let Some(Some(symbol)) = symbols.get(to as usize) {
                let transition = classify(from, to, funcs);
                insert_edge(&mut table, from, symbol, transition)?;
            }
        }
    }

    let mut finals = funcs.lastpos(root).clone();
    if funcs.nullable(root) {
        finals.insert(0);
    }
    let mut final_checks = HashMap::new();
    for f in finals.iter() {
        final_checks.insert(f, funcs.end_ranges(f).to_vec());
    }

    Ok(RangesAutomaton { table, finals, final_checks, range_limits: range_limits_table(tree, funcs) })
}

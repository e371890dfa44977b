//! Plain DFA compiler (C5): no counted ranges, no interleave.
//!
//! States are positions themselves, not position sets — `0..=N` where `N`
//! is the highest symbol position and `0` is the start state. This is
//! exactly the Glushkov/Brüggemann-Klein position automaton: for every
//! symbol occurrence at position `to`, an edge exists from each `from`
//! with `to ∈ followpos(from)` (or from `0` when `to ∈ firstpos(root)`),
//! labeled with the symbol string at `to`.

use std::collections::HashMap;

use crate::error::AmbiguousContentModel;
use crate::functions::Functions;
use crate::posset::{Position, PosSet};
use crate::tree::Tree;

#[derive(Debug, Clone)]
pub struct PlainAutomaton {
    table: Vec<HashMap<String, Position>>,
    finals: PosSet,
}

impl PlainAutomaton {
    pub fn start(&self) -> Position {
        0
    }

    pub fn is_accepting_state(&self, state: Position) -> bool {
        self.finals.contains(state)
    }

    pub fn step(&self, state: Position, symbol: &str) -> Option<Position> {
        self.table[state as usize].get(symbol).copied()
    }

    pub fn valid_symbols(&self, state: Position) -> impl Iterator<Item = &str> {
        self.table[state as usize].keys().map(String::as_str)
    }
}

fn insert_edge(
    table: &mut [HashMap<String, Position>],
    from: Position,
    symbol: &str,
    to: Position,
) -> Result<(), AmbiguousContentModel> {
    match table[from as usize].get(symbol) {
        Some(&existing) if existing != to => Err(AmbiguousContentModel::transition(symbol)),
        _ => {
            table[from as usize].insert(symbol.to_owned(), to);
            Ok(())
        }
    }
}

pub fn compile(tree: &Tree, funcs: &Functions) -> Result<PlainAutomaton, AmbiguousContentModel> {
    let root = tree.root().expect("compile() requires a rooted tree");
    let n = tree.max_position();
    let symbols = tree.symbol_table();
    let mut table: Vec<HashMap<String, Position>> = vec![HashMap::new(); n as usize + 1];

    for to in funcs.firstpos(root).iter() {
        if let Some(Some(symbol)) = symbols.get(to as usize) {
            insert_edge(&mut table, 0, symbol, to)?;
        }
    }
    for from in 1..=n {
        for to in funcs.followpos(from).iter() {
            if let Some(Some(symbol)) = symbols.get(to as usize) {
                insert_edge(&mut table, from, symbol, to)?;
            }
        }
    }

    let mut finals = funcs.lastpos(root).clone();
    if funcs.nullable(root) {
        finals.insert(0);
    }

    Ok(PlainAutomaton { table, finals })
}

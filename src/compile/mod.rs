//! Compilation dispatch: picks the plain (C5), counted-range (C6), or
//! interleave (C7) compiler based on the tree's shape, after running the
//! structural check and the function pass common to all three.

pub mod interleave;
pub mod plain;
pub mod ranges;

use std::rc::Rc;

use crate::cursor::Cursor;
use crate::error::CompileError;
use crate::functions::{self, Functions};
use crate::trace::{Log, Traceable};
use crate::tree::{NaryKind, Node, Tree};

/// Traces the dispatch stage of `compile()` under a fixed label.
struct CompileStage;

impl Traceable for CompileStage {
    fn label(&self) -> Option<&Log<&'static str>> {
        const LABEL: Log<&str> = Log::Default("compile");
        Some(&LABEL)
    }
}

/// The outcome of `compile()`: exactly one of the three automaton
/// shapes, matching whichever compiler the tree's structure selected.
#[derive(Debug, Clone)]
pub enum CompiledModel {
    Plain(plain::PlainAutomaton),
    Ranges(ranges::RangesAutomaton),
    Interleave(interleave::InterleaveAutomaton),
}

impl CompiledModel {
    /// A fresh validation cursor at the automaton's start state, sharing
    /// this `Rc` rather than cloning the compiled tables.
    pub fn initial_state(self: &Rc<Self>) -> Cursor {
        Cursor::new(self)
    }
}

fn has_range_node(tree: &Tree) -> bool {
    (0..tree.len()).any(|id| matches!(tree.node(id), Node::Range { .. }))
}

fn is_interleave_root(tree: &Tree) -> bool {
    match tree.root() {
        Some(root) => matches!(tree.node(root), Node::Nary { kind: NaryKind::Interleave, .. }),
        None => false,
    }
}

/// Run the structural check, the function pass, and the selected
/// compiler, in that order (spec §4: `check()` always precedes
/// `compute()`, which always precedes the DFA/interleave compiler).
pub fn compile(tree: &Tree) -> Result<CompiledModel, CompileError> {
    let stage = CompileStage;
    stage.trace_entry("structural check");
    tree.check()?;

    if is_interleave_root(tree) {
        stage.trace_entry("interleave compiler");
        let model = interleave::compile(tree).map_err(|e| {
            stage.trace_ambiguity(&e.to_string());
            e
        })?;
        stage.trace_success("interleave model compiled");
        return Ok(CompiledModel::Interleave(model));
    }

    stage.trace_entry("function pass");
    let funcs: Functions = functions::compute(tree)?;

    let model = if has_range_node(tree) {
        stage.trace_entry("counted-range DFA compiler");
        CompiledModel::Ranges(ranges::compile(tree, &funcs).map_err(|e| {
            stage.trace_ambiguity(&e.to_string());
            e
        })?)
    } else {
        stage.trace_entry("plain DFA compiler");
        CompiledModel::Plain(plain::compile(tree, &funcs).map_err(|e| {
            stage.trace_ambiguity(&e.to_string());
            e
        })?)
    };
    stage.trace_success("model compiled");
    Ok(model)
}

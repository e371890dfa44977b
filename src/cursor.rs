//! Automaton runtime (C8): one validation cursor per in-progress
//! validation, holding whatever mutable state its compiled shape needs
//! (a bare position, a position plus range counters, or a consumed-set
//! bitmap), backed by a shared, immutable `CompiledModel`.
//!
//! `try_step` computes the post-transition state *without* touching
//! `self`; `step` commits it on success. This gives `valid()`
//! non-destructiveness for free — no clone-then-restore bookkeeping is
//! needed, since a failed attempt never mutated anything to begin with
//! (spec §9's resolution for the cursor/runtime Open Question).

use std::rc::Rc;

use crate::compile::ranges::Transition;
use crate::compile::CompiledModel;
use crate::posset::{Counter, Position, PosSet};

#[derive(Debug, Clone)]
enum State {
    Plain(Position),
    Ranges(Position, Vec<Counter>),
    Interleave(PosSet),
}

/// An exclusively-owned validation cursor over a shared, read-only
/// `CompiledModel` (spec §5: automata are shareable, cursors are not).
#[derive(Debug, Clone)]
pub struct Cursor {
    model: Rc<CompiledModel>,
    state: State,
}

impl Cursor {
    pub fn new(model: &Rc<CompiledModel>) -> Self {
        let state = match model.as_ref() {
            CompiledModel::Plain(a) => State::Plain(a.start()),
            CompiledModel::Ranges(a) => {
                State::Ranges(a.start(), vec![Counter::new(); a.num_ranges()])
            }
            CompiledModel::Interleave(_) => State::Interleave(PosSet::new()),
        };
        Self { model: Rc::clone(model), state }
    }

    fn try_step(&self, symbol: &str) -> Option<State> {
        match (self.model.as_ref(), &self.state) {
            (CompiledModel::Plain(a), State::Plain(s)) => a.step(*s, symbol).map(State::Plain),

            (CompiledModel::Ranges(a), State::Ranges(s, counters)) => {
                let transition = a.step(*s, symbol)?;
                let mut counters = counters.clone();
                match transition {
                    Transition::Valid(_) => {}
                    Transition::ToStart(_, inits) => {
                        for r in inits {
                            counters[r.0].init();
                        }
                    }
                    Transition::FromEnd(_, checks) => {
                        for r in checks {
                            if !counters[r.0].check(a.limits(*r)) {
                                return None;
                            }
                        }
                    }
                    Transition::FromEndToStartNoInc(_, checks, inits) => {
                        for r in checks {
                            if !counters[r.0].check(a.limits(*r)) {
                                return None;
                            }
                        }
                        for r in inits {
                            counters[r.0].init();
                        }
                    }
                    Transition::FromEndToStartInc(_, checks, inits, pos) => {
                        if !counters[pos.0].increment(a.limits(*pos)) {
                            return None;
                        }
                        for r in checks {
                            if !counters[r.0].check(a.limits(*r)) {
                                return None;
                            }
                        }
                        for r in inits {
                            counters[r.0].init();
                        }
                    }
                }
                Some(State::Ranges(transition.target(), counters))
            }

            (CompiledModel::Interleave(a), State::Interleave(consumed)) => {
                let index = a.index_of(symbol)?;
                if consumed.contains(index as u32) {
                    return None;
                }
                let mut consumed = consumed.clone();
                consumed.insert(index as u32);
                Some(State::Interleave(consumed))
            }

            _ => unreachable!("Cursor state does not match its model's compiled shape"),
        }
    }

    /// Attempt a transition; mutates `self` on success, leaves `self`
    /// unchanged on failure.
    pub fn step(&mut self, symbol: &str) -> bool {
        match self.try_step(symbol) {
            Some(state) => {
                self.state = state;
                true
            }
            None => false,
        }
    }

    /// Non-destructive lookahead: would `step(symbol)` currently succeed?
    pub fn valid(&self, symbol: &str) -> bool {
        self.try_step(symbol).is_some()
    }

    /// All symbols on which `valid` would currently succeed.
    pub fn valid_next_symbols(&self) -> Vec<String> {
        match (self.model.as_ref(), &self.state) {
            (CompiledModel::Plain(a), State::Plain(s)) => {
                a.valid_symbols(*s).map(str::to_owned).collect()
            }
            (CompiledModel::Ranges(a), State::Ranges(s, _)) => {
                a.valid_symbols(*s).map(str::to_owned).collect()
            }
            (CompiledModel::Interleave(a), State::Interleave(consumed)) => a
                .symbols()
                .enumerate()
                .filter(|(i, _)| !consumed.contains(*i as u32))
                .map(|(_, s)| s.to_owned())
                .collect(),
            _ => unreachable!("Cursor state does not match its model's compiled shape"),
        }
    }

    /// True iff the cursor is at a final state and, for the
    /// counted-ranges variant, every range checked at that state
    /// satisfies its `[min,max]`.
    pub fn accepting(&self) -> bool {
        match (self.model.as_ref(), &self.state) {
            (CompiledModel::Plain(a), State::Plain(s)) => a.is_accepting_state(*s),
            (CompiledModel::Ranges(a), State::Ranges(s, counters)) => {
                a.is_final_state(*s)
                    && a.accept_checks(*s).iter().all(|r| counters[r.0].check(a.limits(*r)))
            }
            (CompiledModel::Interleave(a), State::Interleave(consumed)) => {
                (0..a.len()).all(|i| consumed.contains(i as u32) || a.is_optional(i))
            }
            _ => unreachable!("Cursor state does not match its model's compiled shape"),
        }
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;
    use crate::builder::{DirectDriver, ExpressionBuilder};
    use crate::compile;

    fn compiled_from(mut build: impl FnMut(&mut DirectDriver)) -> Rc<CompiledModel> {
        let mut b = DirectDriver::new();
        build(&mut b);
        let tree = b.into_tree();
        Rc::new(compile::compile(&tree).unwrap())
    }

    #[test]
    fn plain_cursor_accepts_and_rejects() {
        let model = compiled_from(|b| {
            b.symbol("a");
            b.and();
            b.symbol("b");
        });
        let mut cursor = Cursor::new(&model);
        assert!(!cursor.accepting());
        assert!(cursor.step("a"));
        assert!(!cursor.accepting());
        assert!(!cursor.valid("x"));
        assert!(cursor.step("b"));
        assert!(cursor.accepting());
    }

    #[test]
    fn valid_is_non_destructive() {
        let model = compiled_from(|b| {
            b.symbol("a");
            b.star();
        });
        let cursor = Cursor::new(&model);
        assert!(cursor.valid("a"));
        assert!(cursor.valid("a"));
        assert!(!cursor.valid("b"));
    }

    #[test]
    fn range_cursor_enforces_bounds() {
        let model = compiled_from(|b| {
            b.symbol("a");
            b.range(2, 3).unwrap();
        });
        let mut cursor = Cursor::new(&model);
        assert!(cursor.step("a"));
        assert!(!cursor.accepting());
        assert!(cursor.step("a"));
        assert!(cursor.accepting());
        assert!(cursor.step("a"));
        assert!(cursor.accepting());
        assert!(!cursor.step("a"));
    }

    #[test]
    fn interleave_cursor_tracks_consumed_and_optional() {
        // a? & b
        let model = compiled_from(|b| {
            b.symbol("a");
            b.opt();
            b.all();
            b.symbol("b");
        });
        let mut cursor = Cursor::new(&model);
        assert!(!cursor.accepting());
        assert!(cursor.step("b"));
        assert!(!cursor.valid("b"));
        // "a" is optional, so the interleave is already satisfied.
        assert!(cursor.accepting());
        assert!(cursor.step("a"));
        assert!(cursor.accepting());
    }
}

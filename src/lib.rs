//! A content model validator: compiles a restricted class of regular
//! expressions over string-valued symbols — the kind of particle
//! grammar used by schema languages to describe element content — into
//! a deterministic finite automaton, then validates symbol sequences
//! against it.
//!
//! ```
//! use cmv::Compiler;
//!
//! let mut compiler = Compiler::new("address");
//! compiler.parse("street,city,state?,zip").unwrap();
//! let model = compiler.compile().unwrap();
//!
//! let mut cursor = model.initial_state();
//! for token in ["street", "city", "zip"] {
//!     assert!(cursor.step(token));
//! }
//! assert!(cursor.accepting());
//! ```

mod builder;
mod compile;
mod cursor;
mod error;
mod functions;
mod posset;
mod surface;
mod tokenizer;
mod trace;
mod tree;

pub use builder::{DirectDriver, ExpressionBuilder, ReversePolishDriver};
pub use compile::interleave::InterleaveAutomaton;
pub use compile::plain::PlainAutomaton;
pub use compile::ranges::{RangesAutomaton, Transition};
pub use compile::CompiledModel;
pub use cursor::Cursor;
pub use error::{Ambiguity, AmbiguousContentModel, BadLimits, CompileError, MalformedTree};
pub use posset::{Limits, Position, PosSet, Reduction};
pub use tree::{NaryKind, Node, NodeId, RangeIndex, Tree, UnaryKind};

use std::fmt;
use std::rc::Rc;

/// Lifecycle façade: builds a tree via the direct-driver operation set,
/// compiles it exactly once, and hands out the immutable result. A
/// second `compile()` call is a no-op that returns the cached model.
pub struct Compiler {
    name: String,
    state: CompilerState,
}

enum CompilerState {
    Building(DirectDriver),
    Compiled(Rc<CompiledModel>),
}

impl Compiler {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), state: CompilerState::Building(DirectDriver::new()) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scan `text` under spec §6's surface grammar and drive the
    /// builder. A no-op once `compile()` has already run.
    pub fn parse(&mut self, text: &str) -> Result<(), BadLimits> {
        match &mut self.state {
            CompilerState::Building(builder) => surface::parse_into(builder, text),
            CompilerState::Compiled(_) => Ok(()),
        }
    }

    /// Render the partially-built expression tree for debugging. Returns
    /// an empty string before any operand has been supplied, or after
    /// `compile()` has consumed the tree.
    pub fn dump(&self) -> String {
        match &self.state {
            CompilerState::Building(builder) => match builder.current_root() {
                Some(root) => builder.tree().dump_from(root),
                None => String::new(),
            },
            CompilerState::Compiled(_) => String::new(),
        }
    }

    /// Compile the built tree into a `CompiledModel`. Idempotent: once
    /// compiled, returns a clone of the same cached `Rc`.
    pub fn compile(&mut self) -> Result<Rc<CompiledModel>, CompileError> {
        if let CompilerState::Compiled(model) = &self.state {
            return Ok(Rc::clone(model));
        }
        let placeholder = CompilerState::Building(DirectDriver::new());
        let CompilerState::Building(builder) = std::mem::replace(&mut self.state, placeholder)
        else {
            unreachable!("just checked for the Compiled variant above")
        };
        let tree = builder.into_tree();
        let model = Rc::new(compile::compile(&tree)?);
        self.state = CompilerState::Compiled(Rc::clone(&model));
        Ok(model)
    }
}

impl ExpressionBuilder for Compiler {
    fn symbol(&mut self, value: &str) {
        if let CompilerState::Building(b) = &mut self.state {
            b.symbol(value);
        }
    }

    fn epsilon(&mut self) {
        if let CompilerState::Building(b) = &mut self.state {
            b.epsilon();
        }
    }

    fn opt(&mut self) {
        if let CompilerState::Building(b) = &mut self.state {
            b.opt();
        }
    }

    fn star(&mut self) {
        if let CompilerState::Building(b) = &mut self.state {
            b.star();
        }
    }

    fn plus(&mut self) {
        if let CompilerState::Building(b) = &mut self.state {
            b.plus();
        }
    }

    fn range(&mut self, min: i64, max: i64) -> Result<(), BadLimits> {
        match &mut self.state {
            CompilerState::Building(b) => b.range(min, max),
            CompilerState::Compiled(_) => Ok(()),
        }
    }

    fn neutral(&mut self) {
        if let CompilerState::Building(b) = &mut self.state {
            b.neutral();
        }
    }

    fn and(&mut self) {
        if let CompilerState::Building(b) = &mut self.state {
            b.and();
        }
    }

    fn or(&mut self) {
        if let CompilerState::Building(b) = &mut self.state {
            b.or();
        }
    }

    fn all(&mut self) {
        if let CompilerState::Building(b) = &mut self.state {
            b.all();
        }
    }

    fn push(&mut self) {
        if let CompilerState::Building(b) = &mut self.state {
            b.push();
        }
    }

    fn pop(&mut self) {
        if let CompilerState::Building(b) = &mut self.state {
            b.pop();
        }
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Split a validation string into symbol tokens, per spec §4.9.
pub fn tokenize(input: &str) -> Vec<&str> {
    tokenizer::tokenize(input)
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn compiler_lifecycle_is_idempotent() {
        let mut compiler = Compiler::new("demo");
        compiler.parse("a,b").unwrap();
        let model1 = compiler.compile().unwrap();
        let model2 = compiler.compile().unwrap();
        assert!(Rc::ptr_eq(&model1, &model2));
    }

    #[test]
    fn end_to_end_optional_then_required() {
        let mut compiler = Compiler::new("demo");
        compiler.parse("a?,b").unwrap();
        let model = compiler.compile().unwrap();

        let mut accept = model.initial_state();
        for t in tokenize("a,b") {
            assert!(accept.step(t));
        }
        assert!(accept.accepting());

        let mut reject = model.initial_state();
        assert!(reject.step("a"));
        assert!(!reject.accepting());
    }

    #[test]
    fn dump_reflects_tree_built_so_far() {
        let mut compiler = Compiler::new("demo");
        assert_eq!(compiler.dump(), "");
        compiler.parse("a,b").unwrap();
        let rendered = compiler.dump();
        assert!(rendered.contains('a'));
        assert!(rendered.contains('b'));
    }

    #[test]
    fn ambiguous_expression_is_rejected_at_compile() {
        let mut compiler = Compiler::new("demo");
        compiler.parse("a*|(a,b)").unwrap();
        assert!(compiler.compile().is_err());
    }
}

//! Error taxonomy (C10): `BadLimits`, `AmbiguousContentModel`,
//! `MalformedTree`, and the umbrella `CompileError`.

use std::fmt::{Display, Formatter};

/// Thrown when a `[min,max]` pair given to `range()`/`[m,n]` is not
/// well formed: `min < 0`, or `max` finite and `min > max`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BadLimits {
    pub min: i64,
    pub max: i64,
}

impl BadLimits {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

impl Display for BadLimits {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BadLimits: invalid range [{}, {}]", self.min, self.max)
    }
}

impl std::error::Error for BadLimits {}

/// The offending construct behind an `AmbiguousContentModel`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Ambiguity {
    /// Two DFA transitions fire on the same `(symbol, state)`.
    Transition { symbol: String },
    /// Two distinct counted ranges share a `(lastpos, firstpos)` boundary
    /// pair.
    RangeBoundary,
    /// Two interleave children use the same symbol string.
    InterleaveSymbol { symbol: String },
}

/// Thrown during `compile()` when the expression is not 1-unambiguous, in
/// any of the three senses enumerated by spec §7.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AmbiguousContentModel {
    pub cause: Ambiguity,
}

impl AmbiguousContentModel {
    pub fn transition(symbol: impl Into<String>) -> Self {
        Self { cause: Ambiguity::Transition { symbol: symbol.into() } }
    }

    pub fn range_boundary() -> Self {
        Self { cause: Ambiguity::RangeBoundary }
    }

    pub fn interleave_symbol(symbol: impl Into<String>) -> Self {
        Self { cause: Ambiguity::InterleaveSymbol { symbol: symbol.into() } }
    }

    /// The offending symbol, when the ambiguity names one.
    pub fn symbol(&self) -> Option<&str> {
        match &self.cause {
            Ambiguity::Transition { symbol } | Ambiguity::InterleaveSymbol { symbol } => {
                Some(symbol.as_str())
            }
            Ambiguity::RangeBoundary => None,
        }
    }
}

impl Display for AmbiguousContentModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Ambiguity::Transition { symbol } => write!(
                f,
                "AmbiguousContentModel: two transitions on symbol '{}' from the same state",
                symbol
            ),
            Ambiguity::RangeBoundary => {
                write!(f, "AmbiguousContentModel: range ambiguity at a shared boundary")
            }
            Ambiguity::InterleaveSymbol { symbol } => write!(
                f,
                "AmbiguousContentModel: duplicate symbol '{}' in interleave content",
                symbol
            ),
        }
    }
}

impl std::error::Error for AmbiguousContentModel {}

/// Thrown during `compile()` when a structural invariant of the syntax
/// tree fails: a unary node with != 1 child, an n-ary node with < 2
/// children, or an interleave node that is not the tree root / whose
/// children are not symbols or `?`-wrapped symbols.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MalformedTree {
    pub message: String,
}

impl MalformedTree {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl Display for MalformedTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MalformedTree: {}", self.message)
    }
}

impl std::error::Error for MalformedTree {}

/// The failure surface of `Compiler::compile()`. `Compiler::parse()` only
/// ever produces `BadLimits` (spec §6); `compile()` may raise any of the
/// three kinds.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CompileError {
    BadLimits(BadLimits),
    AmbiguousContentModel(AmbiguousContentModel),
    MalformedTree(MalformedTree),
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::BadLimits(e) => Display::fmt(e, f),
            CompileError::AmbiguousContentModel(e) => Display::fmt(e, f),
            CompileError::MalformedTree(e) => Display::fmt(e, f),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<BadLimits> for CompileError {
    fn from(e: BadLimits) -> Self {
        CompileError::BadLimits(e)
    }
}

impl From<AmbiguousContentModel> for CompileError {
    fn from(e: AmbiguousContentModel) -> Self {
        CompileError::AmbiguousContentModel(e)
    }
}

impl From<MalformedTree> for CompileError {
    fn from(e: MalformedTree) -> Self {
        CompileError::MalformedTree(e)
    }
}

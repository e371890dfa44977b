//! Ambient debug tracing, in the style of `lang_pt`'s `util::Log` /
//! `production::ProductionLogger`: a level-ordered label, gated entirely
//! behind `cfg(debug_assertions)`, with no process-wide writer.

use std::fmt::Display;

/// Level of detail for a traced label. Ordered: `None < Default <
/// Success < Result < Verbose`.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}

impl<T> Log<T> {
    pub fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }
}

impl<T: Display> Display for Log<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Log::None => Ok(()),
            Log::Default(s) | Log::Success(s) | Log::Result(s) | Log::Verbose(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

/// Implemented by compilation stages that want to emit a debug trace
/// under a fixed label. All call sites are no-ops in release builds.
pub trait Traceable {
    fn label(&self) -> Option<&Log<&'static str>>;

    fn trace_entry(&self, what: &str) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.label() {
            if label.order() >= Log::Default(()).order() {
                println!("[{}] entering {}", label, what);
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = what;
    }

    fn trace_ambiguity(&self, message: &str) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.label() {
            if label.order() >= Log::Result(()).order() {
                println!("[{}] ambiguity: {}", label, message);
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = message;
    }

    fn trace_success(&self, message: &str) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.label() {
            if label.order() >= Log::Success(()).order() {
                println!("[{}] {}", label, message);
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = message;
    }
}

//! # Runtime Error Kinds
//!
//! Mirrors the teacher's `error.rs`: a compact enum of runtime fault
//! categories with hand-written `Display`/`Error` impls (no `thiserror`, the
//! same way the reference crate keeps its own error type dependency-free).
//! Compile-time diagnostics are *not* represented here — those are emitted
//! directly by the parser as a side effect of parsing (see `compiler.rs`),
//! not threaded through a return value, matching the source's panic-mode
//! design.

use std::fmt;

/// A fault raised while executing bytecode. Each variant carries just enough
/// context to reproduce the diagnostic text the VM prints to stderr.
#[derive(Debug, PartialEq)]
pub enum RuntimeError {
    /// An operator was applied to operand(s) of the wrong type.
    TypeError(String),
    /// `GetGlobal`/`SetGlobal` referenced a name with no entry in the table.
    UndefinedVariable(String),
    /// `Call` targeted a value that isn't a function.
    NotCallable,
    /// A function was called with the wrong number of arguments.
    ArityMismatch { expected: u8, got: u8 },
    /// Call-frame depth exceeded the VM's fixed frame limit.
    StackOverflow,
    /// An internal invariant was violated (a compiler or VM bug, not a
    /// user-facing fault).
    VmInvariant(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TypeError(msg) => write!(f, "{msg}"),
            RuntimeError::UndefinedVariable(name) => {
                write!(f, "Undefined variable '{name}'.")
            }
            RuntimeError::NotCallable => write!(f, "Can only call functions."),
            RuntimeError::ArityMismatch { expected, got } => {
                write!(f, "Expected {expected} arguments but got {got}.")
            }
            RuntimeError::StackOverflow => write!(f, "Stack overflow."),
            RuntimeError::VmInvariant(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_variable_formats_with_name() {
        let err = RuntimeError::UndefinedVariable("x".to_string());
        assert_eq!(err.to_string(), "Undefined variable 'x'.");
    }

    #[test]
    fn arity_mismatch_formats_both_counts() {
        let err = RuntimeError::ArityMismatch {
            expected: 2,
            got: 1,
        };
        assert_eq!(err.to_string(), "Expected 2 arguments but got 1.");
    }
}

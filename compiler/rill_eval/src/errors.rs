//! Run-time signals.
//!
//! A run-time failure is a tagged signal: an interned symbol naming the
//! condition plus an optional payload value. Signals propagate by `Result`
//! unwinding; every applied node the unwind traverses appends one bounded
//! trace entry (see [`crate::context::SigTrace`]).
//!
//! Factory constructors below are the single import point for the signal
//! tags the core raises.

use crate::value::Value;
use rill_diagnostic::Diagnostic;
use rill_ir::Sym;
use std::fmt;

/// Result of an evaluation step.
pub type RunResult<T> = Result<T, Signal>;

/// A tagged run-time signal.
#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    /// Condition tag.
    pub tag: Sym,
    /// Optional payload; `Nil` when the condition carries no data.
    pub payload: Value,
}

impl Signal {
    /// Signal with a payload value.
    pub fn new(tag: Sym, payload: Value) -> Signal {
        Signal { tag, payload }
    }

    /// Signal with no payload.
    pub fn tagged(tag: &str) -> Signal {
        Signal {
            tag: Sym::new(tag),
            payload: Value::Nil,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signal {}", self.tag)
    }
}

impl From<Diagnostic> for Signal {
    /// Compile failures surface to embedders as `CompileError` signals
    /// carrying the rendered message.
    fn from(diag: Diagnostic) -> Signal {
        Signal {
            tag: Sym::new("CompileError"),
            payload: Value::str(diag.to_string()),
        }
    }
}

/// Operand or index of the wrong type.
pub fn type_mismatch() -> Signal {
    Signal::tagged("TypeMismatch")
}

/// Wrong argument count for the invoked operation.
pub fn invalid_invocation() -> Signal {
    Signal::tagged("InvalidInvocation")
}

/// Operation not supported by the receiver.
pub fn unrecognized_operation() -> Signal {
    Signal::tagged("UnrecognizedOperation")
}

/// Checked integer arithmetic overflowed.
pub fn overflow() -> Signal {
    Signal::tagged("Overflow")
}

/// Division or remainder by zero.
pub fn division_by_zero() -> Signal {
    Signal::tagged("DivisionByZero")
}

/// Record field (or container key) not present.
pub fn key_absent() -> Signal {
    Signal::tagged("KeyAbsent")
}

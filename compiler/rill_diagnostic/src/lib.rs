//! Compile-time diagnostics for the Rill runtime.
//!
//! Compilation failures are fatal to the current compilation unit and carry
//! a source location; they are reported once and never retried. Run-time
//! signals are a separate mechanism owned by the evaluator.

mod diagnostic;

pub use diagnostic::{
    invalid_form, limit_exceeded, not_lvalue, not_rvalue, type_mismatch, unbound_keyword,
    CompileResult, Diagnostic,
};

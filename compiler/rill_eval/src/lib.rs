//! Rill Eval - the execution core of the Rill runtime.
//!
//! Turns parsed source forms into directly-executable code nodes,
//! evaluates them against the tagged, reference-counted value model, and
//! applies a single-pass peephole optimizer that replaces recognized
//! operation shapes with type-specialized fast paths.
//!
//! # Architecture
//!
//! - [`Value`]: fixed-size tagged values; heap payloads behind [`Heap`]
//! - [`Code`]: the evaluate/store/move-out node protocol
//! - `compile`: the dispatcher from [`rill_ir::Form`] to [`Code`]
//! - `call`: call-site synthesis, including in-out arguments
//! - `optimize`: the operand-shape rewrite catalog
//! - [`CompileCx`]/[`EvalCx`]: explicit per-thread state; the only shared
//!   mutable structures are the interning tables in `rill_ir`
//!
//! Each worker thread owns its contexts outright; evaluation is
//! synchronous and runs to completion on the calling thread.

mod call;
mod code;
mod compile;
mod context;
pub mod errors;
pub mod ops;
mod optimize;
mod report;
mod value;

#[cfg(test)]
mod tests;

pub use call::{compile_apply, MAX_ARGC};
pub use code::{Apply, ApplyMod, Code, Export, Lit, Op1, Op2, Operand, Seq, Shaped, Temp};
pub use compile::{compile, compile_lval, compile_rval, compile_seq};
pub use context::{CompileCx, EvalCx, EvalStats, KeywordTable, Phase, SigTrace, TempStack};
pub use errors::{RunResult, Signal};
pub use ops::{known, BinOp, Family, UnOp};
pub use optimize::make_lit;
pub use report::report_uncaught;
pub use value::{Heap, NativeObj, RecordValue, Value};

// Re-export the leaf data model for embedders.
pub use rill_diagnostic::{CompileResult, Diagnostic};
pub use rill_ir::{Form, FormKind, Loc, RecordDescr, Sym};

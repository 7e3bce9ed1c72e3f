//! Open extension point for boxed native objects.
//!
//! The execution core never inspects a native object's representation; the
//! arbitrary-precision decimal backend and embedder-defined procedures plug
//! in through this trait. Operation dispatch hands the object the operation
//! symbol, the full argument vector (receiver at index 0 for operation
//! dispatch, call arguments only for `Apply`), and the optional parallel
//! output vector used by the in-out calling convention.

use crate::context::EvalCx;
use crate::errors::RunResult;
use crate::value::Value;
use rill_ir::Sym;
use std::fmt;

/// A heap object participating in operation dispatch.
pub trait NativeObj: Send + Sync + fmt::Debug {
    /// Type label used by the default `Str` rendering.
    fn type_str(&self) -> &str {
        "value/object"
    }

    /// Apply `op` to this object.
    ///
    /// Implementations fall back to [`crate::ops::default_invoke`] for the
    /// operation set every value supports.
    fn invoke(
        &self,
        cx: &mut EvalCx,
        op: &Sym,
        args: &mut [Value],
        outs: Option<&mut [Value]>,
    ) -> RunResult<Value>;
}

//! Sequencing node.
//!
//! Evaluates the first fragment for effect, then defers to the second.
//! The sequence is an L-value exactly when its second fragment is, and
//! store/move-out re-run the first fragment each time.

use crate::code::Code;
use crate::context::EvalCx;
use crate::errors::RunResult;
use crate::value::Value;

/// `first; second` sequencing.
#[derive(Clone, Debug)]
pub struct Seq {
    pub first: Code,
    pub second: Code,
}

impl Seq {
    pub(crate) fn execute(&self, cx: &mut EvalCx) -> RunResult<Value> {
        self.first.execute(cx)?;
        self.second.execute(cx)
    }

    pub(crate) fn exec_in(&self, cx: &mut EvalCx, value: Value) -> RunResult<()> {
        self.first.execute(cx)?;
        self.second.exec_in(cx, value)
    }

    pub(crate) fn exec_out(&self, cx: &mut EvalCx) -> RunResult<Value> {
        self.first.execute(cx)?;
        self.second.exec_out(cx)
    }

    pub(crate) fn is_lvalue(&self) -> bool {
        self.second.is_lvalue()
    }
}

//! Generic application nodes.
//!
//! [`Apply`] is the plain call: arguments evaluate left to right, the
//! target evaluates last ("the callee receives already-evaluated
//! arguments"), then the application dispatches dynamically. Arguments
//! stay inline in the node up to six; larger calls spill to the heap.
//!
//! [`ApplyMod`] is the in-out call: marked arguments are moved out before
//! the invocation and the callee's updated values are stored back in
//! **reverse** position order afterwards, which fixes destructor and
//! side-effect ordering.
//!
//! Storing through an application (`a[i] := v`) runs the generic replace
//! protocol: evaluate the index arguments, move the container out of the
//! target, ask `Repl` for the updated container, and store it back.

use crate::code::Code;
use crate::context::{EvalCx, Phase};
use crate::errors::RunResult;
use crate::ops;
use crate::value::Value;
use rill_ir::Loc;
use smallvec::{smallvec, SmallVec};

/// Plain n-ary application.
#[derive(Clone, Debug)]
pub struct Apply {
    pub target: Code,
    pub args: SmallVec<[Code; 6]>,
    pub loc: Loc,
}

impl Apply {
    pub(crate) fn execute(&self, cx: &mut EvalCx) -> RunResult<Value> {
        let mut argv: SmallVec<[Value; 6]> = SmallVec::with_capacity(self.args.len());
        for arg in &self.args {
            argv.push(arg.execute(cx)?);
        }
        let target = self.target.execute(cx)?;
        ops::apply_value(cx, target, &mut argv, None).map_err(|sig| {
            cx.trace.push(&self.loc, Phase::Evaluating);
            sig
        })
    }

    pub(crate) fn exec_in(&self, cx: &mut EvalCx, value: Value) -> RunResult<()> {
        let argc = self.args.len();
        let mut argv: SmallVec<[Value; 8]> = smallvec![Value::Nil; argc + 2];
        for (index, arg) in self.args.iter().enumerate() {
            argv[index + 1] = arg.execute(cx)?;
        }
        argv[0] = self.target.exec_out(cx)?;
        argv[argc + 1] = value;
        let updated = ops::dispatch(cx, &ops::known().repl, &mut argv, None).map_err(|sig| {
            cx.trace.push(&self.loc, Phase::Storing);
            sig
        })?;
        self.target.exec_in(cx, updated)
    }

    pub(crate) fn exec_out(&self, cx: &mut EvalCx) -> RunResult<Value> {
        let argc = self.args.len();
        let mut argv: SmallVec<[Value; 8]> = smallvec![Value::Nil; argc + 2];
        for (index, arg) in self.args.iter().enumerate() {
            argv[index + 1] = arg.execute(cx)?;
        }
        argv[0] = self.target.exec_out(cx)?;
        // The replace slot stays nil: the displaced element moves out
        // through the parallel output vector.
        let mut outs: SmallVec<[Value; 8]> = smallvec![Value::Nil; argc + 2];
        let updated =
            ops::dispatch(cx, &ops::known().repl, &mut argv, Some(&mut outs)).map_err(|sig| {
                cx.trace.push(&self.loc, Phase::MovingOut);
                sig
            })?;
        self.target.exec_in(cx, updated)?;
        Ok(std::mem::take(&mut outs[argc + 1]))
    }

    pub(crate) fn is_lvalue(&self) -> bool {
        self.target.is_lvalue()
    }
}

/// Application with at least one in-out argument.
///
/// Never an L-value: the result of an in-out call is a plain value.
#[derive(Clone, Debug)]
pub struct ApplyMod {
    pub target: Code,
    /// Argument fragments with their in-out marks.
    pub args: SmallVec<[(Code, bool); 6]>,
    pub loc: Loc,
}

impl ApplyMod {
    pub(crate) fn execute(&self, cx: &mut EvalCx) -> RunResult<Value> {
        let argc = self.args.len();
        let mut argv: SmallVec<[Value; 6]> = SmallVec::with_capacity(argc);
        for (arg, inout) in &self.args {
            argv.push(if *inout {
                arg.exec_out(cx)?
            } else {
                arg.execute(cx)?
            });
        }
        let target = self.target.execute(cx)?;
        let mut outs: SmallVec<[Value; 6]> = smallvec![Value::Nil; argc];
        let result = ops::apply_value(cx, target, &mut argv, Some(&mut outs)).map_err(|sig| {
            cx.trace.push(&self.loc, Phase::Evaluating);
            sig
        })?;
        // Write-back runs in reverse position order: the last in-out
        // argument is stored first.
        for (index, (arg, inout)) in self.args.iter().enumerate().rev() {
            if *inout {
                arg.exec_in(cx, std::mem::take(&mut outs[index]))?;
            }
        }
        Ok(result)
    }
}

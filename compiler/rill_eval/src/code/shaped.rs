//! Shape-specialized nodes emitted by the optimizer.
//!
//! [`Op1`] and [`Op2`] embed a recognized operator and classified operands;
//! evaluation goes straight to the scalar operator core without passing
//! through dynamic value application. [`Shaped`] keeps the dynamic
//! dispatch but skips re-classifying its operand shapes at run time — the
//! fallback used for non-operator targets (indexing) and for operand types
//! the fast operators do not cover.

use crate::code::Operand;
use crate::context::{EvalCx, Phase};
use crate::errors::RunResult;
use crate::ops::{self, BinOp, UnOp};
use crate::value::Value;
use rill_ir::Loc;
use smallvec::{smallvec, SmallVec};

/// Specialized unary operator node. Never an L-value.
#[derive(Clone, Debug)]
pub struct Op1 {
    pub op: UnOp,
    pub arg: Operand,
    pub loc: Loc,
}

impl Op1 {
    pub(crate) fn execute(&self, cx: &mut EvalCx) -> RunResult<Value> {
        let value = self.arg.fetch(cx)?;
        cx.stats.fast_ops += 1;
        ops::eval_un(cx, self.op, value).map_err(|sig| {
            cx.trace.push(&self.loc, Phase::Evaluating);
            sig
        })
    }
}

/// Specialized binary operator node. Never an L-value.
#[derive(Clone, Debug)]
pub struct Op2 {
    pub op: BinOp,
    pub lhs: Operand,
    pub rhs: Operand,
    pub loc: Loc,
}

impl Op2 {
    pub(crate) fn execute(&self, cx: &mut EvalCx) -> RunResult<Value> {
        let lhs = self.lhs.fetch(cx)?;
        let rhs = self.rhs.fetch(cx)?;
        cx.stats.fast_ops += 1;
        ops::eval_bin(cx, self.op, lhs, rhs).map_err(|sig| {
            cx.trace.push(&self.loc, Phase::Evaluating);
            sig
        })
    }
}

/// Application with shape-classified target and operands.
///
/// Same observable behavior as [`crate::code::Apply`], including
/// L-value-ness (an application is assignable exactly when its target is).
#[derive(Clone, Debug)]
pub struct Shaped {
    pub target: Operand,
    pub args: SmallVec<[Operand; 4]>,
    pub loc: Loc,
}

impl Shaped {
    pub(crate) fn execute(&self, cx: &mut EvalCx) -> RunResult<Value> {
        let mut argv: SmallVec<[Value; 6]> = SmallVec::with_capacity(self.args.len());
        for arg in &self.args {
            argv.push(arg.fetch(cx)?);
        }
        let target = self.target.fetch(cx)?;
        ops::apply_value(cx, target, &mut argv, None).map_err(|sig| {
            cx.trace.push(&self.loc, Phase::Evaluating);
            sig
        })
    }

    pub(crate) fn exec_in(&self, cx: &mut EvalCx, value: Value) -> RunResult<()> {
        let argc = self.args.len();
        let mut argv: SmallVec<[Value; 8]> = smallvec![Value::Nil; argc + 2];
        for (index, arg) in self.args.iter().enumerate() {
            argv[index + 1] = arg.fetch(cx)?;
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
            argv[index + 1] = arg.fetch(cx)?;
        }
        argv[0] = self.target.exec_out(cx)?;
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

//! Compiled-code nodes.
//!
//! A [`Code`] is an executable fragment produced by compilation: a typed
//! literal, a temporary reference, an application in one of its generic or
//! specialized forms, a sequence, or the non-value binding-override node.
//! Nodes are cheap to clone (shared subtrees are reference-counted) and a
//! tree owns its children exclusively — source programs are finite
//! expression trees, so no cycles can form.
//!
//! Every value node supports `execute`; L-value nodes additionally support
//! `exec_in` (store) and `exec_out` (atomic move-out). L-value-ness is a
//! static property fixed at construction: an application is an L-value
//! exactly when its target is.

mod apply;
mod export;
mod seq;
mod shaped;

pub use apply::{Apply, ApplyMod};
pub use export::Export;
pub use seq::Seq;
pub use shaped::{Op1, Op2, Shaped};

use crate::context::EvalCx;
use crate::errors::RunResult;
use crate::value::{Heap, Value};
use rill_ir::Sym;
use std::sync::Arc;

/// A typed literal payload.
///
/// The optimizer keys on the scalar type here; `Val` holds literal values
/// outside the scalar set (records, boxed objects).
#[derive(Clone, Debug)]
pub enum Lit {
    Int(i64),
    Float(f64),
    F32(f32),
    Bool(bool),
    Nil,
    U32(u32),
    Sym(Sym),
    Str(Heap<str>),
    Val(Value),
}

impl Lit {
    /// The literal's value.
    pub fn value(&self) -> Value {
        match self {
            Lit::Int(n) => Value::Int(*n),
            Lit::Float(x) => Value::Float(*x),
            Lit::F32(x) => Value::F32(*x),
            Lit::Bool(b) => Value::Bool(*b),
            Lit::Nil => Value::Nil,
            Lit::U32(n) => Value::U32(*n),
            Lit::Sym(sym) => Value::Sym(sym.clone()),
            Lit::Str(s) => Value::Str(s.clone()),
            Lit::Val(v) => v.clone(),
        }
    }
}

/// A frame-relative temporary-variable reference. Always an L-value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Temp {
    pub slot: u32,
}

/// An executable fragment.
#[derive(Clone, Debug)]
pub enum Code {
    /// Literal value.
    Lit(Lit),
    /// Temporary-variable reference.
    Temp(Temp),
    /// Generic application (plain arguments).
    Apply(Arc<Apply>),
    /// Application with in-out arguments.
    ApplyMod(Arc<ApplyMod>),
    /// Specialized unary operator.
    Op1(Arc<Op1>),
    /// Specialized binary operator.
    Op2(Arc<Op2>),
    /// Shape-classified application/indexing.
    Shaped(Arc<Shaped>),
    /// Sequencing: evaluate first for effect, then second.
    Seq(Arc<Seq>),
    /// Non-value binding-override node.
    Export(Arc<Export>),
}

impl Code {
    /// Evaluate the fragment.
    pub fn execute(&self, cx: &mut EvalCx) -> RunResult<Value> {
        match self {
            Code::Lit(lit) => Ok(lit.value()),
            Code::Temp(temp) => Ok(cx.temps.get(temp.slot).clone()),
            Code::Apply(node) => node.execute(cx),
            Code::ApplyMod(node) => node.execute(cx),
            Code::Op1(node) => node.execute(cx),
            Code::Op2(node) => node.execute(cx),
            Code::Shaped(node) => node.execute(cx),
            Code::Seq(node) => node.execute(cx),
            Code::Export(_) => unreachable!("binding-override node used as a value"),
        }
    }

    /// Store `value` into the referenced storage. L-values only; callers
    /// go through `compile_lval`, which rejects everything else.
    pub fn exec_in(&self, cx: &mut EvalCx, value: Value) -> RunResult<()> {
        match self {
            Code::Temp(temp) => {
                cx.temps.set(temp.slot, value);
                Ok(())
            }
            Code::Apply(node) => node.exec_in(cx, value),
            Code::Shaped(node) => node.exec_in(cx, value),
            Code::Seq(node) => node.exec_in(cx, value),
            _ => unreachable!("store into a non-L-value node"),
        }
    }

    /// Move the current value out, leaving the storage in transition until
    /// the matching `exec_in`. L-values only.
    pub fn exec_out(&self, cx: &mut EvalCx) -> RunResult<Value> {
        match self {
            Code::Temp(temp) => Ok(cx.temps.take(temp.slot)),
            Code::Apply(node) => node.exec_out(cx),
            Code::Shaped(node) => node.exec_out(cx),
            Code::Seq(node) => node.exec_out(cx),
            _ => unreachable!("move-out of a non-L-value node"),
        }
    }

    /// Whether the node admits `exec_in`/`exec_out`.
    pub fn is_lvalue(&self) -> bool {
        match self {
            Code::Temp(_) => true,
            Code::Apply(node) => node.is_lvalue(),
            Code::Shaped(node) => node.is_lvalue(),
            Code::Seq(node) => node.is_lvalue(),
            Code::Lit(_) | Code::ApplyMod(_) | Code::Op1(_) | Code::Op2(_) => false,
            Code::Export(_) => false,
        }
    }

    /// Whether the node produces a value at all.
    pub fn is_rvalue(&self) -> bool {
        !matches!(self, Code::Export(_))
    }

    /// Compile an application form with this fragment as its head.
    ///
    /// The binding-override node interprets the form itself; every value
    /// node becomes the target of call-site synthesis.
    pub fn compile_form(
        &self,
        ccx: &mut crate::context::CompileCx,
        form: &rill_ir::Form,
        loc: &rill_ir::Loc,
    ) -> rill_diagnostic::CompileResult<Code> {
        match self {
            Code::Export(export) => export.compile_form(ccx, form, loc),
            _ => crate::call::compile_apply(ccx, self.clone(), form, loc),
        }
    }
}

/// A shape-classified operand: the optimizer's static classification of a
/// subexpression as a typed literal, a temporary, or an opaque fragment.
#[derive(Clone, Debug)]
pub enum Operand {
    Lit(Lit),
    Temp(Temp),
    Expr(Code),
}

impl Operand {
    /// Produce the operand's value.
    pub fn fetch(&self, cx: &mut EvalCx) -> RunResult<Value> {
        match self {
            Operand::Lit(lit) => Ok(lit.value()),
            Operand::Temp(temp) => Ok(cx.temps.get(temp.slot).clone()),
            Operand::Expr(code) => code.execute(cx),
        }
    }

    /// Whether the operand admits store/move-out.
    pub fn is_lvalue(&self) -> bool {
        match self {
            Operand::Lit(_) => false,
            Operand::Temp(_) => true,
            Operand::Expr(code) => code.is_lvalue(),
        }
    }

    /// Store into the operand's storage. L-values only.
    pub fn exec_in(&self, cx: &mut EvalCx, value: Value) -> RunResult<()> {
        match self {
            Operand::Temp(temp) => {
                cx.temps.set(temp.slot, value);
                Ok(())
            }
            Operand::Expr(code) => code.exec_in(cx, value),
            Operand::Lit(_) => unreachable!("store into a literal operand"),
        }
    }

    /// Move the operand's current value out. L-values only.
    pub fn exec_out(&self, cx: &mut EvalCx) -> RunResult<Value> {
        match self {
            Operand::Temp(temp) => Ok(cx.temps.take(temp.slot)),
            Operand::Expr(code) => code.exec_out(cx),
            Operand::Lit(_) => unreachable!("move-out of a literal operand"),
        }
    }
}

//! Single-pass peephole rewriting of application nodes.
//!
//! Applications of arity 0 through 4 are rewritten once, at construction,
//! by classifying the static shape of the target and operands: a literal of
//! a specific scalar type, a temporary reference, or an opaque fragment.
//! Recognized operator symbols in target position become [`Op1`]/[`Op2`]
//! fast-path nodes; everything else falls back to the shape-classified
//! [`Shaped`] application. Arity 5 and above is never rewritten.
//!
//! The rule order is significant and deliberately asymmetric:
//!
//! - the left operand's classification takes priority over the right's;
//! - a literal whose scalar type the family's fast path does not support
//!   routes the whole node to the shaped generic form (correctness over
//!   speed) — e.g. a string literal in the numeric family;
//! - boolean literals specialize on the *left* of the equality family
//!   (`False == v` can beat `~v`) but not on the right of a non-literal;
//! - literal/literal pairs are not constant-folded here: the resulting
//!   node computes the operation once per execution, which preserves
//!   failure behavior exactly.
//!
//! There is no fixed-point iteration: a node is examined once, so the rule
//! order below must reach the best available specialization in one pass.

use crate::code::{Apply, Code, Lit, Op1, Op2, Operand, Shaped};
use crate::ops::{BinOp, Family, UnOp};
use crate::value::Value;
use rill_ir::{Loc, Sym};
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;
use tracing::debug;

/// Build an optimized literal node with its scalar type exposed.
pub fn make_lit(value: Value) -> Code {
    Code::Lit(lit_of(value))
}

fn lit_of(value: Value) -> Lit {
    match value {
        Value::Int(n) => Lit::Int(n),
        Value::Float(x) => Lit::Float(x),
        Value::F32(x) => Lit::F32(x),
        Value::Bool(b) => Lit::Bool(b),
        Value::Nil => Lit::Nil,
        Value::U32(n) => Lit::U32(n),
        Value::Sym(sym) => Lit::Sym(sym),
        Value::Str(s) => Lit::Str(s),
        other => Lit::Val(other),
    }
}

/// Rewrite a freshly synthesized application node.
pub fn apply(node: Apply) -> Code {
    let Apply {
        target,
        mut args,
        loc,
    } = node;
    match args.len() {
        0 => apply0(target, loc),
        1 => {
            let a0 = pop(&mut args);
            apply1(target, a0, loc)
        }
        2 => {
            let a1 = pop(&mut args);
            let a0 = pop(&mut args);
            apply2(target, a0, a1, loc)
        }
        3 | 4 => apply_wide(target, args, loc),
        _ => Code::Apply(Arc::new(Apply { target, args, loc })),
    }
}

fn pop(args: &mut SmallVec<[Code; 6]>) -> Code {
    match args.pop() {
        Some(code) => code,
        None => unreachable!("arity checked by caller"),
    }
}

fn op1(op: UnOp, arg: Operand, loc: Loc) -> Code {
    debug!(?op, "specialized unary operator");
    Code::Op1(Arc::new(Op1 { op, arg, loc }))
}

fn op2(op: BinOp, lhs: Operand, rhs: Operand, loc: Loc) -> Code {
    debug!(?op, "specialized binary operator");
    Code::Op2(Arc::new(Op2 { op, lhs, rhs, loc }))
}

fn shaped(target: Operand, args: SmallVec<[Operand; 4]>, loc: Loc) -> Code {
    Code::Shaped(Arc::new(Shaped { target, args, loc }))
}

fn sym_target(sym: Sym) -> Operand {
    Operand::Lit(Lit::Sym(sym))
}

/// Full shape classification of an operand subexpression.
fn classify(code: Code) -> Operand {
    match code {
        Code::Lit(lit) => Operand::Lit(lit),
        Code::Temp(temp) => Operand::Temp(temp),
        other => Operand::Expr(other),
    }
}

/// Temporary-or-opaque classification: used where the catalog does not
/// care about literal types on that side.
fn temp_or_expr(code: Code) -> Operand {
    match code {
        Code::Temp(temp) => Operand::Temp(temp),
        other => Operand::Expr(other),
    }
}

fn apply0(target: Code, loc: Loc) -> Code {
    match target {
        Code::Lit(lit) => shaped(Operand::Lit(lit), smallvec![], loc),
        Code::Temp(temp) => shaped(Operand::Temp(temp), smallvec![], loc),
        target => Code::Apply(Arc::new(Apply {
            target,
            args: smallvec![],
            loc,
        })),
    }
}

fn apply1(target: Code, a0: Code, loc: Loc) -> Code {
    match target {
        Code::Lit(Lit::Sym(sym)) => {
            if let Some(op) = UnOp::from_sym(&sym) {
                return op1(op, temp_or_expr(a0), loc);
            }
            shaped(sym_target(sym), smallvec![Operand::Expr(a0)], loc)
        }
        Code::Lit(lit) => shaped(Operand::Lit(lit), smallvec![sym_temp_or_expr(a0)], loc),
        Code::Temp(temp) => shaped(Operand::Temp(temp), smallvec![sym_temp_or_expr(a0)], loc),
        target => match a0 {
            Code::Lit(Lit::Sym(s0)) => shaped(
                Operand::Expr(target),
                smallvec![Operand::Lit(Lit::Sym(s0))],
                loc,
            ),
            Code::Temp(t0) => shaped(Operand::Expr(target), smallvec![Operand::Temp(t0)], loc),
            a0 => Code::Apply(Arc::new(Apply {
                target,
                args: smallvec![a0],
                loc,
            })),
        },
    }
}

/// Symbol-literal, temporary, or opaque: the indexing-side classification.
fn sym_temp_or_expr(code: Code) -> Operand {
    match code {
        Code::Lit(Lit::Sym(sym)) => Operand::Lit(Lit::Sym(sym)),
        Code::Temp(temp) => Operand::Temp(temp),
        other => Operand::Expr(other),
    }
}

fn apply2(target: Code, a0: Code, a1: Code, loc: Loc) -> Code {
    match target {
        Code::Lit(Lit::Sym(sym)) => match BinOp::from_sym(&sym) {
            Some(op) => match op.family() {
                Family::Equality => eq_family(op, sym, a0, a1, loc),
                Family::Numeric => num_family(op, sym, a0, a1, loc),
                Family::Bitwise => bit_family(op, sym, a0, a1, loc),
            },
            // Non-operator symbol in target position: a generic binary
            // invocation with both operand shapes recognized. Two literals
            // stay unfolded on purpose.
            None => shaped(sym_target(sym), smallvec![classify(a0), classify(a1)], loc),
        },
        Code::Lit(lit) => index2(Operand::Lit(lit), a0, a1, loc),
        Code::Temp(temp) => index2(Operand::Temp(temp), a0, a1, loc),
        target => opaque2(target, a0, a1, loc),
    }
}

/// Equality family: every scalar literal type participates, including
/// booleans and strings on the left.
fn eq_family(op: BinOp, sym: Sym, a0: Code, a1: Code, loc: Loc) -> Code {
    match a0 {
        Code::Lit(
            lit @ (Lit::Int(_)
            | Lit::Float(_)
            | Lit::F32(_)
            | Lit::Sym(_)
            | Lit::Bool(_)
            | Lit::Nil
            | Lit::U32(_)
            | Lit::Str(_)),
        ) => op2(op, Operand::Lit(lit), temp_or_expr(a1), loc),
        // Boxed literal on the left: shaped generic.
        Code::Lit(lit) => shaped(sym_target(sym), smallvec![Operand::Lit(lit), temp_or_expr(a1)], loc),
        Code::Temp(t0) => eq_rhs(op, sym, Operand::Temp(t0), a1, loc),
        a0 => eq_rhs(op, sym, Operand::Expr(a0), a1, loc),
    }
}

fn eq_rhs(op: BinOp, sym: Sym, lhs: Operand, a1: Code, loc: Loc) -> Code {
    match a1 {
        // Boolean literals do not specialize on the right.
        Code::Lit(lit1 @ Lit::Bool(_)) => {
            shaped(sym_target(sym), smallvec![lhs, Operand::Lit(lit1)], loc)
        }
        Code::Lit(lit1) => op2(op, lhs, Operand::Lit(lit1), loc),
        Code::Temp(t1) => op2(op, lhs, Operand::Temp(t1), loc),
        a1 => op2(op, lhs, Operand::Expr(a1), loc),
    }
}

/// Ordering/arithmetic family: numeric literal types only; anything else
/// in literal position routes to the shaped generic form.
fn num_family(op: BinOp, sym: Sym, a0: Code, a1: Code, loc: Loc) -> Code {
    match a0 {
        Code::Lit(lit @ (Lit::Int(_) | Lit::Float(_) | Lit::F32(_) | Lit::U32(_))) => {
            op2(op, Operand::Lit(lit), temp_or_expr(a1), loc)
        }
        Code::Lit(lit @ (Lit::Str(_) | Lit::Val(_))) => {
            shaped(sym_target(sym), smallvec![Operand::Lit(lit), temp_or_expr(a1)], loc)
        }
        Code::Temp(t0) => num_rhs(op, sym, Operand::Temp(t0), a1, loc),
        // Symbol, boolean, and nil literals on the left are opaque here.
        a0 => num_rhs(op, sym, Operand::Expr(a0), a1, loc),
    }
}

fn num_rhs(op: BinOp, sym: Sym, lhs: Operand, a1: Code, loc: Loc) -> Code {
    match a1 {
        Code::Lit(lit1 @ (Lit::Int(_) | Lit::Float(_) | Lit::F32(_) | Lit::U32(_))) => {
            op2(op, lhs, Operand::Lit(lit1), loc)
        }
        Code::Lit(lit1) => shaped(sym_target(sym), smallvec![lhs, Operand::Lit(lit1)], loc),
        Code::Temp(t1) => op2(op, lhs, Operand::Temp(t1), loc),
        a1 => op2(op, lhs, Operand::Expr(a1), loc),
    }
}

/// Exclusive-or and plain bitwise and/or family: boolean and unsigned
/// literal types only.
fn bit_family(op: BinOp, sym: Sym, a0: Code, a1: Code, loc: Loc) -> Code {
    match a0 {
        // `True.Xor[v]` can beat `~v`, so boolean literals specialize.
        Code::Lit(lit @ (Lit::Bool(_) | Lit::U32(_))) => {
            op2(op, Operand::Lit(lit), temp_or_expr(a1), loc)
        }
        Code::Lit(lit @ (Lit::Str(_) | Lit::Val(_))) => {
            shaped(sym_target(sym), smallvec![Operand::Lit(lit), temp_or_expr(a1)], loc)
        }
        Code::Temp(t0) => bit_rhs(op, sym, Operand::Temp(t0), a1, loc),
        a0 => bit_rhs(op, sym, Operand::Expr(a0), a1, loc),
    }
}

fn bit_rhs(op: BinOp, sym: Sym, lhs: Operand, a1: Code, loc: Loc) -> Code {
    match a1 {
        Code::Lit(lit1 @ Lit::U32(_)) => op2(op, lhs, Operand::Lit(lit1), loc),
        Code::Lit(lit1) => shaped(sym_target(sym), smallvec![lhs, Operand::Lit(lit1)], loc),
        Code::Temp(t1) => op2(op, lhs, Operand::Temp(t1), loc),
        a1 => op2(op, lhs, Operand::Expr(a1), loc),
    }
}

/// Indexing into fast containers: a non-operator literal or temporary in
/// target position. Only operand shapes are recognized, never operators.
fn index2(target: Operand, a0: Code, a1: Code, loc: Loc) -> Code {
    let arg0 = temp_or_expr(a0);
    let arg1 = sym_temp_or_expr(a1);
    shaped(target, smallvec![arg0, arg1], loc)
}

/// Dynamic target: classify what we can; a fully opaque application stays
/// on the generic node.
fn opaque2(target: Code, a0: Code, a1: Code, loc: Loc) -> Code {
    match a0 {
        Code::Temp(t0) => shaped(
            Operand::Expr(target),
            smallvec![Operand::Temp(t0), sym_temp_or_expr(a1)],
            loc,
        ),
        a0 => match a1 {
            Code::Lit(Lit::Sym(s1)) => shaped(
                Operand::Expr(target),
                smallvec![Operand::Expr(a0), Operand::Lit(Lit::Sym(s1))],
                loc,
            ),
            Code::Temp(t1) => shaped(
                Operand::Expr(target),
                smallvec![Operand::Expr(a0), Operand::Temp(t1)],
                loc,
            ),
            a1 => Code::Apply(Arc::new(Apply {
                target,
                args: smallvec![a0, a1],
                loc,
            })),
        },
    }
}

/// Arity 3 and 4: the target's shape is recognized, operands are not.
fn apply_wide(target: Code, args: SmallVec<[Code; 6]>, loc: Loc) -> Code {
    let operands = |args: SmallVec<[Code; 6]>| -> SmallVec<[Operand; 4]> {
        args.into_iter().map(Operand::Expr).collect()
    };
    match target {
        Code::Lit(lit) => shaped(Operand::Lit(lit), operands(args), loc),
        Code::Temp(temp) => shaped(Operand::Temp(temp), operands(args), loc),
        target => Code::Apply(Arc::new(Apply { target, args, loc })),
    }
}

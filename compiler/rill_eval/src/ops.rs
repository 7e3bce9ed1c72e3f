//! Operator identification and the dynamic dispatch core.
//!
//! Every operation a value supports is named by a symbol. The specialized
//! operator nodes the optimizer emits and the generic dynamic-dispatch path
//! both bottom out in [`eval_bin`]/[`eval_un`], so a rewrite can never
//! change an operation's result or failure.
//!
//! Failure taxonomy: an operation the receiver does not support at all is
//! `UnrecognizedOperation`; a supported operation with an operand of the
//! wrong type is `TypeMismatch`; a wrong argument count is
//! `InvalidInvocation`.

use crate::context::EvalCx;
use crate::errors::{
    division_by_zero, invalid_invocation, key_absent, overflow, type_mismatch,
    unrecognized_operation, RunResult,
};
use crate::value::{RecordValue, Value};
use rill_ir::Sym;
use std::sync::OnceLock;

/// Interned handles for the operation symbols the core recognizes.
///
/// Interned once per process and never released, so identification is an
/// id comparison rather than a table lookup.
pub struct KnownSyms {
    pub eq: Sym,
    pub ne: Sym,
    pub lt: Sym,
    pub le: Sym,
    pub gt: Sym,
    pub ge: Sym,
    pub add: Sym,
    pub sub: Sym,
    pub mul: Sym,
    pub div: Sym,
    pub rem: Sym,
    pub xor: Sym,
    pub and: Sym,
    pub or: Sym,
    pub not: Sym,
    pub neg: Sym,
    pub abs: Sym,
    pub order: Sym,
    pub clone: Sym,
    pub deep_clone: Sym,
    pub str: Sym,
    pub apply: Sym,
    pub repl: Sym,
    /// The `?` in-out marker at call sites.
    pub inout_mark: Sym,
    /// The `in` keyword of binding forms.
    pub in_kw: Sym,
    pub compile_error: Sym,
}

/// The process-wide known-symbol set.
pub fn known() -> &'static KnownSyms {
    static KNOWN: OnceLock<KnownSyms> = OnceLock::new();
    KNOWN.get_or_init(|| KnownSyms {
        eq: Sym::new("=="),
        ne: Sym::new("<>"),
        lt: Sym::new("<"),
        le: Sym::new("<="),
        gt: Sym::new(">"),
        ge: Sym::new(">="),
        add: Sym::new("+"),
        sub: Sym::new("-"),
        mul: Sym::new("*"),
        div: Sym::new("/"),
        rem: Sym::new("Rem"),
        xor: Sym::new("Xor"),
        and: Sym::new("&"),
        or: Sym::new("|"),
        not: Sym::new("~"),
        neg: Sym::new("Neg"),
        abs: Sym::new("Abs"),
        order: Sym::new("Order"),
        clone: Sym::new("Clone"),
        deep_clone: Sym::new("DeepClone"),
        str: Sym::new("Str"),
        apply: Sym::new("Apply"),
        repl: Sym::new("Repl"),
        inout_mark: Sym::new("?"),
        in_kw: Sym::new("in"),
        compile_error: Sym::new("CompileError"),
    })
}

/// Binary operators with specialized node forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Xor,
    And,
    Or,
}

/// Operator families the optimizer's catalog is keyed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    /// `==`, `<>`: total across variants.
    Equality,
    /// `<`, `<=`, `>`, `>=`, `+`, `-`, `*`: numeric (plus string compare
    /// and concatenation).
    Numeric,
    /// `Xor`, `&`, `|`: boolean and modular-integer bit operations.
    Bitwise,
}

impl BinOp {
    /// Identify an operator symbol.
    pub fn from_sym(sym: &Sym) -> Option<BinOp> {
        let k = known();
        Some(match sym {
            _ if sym == &k.eq => BinOp::Eq,
            _ if sym == &k.ne => BinOp::Ne,
            _ if sym == &k.lt => BinOp::Lt,
            _ if sym == &k.le => BinOp::Le,
            _ if sym == &k.gt => BinOp::Gt,
            _ if sym == &k.ge => BinOp::Ge,
            _ if sym == &k.add => BinOp::Add,
            _ if sym == &k.sub => BinOp::Sub,
            _ if sym == &k.mul => BinOp::Mul,
            _ if sym == &k.xor => BinOp::Xor,
            _ if sym == &k.and => BinOp::And,
            _ if sym == &k.or => BinOp::Or,
            _ => return None,
        })
    }

    /// The operator's symbol.
    pub fn sym(self) -> Sym {
        let k = known();
        match self {
            BinOp::Eq => k.eq.clone(),
            BinOp::Ne => k.ne.clone(),
            BinOp::Lt => k.lt.clone(),
            BinOp::Le => k.le.clone(),
            BinOp::Gt => k.gt.clone(),
            BinOp::Ge => k.ge.clone(),
            BinOp::Add => k.add.clone(),
            BinOp::Sub => k.sub.clone(),
            BinOp::Mul => k.mul.clone(),
            BinOp::Xor => k.xor.clone(),
            BinOp::And => k.and.clone(),
            BinOp::Or => k.or.clone(),
        }
    }

    /// Catalog family.
    pub fn family(self) -> Family {
        match self {
            BinOp::Eq | BinOp::Ne => Family::Equality,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Add | BinOp::Sub
            | BinOp::Mul => Family::Numeric,
            BinOp::Xor | BinOp::And | BinOp::Or => Family::Bitwise,
        }
    }
}

/// Unary operators with specialized node forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
    Abs,
}

impl UnOp {
    /// Identify an operator symbol.
    pub fn from_sym(sym: &Sym) -> Option<UnOp> {
        let k = known();
        Some(match sym {
            _ if sym == &k.not => UnOp::Not,
            _ if sym == &k.neg => UnOp::Neg,
            _ if sym == &k.abs => UnOp::Abs,
            _ => return None,
        })
    }

    /// The operator's symbol.
    pub fn sym(self) -> Sym {
        let k = known();
        match self {
            UnOp::Not => k.not.clone(),
            UnOp::Neg => k.neg.clone(),
            UnOp::Abs => k.abs.clone(),
        }
    }
}

/// Language-level equality: total across variants.
///
/// Mixed variants are unequal rather than a failure; symbols and strings
/// alias each other by text on the comparison operators only.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::F32(a), Value::F32(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Nil, Value::Nil) => true,
        (Value::U32(a), Value::U32(b)) => a == b,
        (Value::Sym(a), Value::Sym(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => **a == **b,
        (Value::Sym(a), Value::Str(b)) => a.text().as_ref() == &**b,
        (Value::Str(a), Value::Sym(b)) => &**a == b.text().as_ref(),
        (Value::Rec(a), Value::Rec(b)) => a.ptr_eq(b),
        (Value::Obj(a), Value::Obj(b)) => a.ptr_eq(b),
        _ => false,
    }
}

/// Language-level three-way ordering.
///
/// Defined within a variant only; mixed variants (including the sym/str
/// aliasing pair) signal `TypeMismatch`.
pub fn order_values(a: &Value, b: &Value) -> RunResult<i64> {
    let ord = match (a, b) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
        (Value::F32(a), Value::F32(b)) => a.total_cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Nil, Value::Nil) => std::cmp::Ordering::Equal,
        (Value::U32(a), Value::U32(b)) => a.cmp(b),
        (Value::Sym(a), Value::Sym(b)) => a.text().cmp(&b.text()),
        (Value::Str(a), Value::Str(b)) => (**a).cmp(&**b),
        (Value::Rec(a), Value::Rec(b)) if a.ptr_eq(b) => std::cmp::Ordering::Equal,
        (Value::Obj(a), Value::Obj(b)) if a.ptr_eq(b) => std::cmp::Ordering::Equal,
        _ => return Err(type_mismatch()),
    };
    Ok(ord as i64)
}

/// Evaluate a specialized binary operator.
///
/// This is the single implementation behind both the optimizer's fast-path
/// nodes and generic dispatch.
pub fn eval_bin(cx: &mut EvalCx, op: BinOp, a: Value, b: Value) -> RunResult<Value> {
    // Boxed objects see every operation, including the comparison set.
    if let Value::Obj(obj) = &a {
        let obj = obj.clone();
        let mut args = [a, b];
        return obj.invoke(cx, &op.sym(), &mut args, None);
    }
    match op.family() {
        Family::Equality => {
            let eq = values_equal(&a, &b);
            Ok(Value::Bool(if op == BinOp::Eq { eq } else { !eq }))
        }
        Family::Numeric => numeric(op, a, b),
        Family::Bitwise => bitwise(op, a, b),
    }
}

fn numeric(op: BinOp, a: Value, b: Value) -> RunResult<Value> {
    use BinOp::*;
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => match op {
            Lt => Ok(Value::Bool(a < b)),
            Le => Ok(Value::Bool(a <= b)),
            Gt => Ok(Value::Bool(a > b)),
            Ge => Ok(Value::Bool(a >= b)),
            Add => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
            Sub => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
            Mul => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
            _ => Err(unrecognized_operation()),
        },
        (Value::Float(a), Value::Float(b)) => match op {
            Lt => Ok(Value::Bool(a < b)),
            Le => Ok(Value::Bool(a <= b)),
            Gt => Ok(Value::Bool(a > b)),
            Ge => Ok(Value::Bool(a >= b)),
            Add => Ok(Value::Float(a + b)),
            Sub => Ok(Value::Float(a - b)),
            Mul => Ok(Value::Float(a * b)),
            _ => Err(unrecognized_operation()),
        },
        (Value::F32(a), Value::F32(b)) => match op {
            Lt => Ok(Value::Bool(a < b)),
            Le => Ok(Value::Bool(a <= b)),
            Gt => Ok(Value::Bool(a > b)),
            Ge => Ok(Value::Bool(a >= b)),
            Add => Ok(Value::F32(a + b)),
            Sub => Ok(Value::F32(a - b)),
            Mul => Ok(Value::F32(a * b)),
            _ => Err(unrecognized_operation()),
        },
        // Unsigned arithmetic is modular.
        (Value::U32(a), Value::U32(b)) => match op {
            Lt => Ok(Value::Bool(a < b)),
            Le => Ok(Value::Bool(a <= b)),
            Gt => Ok(Value::Bool(a > b)),
            Ge => Ok(Value::Bool(a >= b)),
            Add => Ok(Value::U32(a.wrapping_add(b))),
            Sub => Ok(Value::U32(a.wrapping_sub(b))),
            Mul => Ok(Value::U32(a.wrapping_mul(b))),
            _ => Err(unrecognized_operation()),
        },
        (Value::Str(a), Value::Str(b)) => match op {
            Lt => Ok(Value::Bool(*a < *b)),
            Le => Ok(Value::Bool(*a <= *b)),
            Gt => Ok(Value::Bool(*a > *b)),
            Ge => Ok(Value::Bool(*a >= *b)),
            Add => Ok(Value::str(format!("{a}{b}"))),
            _ => Err(unrecognized_operation()),
        },
        // Receiver supports the family, operand does not match.
        (Value::Int(_) | Value::Float(_) | Value::F32(_) | Value::U32(_) | Value::Str(_), _) => {
            Err(type_mismatch())
        }
        // Receiver does not support the family at all.
        _ => Err(unrecognized_operation()),
    }
}

fn bitwise(op: BinOp, a: Value, b: Value) -> RunResult<Value> {
    use BinOp::*;
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
            Xor => a ^ b,
            And => a & b,
            Or => a | b,
            _ => return Err(unrecognized_operation()),
        })),
        (Value::U32(a), Value::U32(b)) => Ok(Value::U32(match op {
            Xor => a ^ b,
            And => a & b,
            Or => a | b,
            _ => return Err(unrecognized_operation()),
        })),
        (Value::Bool(_) | Value::U32(_), _) => Err(type_mismatch()),
        _ => Err(unrecognized_operation()),
    }
}

/// Evaluate a specialized unary operator.
pub fn eval_un(cx: &mut EvalCx, op: UnOp, value: Value) -> RunResult<Value> {
    if let Value::Obj(obj) = &value {
        let obj = obj.clone();
        let mut args = [value];
        return obj.invoke(cx, &op.sym(), &mut args, None);
    }
    match (op, value) {
        (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnOp::Not, Value::U32(n)) => Ok(Value::U32(!n)),
        (UnOp::Neg, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(overflow),
        (UnOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnOp::Neg, Value::F32(x)) => Ok(Value::F32(-x)),
        (UnOp::Neg, Value::U32(n)) => Ok(Value::U32(n.wrapping_neg())),
        (UnOp::Abs, Value::Int(n)) => n.checked_abs().map(Value::Int).ok_or_else(overflow),
        (UnOp::Abs, Value::Float(x)) => Ok(Value::Float(x.abs())),
        (UnOp::Abs, Value::F32(x)) => Ok(Value::F32(x.abs())),
        _ => Err(unrecognized_operation()),
    }
}

fn divide(op_is_rem: bool, a: Value, b: Value) -> RunResult<Value> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                return Err(division_by_zero());
            }
            let res = if op_is_rem {
                a.checked_rem(b)
            } else {
                a.checked_div(b)
            };
            res.map(Value::Int).ok_or_else(overflow)
        }
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(if op_is_rem {
            a % b
        } else {
            a / b
        })),
        (Value::F32(a), Value::F32(b)) => Ok(Value::F32(if op_is_rem { a % b } else { a / b })),
        (Value::U32(a), Value::U32(b)) => {
            if b == 0 {
                return Err(division_by_zero());
            }
            Ok(Value::U32(if op_is_rem { a % b } else { a / b }))
        }
        (Value::Int(_) | Value::Float(_) | Value::F32(_) | Value::U32(_), _) => {
            Err(type_mismatch())
        }
        _ => Err(unrecognized_operation()),
    }
}

/// The default operation set every value answers.
///
/// Native objects call this for operations they do not override: identity
/// `==`/`<>`/`Order`, shallow `Clone`/`DeepClone`, and the type-label `Str`.
/// `args` includes the receiver at index 0.
pub fn default_invoke(receiver: &Value, op: &Sym, args: &mut [Value]) -> RunResult<Value> {
    let k = known();
    if op == &k.eq || op == &k.ne {
        if args.len() != 2 {
            return Err(invalid_invocation());
        }
        let same = values_equal(receiver, &args[1]);
        return Ok(Value::Bool(if op == &k.eq { same } else { !same }));
    }
    if op == &k.order {
        if args.len() != 2 {
            return Err(invalid_invocation());
        }
        if !values_equal(receiver, &args[1]) {
            return Err(type_mismatch());
        }
        return Ok(Value::Int(0));
    }
    if op == &k.clone || op == &k.deep_clone {
        if args.len() != 1 {
            return Err(invalid_invocation());
        }
        return Ok(receiver.clone());
    }
    if op == &k.str {
        if args.len() != 1 {
            return Err(invalid_invocation());
        }
        return Ok(Value::str(receiver.type_str()));
    }
    Err(unrecognized_operation())
}

/// Deep-clone a value: records clone slot-by-slot, objects answer their
/// own `DeepClone`, everything else is a cheap clone.
pub fn deep_clone_value(cx: &mut EvalCx, value: Value) -> RunResult<Value> {
    match value {
        Value::Rec(rec) => {
            let mut copy = (*rec).clone();
            for slot in copy.slots_mut() {
                let deep = deep_clone_value(cx, std::mem::take(slot))?;
                *slot = deep;
            }
            Ok(Value::rec(copy))
        }
        Value::Obj(obj) => {
            let mut args = [Value::Obj(obj.clone())];
            obj.invoke(cx, &known().deep_clone, &mut args, None)
        }
        other => Ok(other),
    }
}

/// The generic `Repl` replace protocol.
///
/// `args` is `[container, index…, new]`; the updated container is returned
/// and the displaced element, when `outs` is supplied, lands in its last
/// slot (mirroring the argument layout of the caller).
fn repl(args: &mut [Value], outs: Option<&mut [Value]>) -> RunResult<Value> {
    let argc = args.len();
    if argc < 3 {
        return Err(invalid_invocation());
    }
    match std::mem::take(&mut args[0]) {
        Value::Rec(mut rec) => {
            if argc != 3 {
                return Err(invalid_invocation());
            }
            let field = match &args[1] {
                Value::Sym(sym) => sym.clone(),
                _ => return Err(type_mismatch()),
            };
            let new = std::mem::take(&mut args[2]);
            let old = rec
                .make_mut()
                .replace(&field, new)
                .ok_or_else(key_absent)?;
            if let Some(outs) = outs {
                if let Some(slot) = outs.last_mut() {
                    *slot = old;
                }
            }
            Ok(Value::Rec(rec))
        }
        _ => Err(unrecognized_operation()),
    }
}

/// Apply an operation symbol to an argument vector (receiver at index 0).
///
/// This is the dynamic-dispatch slow path that the optimizer's specialized
/// nodes exist to avoid.
pub fn dispatch(
    cx: &mut EvalCx,
    op: &Sym,
    args: &mut [Value],
    outs: Option<&mut [Value]>,
) -> RunResult<Value> {
    if args.is_empty() {
        return Err(invalid_invocation());
    }
    // Boxed objects own their whole operation set.
    if let Value::Obj(obj) = &args[0] {
        let obj = obj.clone();
        return obj.invoke(cx, op, args, outs);
    }
    let k = known();
    if let Some(binop) = BinOp::from_sym(op) {
        if args.len() != 2 {
            return Err(invalid_invocation());
        }
        let b = std::mem::take(&mut args[1]);
        let a = std::mem::take(&mut args[0]);
        return eval_bin(cx, binop, a, b);
    }
    if let Some(unop) = UnOp::from_sym(op) {
        if args.len() != 1 {
            return Err(invalid_invocation());
        }
        let a = std::mem::take(&mut args[0]);
        return eval_un(cx, unop, a);
    }
    if op == &k.div || op == &k.rem {
        if args.len() != 2 {
            return Err(invalid_invocation());
        }
        let b = std::mem::take(&mut args[1]);
        let a = std::mem::take(&mut args[0]);
        return divide(op == &k.rem, a, b);
    }
    if op == &k.order {
        if args.len() != 2 {
            return Err(invalid_invocation());
        }
        return order_values(&args[0], &args[1]).map(Value::Int);
    }
    if op == &k.clone {
        if args.len() != 1 {
            return Err(invalid_invocation());
        }
        return Ok(args[0].clone());
    }
    if op == &k.deep_clone {
        if args.len() != 1 {
            return Err(invalid_invocation());
        }
        let a = std::mem::take(&mut args[0]);
        return deep_clone_value(cx, a);
    }
    if op == &k.str {
        if args.len() != 1 {
            return Err(invalid_invocation());
        }
        return Ok(Value::str(args[0].to_string()));
    }
    if op == &k.repl {
        return repl(args, outs);
    }
    Err(unrecognized_operation())
}

/// Apply a value as a callee.
///
/// Symbols apply the named operation; records index by field symbol; boxed
/// objects answer `Apply`; anything else does not support application.
pub fn apply_value(
    cx: &mut EvalCx,
    callee: Value,
    args: &mut [Value],
    outs: Option<&mut [Value]>,
) -> RunResult<Value> {
    cx.stats.generic_dispatch += 1;
    match callee {
        Value::Sym(op) => {
            if args.is_empty() {
                return Err(invalid_invocation());
            }
            dispatch(cx, &op, args, outs)
        }
        Value::Rec(rec) => {
            if args.len() != 1 {
                return Err(invalid_invocation());
            }
            match &args[0] {
                Value::Sym(field) => rec.get(field).cloned().ok_or_else(key_absent),
                _ => Err(type_mismatch()),
            }
        }
        Value::Obj(obj) => obj.invoke(cx, &known().apply, args, outs),
        _ => Err(unrecognized_operation()),
    }
}

/// Make a record value; slot values are matched to fields by name.
///
/// Convenience for embedders and tests: fields and values are paired
/// positionally, then stored at the descriptor's canonical offsets.
pub fn make_record(fields: &[Sym], values: Vec<Value>) -> RunResult<Value> {
    if fields.len() != values.len() {
        return Err(invalid_invocation());
    }
    let descr = rill_ir::RecordDescr::new(fields);
    if descr.len() != fields.len() {
        return Err(invalid_invocation()); // duplicate field names
    }
    let mut slots = vec![Value::Nil; descr.len()];
    for (field, value) in fields.iter().zip(values) {
        match descr.offset_of(field) {
            Some(disp) => slots[disp] = value,
            None => return Err(key_absent()),
        }
    }
    match RecordValue::new(descr, slots) {
        Some(rec) => Ok(Value::rec(rec)),
        None => Err(invalid_invocation()),
    }
}

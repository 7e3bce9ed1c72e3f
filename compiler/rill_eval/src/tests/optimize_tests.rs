//! Catalog classification: which node shape each application becomes.

use crate::code::{Code, Lit, Operand};
use crate::optimize;
use crate::{BinOp, CompileCx, EvalCx, UnOp, Value};
use pretty_assertions::assert_eq;
use rill_ir::{Form, Sym};

use super::compile_form;

fn ctx() -> (CompileCx, EvalCx) {
    (CompileCx::new(), EvalCx::new())
}

/// Bind `name` to a fresh temporary and push `value` into its slot.
fn bind_temp(ccx: &mut CompileCx, ecx: &mut EvalCx, name: &str, value: Value) {
    ccx.bind_temp(Sym::new(name));
    ecx.temps.push(value);
}

#[test]
fn test_lit_classification() {
    assert!(matches!(
        optimize::make_lit(Value::Int(1)),
        Code::Lit(Lit::Int(1))
    ));
    assert!(matches!(
        optimize::make_lit(Value::Bool(true)),
        Code::Lit(Lit::Bool(true))
    ));
    assert!(matches!(optimize::make_lit(Value::Nil), Code::Lit(Lit::Nil)));
    assert!(matches!(
        optimize::make_lit(Value::str("s")),
        Code::Lit(Lit::Str(_))
    ));
    assert!(matches!(
        optimize::make_lit(Value::Sym(Sym::new("LitSym"))),
        Code::Lit(Lit::Sym(_))
    ));
}

#[test]
fn test_add_with_int_lit_and_temp_specializes() {
    let (mut ccx, mut ecx) = ctx();
    bind_temp(&mut ccx, &mut ecx, "OptT", Value::Int(4));
    let form = Form::list(vec![Form::word("+"), Form::int(3), Form::word("OptT")]);
    let code = compile_form(&mut ccx, &form);
    match &code {
        Code::Op2(node) => {
            assert_eq!(node.op, BinOp::Add);
            assert!(matches!(node.lhs, Operand::Lit(Lit::Int(3))));
            assert!(matches!(node.rhs, Operand::Temp(_)));
        }
        other => panic!("expected Op2, got {other:?}"),
    }
    assert_eq!(code.execute(&mut ecx).unwrap(), Value::Int(7));
    assert_eq!(ecx.stats.generic_dispatch, 0, "no dynamic dispatch");
    assert_eq!(ecx.stats.fast_ops, 1);
}

#[test]
fn test_unary_specializes() {
    let (mut ccx, mut ecx) = ctx();
    bind_temp(&mut ccx, &mut ecx, "NegT", Value::Int(5));
    let form = Form::list(vec![Form::word("Neg"), Form::word("NegT")]);
    let code = compile_form(&mut ccx, &form);
    match &code {
        Code::Op1(node) => {
            assert_eq!(node.op, UnOp::Neg);
            assert!(matches!(node.arg, Operand::Temp(_)));
        }
        other => panic!("expected Op1, got {other:?}"),
    }
    assert_eq!(code.execute(&mut ecx).unwrap(), Value::Int(-5));
}

#[test]
fn test_string_literal_in_numeric_family_stays_generic() {
    // `+["a"; T]`: the numeric fast path does not cover strings, so the
    // rewrite falls back to the shaped generic form.
    let (mut ccx, mut ecx) = ctx();
    bind_temp(&mut ccx, &mut ecx, "StrT", Value::str("b"));
    let form = Form::list(vec![Form::word("+"), Form::str("a"), Form::word("StrT")]);
    let code = compile_form(&mut ccx, &form);
    assert!(
        matches!(code, Code::Shaped(_)),
        "expected shaped fallback, got {code:?}"
    );
    assert_eq!(code.execute(&mut ecx).unwrap(), Value::str("ab"));
    assert_eq!(ecx.stats.generic_dispatch, 1);
}

#[test]
fn test_bool_literal_specializes_left_of_equality_only() {
    let (mut ccx, mut ecx) = ctx();
    bind_temp(&mut ccx, &mut ecx, "BoolT", Value::Bool(false));

    // Boolean literals have no source-form spelling here; build the
    // application nodes directly.
    use smallvec::smallvec;
    let left = crate::optimize::apply(crate::Apply {
        target: optimize::make_lit(Value::Sym(Sym::new("=="))),
        args: smallvec![
            optimize::make_lit(Value::Bool(false)),
            Code::Temp(crate::Temp { slot: 0 })
        ],
        loc: rill_ir::Loc::DUMMY,
    });
    assert!(matches!(left, Code::Op2(_)), "got {left:?}");

    // Right boolean literal against a temporary: shaped generic.
    let right = crate::optimize::apply(crate::Apply {
        target: optimize::make_lit(Value::Sym(Sym::new("=="))),
        args: smallvec![
            Code::Temp(crate::Temp { slot: 0 }),
            optimize::make_lit(Value::Bool(false))
        ],
        loc: rill_ir::Loc::DUMMY,
    });
    assert!(matches!(right, Code::Shaped(_)), "got {right:?}");

    // Both produce the same result.
    assert_eq!(left.execute(&mut ecx).unwrap(), Value::Bool(true));
    assert_eq!(right.execute(&mut ecx).unwrap(), Value::Bool(true));
}

#[test]
fn test_non_operator_symbol_target_is_shaped() {
    use smallvec::smallvec;
    let code = crate::optimize::apply(crate::Apply {
        target: optimize::make_lit(Value::Sym(Sym::new("Frobnicate"))),
        args: smallvec![
            optimize::make_lit(Value::Int(1)),
            optimize::make_lit(Value::Int(2))
        ],
        loc: rill_ir::Loc::DUMMY,
    });
    match &code {
        Code::Shaped(node) => {
            assert!(matches!(node.target, Operand::Lit(Lit::Sym(_))));
            assert!(matches!(node.args[0], Operand::Lit(Lit::Int(1))));
            assert!(matches!(node.args[1], Operand::Lit(Lit::Int(2))));
        }
        other => panic!("expected Shaped, got {other:?}"),
    }
}

#[test]
fn test_literal_pair_is_not_folded() {
    // `+[2; 3]` must stay an executable node, not a folded literal.
    let (mut ccx, mut ecx) = ctx();
    let form = Form::list(vec![Form::word("+"), Form::int(2), Form::int(3)]);
    let code = compile_form(&mut ccx, &form);
    assert!(
        !matches!(code, Code::Lit(_)),
        "literal/literal pairs defer to execution"
    );
    assert_eq!(code.execute(&mut ecx).unwrap(), Value::Int(5));
}

#[test]
fn test_indexing_family_classifies_shapes() {
    // `T[Field]` with a temporary target: shaped indexing with a
    // literal-symbol operand.
    let (mut ccx, mut ecx) = ctx();
    let field = Sym::new("IxField");
    let rec = crate::ops::make_record(&[field.clone()], vec![Value::Int(42)]).unwrap();
    bind_temp(&mut ccx, &mut ecx, "IxT", rec);
    let form = Form::list(vec![Form::word("IxT"), Form::sym(field)]);
    let code = compile_form(&mut ccx, &form);
    match &code {
        Code::Shaped(node) => {
            assert!(matches!(node.target, Operand::Temp(_)));
            assert!(matches!(node.args[0], Operand::Lit(Lit::Sym(_))));
            assert!(node.is_lvalue(), "temp-target application is assignable");
        }
        other => panic!("expected Shaped, got {other:?}"),
    }
    assert_eq!(code.execute(&mut ecx).unwrap(), Value::Int(42));
}

#[test]
fn test_fully_opaque_application_stays_generic() {
    use smallvec::smallvec;
    // Opaque target and operands (sequences are opaque).
    let opaque = |v: Value| {
        Code::Seq(std::sync::Arc::new(crate::Seq {
            first: optimize::make_lit(Value::Nil),
            second: optimize::make_lit(v),
        }))
    };
    let code = crate::optimize::apply(crate::Apply {
        target: opaque(Value::Sym(Sym::new("+"))),
        args: smallvec![opaque(Value::Int(1)), opaque(Value::Int(2))],
        loc: rill_ir::Loc::DUMMY,
    });
    assert!(matches!(code, Code::Apply(_)), "got {code:?}");
    let mut ecx = EvalCx::new();
    assert_eq!(code.execute(&mut ecx).unwrap(), Value::Int(3));
}

#[test]
fn test_arity_five_is_never_rewritten() {
    use smallvec::smallvec;
    let code = crate::optimize::apply(crate::Apply {
        target: optimize::make_lit(Value::Sym(Sym::new("Wide"))),
        args: smallvec![
            optimize::make_lit(Value::Int(1)),
            optimize::make_lit(Value::Int(2)),
            optimize::make_lit(Value::Int(3)),
            optimize::make_lit(Value::Int(4)),
            optimize::make_lit(Value::Int(5))
        ],
        loc: rill_ir::Loc::DUMMY,
    });
    assert!(matches!(code, Code::Apply(_)));
}

#[test]
fn test_arity_three_classifies_target_only() {
    use smallvec::smallvec;
    let code = crate::optimize::apply(crate::Apply {
        target: optimize::make_lit(Value::Sym(Sym::new("Three"))),
        args: smallvec![
            optimize::make_lit(Value::Int(1)),
            optimize::make_lit(Value::Int(2)),
            optimize::make_lit(Value::Int(3))
        ],
        loc: rill_ir::Loc::DUMMY,
    });
    match &code {
        Code::Shaped(node) => {
            assert!(matches!(node.target, Operand::Lit(Lit::Sym(_))));
            assert!(node.args.iter().all(|a| matches!(a, Operand::Expr(_))));
        }
        other => panic!("expected Shaped, got {other:?}"),
    }
}

//! In-out calls and the store/extract protocol.

use crate::errors::RunResult;
use crate::ops::{default_invoke, known};
use crate::{CompileCx, EvalCx, NativeObj, Sym, Value};
use pretty_assertions::assert_eq;
use rill_ir::Form;

use super::{compile_form, eval_form};

/// Two-argument test procedure: returns `a + b`, and reports `b + 10` as
/// the updated value of its second (in-out) parameter.
#[derive(Debug)]
struct AddAndBump;

impl NativeObj for AddAndBump {
    fn type_str(&self) -> &str {
        "procedure/add-and-bump"
    }

    fn invoke(
        &self,
        _cx: &mut EvalCx,
        op: &Sym,
        args: &mut [Value],
        outs: Option<&mut [Value]>,
    ) -> RunResult<Value> {
        if op != &known().apply {
            let receiver = args[0].clone();
            return default_invoke(&receiver, op, args);
        }
        if args.len() != 2 {
            return Err(crate::errors::invalid_invocation());
        }
        let (a, b) = match (&args[0], &args[1]) {
            (Value::Int(a), Value::Int(b)) => (*a, *b),
            _ => return Err(crate::errors::type_mismatch()),
        };
        if let Some(outs) = outs {
            outs[1] = Value::Int(b + 10);
        }
        Ok(Value::Int(a + b))
    }
}

/// Procedure reporting fixed updated values for both parameters.
#[derive(Debug)]
struct WriteBoth;

impl NativeObj for WriteBoth {
    fn invoke(
        &self,
        _cx: &mut EvalCx,
        op: &Sym,
        args: &mut [Value],
        outs: Option<&mut [Value]>,
    ) -> RunResult<Value> {
        if op != &known().apply {
            let receiver = args[0].clone();
            return default_invoke(&receiver, op, args);
        }
        if let Some(outs) = outs {
            outs[0] = Value::Int(1);
            outs[1] = Value::Int(2);
        }
        Ok(Value::Nil)
    }
}

fn bind_proc(ccx: &mut CompileCx, name: &str, proc: impl NativeObj + 'static) {
    ccx.keywords
        .set(Sym::new(name), Some(crate::make_lit(Value::obj(proc))));
}

#[test]
fn test_inout_extracts_then_stores_back() {
    // `Proc[A; ?B]`: B's pre-call value reaches the callee, the callee's
    // updated value lands back in B before the call returns its result.
    let mut ccx = CompileCx::new();
    let mut ecx = EvalCx::new();
    bind_proc(&mut ccx, "proc", AddAndBump);
    ccx.bind_temp(Sym::new("B"));
    ecx.temps.push(Value::Int(5));

    let form = Form::list(vec![
        Form::word("proc"),
        Form::int(3),
        Form::list(vec![Form::word("?"), Form::word("B")]),
    ]);
    let result = eval_form(&mut ccx, &mut ecx, &form).unwrap();
    assert_eq!(result, Value::Int(8), "primary result is a + b");
    assert_eq!(
        ecx.temps.get(0),
        &Value::Int(15),
        "B holds the callee's updated value"
    );
}

#[test]
fn test_writeback_runs_in_reverse_order() {
    // Both in-out arguments reference the same storage; reverse-order
    // write-back means the *first* argument's update is stored last and
    // wins.
    let mut ccx = CompileCx::new();
    let mut ecx = EvalCx::new();
    bind_proc(&mut ccx, "wproc", WriteBoth);
    ccx.bind_temp(Sym::new("Shared"));
    ecx.temps.push(Value::Int(0));

    let form = Form::list(vec![
        Form::word("wproc"),
        Form::list(vec![Form::word("?"), Form::word("Shared")]),
        Form::list(vec![Form::word("?"), Form::word("Shared")]),
    ]);
    eval_form(&mut ccx, &mut ecx, &form).unwrap();
    assert_eq!(ecx.temps.get(0), &Value::Int(1));
}

#[test]
fn test_unmarked_args_pass_by_value() {
    let mut ccx = CompileCx::new();
    let mut ecx = EvalCx::new();
    bind_proc(&mut ccx, "vproc", AddAndBump);
    ccx.bind_temp(Sym::new("V"));
    ecx.temps.push(Value::Int(4));

    // No `?` marks: the temp is only read.
    let form = Form::list(vec![Form::word("vproc"), Form::int(1), Form::word("V")]);
    assert_eq!(eval_form(&mut ccx, &mut ecx, &form).unwrap(), Value::Int(5));
    assert_eq!(ecx.temps.get(0), &Value::Int(4));
}

#[test]
fn test_store_through_record_field() {
    // `R[F] := v` runs the replace protocol; `R[F]` extract leaves the
    // field in transition and the store/extract pair round-trips.
    let mut ccx = CompileCx::new();
    let mut ecx = EvalCx::new();
    let field = Sym::new("Field");
    let rec = crate::ops::make_record(&[field.clone()], vec![Value::Int(1)]).unwrap();
    ccx.bind_temp(Sym::new("R"));
    ecx.temps.push(rec);

    let access = compile_form(
        &mut ccx,
        &Form::list(vec![Form::word("R"), Form::sym(field.clone())]),
    );
    assert!(access.is_lvalue());

    access.exec_in(&mut ecx, Value::Int(7)).unwrap();
    assert_eq!(access.execute(&mut ecx).unwrap(), Value::Int(7));

    let moved = access.exec_out(&mut ecx).unwrap();
    assert_eq!(moved, Value::Int(7));
    assert_eq!(
        access.execute(&mut ecx).unwrap(),
        Value::Nil,
        "field is in transition after extract"
    );
    access.exec_in(&mut ecx, moved).unwrap();
    assert_eq!(access.execute(&mut ecx).unwrap(), Value::Int(7));
}

#[test]
fn test_store_to_absent_field_signals() {
    let mut ccx = CompileCx::new();
    let mut ecx = EvalCx::new();
    let rec = crate::ops::make_record(&[Sym::new("Present")], vec![Value::Int(1)]).unwrap();
    ccx.bind_temp(Sym::new("R2"));
    ecx.temps.push(rec);

    let access = compile_form(
        &mut ccx,
        &Form::list(vec![Form::word("R2"), Form::sym(Sym::new("Absent"))]),
    );
    let err = access.exec_in(&mut ecx, Value::Int(7)).unwrap_err();
    assert_eq!(err.tag.text().as_ref(), "KeyAbsent");
}

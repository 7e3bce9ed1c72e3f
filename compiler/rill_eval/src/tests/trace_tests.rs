//! Failure unwinding and trace annotation.

use crate::context::Phase;
use crate::{CompileCx, EvalCx, Value};
use pretty_assertions::assert_eq;
use rill_ir::{Form, Loc, Sym};
use std::sync::Arc;

use super::compile_form;

fn at(line: u32) -> Loc {
    Loc::new(Arc::from("trace.rl"), (line, 1), (line, 9))
}

#[test]
fn test_failed_invocation_annotates_with_location() {
    let mut ccx = CompileCx::new();
    let mut ecx = EvalCx::new();
    // `+[1; "x"]` fails with TypeMismatch at the call's location.
    let form = Form::list(vec![Form::word("+"), Form::int(1), Form::str("x")])
        .with_loc(at(4));
    let code = compile_form(&mut ccx, &form);
    let err = code.execute(&mut ecx).unwrap_err();
    assert_eq!(err.tag.text().as_ref(), "TypeMismatch");
    assert_eq!(ecx.trace.frames().len(), 1);
    let (loc, phase) = &ecx.trace.frames()[0];
    assert_eq!(loc.start, (4, 1));
    assert_eq!(*phase, Phase::Evaluating);
}

#[test]
fn test_nested_invocations_annotate_innermost_first() {
    let mut ccx = CompileCx::new();
    let mut ecx = EvalCx::new();
    // Outer call fails because its inner *target* invocation fails; both
    // invocations contribute, innermost first.
    // Inner: Order[1; "x"] → TypeMismatch while evaluating the target of
    // the outer application.
    let inner = Form::list(vec![
        Form::word("Order"),
        Form::int(1),
        Form::str("x"),
    ])
    .with_loc(at(2));
    let outer = Form::list(vec![inner, Form::int(1)]).with_loc(at(7));
    let code = compile_form(&mut ccx, &outer);
    let err = code.execute(&mut ecx).unwrap_err();
    assert_eq!(err.tag.text().as_ref(), "TypeMismatch");
    let lines: Vec<u32> = ecx.trace.frames().iter().map(|(l, _)| l.start.0).collect();
    assert_eq!(lines, vec![2], "only the failed invocation annotates");
}

#[test]
fn test_failed_store_annotates_storing_phase() {
    let mut ccx = CompileCx::new();
    let mut ecx = EvalCx::new();
    let rec = crate::ops::make_record(&[Sym::new("Known")], vec![Value::Int(1)]).unwrap();
    ccx.bind_temp(Sym::new("TraceR"));
    ecx.temps.push(rec);

    let form = Form::list(vec![Form::word("TraceR"), Form::sym(Sym::new("Missing"))])
        .with_loc(at(9));
    let access = compile_form(&mut ccx, &form);
    let err = access.exec_in(&mut ecx, Value::Int(2)).unwrap_err();
    assert_eq!(err.tag.text().as_ref(), "KeyAbsent");
    let (loc, phase) = &ecx.trace.frames()[0];
    assert_eq!(loc.start, (9, 1));
    assert_eq!(*phase, Phase::Storing);
}

#[test]
fn test_failed_extract_annotates_moving_out_phase() {
    let mut ccx = CompileCx::new();
    let mut ecx = EvalCx::new();
    let rec = crate::ops::make_record(&[Sym::new("Known2")], vec![Value::Int(1)]).unwrap();
    ccx.bind_temp(Sym::new("TraceR2"));
    ecx.temps.push(rec);

    let form = Form::list(vec![
        Form::word("TraceR2"),
        Form::sym(Sym::new("Missing2")),
    ])
    .with_loc(at(3));
    let access = compile_form(&mut ccx, &form);
    let err = access.exec_out(&mut ecx).unwrap_err();
    assert_eq!(err.tag.text().as_ref(), "KeyAbsent");
    let (_, phase) = &ecx.trace.frames()[0];
    assert_eq!(*phase, Phase::MovingOut);
}

#[test]
fn test_unlocated_nodes_do_not_annotate() {
    let mut ccx = CompileCx::new();
    let mut ecx = EvalCx::new();
    let form = Form::list(vec![Form::word("+"), Form::int(1), Form::str("x")]);
    let code = compile_form(&mut ccx, &form);
    assert!(code.execute(&mut ecx).is_err());
    assert!(ecx.trace.is_empty());
}

/// Procedure that runs a compiled body when applied: a stand-in for
/// user-level calls, which are what build deep invocation traces.
#[derive(Debug)]
struct Chained {
    body: crate::Code,
}

impl crate::NativeObj for Chained {
    fn invoke(
        &self,
        cx: &mut EvalCx,
        op: &Sym,
        args: &mut [Value],
        _outs: Option<&mut [Value]>,
    ) -> crate::RunResult<Value> {
        if op == &crate::ops::known().apply {
            self.body.execute(cx)
        } else {
            let receiver = args[0].clone();
            crate::ops::default_invoke(&receiver, op, args)
        }
    }
}

#[test]
fn test_deep_failure_truncates_silently() {
    let mut ccx = CompileCx::new();
    let mut ecx = EvalCx::new();
    // A chain of procedures, each invoking the next; the innermost fails.
    // Every invocation on the unwind path contributes one frame, oldest
    // (innermost) first, and entries past capacity drop silently.
    let mut body = compile_form(
        &mut ccx,
        &Form::list(vec![Form::word("+"), Form::int(1), Form::str("x")]).with_loc(at(1)),
    );
    for line in 2..=(crate::SigTrace::CAPACITY as u32 + 20) {
        let name = format!("Chain{line}");
        ccx.keywords
            .set(Sym::new(&name), Some(crate::make_lit(Value::obj(Chained { body }))));
        body = compile_form(
            &mut ccx,
            &Form::list(vec![Form::sym(Sym::new(&name))]).with_loc(at(line)),
        );
    }
    assert!(body.execute(&mut ecx).is_err());
    assert_eq!(ecx.trace.frames().len(), crate::SigTrace::CAPACITY);
    assert!(ecx.trace.is_truncated());
    // Oldest-first: the innermost invocation is retained.
    assert_eq!(ecx.trace.frames()[0].0.start.0, 1);
}

//! Test modules for the execution core.
//!
//! Shared helpers build forms programmatically (the textual reader is an
//! external collaborator) and run them through fresh per-test contexts.

mod inout_tests;
mod optimize_tests;
mod trace_tests;

use crate::{compile_rval, Code, CompileCx, EvalCx, RunResult, Value};
use rill_ir::{Form, Loc};

/// Compile a form as an R-value with a dummy enclosing location.
pub(crate) fn compile_form(ccx: &mut CompileCx, form: &Form) -> Code {
    match compile_rval(ccx, form, &Loc::DUMMY) {
        Ok(code) => code,
        Err(diag) => panic!("compile failed: {diag}"),
    }
}

/// Compile and execute a form in the given contexts.
pub(crate) fn eval_form(ccx: &mut CompileCx, ecx: &mut EvalCx, form: &Form) -> RunResult<Value> {
    compile_form(ccx, form).execute(ecx)
}

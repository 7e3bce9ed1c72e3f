//! Call-site synthesis.
//!
//! Given a compiled target fragment and the argument forms of an
//! application, build the minimal node for the call. Plain calls go to the
//! generic [`Apply`] node and straight into the peephole optimizer; calls
//! with `?[X]`-marked arguments go to the in-out [`ApplyMod`] node, which
//! threads marked arguments through the move-out/store protocol.
//!
//! All shape checks happen before any node is constructed: a plain
//! argument must compile to an R-value, an in-out argument to an L-value,
//! and oversized argument lists are rejected outright.

use crate::code::{Apply, ApplyMod, Code};
use crate::compile::{compile_lval, compile_rval};
use crate::context::CompileCx;
use crate::ops::known;
use crate::optimize;
use rill_diagnostic::{invalid_form, limit_exceeded, CompileResult};
use rill_ir::{Form, Loc};
use smallvec::SmallVec;
use std::sync::Arc;

/// Most arguments an application form may carry.
pub const MAX_ARGC: usize = 255;

/// Synthesize the application of `target` to the form's arguments.
pub fn compile_apply(
    ccx: &mut CompileCx,
    target: Code,
    form: &Form,
    loc: &Loc,
) -> CompileResult<Code> {
    let items = match form.items() {
        Some(items) => items,
        None => return Err(invalid_form(loc)),
    };
    let arg_forms = &items[1..];
    if arg_forms.len() > MAX_ARGC {
        return Err(limit_exceeded(loc));
    }

    // Application without in-out arguments.
    if !arg_forms.iter().any(is_inout_marked) {
        let mut args: SmallVec<[Code; 6]> = SmallVec::with_capacity(arg_forms.len());
        for el in arg_forms {
            args.push(compile_rval(ccx, el, loc)?);
        }
        return Ok(optimize::apply(Apply {
            target,
            args,
            loc: loc.clone(),
        }));
    }

    // Application with at least one in-out argument. Reads happen in
    // position order (move-out for marked arguments), write-back in
    // reverse position order; the node itself enforces that.
    let mut args: SmallVec<[(Code, bool); 6]> = SmallVec::with_capacity(arg_forms.len());
    for el in arg_forms {
        match inout_payload(el, loc)? {
            Some(inner) => args.push((compile_lval(ccx, inner, loc)?, true)),
            None => args.push((compile_rval(ccx, el, loc)?, false)),
        }
    }
    Ok(Code::ApplyMod(Arc::new(ApplyMod {
        target,
        args,
        loc: loc.clone(),
    })))
}

/// Whether the argument form is a `?`-headed list (of any length).
fn is_inout_marked(form: &Form) -> bool {
    form.items()
        .and_then(|items| items.first())
        .and_then(Form::as_sym)
        .is_some_and(|sym| sym == &known().inout_mark)
}

/// The payload of a well-formed `?[X]` marker, `None` for plain arguments,
/// or a diagnostic for a malformed marker.
fn inout_payload<'a>(form: &'a Form, loc: &Loc) -> CompileResult<Option<&'a Form>> {
    if !is_inout_marked(form) {
        return Ok(None);
    }
    match form.items() {
        Some([_, payload]) => Ok(Some(payload)),
        _ => Err(invalid_form(loc)),
    }
}

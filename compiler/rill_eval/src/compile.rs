//! The compiler dispatcher.
//!
//! Maps a source form to a compiled fragment: symbols resolve through the
//! keyword table first, leaves become optimized literals, and non-empty
//! lists compile their head and let it interpret the rest of the form
//! (call-site synthesis for value nodes, scoped binding for the export
//! node).

use crate::code::Code;
use crate::code::Seq;
use crate::context::CompileCx;
use crate::optimize;
use crate::value::Value;
use rill_diagnostic::{invalid_form, not_lvalue, not_rvalue, unbound_keyword, CompileResult};
use rill_ir::{Form, FormKind, Loc};
use std::sync::Arc;

/// Compile one source form.
pub fn compile(ccx: &mut CompileCx, form: &Form, enclosing: &Loc) -> CompileResult<Code> {
    let loc = form.loc_or(enclosing).clone();
    match &form.kind {
        FormKind::Sym(sym) => {
            if let Some(code) = ccx.keywords.get(sym) {
                return Ok(code.clone());
            }
            // Lowercase-initial symbols are reserved for keywords; an
            // unbound one is a compile error rather than a literal.
            if sym.text().starts_with(|c: char| c.is_ascii_lowercase()) {
                return Err(unbound_keyword(&loc));
            }
            Ok(optimize::make_lit(Value::Sym(sym.clone())))
        }
        FormKind::Int(n) => Ok(optimize::make_lit(Value::Int(*n))),
        FormKind::Str(s) => Ok(optimize::make_lit(Value::str(s))),
        FormKind::List(items) => match items.first() {
            Some(head) => {
                let target = compile(ccx, head, &loc)?;
                target.compile_form(ccx, form, &loc)
            }
            None => Err(invalid_form(&loc)),
        },
    }
}

/// Compile a form that must produce a value.
pub fn compile_rval(ccx: &mut CompileCx, form: &Form, enclosing: &Loc) -> CompileResult<Code> {
    let code = compile(ccx, form, enclosing)?;
    if !code.is_rvalue() {
        return Err(not_rvalue(form.loc_or(enclosing)));
    }
    Ok(code)
}

/// Compile a form that must designate assignable storage.
pub fn compile_lval(ccx: &mut CompileCx, form: &Form, enclosing: &Loc) -> CompileResult<Code> {
    let code = compile(ccx, form, enclosing)?;
    if !code.is_lvalue() {
        return Err(not_lvalue(form.loc_or(enclosing)));
    }
    Ok(code)
}

/// Compile a non-empty form range into left-folded sequencing.
///
/// Every element must be an R-value; the sequence's own value (and
/// L-value-ness) is the last element's.
pub fn compile_seq(ccx: &mut CompileCx, forms: &[Form], enclosing: &Loc) -> CompileResult<Code> {
    let mut iter = forms.iter();
    let first = match iter.next() {
        Some(form) => form,
        None => return Err(invalid_form(enclosing)),
    };
    let mut code = compile_rval(ccx, first, enclosing)?;
    for form in iter {
        code = Code::Seq(Arc::new(Seq {
            first: code,
            second: compile_rval(ccx, form, enclosing)?,
        }));
    }
    Ok(code)
}

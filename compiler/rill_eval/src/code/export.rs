//! Binding-override node.
//!
//! An [`Export`] carries a set of symbol-to-fragment bindings. It is not a
//! value: using it where a value is required is a compile error. Applied to
//! a `X[in; body…]` form, it overrides the keyword table with its bindings
//! for the extent of the body and restores the previous entries afterwards
//! (including "absent").

use crate::code::Code;
use crate::compile::{compile, compile_seq};
use crate::context::CompileCx;
use crate::ops::known;
use rill_diagnostic::{invalid_form, CompileResult};
use rill_ir::{Form, Loc, Sym};

/// Scope-export node: named fragments made visible to a nested body.
#[derive(Clone, Debug)]
pub struct Export {
    pub bind: Vec<(Sym, Code)>,
}

impl Export {
    pub fn new(bind: Vec<(Sym, Code)>) -> Export {
        Export { bind }
    }

    pub(crate) fn compile_form(
        &self,
        ccx: &mut CompileCx,
        form: &Form,
        loc: &Loc,
    ) -> CompileResult<Code> {
        let items = match form.items() {
            Some(items) => items,
            None => return Err(invalid_form(loc)),
        };
        if items.len() < 3 || items[1].as_sym() != Some(&known().in_kw) {
            return Err(invalid_form(loc));
        }
        // Shortcut: `X[in; name]` for a directly bound name needs no
        // override at all.
        if items.len() == 3 {
            if let Some(sym) = items[2].as_sym() {
                for (bound, code) in &self.bind {
                    if bound == sym {
                        return Ok(code.clone());
                    }
                }
            }
        }
        let mut overridden: Vec<(Sym, Option<Code>)> = Vec::with_capacity(self.bind.len());
        for (sym, code) in &self.bind {
            let old = ccx.keywords.set(sym.clone(), Some(code.clone()));
            overridden.push((sym.clone(), old));
        }
        let body = if items.len() == 3 {
            compile(ccx, &items[2], loc)
        } else {
            compile_seq(ccx, &items[2..], loc)
        };
        for (sym, old) in overridden {
            ccx.keywords.set(sym, old);
        }
        body
    }
}

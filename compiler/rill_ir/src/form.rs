//! Source forms.
//!
//! The parser hands the compiler a finite tree of forms: integer, string,
//! and symbol leaves, plus ordered lists whose first element denotes the
//! applied target. Every form carries a [`Loc`] for diagnostics.

use crate::{Loc, Sym};
use std::fmt;
use std::sync::Arc;

/// Payload of a source form.
#[derive(Clone, Debug, PartialEq)]
pub enum FormKind {
    Int(i64),
    Str(Arc<str>),
    Sym(Sym),
    List(Vec<Form>),
}

/// A located source form.
#[derive(Clone, Debug, PartialEq)]
pub struct Form {
    pub kind: FormKind,
    pub loc: Loc,
}

impl Form {
    /// Integer leaf.
    pub fn int(value: i64) -> Form {
        Form {
            kind: FormKind::Int(value),
            loc: Loc::DUMMY,
        }
    }

    /// String leaf.
    pub fn str(value: impl Into<Arc<str>>) -> Form {
        Form {
            kind: FormKind::Str(value.into()),
            loc: Loc::DUMMY,
        }
    }

    /// Symbol leaf.
    pub fn sym(sym: Sym) -> Form {
        Form {
            kind: FormKind::Sym(sym),
            loc: Loc::DUMMY,
        }
    }

    /// Symbol leaf interned from text.
    pub fn word(text: &str) -> Form {
        Form::sym(Sym::new(text))
    }

    /// List form.
    pub fn list(items: Vec<Form>) -> Form {
        Form {
            kind: FormKind::List(items),
            loc: Loc::DUMMY,
        }
    }

    /// Attach a source location.
    #[must_use]
    pub fn with_loc(mut self, loc: Loc) -> Form {
        self.loc = loc;
        self
    }

    /// Location of this form, falling back to an enclosing location when
    /// the form itself is unlocated.
    pub fn loc_or<'a>(&'a self, fallback: &'a Loc) -> &'a Loc {
        if self.loc.is_known() {
            &self.loc
        } else {
            fallback
        }
    }

    /// Whether this is a list form.
    pub fn is_list(&self) -> bool {
        matches!(self.kind, FormKind::List(_))
    }

    /// List items, if this is a list form.
    pub fn items(&self) -> Option<&[Form]> {
        match &self.kind {
            FormKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// The symbol, if this is a symbol leaf.
    pub fn as_sym(&self) -> Option<&Sym> {
        match &self.kind {
            FormKind::Sym(sym) => Some(sym),
            _ => None,
        }
    }
}

impl fmt::Display for Form {
    /// Round-trippable surface syntax: `Target[A; B]` for lists.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FormKind::Int(value) => write!(f, "{value}"),
            FormKind::Str(value) => write!(f, "{value:?}"),
            FormKind::Sym(sym) => write!(f, "{sym}"),
            FormKind::List(items) => {
                let mut items = items.iter();
                match items.next() {
                    None => write!(f, "[]"),
                    Some(head) => {
                        write!(f, "{head}[")?;
                        for (index, item) in items.enumerate() {
                            if index > 0 {
                                write!(f, "; ")?;
                            }
                            write!(f, "{item}")?;
                        }
                        write!(f, "]")
                    }
                }
            }
        }
    }
}

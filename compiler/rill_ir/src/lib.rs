//! Rill IR - source forms, locations, and interning for the Rill runtime.
//!
//! This crate holds the leaf data model shared by every later stage:
//!
//! - [`Loc`]: origin-labelled source spans carried by forms and code nodes
//! - [`Sym`]: reference-counted handles into the process-wide symbol table
//! - [`RecordDescr`]: deduplicated field-set descriptors for record values
//! - [`Form`]: the parser-facing source tree

mod form;
mod loc;
mod record;
mod sym;

pub use form::{Form, FormKind};
pub use loc::Loc;
pub use record::RecordDescr;
pub use sym::{Sym, SymSpaceExhausted, SymTable};

/// Assert the size of a type at compile time.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

//! Record values.
//!
//! A record is a descriptor plus a dense slot vector; all records with the
//! same field set share one [`RecordDescr`]. Field access and the `Repl`
//! replace protocol address slots through the descriptor's offsets.

use crate::value::Value;
use rill_ir::{RecordDescr, Sym};

/// A record instance.
#[derive(Clone, Debug)]
pub struct RecordValue {
    descr: RecordDescr,
    slots: Box<[Value]>,
}

impl RecordValue {
    /// Build a record over `descr` with slot values in descriptor order.
    ///
    /// Returns `None` when the slot count does not match the descriptor.
    pub fn new(descr: RecordDescr, slots: Vec<Value>) -> Option<RecordValue> {
        if slots.len() != descr.len() {
            return None;
        }
        Some(RecordValue {
            descr,
            slots: slots.into_boxed_slice(),
        })
    }

    /// The shared descriptor.
    pub fn descr(&self) -> &RecordDescr {
        &self.descr
    }

    /// Field value by name.
    pub fn get(&self, field: &Sym) -> Option<&Value> {
        self.descr.offset_of(field).map(|disp| &self.slots[disp])
    }

    /// Replace a field in place, returning the displaced value.
    pub fn replace(&mut self, field: &Sym, value: Value) -> Option<Value> {
        let disp = self.descr.offset_of(field)?;
        Some(std::mem::replace(&mut self.slots[disp], value))
    }

    /// All slot values in descriptor order.
    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    /// Mutable slot values in descriptor order.
    pub fn slots_mut(&mut self) -> &mut [Value] {
        &mut self.slots
    }
}

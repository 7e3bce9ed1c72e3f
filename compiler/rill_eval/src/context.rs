//! Per-thread compilation and evaluation state.
//!
//! Each worker thread owns one [`CompileCx`] and one [`EvalCx`]; nothing
//! here is shared or ambient. The only cross-thread state in the runtime is
//! the symbol table and the record-descriptor cache, both behind their own
//! locks in `rill_ir`.

use crate::code::Code;
use crate::value::Value;
use rill_ir::{Loc, Sym};
use rustc_hash::FxHashMap;

/// Unwind phase recorded with each trace entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Failure while producing a value.
    Evaluating,
    /// Failure while overwriting storage.
    Storing,
    /// Failure while moving a value out of storage.
    MovingOut,
}

impl Phase {
    /// Human-readable phase description used in backtraces.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Evaluating => "evaluating",
            Phase::Storing => "storing a value",
            Phase::MovingOut => "moving-out a value",
        }
    }
}

/// Bounded invocation trace collected while a signal unwinds.
///
/// Entries are oldest-first (innermost invocation first); once the buffer
/// is full further entries are dropped silently, and the overflow is
/// remembered so the reporter can say so.
#[derive(Debug, Default)]
pub struct SigTrace {
    frames: Vec<(Loc, Phase)>,
    truncated: bool,
}

impl SigTrace {
    /// Retained entries.
    pub const CAPACITY: usize = 100;

    /// Record one unwind step. Unlocated nodes contribute nothing.
    pub fn push(&mut self, loc: &Loc, phase: Phase) {
        if !loc.is_known() {
            return;
        }
        if self.frames.len() < Self::CAPACITY {
            self.frames.push((loc.clone(), phase));
        } else {
            self.truncated = true;
        }
    }

    /// Collected entries, oldest-first.
    pub fn frames(&self) -> &[(Loc, Phase)] {
        &self.frames
    }

    /// Whether entries were dropped past capacity.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Whether nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Forget everything, e.g. after a handler consumed the failure.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.truncated = false;
    }
}

/// Temporary-variable stack with a frame pointer.
///
/// Slot-addressed storage for compiler-managed temporaries; slots are
/// frame-relative. `enter`/`leave` bracket an activation.
#[derive(Debug, Default)]
pub struct TempStack {
    vals: Vec<Value>,
    frame: usize,
}

impl TempStack {
    /// Push one value on top of the stack.
    pub fn push(&mut self, value: Value) {
        self.vals.push(value);
    }

    /// Push `count` nil slots.
    pub fn extend(&mut self, count: usize) {
        self.vals.resize_with(self.vals.len() + count, Value::default);
    }

    /// Drop the top `count` slots.
    pub fn drop_n(&mut self, count: usize) {
        self.vals.truncate(self.vals.len().saturating_sub(count));
    }

    /// Start a new frame at the current top; returns the previous frame
    /// pointer for the matching [`TempStack::leave`].
    pub fn enter(&mut self) -> usize {
        std::mem::replace(&mut self.frame, self.vals.len())
    }

    /// Restore the previous frame pointer.
    pub fn leave(&mut self, frame: usize) {
        self.frame = frame;
    }

    /// Read a frame-relative slot.
    pub fn get(&self, slot: u32) -> &Value {
        &self.vals[self.frame + slot as usize]
    }

    /// Overwrite a frame-relative slot.
    pub fn set(&mut self, slot: u32, value: Value) {
        self.vals[self.frame + slot as usize] = value;
    }

    /// Move a frame-relative slot out, leaving nil in transition.
    pub fn take(&mut self, slot: u32) -> Value {
        std::mem::take(&mut self.vals[self.frame + slot as usize])
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.vals.len()
    }

    /// Whether the stack holds no slots.
    pub fn is_empty(&self) -> bool {
        self.vals.is_empty()
    }
}

/// Dispatch accounting.
///
/// `generic_dispatch` counts applications that went through the dynamic
/// value-application path; specialized operator nodes bypass it entirely,
/// which is what the optimizer's end-to-end tests observe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvalStats {
    pub generic_dispatch: u64,
    pub fast_ops: u64,
}

/// Per-thread evaluation context.
#[derive(Debug, Default)]
pub struct EvalCx {
    pub temps: TempStack,
    pub trace: SigTrace,
    pub stats: EvalStats,
}

impl EvalCx {
    pub fn new() -> EvalCx {
        EvalCx::default()
    }
}

/// Keyword table: symbol to already-compiled fragment.
///
/// Consulted before structural compilation; binding forms override entries
/// for the extent of a nested body and restore them afterwards.
#[derive(Debug, Default)]
pub struct KeywordTable {
    map: FxHashMap<Sym, Code>,
}

impl KeywordTable {
    /// Current binding for `sym`.
    pub fn get(&self, sym: &Sym) -> Option<&Code> {
        self.map.get(sym)
    }

    /// Install, replace, or remove (`None`) a binding; returns the previous
    /// one so scoped overrides can restore it.
    pub fn set(&mut self, sym: Sym, code: Option<Code>) -> Option<Code> {
        match code {
            Some(code) => self.map.insert(sym, code),
            None => self.map.remove(&sym),
        }
    }
}

/// Per-thread compilation context.
#[derive(Debug, Default)]
pub struct CompileCx {
    pub keywords: KeywordTable,
    /// Temporary count for the current frame layout.
    pub tmp_cnt: u32,
}

impl CompileCx {
    pub fn new() -> CompileCx {
        CompileCx::default()
    }

    /// Allocate the next temporary slot and bind `sym` to it.
    ///
    /// Returns the slot; the caller is responsible for pushing a matching
    /// stack slot into the evaluation context before executing.
    pub fn bind_temp(&mut self, sym: Sym) -> u32 {
        let slot = self.tmp_cnt;
        self.tmp_cnt += 1;
        self.keywords
            .set(sym, Some(Code::Temp(crate::code::Temp { slot })));
        slot
    }
}

//! Record descriptors.
//!
//! A [`RecordDescr`] maps a fixed set of field-name symbols to dense slot
//! offsets. Descriptors are deduplicated process-wide by field-set equality:
//! two requests for the same set (in any order) return the same object, so
//! record instances with identical field sets share one descriptor and the
//! optimizer's literal matching of field access stays meaningful.
//!
//! Teardown follows the symbol table's two-tier rule: handle counts move
//! lock-free, and the drop that reaches zero re-checks under the store lock
//! before erasing.

use crate::Sym;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::trace;

struct DescrInner {
    /// Field symbols in canonical (sorted) order; offsets follow this order.
    fields: Box<[Sym]>,
    offsets: FxHashMap<Sym, u32>,
    /// Count of user handles; the store's own reference is not counted.
    handles: AtomicU32,
}

type Store = Mutex<FxHashMap<Box<[u32]>, Arc<DescrInner>>>;

fn store() -> &'static Store {
    static STORE: OnceLock<Store> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(FxHashMap::default()))
}

/// Deduplicated, reference-counted record field-set descriptor.
///
/// Slot offsets run `0..len` in the canonical order of the field set; the
/// order is a property of the set, not of any particular request.
pub struct RecordDescr {
    inner: Arc<DescrInner>,
}

impl RecordDescr {
    /// Descriptor for the given field set.
    ///
    /// Duplicate symbols collapse; insertion order of `fields` is
    /// irrelevant. Returns the shared descriptor, creating it on first
    /// request.
    pub fn new(fields: &[Sym]) -> RecordDescr {
        let mut sorted: Vec<Sym> = fields.to_vec();
        sorted.sort();
        sorted.dedup();
        let key: Box<[u32]> = sorted.iter().map(Sym::id).collect();

        let mut store = store().lock();
        if let Some(inner) = store.get(&key) {
            inner.handles.fetch_add(1, Ordering::Relaxed);
            return RecordDescr {
                inner: inner.clone(),
            };
        }
        let offsets = sorted
            .iter()
            .enumerate()
            .map(|(disp, sym)| (sym.clone(), disp as u32))
            .collect();
        let inner = Arc::new(DescrInner {
            fields: sorted.into_boxed_slice(),
            offsets,
            handles: AtomicU32::new(1),
        });
        trace!(fields = inner.fields.len(), "created record descriptor");
        store.insert(key, inner.clone());
        RecordDescr { inner }
    }

    /// Field symbols in slot order.
    pub fn fields(&self) -> &[Sym] {
        &self.inner.fields
    }

    /// Slot offset for a field, if present.
    pub fn offset_of(&self, field: &Sym) -> Option<usize> {
        self.inner.offsets.get(field).map(|&disp| disp as usize)
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.inner.fields.len()
    }

    /// Whether the descriptor has no fields.
    pub fn is_empty(&self) -> bool {
        self.inner.fields.is_empty()
    }
}

impl Clone for RecordDescr {
    fn clone(&self) -> Self {
        self.inner.handles.fetch_add(1, Ordering::Relaxed);
        RecordDescr {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for RecordDescr {
    fn drop(&mut self) {
        if self.inner.handles.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }
        let mut store = store().lock();
        if self.inner.handles.load(Ordering::Relaxed) != 0 {
            return; // resurrected by a concurrent request
        }
        let key: Box<[u32]> = self.inner.fields.iter().map(Sym::id).collect();
        store.remove(&key);
        trace!(fields = self.inner.fields.len(), "dropped record descriptor");
    }
}

impl PartialEq for RecordDescr {
    /// Descriptor identity: deduplication makes pointer equality equivalent
    /// to field-set equality.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for RecordDescr {}

impl fmt::Debug for RecordDescr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.fields.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dedup_ignores_insertion_order() {
        let a = Sym::new("descr-a");
        let b = Sym::new("descr-b");
        let c = Sym::new("descr-c");
        let first = RecordDescr::new(&[a.clone(), b.clone(), c.clone()]);
        let second = RecordDescr::new(&[c.clone(), a.clone(), b.clone()]);
        assert_eq!(first, second);
        for field in first.fields() {
            assert_eq!(first.offset_of(field), second.offset_of(field));
        }
    }

    #[test]
    fn test_offsets_are_dense_and_stable() {
        let a = Sym::new("dense-a");
        let b = Sym::new("dense-b");
        let descr = RecordDescr::new(&[b.clone(), a.clone()]);
        assert_eq!(descr.len(), 2);
        let mut seen: Vec<usize> = descr
            .fields()
            .iter()
            .map(|f| descr.offset_of(f).unwrap())
            .collect();
        assert_eq!(seen, vec![0, 1]);
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn test_duplicate_fields_collapse() {
        let a = Sym::new("dup-a");
        let descr = RecordDescr::new(&[a.clone(), a.clone()]);
        assert_eq!(descr.len(), 1);
        assert_eq!(descr.offset_of(&a), Some(0));
    }

    #[test]
    fn test_distinct_sets_are_distinct() {
        let a = Sym::new("set-a");
        let b = Sym::new("set-b");
        let ab = RecordDescr::new(&[a.clone(), b.clone()]);
        let only_a = RecordDescr::new(&[a.clone()]);
        assert_ne!(ab, only_a);
        assert_eq!(only_a.offset_of(&b), None);
    }

    #[test]
    fn test_clone_shares_identity() {
        let a = Sym::new("clone-a");
        let descr = RecordDescr::new(&[a.clone()]);
        let copy = descr.clone();
        assert_eq!(descr, copy);
        drop(descr);
        // The clone keeps the cache entry alive.
        let again = RecordDescr::new(&[a]);
        assert_eq!(copy, again);
    }
}

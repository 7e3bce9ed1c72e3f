//! Reference-counted symbol interning.
//!
//! A [`Sym`] is a small integer handle into a process-wide table mapping
//! text to handles and back. At most one live handle id exists per text;
//! ids are recycled through a free list once their reference count reaches
//! zero, and exhausting the id space is a fatal condition (the table cannot
//! keep its uniqueness invariant past wraparound).
//!
//! # Concurrency
//!
//! Table mutation (intern, erase) happens under a single global lock.
//! Reference-count traffic on handles a caller already owns is lock-free:
//! counts live in a fixed slot array that is never reallocated, so clones
//! and drops touch only an atomic. A drop that brings the count to zero
//! re-checks the count *under the lock* before erasing, which closes the
//! race against a concurrent intern of the same text.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Error when the symbol id space is exhausted.
///
/// Surfaced only by the `try_` constructors; the plain constructors treat
/// exhaustion as fatal and terminate the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymSpaceExhausted {
    /// Number of ids the table was created with.
    pub capacity: usize,
}

impl fmt::Display for SymSpaceExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "symbol space exhausted ({} ids)", self.capacity)
    }
}

impl std::error::Error for SymSpaceExhausted {}

/// Locked portion of the symbol table.
struct TableInner {
    /// Text to id.
    dict: FxHashMap<Arc<str>, u32>,
    /// Id to text; `None` for ids currently on the free list.
    texts: Vec<Option<Arc<str>>>,
    /// Recycled ids.
    free: Vec<u32>,
    /// Display mask for anonymous symbols.
    mask: u16,
}

/// Symbol table with reference-counted entries.
///
/// The process-wide instance behind [`Sym`] is created on first use;
/// standalone tables exist for capacity-bounded harnesses.
pub struct SymTable {
    /// Per-id reference counts. Fixed allocation: the lock-free fast path
    /// indexes this array concurrently with table mutation, so it must
    /// never move.
    counts: Box<[AtomicU32]>,
    inner: Mutex<TableInner>,
}

impl SymTable {
    /// Id space of the process-wide table.
    pub const DEFAULT_CAPACITY: usize = 1 << 16;

    /// Create a table with a bounded id space.
    pub fn with_capacity(capacity: usize) -> Self {
        let counts = (0..capacity).map(|_| AtomicU32::new(0)).collect();
        SymTable {
            counts,
            inner: Mutex::new(TableInner {
                dict: FxHashMap::default(),
                texts: Vec::new(),
                free: Vec::new(),
                mask: display_mask(),
            }),
        }
    }

    /// Intern `text`, returning its id with the reference count bumped.
    pub fn try_intern(&self, text: &str) -> Result<u32, SymSpaceExhausted> {
        let mut inner = self.inner.lock();
        if let Some(&id) = inner.dict.get(text) {
            self.counts[id as usize].fetch_add(1, Ordering::Relaxed);
            return Ok(id);
        }
        let id = self.try_alloc(&mut inner)?;
        let owned: Arc<str> = Arc::from(text);
        inner.dict.insert(owned.clone(), id);
        inner.texts[id as usize] = Some(owned);
        self.counts[id as usize].store(1, Ordering::Relaxed);
        trace!(id, text, "interned symbol");
        Ok(id)
    }

    /// Intern a fresh anonymous symbol with synthesized `` `N `` text.
    ///
    /// The displayed number is the id XORed with a per-table random mask;
    /// this keeps printed anonymous names unpredictable, nothing more.
    pub fn try_intern_anonymous(&self) -> Result<u32, SymSpaceExhausted> {
        let mut inner = self.inner.lock();
        let id = self.try_alloc(&mut inner)?;
        let text: Arc<str> = Arc::from(format!("`{}", id as u16 ^ inner.mask).as_str());
        inner.dict.insert(text.clone(), id);
        inner.texts[id as usize] = Some(text);
        self.counts[id as usize].store(1, Ordering::Relaxed);
        trace!(id, "interned anonymous symbol");
        Ok(id)
    }

    /// Allocate an id from the free list or by monotonic growth.
    fn try_alloc(&self, inner: &mut TableInner) -> Result<u32, SymSpaceExhausted> {
        if let Some(id) = inner.free.pop() {
            return Ok(id);
        }
        if inner.texts.len() < self.counts.len() {
            inner.texts.push(None);
            // texts.len() is bounded by counts.len(), which fits u32 ids
            return Ok((inner.texts.len() - 1) as u32);
        }
        Err(SymSpaceExhausted {
            capacity: self.counts.len(),
        })
    }

    /// Look up the id for `text`, bumping its count on a hit.
    pub fn lookup(&self, text: &str) -> Option<u32> {
        let inner = self.inner.lock();
        let id = *inner.dict.get(text)?;
        self.counts[id as usize].fetch_add(1, Ordering::Relaxed);
        Some(id)
    }

    /// Text for a live id.
    pub fn text(&self, id: u32) -> Arc<str> {
        let inner = self.inner.lock();
        match &inner.texts[id as usize] {
            Some(text) => text.clone(),
            None => unreachable!("text requested for a released symbol id"),
        }
    }

    /// Lock-free count bump for an id the caller already holds.
    #[inline]
    pub fn retain(&self, id: u32) {
        self.counts[id as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Drop one reference to `id`.
    ///
    /// The decrement is lock-free; only a decrement that reaches zero takes
    /// the lock, and it re-checks the count there before erasing so that a
    /// concurrent intern of the same text wins cleanly.
    pub fn release(&self, id: u32) {
        if self.counts[id as usize].fetch_sub(1, Ordering::Release) != 1 {
            return;
        }
        let mut inner = self.inner.lock();
        if self.counts[id as usize].load(Ordering::Relaxed) != 0 {
            return; // resurrected by a concurrent intern
        }
        if let Some(text) = inner.texts[id as usize].take() {
            inner.dict.remove(text.as_ref());
            inner.free.push(id);
            trace!(id, text = text.as_ref(), "released symbol");
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.lock().dict.len()
    }

    /// Whether the table has no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide table backing [`Sym`].
fn global() -> &'static SymTable {
    static GLOBAL: OnceLock<SymTable> = OnceLock::new();
    GLOBAL.get_or_init(|| SymTable::with_capacity(SymTable::DEFAULT_CAPACITY))
}

/// Random display mask for anonymous symbols, seeded per table.
fn display_mask() -> u16 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u32(0x9e37_79b9);
    (hasher.finish() & 0xFFFF) as u16
}

/// Exit on symbol-space exhaustion. No unwind: the interning invariant
/// cannot be preserved past this point.
fn fatal(err: &SymSpaceExhausted) -> ! {
    eprintln!("rill: fatal error: {err}");
    std::process::exit(1)
}

/// Reference-counted handle to an interned symbol.
///
/// Equality, ordering, and hashing are by id; two handles for the same text
/// are always equal. Cloning bumps the reference count, dropping the last
/// handle erases the entry and recycles the id.
pub struct Sym {
    id: u32,
}

impl Sym {
    /// Intern `text` in the process-wide table.
    ///
    /// Terminates the process on id-space exhaustion; use [`Sym::try_new`]
    /// where a recoverable error is wanted.
    pub fn new(text: &str) -> Sym {
        match Sym::try_new(text) {
            Ok(sym) => sym,
            Err(err) => fatal(&err),
        }
    }

    /// Fallible twin of [`Sym::new`].
    pub fn try_new(text: &str) -> Result<Sym, SymSpaceExhausted> {
        global().try_intern(text).map(|id| Sym { id })
    }

    /// Intern a fresh anonymous symbol.
    ///
    /// Terminates the process on id-space exhaustion.
    pub fn anonymous() -> Sym {
        match global().try_intern_anonymous() {
            Ok(id) => Sym { id },
            Err(err) => fatal(&err),
        }
    }

    /// Handle for already-interned text, if any.
    pub fn lookup(text: &str) -> Option<Sym> {
        global().lookup(text).map(|id| Sym { id })
    }

    /// The symbol's text.
    pub fn text(&self) -> Arc<str> {
        global().text(self.id)
    }

    /// Raw table id. Stable only while at least one handle is live.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Clone for Sym {
    fn clone(&self) -> Self {
        global().retain(self.id);
        Sym { id: self.id }
    }
}

impl Drop for Sym {
    fn drop(&mut self) {
        global().release(self.id);
    }
}

impl PartialEq for Sym {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sym {}

impl PartialOrd for Sym {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sym {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for Sym {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

impl fmt::Debug for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sym({})", self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_intern_idempotent() {
        let a = Sym::new("intern-idempotent");
        let b = Sym::new("intern-idempotent");
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.text().as_ref(), "intern-idempotent");
    }

    #[test]
    fn test_lookup_live_and_dead() {
        let a = Sym::new("lookup-live");
        assert_eq!(Sym::lookup("lookup-live").as_ref(), Some(&a));
        drop(a);
        // Last handle (plus the lookup's) released: text is gone.
        assert!(Sym::lookup("lookup-live").is_none());
    }

    #[test]
    fn test_anonymous_is_fresh_and_printable() {
        let a = Sym::anonymous();
        let b = Sym::anonymous();
        assert_ne!(a, b);
        assert!(a.text().starts_with('`'));
        assert!(b.text().starts_with('`'));
    }

    #[test]
    fn test_id_reuse_reflects_new_text() {
        let table = SymTable::with_capacity(4);
        let id = table.try_intern("first").unwrap();
        table.release(id);
        let reused = table.try_intern("second").unwrap();
        assert_eq!(id, reused, "free list recycles the released id");
        assert_eq!(table.text(reused).as_ref(), "second");
    }

    #[test]
    fn test_release_only_at_zero() {
        let table = SymTable::with_capacity(4);
        let id = table.try_intern("held").unwrap();
        table.retain(id);
        table.release(id);
        assert_eq!(table.text(id).as_ref(), "held", "one reference remains");
        table.release(id);
        assert!(table.is_empty());
    }

    #[test]
    fn test_exhaustion_is_deterministic() {
        let table = SymTable::with_capacity(2);
        table.try_intern("a").unwrap();
        table.try_intern("b").unwrap();
        let err = table.try_intern("c").unwrap_err();
        assert_eq!(err, SymSpaceExhausted { capacity: 2 });
        // Interning existing text is still fine at capacity.
        table.try_intern("a").unwrap();
        // Releasing frees an id for reuse.
        table.release(1);
        let id = table.try_intern("c").unwrap();
        assert_eq!(table.text(id).as_ref(), "c");
    }

    #[test]
    fn test_anonymous_exhaustion() {
        let table = SymTable::with_capacity(1);
        table.try_intern_anonymous().unwrap();
        assert!(table.try_intern_anonymous().is_err());
    }

    #[test]
    fn test_concurrent_clone_drop() {
        let sym = Sym::new("concurrent-clone-drop");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sym = sym.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let copy = sym.clone();
                        assert_eq!(copy, sym);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sym.text().as_ref(), "concurrent-clone-drop");
    }
}

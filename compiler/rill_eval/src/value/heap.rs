//! Reference-counted heap wrapper.
//!
//! All heap-backed value payloads go through [`Heap<T>`]; the constructor is
//! crate-private so external code builds heap values only through the
//! factory methods on `Value`. Cloning a `Heap` bumps a reference count,
//! dropping the last handle runs the payload's destructor.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Crate-constructed shared heap allocation.
#[repr(transparent)]
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    /// Allocate a payload. Crate-private: use the `Value` factories.
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized> Heap<T> {
    pub(crate) fn from_arc(arc: Arc<T>) -> Self {
        Heap(arc)
    }

    /// Whether two handles share one allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Heap<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Heap<T> {
    /// Mutable access, cloning the payload first if it is shared.
    pub(crate) fn make_mut(&mut self) -> &mut T {
        Arc::make_mut(&mut self.0)
    }
}

impl Heap<str> {
    pub(crate) fn from_str(value: &str) -> Self {
        Heap(Arc::from(value))
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(self.0.clone())
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

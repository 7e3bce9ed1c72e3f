//! Source locations.
//!
//! A [`Loc`] attaches an origin label (file name or REPL tag) and a 1-based,
//! half-open `(line, column)` span to program text. Forms carry them through
//! compilation; applied code nodes keep them for trace construction.

use std::fmt;
use std::sync::Arc;

/// Origin-labelled source span.
///
/// `start` and `end` are 1-based `(line, column)` pairs; `end` is exclusive
/// in its column. A `Loc` without an origin renders as an unknown location
/// and is skipped by trace collection.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Loc {
    /// Origin label, shared across all locations from the same source.
    pub origin: Option<Arc<str>>,
    /// Inclusive start position, 1-based.
    pub start: (u32, u32),
    /// Exclusive end position, 1-based.
    pub end: (u32, u32),
}

impl Loc {
    /// Location for generated code with no source counterpart.
    pub const DUMMY: Loc = Loc {
        origin: None,
        start: (0, 0),
        end: (0, 0),
    };

    /// Create a located span within the given origin.
    pub fn new(origin: Arc<str>, start: (u32, u32), end: (u32, u32)) -> Self {
        Loc {
            origin: Some(origin),
            start,
            end,
        }
    }

    /// Whether this location points at real source text.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.origin.is_some()
    }

    /// Merge two spans from the same origin into one covering both.
    #[must_use]
    pub fn merge(&self, other: &Loc) -> Loc {
        Loc {
            origin: self.origin.clone().or_else(|| other.origin.clone()),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            None => write!(f, "<unknown location>"),
            // The end column is exclusive; report the last covered column.
            Some(origin) => write!(
                f,
                "({}) {}:{}-{}:{}",
                origin,
                self.start.0,
                self.start.1,
                self.end.0,
                self.end.1.saturating_sub(1)
            ),
        }
    }
}

impl fmt::Debug for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

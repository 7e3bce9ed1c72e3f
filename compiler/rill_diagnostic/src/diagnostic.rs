//! Location-tagged compile diagnostics.
//!
//! Factory constructors cover the compile failures the core can raise;
//! each produces a [`Diagnostic`] already positioned at the offending form.

use rill_ir::Loc;
use std::fmt;

/// Result of a compilation step.
pub type CompileResult<T> = Result<T, Diagnostic>;

/// A compile-time failure with its source location.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub loc: Loc,
}

impl Diagnostic {
    /// Create a diagnostic at the given location.
    pub fn new(message: impl Into<String>, loc: Loc) -> Self {
        Diagnostic {
            message: message.into(),
            loc,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Error: {}", self.loc, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Malformed source form.
pub fn invalid_form(loc: &Loc) -> Diagnostic {
    Diagnostic::new("invalid form", loc.clone())
}

/// A symbol in keyword position with no binding in scope.
pub fn unbound_keyword(loc: &Loc) -> Diagnostic {
    Diagnostic::new("unbound keyword (nested in this context)", loc.clone())
}

/// An expression used where an R-value is required.
pub fn not_rvalue(loc: &Loc) -> Diagnostic {
    Diagnostic::new(
        "not an R-value expression (nested in this context)",
        loc.clone(),
    )
}

/// An expression used where an L-value is required.
pub fn not_lvalue(loc: &Loc) -> Diagnostic {
    Diagnostic::new(
        "not an L-value expression (nested in this context)",
        loc.clone(),
    )
}

/// A form exceeding a fixed implementation limit.
pub fn limit_exceeded(loc: &Loc) -> Diagnostic {
    Diagnostic::new("limit exceeded", loc.clone())
}

/// A literal of the wrong type in a required position.
pub fn type_mismatch(loc: &Loc) -> Diagnostic {
    Diagnostic::new("type mismatch", loc.clone())
}

//! Uncaught-signal reporting.
//!
//! Renders a signal and its accumulated invocation trace to a writer, in
//! the shape a post-mortem reader expects: the signal tag, then the
//! oldest-first backtrace (or an explicit empty marker). Compile errors
//! surface through the same path and print their message alone.
//!
//! Process-exit policy belongs to the embedding binary; this module only
//! writes.

use crate::context::SigTrace;
use crate::errors::Signal;
use crate::ops::known;
use crate::value::Value;
use std::io::{self, Write};

/// Write an uncaught signal and its backtrace.
pub fn report_uncaught(
    signal: &Signal,
    trace: &SigTrace,
    out: &mut impl Write,
) -> io::Result<()> {
    if signal.tag == known().compile_error {
        if let Value::Str(message) = &signal.payload {
            return writeln!(out, "{message}");
        }
    }
    writeln!(out, "Uncaught signal {}", signal.tag)?;
    if trace.is_empty() {
        return writeln!(out, "*** invocation backtrace empty ***");
    }
    writeln!(out, "====== invocation backtrace ======")?;
    for (index, (loc, phase)) in trace.frames().iter().enumerate() {
        writeln!(out, "{index:02} at {loc} {}", phase.as_str())?;
    }
    if trace.is_truncated() {
        writeln!(out, "==== more invocations omitted ====")
    } else {
        writeln!(out, "======== end of backtrace ========")
    }
}

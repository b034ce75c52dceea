//! The "log buffer" of spec.md §4.7/§7: diagnostics raised while compiling a
//! template accumulate here, keyed by severity, for the caller to inspect
//! after `parse()` returns — independent of wherever the global [`log`]
//! facade's sink happens to be wired up. `Preprocessor::reset` clears it;
//! `Preprocessor::diagnostics` exposes it.
//!
//! Every diagnostic also goes through the `log` facade at the matching
//! level (`diskplan`'s own convention of `log::warn!`/`log::debug!` calls
//! threaded through `traversal.rs`), so a caller who only cares about the
//! global log sees the same messages a caller inspecting the buffer does.

use std::fmt;

/// Severity of one accumulated diagnostic (spec.md §7's "keyed by severity").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warn => "warn",
            Severity::Error => "error",
        })
    }
}

/// One accumulated diagnostic: an unknown directive, an unknown attribute
/// rewrite rule, or a logged caveat (e.g. `random` ordering's stand-in hash).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// The log buffer itself: an append-only list of [`Diagnostic`]s for one
/// `parse()` run, drained by `clear()` on `init`/`reset`.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics(Vec::new())
    }

    /// Record a warning: an unknown-but-recoverable situation (spec.md §7's
    /// "logged, element skipped" / "logged, attribute elided" cases).
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.0.push(Diagnostic {
            severity: Severity::Warn,
            message,
        });
    }

    /// Record an error-severity diagnostic. Unused by current directive
    /// semantics (spec.md §7 defines no fatal conditions) but kept alongside
    /// `warn` so the severity axis spec.md asks for isn't a single-variant
    /// enum in practice, only in the absence of a use case for it yet.
    #[allow(dead_code)]
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{message}");
        self.0.push(Diagnostic {
            severity: Severity::Error,
            message,
        });
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warn_accumulates_and_clears() {
        let mut log = Diagnostics::new();
        assert!(log.is_empty());
        log.warn("unknown directive `<s:bogus>`; skipping");
        log.warn("unknown attribute rewrite rule `s:bogus.x`; eliding");
        assert_eq!(log.as_slice().len(), 2);
        assert_eq!(log.as_slice()[0].severity, Severity::Warn);
        log.clear();
        assert!(log.is_empty());
    }
}

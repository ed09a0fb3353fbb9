//! Canonical status strings and their presentation glyphs.
//!
//! A record's canonical status prefers its completion result over its in-flight
//! state. `inProgress` has no static glyph: [`SymbolTable::symbolize`] returns
//! [`Symbol::Spinner`] and the caller substitutes the current spinner frame.

use std::collections::HashMap;

pub const IN_PROGRESS: &str = "inProgress";

/// Shown for any status the table does not know about.
pub const NEUTRAL_GLYPH: &str = "·";

/// Returns `result` when it is non-empty, otherwise `state`.
pub fn resolve<'a>(state: &'a str, result: &'a str) -> &'a str {
    if result.is_empty() {
        state
    } else {
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Glyph(&'static str),
    /// Time-varying; render with [`crate::tui::spinner::symbol_text`].
    Spinner,
}

/// `status → glyph` mapping. Passed by value into whatever needs it; there is no
/// process-wide table.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    glyphs: HashMap<&'static str, &'static str>,
    fallback: &'static str,
}

impl Default for SymbolTable {
    fn default() -> Self {
        let glyphs = HashMap::from([
            ("pending", "•"),
            ("succeeded", "✓"),
            ("failed", "✗"),
            ("skipped", ">"),
            ("noRuns", "■"),
            ("partiallySucceeded", "!"),
            ("succeededWithIssues", "!"),
            ("canceled", "-"),
            ("abandoned", "-"),
            ("notStarted", "•"),
        ]);
        Self {
            glyphs,
            fallback: NEUTRAL_GLYPH,
        }
    }
}

impl SymbolTable {
    /// Overrides (or adds) the glyph for one status.
    pub fn with(mut self, status: &'static str, glyph: &'static str) -> Self {
        self.glyphs.insert(status, glyph);
        self
    }

    pub fn symbolize(&self, status: &str) -> Symbol {
        if status == IN_PROGRESS {
            return Symbol::Spinner;
        }
        Symbol::Glyph(self.glyphs.get(status).copied().unwrap_or(self.fallback))
    }
}

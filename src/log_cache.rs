//! Per-record log retrieval with completion-aware memoization.
//!
//! A log is fetched again on every request until a fetch happens while its record is
//! `completed`; from then on the cached text is returned as-is. Partial logs of
//! running steps are replaced wholesale, never appended to.

use crate::app::RecordState;
use crate::error::FetchError;
use std::collections::HashMap;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCacheEntry {
    pub content: String,
    pub last_known_state: RecordState,
}

/// Formatted log text for one record, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSnapshot {
    pub record_id: String,
    pub content: String,
}

/// Owned by exactly one watch session; dropped (via [`LogCache::reset`]) when the run changes.
#[derive(Debug)]
pub struct LogCache {
    entries: HashMap<u64, LogCacheEntry>,
    max_lines: usize,
}

impl LogCache {
    pub fn new(max_lines: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_lines: max_lines.max(1),
        }
    }

    /// `true` when the next [`get_log`](Self::get_log) for `log_id` would hit the backend.
    pub fn needs_fetch(&self, log_id: u64) -> bool {
        self.entries
            .get(&log_id)
            .is_none_or(|e| e.last_known_state != RecordState::Completed)
    }

    /// Returns the formatted log for `log_id`, calling `fetch` only when the cached
    /// copy is missing or was captured before the record completed. A failed fetch
    /// leaves the previous entry untouched.
    pub async fn get_log<F, Fut>(
        &mut self,
        record_id: &str,
        log_id: u64,
        state: RecordState,
        fetch: F,
    ) -> Result<String, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, FetchError>>,
    {
        if !self.needs_fetch(log_id) {
            if let Some(entry) = self.entries.get(&log_id) {
                return Ok(entry.content.clone());
            }
        }

        tracing::debug!(record_id, log_id, state = state.as_str(), "fetching log");
        let raw = fetch().await?;
        let content = format_log(&raw, self.max_lines);
        self.entries.insert(
            log_id,
            LogCacheEntry {
                content: content.clone(),
                last_known_state: state,
            },
        );
        Ok(content)
    }

    pub fn get(&self, log_id: u64) -> Option<&LogCacheEntry> {
        self.entries.get(&log_id)
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drops a single leading timestamp token: everything up to the first space.
pub fn strip_timestamp(line: &str) -> &str {
    line.split_once(' ').map_or(line, |(_, rest)| rest)
}

/// Keeps the last `max_lines` lines, numbering them by their position in the full log
/// with a right-justified counter as wide as `max_lines` has digits.
pub fn format_log(raw: &str, max_lines: usize) -> String {
    let max_lines = max_lines.max(1);
    let width = max_lines.to_string().len();
    let lines: Vec<&str> = raw.lines().collect();
    let skip = lines.len().saturating_sub(max_lines);
    lines
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, line)| format!("{:>width$} {}", i + 1, strip_timestamp(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

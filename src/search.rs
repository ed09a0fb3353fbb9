//! Scrollable log text with incremental search.
//!
//! The original content is never touched: highlighting is derived at render time
//! from the match index. Matches are case-sensitive, non-overlapping,
//! leftmost-first substring hits per line, recomputed in full whenever the query or
//! the content changes.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Idle,
    /// Query is being typed; matches update live.
    Searching,
    /// Query locked; `n`/`N` navigate.
    Browsing,
}

/// Position of a match: line index and byte column within that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Plain,
    Match,
    CurrentMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub kind: SegmentKind,
}

pub type RenderedLine<'a> = Vec<Segment<'a>>;

#[derive(Debug, Clone, Default)]
pub struct SearchableViewport {
    content: String,
    line_count: usize,
    query: String,
    matches: Vec<Match>,
    current: usize,
    mode: SearchMode,
    top_line: usize,
    visible_height: usize,
}

impl SearchableViewport {
    pub fn new() -> Self {
        Self {
            visible_height: 1,
            ..Self::default()
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn top_line(&self) -> usize {
        self.top_line
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn current_match_index(&self) -> Option<usize> {
        (!self.matches.is_empty()).then_some(self.current)
    }

    pub fn current_match(&self) -> Option<Match> {
        self.matches.get(self.current).copied()
    }

    /// Replaces the content (partial logs are replaced, never appended). The current
    /// match index is kept, wrapped into the new match range.
    pub fn set_content(&mut self, text: String) {
        self.content = text;
        self.line_count = self.content.lines().count();
        self.recompute();
        self.top_line = self.top_line.min(self.max_top());
    }

    pub fn visible_height(&self) -> usize {
        self.visible_height
    }

    /// Empties the pane for a different record; the window size is kept.
    pub fn reset(&mut self) {
        *self = Self {
            visible_height: self.visible_height,
            ..Self::default()
        };
    }

    pub fn set_visible_height(&mut self, height: usize) {
        self.visible_height = height.max(1);
        self.top_line = self.top_line.min(self.max_top());
    }

    // --- Mode transitions ---

    /// Starts a search, or reopens the confirmed query for editing while browsing.
    pub fn begin_search(&mut self) {
        self.mode = SearchMode::Searching;
    }

    /// Locks the query and enables navigation. An empty query just leaves search.
    pub fn confirm(&mut self) {
        if self.mode != SearchMode::Searching {
            return;
        }
        if self.query.is_empty() {
            self.clear_search();
            return;
        }
        self.mode = SearchMode::Browsing;
        if let Some(m) = self.current_match() {
            self.scroll_into_view(m.line);
        }
    }

    /// Steps back one mode: `Browsing → Searching → Idle`.
    pub fn cancel(&mut self) {
        match self.mode {
            SearchMode::Browsing => self.mode = SearchMode::Searching,
            SearchMode::Searching => self.clear_search(),
            SearchMode::Idle => {}
        }
    }

    fn clear_search(&mut self) {
        self.mode = SearchMode::Idle;
        self.query.clear();
        self.matches.clear();
        self.current = 0;
    }

    // --- Query editing (only while Searching) ---

    pub fn set_query(&mut self, query: &str) -> bool {
        if self.mode != SearchMode::Searching {
            return false;
        }
        self.query = query.to_string();
        self.current = 0;
        self.recompute();
        true
    }

    pub fn push_char(&mut self, c: char) -> bool {
        let mut query = self.query.clone();
        query.push(c);
        self.set_query(&query)
    }

    pub fn pop_char(&mut self) -> bool {
        let mut query = self.query.clone();
        query.pop();
        self.set_query(&query)
    }

    fn recompute(&mut self) {
        self.matches.clear();
        if !self.query.is_empty() {
            for (line_idx, line) in self.content.lines().enumerate() {
                self.matches.extend(line.match_indices(self.query.as_str()).map(
                    |(column, _)| Match {
                        line: line_idx,
                        column,
                    },
                ));
            }
        }
        self.current = if self.matches.is_empty() {
            0
        } else {
            self.current % self.matches.len()
        };
    }

    // --- Navigation ---

    /// Advances to the next match with wraparound and scrolls it into view.
    pub fn next_match(&mut self) -> Option<Match> {
        if self.matches.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.matches.len();
        let m = self.matches[self.current];
        self.scroll_into_view(m.line);
        Some(m)
    }

    pub fn prev_match(&mut self) -> Option<Match> {
        if self.matches.is_empty() {
            return None;
        }
        let len = self.matches.len();
        self.current = (self.current + len - 1) % len;
        let m = self.matches[self.current];
        self.scroll_into_view(m.line);
        Some(m)
    }

    /// Moves one line at a time until `line` is inside
    /// `[top_line, top_line + visible_height - 1]`.
    fn scroll_into_view(&mut self, line: usize) {
        while line < self.top_line {
            self.scroll_up(1);
        }
        while line > (self.top_line + self.visible_height).saturating_sub(1) {
            let before = self.top_line;
            self.scroll_down(1);
            if self.top_line == before {
                break;
            }
        }
    }

    fn max_top(&self) -> usize {
        self.line_count.saturating_sub(self.visible_height)
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.top_line = self.top_line.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.top_line = (self.top_line + amount).min(self.max_top());
    }

    pub fn scroll_to_top(&mut self) {
        self.top_line = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.top_line = self.max_top();
    }

    // --- Rendering ---

    /// Every line with highlight segments. Plain content when not searching.
    pub fn render(&self) -> Vec<RenderedLine<'_>> {
        self.render_range(0, self.line_count)
    }

    /// The lines currently in the visible window.
    pub fn render_visible(&self) -> Vec<RenderedLine<'_>> {
        self.render_range(self.top_line, self.visible_height)
    }

    pub fn render_range(&self, start: usize, len: usize) -> Vec<RenderedLine<'_>> {
        let highlight = self.mode != SearchMode::Idle && !self.query.is_empty();
        let qlen = self.query.len();
        self.content
            .lines()
            .enumerate()
            .skip(start)
            .take(len)
            .map(|(line_idx, line)| {
                if !highlight {
                    return vec![Segment {
                        text: line,
                        kind: SegmentKind::Plain,
                    }];
                }
                let first = self.matches.partition_point(|m| m.line < line_idx);
                let last = self.matches.partition_point(|m| m.line <= line_idx);
                let mut segments = Vec::new();
                let mut pos = 0;
                for (idx, m) in self.matches[first..last].iter().enumerate() {
                    if m.column > pos {
                        segments.push(Segment {
                            text: &line[pos..m.column],
                            kind: SegmentKind::Plain,
                        });
                    }
                    let kind = if first + idx == self.current {
                        SegmentKind::CurrentMatch
                    } else {
                        SegmentKind::Match
                    };
                    segments.push(Segment {
                        text: &line[m.column..m.column + qlen],
                        kind,
                    });
                    pos = m.column + qlen;
                }
                if pos < line.len() || segments.is_empty() {
                    segments.push(Segment {
                        text: &line[pos..],
                        kind: SegmentKind::Plain,
                    });
                }
                segments
            })
            .collect()
    }
}

//! Application data model, presentation state, and cursor/selection handling.

use crate::input::Action;
use crate::order::{OrderedRecordView, ViewEntry};
use crate::refresh::{EngineCommand, RefreshUpdate};
use crate::search::SearchableViewport;
use crate::status;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

// ── Shared utility functions ──

/// Format a duration in seconds into a human-readable string (e.g. "2m 5s").
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Compute a human-readable duration from optional start/finish timestamps.
/// Returns an empty string if no start time is available.
pub fn compute_duration(
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
) -> String {
    match (started_at, finished_at) {
        (Some(start), Some(end)) => format_duration(end.signed_duration_since(start).num_seconds()),
        (Some(start), None) => {
            format_duration(Utc::now().signed_duration_since(start).num_seconds())
        }
        _ => String::new(),
    }
}

/// Unicode-width-aware truncation with ellipsis.
/// Returns `""` when `max_width` is 0.
pub fn truncate(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthStr;
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(s) <= max_width {
        s.to_string()
    } else {
        let mut result = String::new();
        let mut width = 0;
        for c in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if width + cw + 1 > max_width {
                result.push('\u{2026}');
                break;
            }
            result.push(c);
            width += cw;
        }
        result
    }
}

/// Task-level polling. Azure updates timeline records roughly every second.
pub const POLL_INTERVAL_TASK: u64 = 2;
/// Below 60 cols, durations and key hints don't fit.
pub const NARROW_WIDTH_THRESHOLD: u16 = 60;
/// Long enough to read; short enough to not permanently obscure the tree.
pub const ERROR_TTL_SECS: u64 = 10;
/// Default cap on retained log lines; also sets the line-number column width.
pub const LOG_MAX_LINES: usize = 100_000;

pub const UNNAMED_RECORD: &str = "(unnamed record)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Stage,
    Phase,
    Job,
    Task,
    Checkpoint,
    Other,
}

impl RecordType {
    /// Azure reports checkpoint flavours as `Checkpoint.Approval`, `Checkpoint.ExtendsCheck`, ...
    pub fn from_wire(s: &str) -> Self {
        match s {
            "Stage" => Self::Stage,
            "Phase" => Self::Phase,
            "Job" => Self::Job,
            "Task" => Self::Task,
            s if s.starts_with("Checkpoint") => Self::Checkpoint,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stage => "Stage",
            Self::Phase => "Phase",
            Self::Job => "Job",
            Self::Task => "Task",
            Self::Checkpoint => "Checkpoint",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordState {
    Pending,
    InProgress,
    Completed,
    Unknown,
}

impl RecordState {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "inProgress" => Self::InProgress,
            "completed" => Self::Completed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => status::IN_PROGRESS,
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordResult {
    Succeeded,
    SucceededWithIssues,
    PartiallySucceeded,
    Failed,
    Skipped,
    Canceled,
    Abandoned,
    Unknown,
}

impl RecordResult {
    /// `None` for an empty string; Azure also sends `null` for unfinished records.
    pub fn from_wire(s: &str) -> Option<Self> {
        let result = match s {
            "" => return None,
            "succeeded" => Self::Succeeded,
            "succeededWithIssues" => Self::SucceededWithIssues,
            "partiallySucceeded" => Self::PartiallySucceeded,
            "failed" => Self::Failed,
            "skipped" => Self::Skipped,
            "canceled" => Self::Canceled,
            "abandoned" => Self::Abandoned,
            _ => Self::Unknown,
        };
        Some(result)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::SucceededWithIssues => "succeededWithIssues",
            Self::PartiallySucceeded => "partiallySucceeded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Canceled => "canceled",
            Self::Abandoned => "abandoned",
            Self::Unknown => "unknown",
        }
    }
}

/// One node of a run's execution tree as the backend reported it at one point in time.
///
/// `record_type` and `name` are optional because the backend occasionally omits them;
/// such records still get displayed, just without a place in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRecord {
    pub id: String,
    pub parent_id: Option<String>,
    pub record_type: Option<RecordType>,
    pub name: Option<String>,
    /// 1-based sibling sequence number.
    pub order: Option<i64>,
    pub state: RecordState,
    pub result: Option<RecordResult>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    pub log_id: Option<u64>,
}

impl TimelineRecord {
    pub fn canonical_status(&self) -> &'static str {
        status::resolve(
            self.state.as_str(),
            self.result.map_or("", RecordResult::as_str),
        )
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED_RECORD)
    }

    pub fn is_well_formed(&self) -> bool {
        self.record_type.is_some() && self.name.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.state == RecordState::Completed
    }
}

/// Overall status of the watched run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub status: String,
    /// `None` while the run is unfinished (Azure's `"none"` is normalised to `None`).
    pub result: Option<String>,
    pub title: String,
    pub branch: String,
}

impl RunSummary {
    pub fn canonical_status(&self) -> &str {
        status::resolve(&self.status, self.result.as_deref().unwrap_or(""))
    }

    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tree,
    Log,
}

/// Immutable configuration set at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub org: Option<String>,
    pub project: Option<String>,
    pub interval: Duration,
    pub log_lines: usize,
    pub version_string: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            org: None,
            project: None,
            interval: Duration::from_secs(POLL_INTERVAL_TASK),
            log_lines: LOG_MAX_LINES,
            version_string: String::new(),
        }
    }
}

/// What `apply_update` did with an engine update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Produced under a session we no longer watch.
    Stale,
    Applied {
        /// The run crossed into `completed` with this update.
        run_completed: bool,
    },
}

pub struct AppState {
    pub config: AppConfig,

    // Watch session
    pub session: u64,
    pub run_id: Option<u64>,
    pub run: Option<RunSummary>,
    pub view: OrderedRecordView,

    // Tree navigation
    pub cursor: usize,
    pub selected_id: Option<String>,
    pub focus: Focus,

    // Log pane
    pub log: SearchableViewport,
    pub log_record_id: Option<String>,

    // Status indicators
    /// Muted: last tick failed transiently; previous data still shown.
    pub stalled: Option<String>,
    /// Terminal: the run could not be loaded and the watch stopped.
    pub load_error: Option<String>,
    pub error: Option<(String, Instant)>,
    pub last_update: Option<Instant>,

    // Transient UI
    pub spinner_frame: usize,
    pub should_quit: bool,
    pub desktop_notify: bool,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            session: 0,
            run_id: None,
            run: None,
            view: OrderedRecordView::default(),
            cursor: 0,
            selected_id: None,
            focus: Focus::Tree,
            log: SearchableViewport::new(),
            log_record_id: None,
            stalled: None,
            load_error: None,
            error: None,
            last_update: None,
            spinner_frame: 0,
            should_quit: false,
            desktop_notify: true,
        }
    }

    /// A new watch session began; everything derived from the previous run is dropped.
    pub fn begin_watch(&mut self, session: u64, run_id: u64) {
        self.session = session;
        if self.run_id != Some(run_id) {
            self.run = None;
            self.view = OrderedRecordView::default();
            self.cursor = 0;
            self.selected_id = None;
            self.log = SearchableViewport::new();
            self.log_record_id = None;
            self.focus = Focus::Tree;
        }
        self.run_id = Some(run_id);
        self.stalled = None;
        self.load_error = None;
    }

    pub fn apply_update(&mut self, update: RefreshUpdate) -> UpdateOutcome {
        if update.session != self.session || Some(update.run_id) != self.run_id {
            tracing::debug!(
                update_session = update.session,
                current_session = self.session,
                "discarding stale refresh"
            );
            return UpdateOutcome::Stale;
        }

        let was_completed = self.run.as_ref().is_some_and(RunSummary::is_completed);
        let run_completed = !was_completed && update.run.is_completed();
        self.run = Some(update.run);
        self.view = update.view;
        self.restore_cursor();

        if let Some(snapshot) = update.log {
            if self.selected_id.as_deref() == Some(snapshot.record_id.as_str()) {
                self.log.set_content(snapshot.content);
                self.log_record_id = Some(snapshot.record_id);
            }
        }

        self.stalled = None;
        self.load_error = None;
        self.last_update = Some(Instant::now());
        UpdateOutcome::Applied { run_completed }
    }

    pub fn mark_stalled(&mut self, session: u64, message: String) {
        if session == self.session {
            self.stalled = Some(message);
        }
    }

    pub fn mark_failed(&mut self, session: u64, message: String) {
        if session == self.session {
            self.stalled = None;
            self.load_error = Some(message);
        }
    }

    /// Keep the cursor on the same record across refreshes; clamp if it vanished.
    fn restore_cursor(&mut self) {
        if let Some(pos) = self
            .selected_id
            .as_deref()
            .and_then(|id| self.view.position(id))
        {
            self.cursor = pos;
            return;
        }
        if self.view.is_empty() {
            self.cursor = 0;
        } else if self.cursor >= self.view.len() {
            self.cursor = self.view.len() - 1;
        }
        self.selected_id = self.view.get(self.cursor).map(|e| e.record.id.clone());
    }

    pub fn selected_entry(&self) -> Option<&ViewEntry> {
        self.view.get(self.cursor)
    }

    /// Returns `true` when the selection changed (the engine needs to know).
    pub fn move_cursor_up(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            return self.sync_selection();
        }
        false
    }

    pub fn move_cursor_down(&mut self) -> bool {
        if !self.view.is_empty() && self.cursor < self.view.len() - 1 {
            self.cursor += 1;
            return self.sync_selection();
        }
        false
    }

    fn sync_selection(&mut self) -> bool {
        let id = self.view.get(self.cursor).map(|e| e.record.id.clone());
        if id == self.selected_id {
            return false;
        }
        self.selected_id = id;
        true
    }

    pub fn focus_log(&mut self) {
        if self.selected_entry().is_some() {
            self.focus = Focus::Log;
        }
    }

    pub fn focus_tree(&mut self) {
        self.focus = Focus::Tree;
    }

    /// Title for the log pane: the record whose log is currently shown.
    pub fn log_title(&self) -> String {
        self.log_record_id
            .as_deref()
            .and_then(|id| self.view.find(id))
            .map_or_else(|| "Log".to_string(), |e| e.record.display_name().to_string())
    }

    pub fn has_active_run(&self) -> bool {
        self.run.as_ref().is_some_and(|r| !r.is_completed())
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % crate::tui::spinner::FRAME_COUNT;
    }

    pub fn set_error(&mut self, msg: String) {
        self.error = Some((msg, Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, ts)) = &self.error {
            if ts.elapsed().as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }

    /// Applies one key action. Returns the command the refresh engine has to see,
    /// if the action affects what it fetches.
    pub fn apply_action(&mut self, action: Action) -> Option<EngineCommand> {
        let page = self.log.visible_height().max(1);
        match action {
            Action::Quit => {
                self.should_quit = true;
                return Some(EngineCommand::Cancel);
            }
            Action::DismissError => self.clear_error(),
            Action::MoveUp => {
                if self.move_cursor_up() {
                    return Some(self.selection_changed());
                }
            }
            Action::MoveDown => {
                if self.move_cursor_down() {
                    return Some(self.selection_changed());
                }
            }
            Action::FocusLog => self.focus_log(),
            Action::FocusTree => self.focus_tree(),
            Action::Refresh => return Some(EngineCommand::RefreshNow),
            Action::ScrollUp => self.log.scroll_up(1),
            Action::ScrollDown => self.log.scroll_down(1),
            Action::PageUp => self.log.scroll_up(page),
            Action::PageDown => self.log.scroll_down(page),
            Action::ScrollToTop => self.log.scroll_to_top(),
            Action::ScrollToBottom => self.log.scroll_to_bottom(),
            Action::BeginSearch => self.log.begin_search(),
            Action::SearchInput(c) => {
                self.log.push_char(c);
            }
            Action::SearchBackspace => {
                self.log.pop_char();
            }
            Action::ConfirmSearch => self.log.confirm(),
            Action::CancelSearch => self.log.cancel(),
            Action::NextMatch => {
                self.log.next_match();
            }
            Action::PrevMatch => {
                self.log.prev_match();
            }
            Action::None => {}
        }
        None
    }

    /// The pane shows another record's log from now on.
    fn selection_changed(&mut self) -> EngineCommand {
        self.log.reset();
        self.log_record_id = None;
        EngineCommand::SelectRecord(self.selected_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_cache::LogSnapshot;
    use crate::search::SearchMode;
    use crate::status::SymbolTable;

    fn record(id: &str, parent: Option<&str>, kind: RecordType, order: i64) -> TimelineRecord {
        TimelineRecord {
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
            record_type: Some(kind),
            name: Some(format!("{} {id}", kind.as_str())),
            order: Some(order),
            state: RecordState::Completed,
            result: Some(RecordResult::Succeeded),
            start_time: None,
            finish_time: None,
            log_id: Some(order as u64),
        }
    }

    fn view(ids: &[&str]) -> OrderedRecordView {
        let records = ids
            .iter()
            .enumerate()
            .map(|(i, id)| record(id, None, RecordType::Stage, i as i64 + 1))
            .collect();
        OrderedRecordView::build(records, &SymbolTable::default())
    }

    fn summary(status: &str, result: Option<&str>) -> RunSummary {
        RunSummary {
            status: status.to_string(),
            result: result.map(str::to_string),
            title: "CI 20240601.1".to_string(),
            branch: "refs/heads/main".to_string(),
        }
    }

    fn update(session: u64, ids: &[&str]) -> RefreshUpdate {
        RefreshUpdate {
            session,
            run_id: 7,
            view: view(ids),
            run: summary("inProgress", None),
            log: None,
        }
    }

    fn watching() -> AppState {
        let mut state = AppState::new(AppConfig::default());
        state.begin_watch(1, 7);
        state
    }

    #[test]
    fn format_duration_ranges() {
        assert_eq!(format_duration(-3), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3700), "1h 1m");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("hello world", 6), "hello\u{2026}");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("anything", 0), "");
    }

    #[test]
    fn record_type_checkpoint_flavours() {
        assert_eq!(RecordType::from_wire("Checkpoint"), RecordType::Checkpoint);
        assert_eq!(
            RecordType::from_wire("Checkpoint.Approval"),
            RecordType::Checkpoint
        );
        assert_eq!(RecordType::from_wire("Stage"), RecordType::Stage);
        assert_eq!(RecordType::from_wire("Whatever"), RecordType::Other);
    }

    #[test]
    fn record_canonical_status() {
        let mut r = record("a", None, RecordType::Task, 1);
        assert_eq!(r.canonical_status(), "succeeded");
        r.state = RecordState::InProgress;
        r.result = None;
        assert_eq!(r.canonical_status(), "inProgress");
    }

    #[test]
    fn run_summary_canonical_status() {
        assert_eq!(summary("inProgress", None).canonical_status(), "inProgress");
        assert_eq!(
            summary("completed", Some("failed")).canonical_status(),
            "failed"
        );
    }

    #[test]
    fn update_from_current_session_applies() {
        let mut state = watching();
        let outcome = state.apply_update(update(1, &["a", "b"]));
        assert_eq!(outcome, UpdateOutcome::Applied { run_completed: false });
        assert_eq!(state.view.len(), 2);
        assert_eq!(state.selected_id.as_deref(), Some("a"));
    }

    #[test]
    fn update_from_old_session_is_discarded() {
        let mut state = watching();
        state.apply_update(update(1, &["a"]));
        state.begin_watch(2, 8);
        let outcome = state.apply_update(update(1, &["x", "y", "z"]));
        assert_eq!(outcome, UpdateOutcome::Stale);
        assert!(state.view.is_empty());
    }

    #[test]
    fn cursor_follows_selected_record_across_refreshes() {
        let mut state = watching();
        state.apply_update(update(1, &["a", "b", "c"]));
        state.move_cursor_down();
        state.move_cursor_down();
        assert_eq!(state.selected_id.as_deref(), Some("c"));
        // "c" moves to the front
        state.apply_update(update(1, &["c", "a", "b"]));
        assert_eq!(state.cursor, 0);
        assert_eq!(state.selected_id.as_deref(), Some("c"));
    }

    #[test]
    fn cursor_clamped_when_view_shrinks() {
        let mut state = watching();
        state.apply_update(update(1, &["a", "b", "c"]));
        state.cursor = 2;
        state.selected_id = Some("gone".to_string());
        state.apply_update(update(1, &["a"]));
        assert_eq!(state.cursor, 0);
        assert_eq!(state.selected_id.as_deref(), Some("a"));
    }

    #[test]
    fn cursor_movement_reports_selection_change() {
        let mut state = watching();
        state.apply_update(update(1, &["a", "b"]));
        assert!(!state.move_cursor_up());
        assert!(state.move_cursor_down());
        assert!(!state.move_cursor_down());
        assert!(state.move_cursor_up());
    }

    #[test]
    fn cursor_on_empty_view_stays_put() {
        let mut state = watching();
        assert!(!state.move_cursor_down());
        assert!(!state.move_cursor_up());
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn log_snapshot_for_selected_record_replaces_content() {
        let mut state = watching();
        state.apply_update(update(1, &["a", "b"]));
        let mut u = update(1, &["a", "b"]);
        u.log = Some(LogSnapshot {
            record_id: "a".to_string(),
            content: "first".to_string(),
        });
        state.apply_update(u);
        assert_eq!(state.log.content(), "first");

        let mut u = update(1, &["a", "b"]);
        u.log = Some(LogSnapshot {
            record_id: "a".to_string(),
            content: "second".to_string(),
        });
        state.apply_update(u);
        assert_eq!(state.log.content(), "second");
    }

    #[test]
    fn log_snapshot_for_other_record_is_ignored() {
        let mut state = watching();
        state.apply_update(update(1, &["a", "b"]));
        let mut u = update(1, &["a", "b"]);
        u.log = Some(LogSnapshot {
            record_id: "b".to_string(),
            content: "not mine".to_string(),
        });
        state.apply_update(u);
        assert_eq!(state.log.content(), "");
    }

    #[test]
    fn run_completion_reported_once() {
        let mut state = watching();
        state.apply_update(update(1, &["a"]));
        let mut done = update(1, &["a"]);
        done.run = summary("completed", Some("succeeded"));
        assert_eq!(
            state.apply_update(done.clone()),
            UpdateOutcome::Applied { run_completed: true }
        );
        assert_eq!(
            state.apply_update(done),
            UpdateOutcome::Applied { run_completed: false }
        );
    }

    #[test]
    fn stalled_and_failed_only_for_current_session() {
        let mut state = watching();
        state.mark_stalled(99, "blip".to_string());
        assert!(state.stalled.is_none());
        state.mark_stalled(1, "blip".to_string());
        assert_eq!(state.stalled.as_deref(), Some("blip"));
        state.mark_failed(1, "run 7 not found".to_string());
        assert!(state.stalled.is_none());
        assert_eq!(state.load_error.as_deref(), Some("run 7 not found"));
    }

    #[test]
    fn successful_update_clears_stalled() {
        let mut state = watching();
        state.mark_stalled(1, "blip".to_string());
        state.apply_update(update(1, &["a"]));
        assert!(state.stalled.is_none());
    }

    #[test]
    fn begin_watch_on_new_run_resets_view() {
        let mut state = watching();
        state.apply_update(update(1, &["a", "b"]));
        state.begin_watch(2, 9);
        assert!(state.view.is_empty());
        assert!(state.selected_id.is_none());
        assert_eq!(state.run_id, Some(9));
    }

    #[test]
    fn focus_log_requires_selection() {
        let mut state = watching();
        state.focus_log();
        assert_eq!(state.focus, Focus::Tree);
        state.apply_update(update(1, &["a"]));
        state.focus_log();
        assert_eq!(state.focus, Focus::Log);
        state.focus_tree();
        assert_eq!(state.focus, Focus::Tree);
    }

    #[test]
    fn error_lifecycle() {
        let mut state = watching();
        assert!(state.error_message().is_none());
        state.set_error("something broke".to_string());
        assert_eq!(state.error_message(), Some("something broke"));
        state.clear_error();
        assert!(state.error_message().is_none());
    }

    #[test]
    fn moving_the_cursor_selects_for_the_engine() {
        let mut state = watching();
        state.apply_update(update(1, &["a", "b"]));
        assert_eq!(
            state.apply_action(Action::MoveDown),
            Some(EngineCommand::SelectRecord(Some("b".to_string())))
        );
        assert_eq!(state.apply_action(Action::MoveDown), None);
    }

    #[test]
    fn selection_change_clears_log_pane() {
        let mut state = watching();
        state.apply_update(update(1, &["a", "b"]));
        let mut u = update(1, &["a", "b"]);
        u.log = Some(LogSnapshot {
            record_id: "a".to_string(),
            content: "line".to_string(),
        });
        state.apply_update(u);
        state.apply_action(Action::MoveDown);
        assert_eq!(state.log.content(), "");
        assert!(state.log_record_id.is_none());
    }

    #[test]
    fn search_actions_drive_the_viewport() {
        let mut state = watching();
        state.log.set_content("error\nok\nerror".to_string());
        state.apply_action(Action::BeginSearch);
        for c in "error".chars() {
            state.apply_action(Action::SearchInput(c));
        }
        state.apply_action(Action::ConfirmSearch);
        assert_eq!(state.log.matches().len(), 2);
        state.apply_action(Action::NextMatch);
        assert_eq!(state.log.current_match_index(), Some(1));
        state.apply_action(Action::PrevMatch);
        assert_eq!(state.log.current_match_index(), Some(0));
        state.apply_action(Action::CancelSearch);
        state.apply_action(Action::CancelSearch);
        assert_eq!(state.log.query(), "");
    }

    #[test]
    fn slash_key_while_browsing_edits_query() {
        use crate::input::{map_key, InputContext};
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

        let mut state = watching();
        state.focus = Focus::Log;
        state.log.set_content("error\nok\nerror".to_string());
        state.log.begin_search();
        state.log.set_query("error");
        state.log.confirm();

        let ctx = InputContext {
            has_error: false,
            focus: state.focus,
            search_mode: state.log.mode(),
        };
        let action = map_key(KeyEvent::new(KeyCode::Char('/'), KeyModifiers::NONE), &ctx);
        state.apply_action(action);
        assert_eq!(state.log.mode(), SearchMode::Searching);
        assert_eq!(state.log.query(), "error");
    }

    #[test]
    fn quit_and_refresh_commands() {
        let mut state = watching();
        assert_eq!(
            state.apply_action(Action::Refresh),
            Some(EngineCommand::RefreshNow)
        );
        assert_eq!(state.apply_action(Action::Quit), Some(EngineCommand::Cancel));
        assert!(state.should_quit);
    }

    #[test]
    fn spinner_wraps() {
        let mut state = watching();
        for _ in 0..crate::tui::spinner::FRAME_COUNT {
            state.advance_spinner();
        }
        assert_eq!(state.spinner_frame, 0);
    }
}

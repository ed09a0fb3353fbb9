use crate::app::Focus;
use crate::search::SearchMode;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    MoveUp,
    MoveDown,
    FocusLog,
    FocusTree,
    Refresh,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    BeginSearch,
    SearchInput(char),
    SearchBackspace,
    ConfirmSearch,
    /// Steps the search mode back one level.
    CancelSearch,
    NextMatch,
    PrevMatch,
    None,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Copy)]
pub struct InputContext {
    pub has_error: bool,
    pub focus: Focus,
    pub search_mode: SearchMode,
}

impl Default for InputContext {
    fn default() -> Self {
        Self {
            has_error: false,
            focus: Focus::Tree,
            search_mode: SearchMode::Idle,
        }
    }
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    match ctx.focus {
        Focus::Tree => map_tree_key(key, ctx),
        Focus::Log => match ctx.search_mode {
            SearchMode::Searching => map_query_key(key),
            SearchMode::Idle | SearchMode::Browsing => map_log_key(key, ctx),
        },
    }
}

fn map_tree_key(key: KeyEvent, ctx: &InputContext) -> Action {
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_error {
                Action::DismissError
            } else {
                Action::Quit
            }
        }
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Enter | KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => Action::FocusLog,
        KeyCode::Char('r') => Action::Refresh,
        _ => Action::None,
    }
}

fn map_log_key(key: KeyEvent, ctx: &InputContext) -> Action {
    let browsing = ctx.search_mode == SearchMode::Browsing;
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
        KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::Char('g') => Action::ScrollToTop,
        KeyCode::Char('G') => Action::ScrollToBottom,
        KeyCode::Char('/') => Action::BeginSearch,
        KeyCode::Char('n') if browsing => Action::NextMatch,
        KeyCode::Char('N') if browsing => Action::PrevMatch,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Tab | KeyCode::Left | KeyCode::Char('h') => Action::FocusTree,
        KeyCode::Esc if browsing => Action::CancelSearch,
        KeyCode::Esc => Action::FocusTree,
        _ => Action::None,
    }
}

fn map_query_key(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => Action::ConfirmSearch,
        KeyCode::Esc => Action::CancelSearch,
        KeyCode::Backspace => Action::SearchBackspace,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Action::SearchInput(c)
        }
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn press_with(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        }
    }

    fn ctx() -> InputContext {
        InputContext::default()
    }

    fn ctx_error() -> InputContext {
        InputContext { has_error: true, ..Default::default() }
    }

    fn ctx_log(search_mode: SearchMode) -> InputContext {
        InputContext { focus: Focus::Log, search_mode, ..Default::default() }
    }

    #[test]
    fn quit_on_q() {
        assert_eq!(map_key(press(KeyCode::Char('q')), &ctx()), Action::Quit);
    }

    #[test]
    fn esc_quits_without_error() {
        assert_eq!(map_key(press(KeyCode::Esc), &ctx()), Action::Quit);
    }

    #[test]
    fn esc_dismisses_error_when_present() {
        assert_eq!(map_key(press(KeyCode::Esc), &ctx_error()), Action::DismissError);
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let key = press_with(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(key, &ctx()), Action::Quit);
        assert_eq!(map_key(key, &ctx_log(SearchMode::Searching)), Action::Quit);
    }

    #[test]
    fn tree_navigation() {
        assert_eq!(map_key(press(KeyCode::Up), &ctx()), Action::MoveUp);
        assert_eq!(map_key(press(KeyCode::Char('k')), &ctx()), Action::MoveUp);
        assert_eq!(map_key(press(KeyCode::Down), &ctx()), Action::MoveDown);
        assert_eq!(map_key(press(KeyCode::Char('j')), &ctx()), Action::MoveDown);
    }

    #[test]
    fn tree_focus_log_keys() {
        for code in [KeyCode::Enter, KeyCode::Tab, KeyCode::Char('l')] {
            assert_eq!(map_key(press(code), &ctx()), Action::FocusLog);
        }
    }

    #[test]
    fn refresh_r() {
        assert_eq!(map_key(press(KeyCode::Char('r')), &ctx()), Action::Refresh);
    }

    #[test]
    fn log_scrolling() {
        let c = ctx_log(SearchMode::Idle);
        assert_eq!(map_key(press(KeyCode::Char('j')), &c), Action::ScrollDown);
        assert_eq!(map_key(press(KeyCode::Char('k')), &c), Action::ScrollUp);
        assert_eq!(map_key(press(KeyCode::PageDown), &c), Action::PageDown);
        assert_eq!(map_key(press(KeyCode::PageUp), &c), Action::PageUp);
        assert_eq!(map_key(press(KeyCode::Char('g')), &c), Action::ScrollToTop);
        assert_eq!(map_key(press(KeyCode::Char('G')), &c), Action::ScrollToBottom);
    }

    #[test]
    fn slash_begins_search() {
        assert_eq!(
            map_key(press(KeyCode::Char('/')), &ctx_log(SearchMode::Idle)),
            Action::BeginSearch
        );
    }

    #[test]
    fn n_only_navigates_while_browsing() {
        assert_eq!(
            map_key(press(KeyCode::Char('n')), &ctx_log(SearchMode::Idle)),
            Action::None
        );
        assert_eq!(
            map_key(press(KeyCode::Char('n')), &ctx_log(SearchMode::Browsing)),
            Action::NextMatch
        );
        assert_eq!(
            map_key(press(KeyCode::Char('N')), &ctx_log(SearchMode::Browsing)),
            Action::PrevMatch
        );
    }

    #[test]
    fn searching_captures_printable_keys() {
        let c = ctx_log(SearchMode::Searching);
        assert_eq!(map_key(press(KeyCode::Char('q')), &c), Action::SearchInput('q'));
        assert_eq!(map_key(press(KeyCode::Char('n')), &c), Action::SearchInput('n'));
        assert_eq!(map_key(press(KeyCode::Char('/')), &c), Action::SearchInput('/'));
        assert_eq!(map_key(press(KeyCode::Backspace), &c), Action::SearchBackspace);
        assert_eq!(map_key(press(KeyCode::Enter), &c), Action::ConfirmSearch);
        assert_eq!(map_key(press(KeyCode::Esc), &c), Action::CancelSearch);
    }

    #[test]
    fn esc_in_log_steps_back() {
        assert_eq!(
            map_key(press(KeyCode::Esc), &ctx_log(SearchMode::Browsing)),
            Action::CancelSearch
        );
        assert_eq!(
            map_key(press(KeyCode::Esc), &ctx_log(SearchMode::Idle)),
            Action::FocusTree
        );
    }

    #[test]
    fn tab_returns_to_tree() {
        assert_eq!(
            map_key(press(KeyCode::Tab), &ctx_log(SearchMode::Idle)),
            Action::FocusTree
        );
        assert_eq!(
            map_key(press(KeyCode::Char('h')), &ctx_log(SearchMode::Browsing)),
            Action::FocusTree
        );
    }

    #[test]
    fn release_events_ignored() {
        assert_eq!(map_key(release(KeyCode::Char('q')), &ctx()), Action::None);
    }

    #[test]
    fn unknown_key_returns_none() {
        assert_eq!(map_key(press(KeyCode::Char('z')), &ctx()), Action::None);
    }
}

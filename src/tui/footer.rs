use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, Focus};
use crate::search::SearchMode;

pub fn hints(state: &AppState, narrow: bool) -> &'static [(&'static str, &'static str)] {
    match (state.focus, state.log.mode()) {
        (Focus::Tree, _) if narrow => &[
            ("j/k", "nav"),
            ("⏎", "log"),
            ("r", "refresh"),
            ("q", "quit"),
        ],
        (Focus::Tree, _) => &[
            ("↑↓/jk", "navigate"),
            ("⏎/Tab/l", "view log"),
            ("r", "refresh"),
            ("q", "quit"),
        ],
        (Focus::Log, SearchMode::Searching) => &[
            ("⏎", "confirm"),
            ("Esc", "cancel"),
        ],
        (Focus::Log, SearchMode::Browsing) => &[
            ("n/N", "next/prev"),
            ("/", "edit"),
            ("Esc", "back"),
            ("Tab", "tree"),
        ],
        (Focus::Log, SearchMode::Idle) if narrow => &[
            ("j/k", "scroll"),
            ("/", "search"),
            ("Tab", "tree"),
        ],
        (Focus::Log, SearchMode::Idle) => &[
            ("j/k", "scroll"),
            ("g/G", "top/bottom"),
            ("/", "search"),
            ("Tab/Esc", "tree"),
            ("q", "quit"),
        ],
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;

    let line = if let Some(err) = &state.load_error {
        Line::from(vec![
            Span::styled("✗ ", Style::default().fg(Color::Red)),
            Span::styled(err.clone(), Style::default().fg(Color::Red)),
        ])
    } else {
        let mut spans: Vec<Span> = Vec::new();
        for (i, (key, desc)) in hints(state, narrow).iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
            spans.push(Span::styled(
                format!(" {desc}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}

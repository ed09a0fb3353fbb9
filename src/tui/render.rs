use crate::app::{AppState, NARROW_WIDTH_THRESHOLD};
use crate::tui::{footer, header, log_view, tree};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

/// Screen regions: header, timeline tree, log pane, footer.
pub struct Panes {
    pub header: Rect,
    pub tree: Rect,
    pub log: Rect,
    pub footer: Rect,
}

/// Side by side on wide terminals, stacked on narrow ones.
pub fn layout(area: Rect) -> Panes {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(1),    // body
            Constraint::Length(2), // footer
        ])
        .split(area);

    let direction = if area.width < NARROW_WIDTH_THRESHOLD {
        Direction::Vertical
    } else {
        Direction::Horizontal
    };
    let body = Layout::default()
        .direction(direction)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    Panes {
        header: rows[0],
        tree: body[0],
        log: body[1],
        footer: rows[2],
    }
}

/// Rows of log text visible for a terminal of `area`; used to size the viewport.
pub fn log_visible_height(area: Rect) -> usize {
    log_view::content_height(layout(area).log)
}

pub fn render(f: &mut Frame, state: &AppState) {
    let panes = layout(f.area());

    header::render(f, panes.header, state);
    tree::render(f, panes.tree, state);
    log_view::render(f, panes.log, state);
    footer::render(f, panes.footer, state);

    // Error overlay
    if let Some(err) = state.error_message() {
        let area = f.area();
        if area.height > 6 && area.width >= 4 {
            let err_area = Rect {
                x: area.x + 1,
                y: area.y + area.height.saturating_sub(5),
                width: area.width.saturating_sub(2),
                height: 3,
            };
            let err_widget = Paragraph::new(err.to_owned())
                .style(Style::default().fg(Color::Red))
                .block(
                    Block::default()
                        .title(" Error ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red)),
                )
                .wrap(Wrap { trim: true });
            f.render_widget(err_widget, err_area);
        }
    }
}

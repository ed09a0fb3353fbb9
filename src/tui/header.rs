use crate::app::AppState;
use crate::tui::{spinner, tree};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = vec![
        Span::styled(
            format!(" {} ", state.config.version_string),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
    ];

    if let Some(project) = &state.config.project {
        spans.push(Span::styled(
            format!("{project} "),
            Style::default().fg(Color::White),
        ));
    }

    match (&state.run, state.run_id) {
        (Some(run), _) => {
            let status = run.canonical_status();
            spans.push(Span::styled(
                run.title.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
            if !run.branch.is_empty() {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    format!("[{}]", run.branch),
                    Style::default().fg(Color::Yellow),
                ));
            }
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                status.to_string(),
                Style::default().fg(tree::status_color(status)),
            ));
        }
        (None, Some(run_id)) => {
            spans.push(Span::styled(
                format!("Run {run_id}"),
                Style::default().fg(Color::White),
            ));
        }
        (None, None) => {}
    }

    if state.has_active_run() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            spinner::frame(state.spinner_frame),
            Style::default().fg(Color::Yellow),
        ));
    }

    // Stalled indicator: muted, the last good data is still on screen
    if let Some(msg) = &state.stalled {
        spans.push(Span::styled(
            format!(" ⚠ {msg}"),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if state.error_message().is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(header, area);
}

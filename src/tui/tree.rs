use crate::app::{compute_duration, truncate, AppState, Focus};
use crate::order::ViewEntry;
use crate::tui::spinner;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let border_color = if state.focus == Focus::Tree {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .title(" Timeline ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner_width = area.width.saturating_sub(2) as usize;
    let visible_height = area.height.saturating_sub(2) as usize;

    if state.view.is_empty() {
        let msg = if let Some(err) = &state.load_error {
            Span::styled(err.clone(), Style::default().fg(Color::Red))
        } else if state.run_id.is_some() {
            Span::styled(
                format!("{} Waiting for timeline…", spinner::frame(state.spinner_frame)),
                Style::default().fg(Color::DarkGray),
            )
        } else {
            Span::styled("No run selected", Style::default().fg(Color::DarkGray))
        };
        f.render_widget(Paragraph::new(Line::from(msg)).block(block), area);
        return;
    }

    // Keep the cursor in the visible window
    let scroll_offset = if visible_height > 0 && state.cursor >= visible_height {
        state.cursor - visible_height + 1
    } else {
        0
    };

    let lines: Vec<Line> = state
        .view
        .entries()
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|(i, entry)| render_entry(entry, i == state.cursor, state.spinner_frame, inner_width))
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Colour for a canonical status string.
pub fn status_color(status: &str) -> Color {
    match status {
        "succeeded" => Color::Green,
        "failed" => Color::Red,
        "partiallySucceeded" | "succeededWithIssues" => Color::Yellow,
        "canceled" | "abandoned" => Color::Magenta,
        "inProgress" => Color::Cyan,
        _ => Color::DarkGray,
    }
}

fn render_entry(
    entry: &ViewEntry,
    is_selected: bool,
    spinner_frame: usize,
    max_width: usize,
) -> Line<'static> {
    let icon = spinner::symbol_text(entry.symbol, spinner_frame);
    let prefix = format!("{}{} ", "  ".repeat(entry.depth), icon);
    let duration = compute_duration(entry.record.start_time, entry.record.finish_time);

    let prefix_width = UnicodeWidthStr::width(prefix.as_str());
    let suffix_width = if duration.is_empty() { 0 } else { duration.len() + 1 };
    let name_max = max_width.saturating_sub(prefix_width + suffix_width);
    let name = truncate(entry.record.display_name(), name_max);

    let mut name_style = Style::default();
    if !entry.record.is_well_formed() {
        name_style = name_style.fg(Color::DarkGray).add_modifier(Modifier::ITALIC);
    }
    if is_selected {
        name_style = name_style.add_modifier(Modifier::REVERSED);
    }

    let mut spans = vec![
        Span::styled(prefix, Style::default().fg(status_color(entry.status))),
        Span::styled(name, name_style),
    ];
    if !duration.is_empty() {
        spans.push(Span::styled(
            format!(" {duration}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{RecordState, TimelineRecord};
    use crate::status::Symbol;

    fn entry(depth: usize, symbol: Symbol) -> ViewEntry {
        ViewEntry {
            record: TimelineRecord {
                id: "x".to_string(),
                parent_id: None,
                record_type: Some(crate::app::RecordType::Task),
                name: Some("Compile".to_string()),
                order: Some(1),
                state: RecordState::InProgress,
                result: None,
                start_time: None,
                finish_time: None,
                log_id: None,
            },
            depth,
            status: "inProgress",
            symbol,
        }
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn indents_by_depth() {
        let line = render_entry(&entry(2, Symbol::Glyph("✓")), false, 0, 80);
        assert_eq!(text(&line), "    ✓ Compile");
    }

    #[test]
    fn colors() {
        assert_eq!(status_color("succeeded"), Color::Green);
        assert_eq!(status_color("failed"), Color::Red);
        assert_eq!(status_color("inProgress"), Color::Cyan);
        assert_eq!(status_color("whatever"), Color::DarkGray);
    }

    #[test]
    fn name_truncated_to_width() {
        let line = render_entry(&entry(0, Symbol::Glyph("✓")), false, 0, 6);
        assert!(text(&line).ends_with('…'));
    }
}

use crate::app::{AppState, Focus};
use crate::search::{RenderedLine, SearchMode, SegmentKind};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Rows available for log text inside a pane of `area` (borders excluded).
pub fn content_height(area: Rect) -> usize {
    area.height.saturating_sub(2) as usize
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let log = &state.log;
    let inner_height = content_height(area);
    let total = log.line_count();

    let scroll_info = if total > inner_height {
        format!(
            "[{}-{}/{}] ",
            log.top_line() + 1,
            (log.top_line() + inner_height).min(total),
            total,
        )
    } else {
        String::new()
    };
    let title = format!(" {} {}", state.log_title(), scroll_info);

    let border_color = if state.focus == Focus::Log {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let mut block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    if let Some(bar) = search_bar(state) {
        block = block.title_bottom(bar);
    }

    let hint = match state.selected_entry() {
        None => Some("Select a record to view its log"),
        Some(e) if e.record.log_id.is_none() => Some("No log for this record"),
        Some(e) if state.log_record_id.as_deref() != Some(e.record.id.as_str()) => {
            Some("Loading log…")
        }
        Some(_) => None,
    };
    if let Some(hint) = hint {
        let para = Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray)))
            .block(block);
        f.render_widget(para, area);
        return;
    }

    let lines: Vec<Line> = log.render_visible().into_iter().map(to_line).collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn to_line(segments: RenderedLine<'_>) -> Line<'_> {
    Line::from(
        segments
            .into_iter()
            .map(|seg| Span::styled(seg.text, segment_style(seg.kind)))
            .collect::<Vec<_>>(),
    )
}

fn segment_style(kind: SegmentKind) -> Style {
    match kind {
        SegmentKind::Plain => Style::default(),
        SegmentKind::Match => Style::default().fg(Color::Black).bg(Color::Yellow),
        SegmentKind::CurrentMatch => Style::default()
            .fg(Color::Black)
            .bg(Color::LightRed)
            .add_modifier(Modifier::BOLD),
    }
}

/// Bottom-border line: `/query` while typing, `/query [2/5]` while browsing.
pub fn search_bar(state: &AppState) -> Option<Line<'static>> {
    let log = &state.log;
    let status = match (log.mode(), log.current_match_index()) {
        (SearchMode::Idle, _) => return None,
        (_, Some(i)) => format!(" [{}/{}]", i + 1, log.matches().len()),
        (_, None) if log.query().is_empty() => String::new(),
        (_, None) => " (no matches)".to_string(),
    };
    let cursor = if log.mode() == SearchMode::Searching { "_" } else { "" };
    Some(Line::from(vec![
        Span::styled(
            format!(" /{}{cursor}", log.query()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{status} "), Style::default().fg(Color::DarkGray)),
    ]))
}

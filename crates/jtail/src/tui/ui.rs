//! Rendering. Reads `TuiState`, never mutates it.

use std::time::Instant;

use jtail_protocol::Event;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Sparkline, Wrap};

use super::state::{ConnectionStatus, Entry, MetricsStatus, Mode, RATE_WINDOW_SECS, TuiState};
use super::theme::Theme;
use crate::format::{format_bytes, format_millis, format_number};

/// Width of the kind column
const KIND_WIDTH: usize = 16;

/// Rows of each top-K table in the metrics panel
const TOP_ROWS: usize = 3;

/// Draw the whole screen
pub fn render(frame: &mut Frame, state: &TuiState, theme: &Theme, now: Instant) {
    let banner_height = if state.banner().is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Header
            Constraint::Length(banner_height), // Alert banner
            Constraint::Min(3),                // Content
            Constraint::Length(1),             // Footer
        ])
        .split(frame.area());

    frame.render_widget(Paragraph::new(header_line(state, theme)), chunks[0]);

    if let Some(alert) = state.banner() {
        let banner = Paragraph::new(Line::from(format!(" {} ", alert)))
            .style(theme.banner_style())
            .block(Block::default().borders(Borders::ALL).border_style(theme.error_style()));
        frame.render_widget(banner, chunks[1]);
    }

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[2]);

    render_events(frame, state, theme, content[0]);
    render_side_panel(frame, state, theme, content[1], now);
    render_footer(frame, state, theme, chunks[3]);

    if let Mode::Detail(event) = state.mode() {
        render_detail(frame, event, theme);
    }
}

fn header_line(state: &TuiState, theme: &Theme) -> Line<'static> {
    let (glyph, style) = match state.connection() {
        ConnectionStatus::Connected(_) => ("●", theme.success_style()),
        ConnectionStatus::Connecting => ("○", theme.muted_style()),
        ConnectionStatus::Disconnected(_) => ("○", theme.warning_style()),
        ConnectionStatus::AuthFailed(_) => ("✗", theme.error_style()),
    };
    let connection = Span::styled(format!("{} {}", glyph, state.connection_label()), style);

    let mut spans = vec![
        Span::raw(" "),
        Span::styled("JFR-TAIL", theme.header_style()),
        Span::raw("  "),
        Span::styled(state.target().to_string(), theme.muted_style()),
        Span::raw("  "),
        connection,
        Span::raw("  "),
        if state.is_recording() {
            Span::styled("Rec: ON", theme.error_style())
        } else {
            Span::styled("Rec: OFF", theme.muted_style())
        },
    ];

    if state.is_paused() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("PAUSED", theme.warning_style().bold()));
    }
    if !state.filter().is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format!("filter: {}", state.filter()), theme.brand_style()));
    }

    Line::from(spans)
}

fn render_events(frame: &mut Frame, state: &TuiState, theme: &Theme, area: Rect) {
    let visible = state.visible();
    let title = if state.filter().is_empty() {
        format!(" Events ({}) ", visible.len())
    } else {
        format!(" Events ({}/{}) ", visible.len(), state.event_count())
    };

    let border = if matches!(state.mode(), Mode::Normal) {
        theme.focused_border()
    } else {
        theme.unfocused_border()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title);

    if visible.is_empty() {
        let hint = match state.connection() {
            ConnectionStatus::Connected(_) => "Waiting for events...",
            _ => "Waiting for the hub...",
        };
        let empty = Paragraph::new(Line::styled(format!(" {}", hint), theme.muted_style())).block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = visible
        .iter()
        .map(|entry| ListItem::new(Line::styled(format_event_line(&entry.event), entry_style(entry, theme))))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(theme.selected_bg_style())
        .highlight_symbol("› ");

    let mut list_state = ListState::default().with_selected(Some(state.selected()));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn entry_style(entry: &Entry, theme: &Theme) -> Style {
    if entry.local {
        theme.local_style(&entry.event)
    } else {
        theme.event_style(&entry.event)
    }
}

/// One list row: `time | kind | duration | details`
pub fn format_event_line(event: &Event) -> String {
    let kind: String = event.short_kind().chars().take(KIND_WIDTH).collect();
    let duration = event
        .duration_ms()
        .map(|ms| format!("{:.1} ms", ms))
        .unwrap_or_else(|| "-".to_string());

    let mut details: Vec<String> = Vec::new();
    if let Some(thread) = event.thread() {
        details.push(format!("thread={}", thread));
    }
    details.extend(event.fields().iter().map(|(k, v)| format!("{}={}", k, v)));

    format!(
        "{} | {:<width$} | {:>10} | {}",
        event.timestamp().format("%H:%M:%S%.3f"),
        kind,
        duration,
        details.join(" "),
        width = KIND_WIDTH
    )
}

fn render_side_panel(frame: &mut Frame, state: &TuiState, theme: &Theme, area: Rect, now: Instant) {
    let metrics_height = if state.show_metrics() {
        Constraint::Min(6)
    } else {
        Constraint::Length(0)
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Length(7), metrics_height])
        .split(area);

    let stats = state.stats();
    let counts = vec![
        count_line("Total", stats.total, Style::default()),
        count_line("GC", stats.gc, theme.warning_style()),
        count_line("Locks", stats.lock, theme.error_style()),
        count_line("Excep", stats.exception, theme.exception_style()),
        Line::styled(format!(" {} kinds", stats.by_kind.len()), theme.muted_style()),
    ];
    frame.render_widget(
        Paragraph::new(counts).block(side_block(" Stats ", theme)),
        chunks[0],
    );

    let series = state.rate_series(now);
    let peak = series.iter().copied().max().unwrap_or(0);
    let sparkline = Sparkline::default()
        .block(side_block(
            &format!(" Events/Sec (Last {}s) peak {} ", RATE_WINDOW_SECS, peak),
            theme,
        ))
        .data(&series)
        .style(theme.brand_style());
    frame.render_widget(sparkline, chunks[1]);

    if state.show_metrics() {
        let lines = metrics_lines(state, theme);
        frame.render_widget(
            Paragraph::new(lines)
                .block(side_block(" Metrics ", theme))
                .wrap(Wrap { trim: true }),
            chunks[2],
        );
    }
}

fn side_block<'a>(title: &str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.unfocused_border())
        .title(title.to_string())
}

fn count_line(label: &str, value: u64, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!(" {:<6}", label)),
        Span::styled(format_number(value), style.bold()),
    ])
}

fn metrics_lines(state: &TuiState, theme: &Theme) -> Vec<Line<'static>> {
    let status = match state.metrics_status() {
        MetricsStatus::Disabled => Span::styled("off (use --metrics-url)", theme.muted_style()),
        MetricsStatus::Waiting => Span::styled("waiting", theme.muted_style()),
        MetricsStatus::Ok => Span::styled("OK", theme.success_style()),
        MetricsStatus::Err(e) => Span::styled(format!("ERR {}", e), theme.error_style()),
    };
    let mut lines = vec![Line::from(vec![Span::raw(" Status "), status])];

    let Some(snapshot) = state.metrics() else {
        return lines;
    };
    let m = &snapshot.metrics;

    lines.push(Line::raw(format!(
        " Heap   {} / {}",
        format_bytes(m.heap_used_bytes),
        format_bytes(m.heap_committed_bytes)
    )));
    lines.push(Line::raw(format!(" Pause  {}", format_millis(m.last_gc_pause_ms))));
    lines.push(Line::raw(format!(" Events {}", format_number(m.total_events))));

    if !snapshot.top_exceptions.is_empty() {
        lines.push(Line::styled(" Top exceptions", theme.muted_style()));
        for entry in snapshot.top_exceptions.iter().take(TOP_ROWS) {
            lines.push(Line::raw(format!("  {:>5} {}", entry.value, entry.name)));
        }
    }
    if !snapshot.top_blocked_threads.is_empty() {
        lines.push(Line::styled(" Top blocked", theme.muted_style()));
        for entry in snapshot.top_blocked_threads.iter().take(TOP_ROWS) {
            lines.push(Line::raw(format!("  {:>8} {}", format_millis(entry.value), entry.name)));
        }
    }

    lines
}

fn render_footer(frame: &mut Frame, state: &TuiState, theme: &Theme, area: Rect) {
    if matches!(state.mode(), Mode::Filtering) {
        let input = state.filter_input();
        let prompt = " / ";
        let line = Line::from(vec![
            Span::styled(prompt, theme.brand_style().bold()),
            Span::raw(input.value().to_string()),
            Span::styled("   Enter apply · Esc clear", theme.muted_style()),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        let x = area.x + prompt.len() as u16 + input.visual_cursor() as u16;
        frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        return;
    }

    let line = match state.notice() {
        Some(notice) => Line::styled(format!(" {}", notice), theme.brand_style()),
        None => Line::styled(
            " Q: Quit | ↑↓: Move | /: Filter | Enter: Detail | C: Clear | S: Metrics | B: Bundle | P: Pause ",
            theme.muted_style(),
        ),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_detail(frame: &mut Frame, event: &Event, theme: &Theme) {
    let area = centered(frame.area(), 80, 80);
    let body = serde_json::to_string_pretty(event).unwrap_or_else(|e| format!("unprintable event: {}", e));

    let detail = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.focused_border())
                .title(format!(" {} (Esc to close) ", event.kind())),
        );

    frame.render_widget(Clear, area);
    frame.render_widget(detail, area);
}

/// A rectangle of the given percentages centered in `area`
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

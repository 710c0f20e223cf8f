//! Reusable UI widgets and helper functions
//!
//! This module contains shared rendering utilities used across different views.

use ratatui::prelude::*;
use ratatui::widgets::{Cell, Row};

use crate::tui::theme::Theme;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Create a styled table header row from column names
pub fn create_table_header(columns: Vec<String>, theme: &Theme) -> Row<'static> {
    let header_cells = columns
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().fg(theme.header_fg).bold()));
    Row::new(header_cells)
        .style(Style::default().bg(theme.header_bg))
        .height(1)
}

/// Create a centered rectangle
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

/// Bold section heading inside a popup
pub fn section_header(title: &str, theme: &Theme) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {}", title),
        Style::default().fg(theme.border_focused).bold(),
    ))
}

/// "  Label:      value" with the label padded to a fixed width
pub fn detail_row(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<16}", format!("{}:", label)), Style::default().bold()),
        Span::raw(value.to_string()),
    ])
}

/// Key hint in the `[key] action` style used by popup footers
pub fn key_hint(key: &str, action: &str, theme: &Theme) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!("[{}]", key), Style::default().fg(theme.border).bold()),
        Span::styled(format!(" {}  ", action), Style::default().fg(theme.border)),
    ]
}

pub fn spinner(tick: usize) -> &'static str {
    SPINNER[tick % SPINNER.len()]
}

/// Text progress bar `[====....]` for byte counts
pub fn progress_bar(done: u64, total: u64, width: usize, theme: &Theme) -> Span<'static> {
    let percent = if total == 0 { 100.0 } else { done as f64 * 100.0 / total as f64 };
    let filled = ((percent / 100.0) * width as f64).round().min(width as f64) as usize;
    let empty = width.saturating_sub(filled);
    Span::styled(
        format!("[{}{}] {:>3.0}%", "=".repeat(filled), ".".repeat(empty), percent),
        Style::default().fg(theme.info),
    )
}

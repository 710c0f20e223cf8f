//! Filter editor overlay for the current list

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::list::{ApplyMode, FieldKind, QuickRange, Resource};
use crate::tui::app::ListPage;
use crate::tui::theme::Theme;

use super::widgets::key_hint;

pub fn render_filter_overlay<R: Resource>(page: &ListPage<R>, frame: &mut Frame, area: Rect, theme: &Theme) {
    let panel = &page.panel;
    let fields = panel.fields();

    let height = (fields.len() as u16 + 6).min(area.height);
    let popup_area = Rect {
        x: area.x + 2,
        y: area.y + 1,
        width: area.width.saturating_sub(4).min(72),
        height,
    };
    frame.render_widget(Clear, popup_area);

    let title = match panel.mode() {
        ApplyMode::Explicit => format!(" Filter {} ", R::KIND.title()),
        ApplyMode::Live => format!(" Filter {} (live) ", R::KIND.title()),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .title(title);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines = Vec::with_capacity(fields.len() + 4);
    let mut cursor = None;
    for (index, field) in fields.iter().enumerate() {
        let focused = index == panel.focus();
        let raw = panel.input(index);
        let value = match field.kind {
            FieldKind::Choice(_) if raw.is_empty() => "< any >".to_string(),
            FieldKind::Choice(_) => format!("< {} >", raw),
            FieldKind::Text | FieldKind::DateRange => raw.to_string(),
        };

        let value_style = if panel.is_invalid(index) {
            Style::default().fg(theme.input_invalid)
        } else if focused {
            Style::default().fg(theme.selected_fg).bg(theme.selected_bg)
        } else {
            Style::default().fg(theme.fg)
        };
        let label = format!("{} {:<14}", if focused { ">" } else { " " }, field.label);
        if focused && !matches!(field.kind, FieldKind::Choice(_)) {
            cursor = Some((
                inner.x + label.chars().count() as u16 + value.chars().count() as u16,
                inner.y + index as u16,
            ));
        }
        let mut spans = vec![
            Span::styled(label, Style::default().bold()),
            Span::styled(value, value_style),
        ];
        if field.kind == FieldKind::DateRange && focused {
            spans.push(Span::styled("  YYYY-MM-DD..YYYY-MM-DD", Style::default().fg(theme.muted)));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    if fields.iter().any(|f| f.kind == FieldKind::DateRange) {
        let presets: Vec<String> = QuickRange::ALL
            .iter()
            .enumerate()
            .map(|(i, r)| format!("F{} {}", i + 2, r.label()))
            .collect();
        lines.push(Line::from(Span::styled(
            format!("  {}", presets.join("  ")),
            Style::default().fg(theme.info),
        )));
    }

    let mut footer = vec![Span::raw("  ")];
    footer.extend(key_hint("Tab", "next", theme));
    footer.extend(key_hint("←/→", "choose", theme));
    match panel.mode() {
        ApplyMode::Explicit => footer.extend(key_hint("Enter", "apply", theme)),
        ApplyMode::Live => footer.extend(key_hint("Enter", "apply now", theme)),
    }
    footer.extend(key_hint("Ctrl+L", "clear", theme));
    footer.extend(key_hint("Esc", "close", theme));
    lines.push(Line::from(footer));

    frame.render_widget(Paragraph::new(lines).style(Style::default().fg(theme.fg)), inner);
    if let Some(position) = cursor {
        frame.set_cursor_position(position);
    }
}

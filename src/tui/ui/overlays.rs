//! Overlay and popup rendering
//!
//! Handles rendering of help, the action/sort/export menus, record modals
//! (detail views and action forms) and toast notifications.

use chrono::NaiveDate;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::export::ExportFormat;
use crate::list::{Resource, RowAction, SortState};
use crate::modal::Modal;
use crate::notify::Toast;
use crate::tui::app::MenuState;
use crate::tui::theme::Theme;

use super::widgets::{centered_rect, detail_row, key_hint, progress_bar, section_header};

pub fn render_help_overlay(frame: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = centered_rect(65, 85, area);
    frame.render_widget(Clear, popup_area);

    let heading = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(theme.info).bold()));

    let help_text = vec![
        Line::from(Span::styled("tenantdesk - Keyboard Shortcuts", Style::default().bold())),
        Line::from(""),
        heading("Navigation"),
        Line::from("  j / Down       Move selection down"),
        Line::from("  k / Up         Move selection up"),
        Line::from("  g / G          Jump to top / bottom"),
        Line::from("  Ctrl+d / u     Half page down / up"),
        Line::from("  Mouse click    Select row"),
        Line::from(""),
        heading("Pages"),
        Line::from("  ] / n / Right  Next page"),
        Line::from("  [ / p / Left   Previous page"),
        Line::from("  { / }          First / last page"),
        Line::from("  L              Cycle page size (10, 20, 50, 100)"),
        Line::from(""),
        heading("Views"),
        Line::from("  1              Dashboard"),
        Line::from("  2-7            Tenants, states, invoices, activity, errors, documents"),
        Line::from("  Tab / S-Tab    Next / previous view"),
        Line::from(""),
        heading("Lists"),
        Line::from("  Enter          View details"),
        Line::from("  a              Row actions"),
        Line::from("  f or /         Edit filters"),
        Line::from("  Ctrl+L         Clear filters"),
        Line::from("  F2 / F3 / F4   Last 24 hours / 7 days / 30 days"),
        Line::from("  s / S          Sort menu / flip sort order"),
        Line::from("  y              Copy ID to clipboard"),
        Line::from("  e / E          Server export / CSV of this page"),
        Line::from("  r              Refresh"),
        Line::from("  x              Dismiss error banner"),
        Line::from(""),
        heading("General"),
        Line::from("  ?/F1           Show this help"),
        Line::from("  Esc            Close overlay / cancel"),
        Line::from("  q              Quit application"),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close this help",
            Style::default().fg(theme.border),
        )),
    ];

    let help_para = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border_focused))
                .title(" Help "),
        )
        .style(Style::default().fg(theme.fg));

    frame.render_widget(help_para, popup_area);
}

/// Vertical menu popup shared by the action, sort and export pickers
fn render_menu(title: &str, entries: Vec<Line<'static>>, menu: &MenuState, frame: &mut Frame, area: Rect, theme: &Theme) {
    let height = (entries.len() as u16 + 4).min(area.height);
    let width = 36.min(area.width);
    let popup_area = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .title(format!(" {} ", title));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines = Vec::with_capacity(entries.len() + 2);
    for (i, entry) in entries.into_iter().enumerate() {
        if i == menu.selected {
            let mut spans = vec![Span::raw("> ")];
            spans.extend(entry.spans);
            lines.push(Line::from(spans).style(Style::default().fg(theme.selected_fg).bg(theme.selected_bg)));
        } else {
            let mut spans = vec![Span::raw("  ")];
            spans.extend(entry.spans);
            lines.push(Line::from(spans));
        }
    }
    lines.push(Line::from(""));
    let mut footer = key_hint("Enter", "select", theme);
    footer.extend(key_hint("Esc", "cancel", theme));
    lines.push(Line::from(footer));

    frame.render_widget(Paragraph::new(lines).style(Style::default().fg(theme.fg)), inner);
}

pub fn render_actions_menu(actions: &[RowAction], menu: &MenuState, frame: &mut Frame, area: Rect, theme: &Theme) {
    let entries = actions
        .iter()
        .map(|action| {
            let style = if action.is_destructive() {
                Style::default().fg(theme.negative)
            } else {
                Style::default()
            };
            Line::from(Span::styled(action.label(), style))
        })
        .collect();
    render_menu("Actions", entries, menu, frame, area, theme);
}

pub fn render_sort_menu(
    fields: &[(&'static str, &'static str)],
    sort: &SortState,
    menu: &MenuState,
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
) {
    let entries = fields
        .iter()
        .map(|(field, title)| {
            if sort.is_active(field) {
                Line::from(Span::styled(
                    format!("{} [{}]", title, sort.order.as_str().to_uppercase()),
                    Style::default().fg(theme.info),
                ))
            } else {
                Line::from(*title)
            }
        })
        .collect();
    render_menu("Sort By", entries, menu, frame, area, theme);
}

pub fn render_export_menu(menu: &MenuState, frame: &mut Frame, area: Rect, theme: &Theme) {
    let entries = ExportFormat::ALL
        .iter()
        .map(|format| Line::from(format!("{} (.{})", format.label(), format.extension())))
        .collect();
    render_menu("Export", entries, menu, frame, area, theme);
}

/// Detail view or action form bound to one row
pub fn render_record_modal<R: Resource>(
    modal: &Modal<R>,
    today: NaiveDate,
    tick: usize,
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
) {
    let popup_area = centered_rect(70, 75, area);
    frame.render_widget(Clear, popup_area);

    let border = if modal.action.is_destructive() {
        theme.negative
    } else {
        theme.border_focused
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" {} ", modal.title()));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    match &modal.form {
        None => {
            let mut lines: Vec<Line> = modal
                .target
                .details(today)
                .into_iter()
                .map(|(label, value)| detail_row(label, &value))
                .collect();
            lines.push(Line::from(""));
            let mut footer = vec![Span::raw("  ")];
            footer.extend(key_hint("Esc/Enter", "close", theme));
            footer.extend(key_hint("j/k", "scroll", theme));
            footer.extend(key_hint("y", "copy ID", theme));
            lines.push(Line::from(footer));

            let para = Paragraph::new(lines)
                .style(Style::default().fg(theme.fg))
                .wrap(Wrap { trim: false })
                .scroll((modal.scroll, 0));
            frame.render_widget(para, inner);
        }
        Some(form) => {
            let mut lines = Vec::new();
            lines.push(section_header(&format!("{} {}", R::KIND.singular(), modal.target.id()), theme));
            lines.push(Line::from(""));

            for (index, field) in form.fields().iter().enumerate() {
                let focused = index == form.focus() && !modal.submitting;
                let value_style = if focused {
                    Style::default().fg(theme.selected_fg).bg(theme.selected_bg)
                } else {
                    Style::default().fg(theme.fg)
                };
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{} {:<18}", if focused { ">" } else { " " }, field.label),
                        Style::default().bold(),
                    ),
                    Span::styled(field.input.display(), value_style),
                ]));
                if let Some(error) = modal.errors.get(field.key) {
                    lines.push(Line::from(Span::styled(
                        format!("    {}", error),
                        Style::default().fg(theme.negative),
                    )));
                }
            }

            if let Some(error) = modal.errors.get("form") {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("  {}", error),
                    Style::default().fg(theme.negative).bold(),
                )));
            }

            lines.push(Line::from(""));
            if modal.submitting {
                let mut status = vec![Span::styled(
                    format!("  {} Submitting… ", super::widgets::spinner(tick)),
                    Style::default().fg(theme.warning),
                )];
                if let Some((sent, total)) = modal.progress {
                    status.push(progress_bar(sent, total, 20, theme));
                }
                lines.push(Line::from(status));
            } else {
                let mut footer = vec![Span::raw("  ")];
                footer.extend(key_hint("Tab", "next field", theme));
                footer.extend(key_hint("←/→/Space", "toggle", theme));
                footer.extend(key_hint("Enter", "submit", theme));
                footer.extend(key_hint("Esc", "cancel", theme));
                lines.push(Line::from(footer));
            }

            let para = Paragraph::new(lines)
                .style(Style::default().fg(theme.fg))
                .wrap(Wrap { trim: false });
            frame.render_widget(para, inner);
        }
    }
}

/// Toast in the bottom-right corner
pub fn render_toast(toast: &Toast, frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = format!(" {} {} ", toast.level.icon(), toast.message);
    let toast_width = (text.chars().count() as u16 + 2).min(area.width.saturating_sub(2)).min(70);
    let toast_area = Rect {
        x: area.width.saturating_sub(toast_width + 1),
        y: area.height.saturating_sub(5),
        width: toast_width,
        height: 3,
    };

    frame.render_widget(Clear, toast_area);

    let color = theme.level(toast.level);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let para = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center);

    frame.render_widget(para, toast_area);
}

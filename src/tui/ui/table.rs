//! Resource list rendering: filter bar, data table and pagination strip
//!
//! One generic renderer serves every list; the columns come from the
//! resource's declarations.

use chrono::NaiveDate;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::formatting::truncate_string;
use crate::list::{ApplyMode, PageItem, Resource, TableView, table_view};
use crate::tui::app::ListPage;
use crate::tui::theme::Theme;

use super::widgets::{create_table_header, spinner};

/// Rows taken by the filter bar above the table
pub const FILTER_BAR_HEIGHT: u16 = 3;

pub fn render_list<R: Resource>(
    page: &ListPage<R>,
    today: NaiveDate,
    tick: usize,
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
) {
    let layout = Layout::vertical([
        Constraint::Length(FILTER_BAR_HEIGHT),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .split(area);

    render_filter_bar(page, frame, layout[0], theme);
    render_table(page, today, tick, frame, layout[1], theme);
    render_pagination(page, frame, layout[2], theme);
}

fn render_filter_bar<R: Resource>(page: &ListPage<R>, frame: &mut Frame, area: Rect, theme: &Theme) {
    let committed = &page.query.filters;
    let mut spans = Vec::new();
    if committed.is_empty() {
        spans.push(Span::styled("No filters", Style::default().fg(theme.muted)));
    } else {
        spans.push(Span::styled(committed.summary(), Style::default().fg(theme.info)));
    }
    if page.has_pending_filters() {
        spans.push(Span::styled("  (updating…)", Style::default().fg(theme.warning)));
    } else if page.panel.mode() == ApplyMode::Explicit && page.panel.is_dirty(committed) {
        spans.push(Span::styled("  (edited, not applied)", Style::default().fg(theme.warning)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(" Filters [f] ");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_table<R: Resource>(
    page: &ListPage<R>,
    today: NaiveDate,
    tick: usize,
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
) {
    let total = page.slice.data().map(|p| p.total);
    let mut title = match total {
        Some(total) => format!(" {} ({}) ", R::KIND.title(), total),
        None => format!(" {} ", R::KIND.title()),
    };
    if page.slice.is_loading() {
        title.push_str(&format!("{} ", spinner(tick)));
    }

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .title(title);
    if let Some(error) = page.slice.error() {
        block = block.title_bottom(
            Line::from(Span::styled(
                format!(" {} [x] dismiss  [r] retry ", error),
                Style::default().fg(theme.negative).bg(theme.banner_bg).bold(),
            ))
            .left_aligned(),
        );
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = R::columns();
    let header = create_table_header(
        columns
            .iter()
            .map(|c| {
                if page.query.sort.is_active(c.field) {
                    format!("{} {}", c.title, page.query.sort.order.arrow())
                } else {
                    c.title.to_string()
                }
            })
            .collect(),
        theme,
    );
    let widths: Vec<Constraint> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i + 1 == columns.len() {
                Constraint::Min(c.width)
            } else {
                Constraint::Length(c.width)
            }
        })
        .collect();

    let body_height = usize::from(inner.height.saturating_sub(1));
    let rows: Vec<Row> = match table_view(page.rows(), page.slice.is_loading(), page.query.limit()) {
        TableView::Skeleton(limit) => {
            let count = (limit as usize).min(body_height);
            (0..count)
                .map(|_| {
                    Row::new(columns.iter().map(|c| {
                        Cell::from("░".repeat(usize::from(c.width.saturating_sub(2)).max(3)))
                            .style(Style::default().fg(theme.muted))
                    }))
                })
                .collect()
        }
        TableView::Empty => {
            let message = if page.query.filters.is_empty() {
                format!("No {} found", R::KIND.title().to_lowercase())
            } else {
                format!("No {} match the current filters", R::KIND.title().to_lowercase())
            };
            let header_only = Table::new(Vec::<Row>::new(), widths).header(header);
            frame.render_widget(header_only, Rect { height: 1, ..inner });
            let body = Rect {
                y: inner.y + 1,
                height: inner.height.saturating_sub(1),
                ..inner
            };
            let para = Paragraph::new(message)
                .style(Style::default().fg(theme.muted))
                .alignment(Alignment::Center);
            frame.render_widget(para, body);
            return;
        }
        TableView::Rows(rows) => rows
            .iter()
            .enumerate()
            .skip(page.cursor.scroll_offset)
            .take(body_height)
            .map(|(index, row)| {
                let selected = index == page.cursor.selected;
                let cells = columns.iter().map(|c| {
                    let text = truncate_string(&c.render(row, today), usize::from(c.width.max(4)));
                    Cell::from(text).style(Style::default().fg(theme.tone(c.tone_of(row, today))))
                });
                let row = Row::new(cells);
                if selected {
                    row.style(Style::default().bg(theme.selected_bg).fg(theme.selected_fg).bold())
                } else {
                    row
                }
            })
            .collect(),
    };

    let table = Table::new(rows, widths).header(header);
    frame.render_widget(table, inner);
}

fn render_pagination<R: Resource>(page: &ListPage<R>, frame: &mut Frame, area: Rect, theme: &Theme) {
    let control = page.pagination();
    let dim = Style::default().fg(theme.muted);

    let mut spans = vec![Span::styled(
        " « ",
        if control.has_previous() { Style::default().fg(theme.fg) } else { dim },
    )];
    for item in control.window() {
        match item {
            PageItem::Page(n) if n == control.current_page => spans.push(Span::styled(
                format!("[{}]", n),
                Style::default().fg(theme.selected_fg).bg(theme.selected_bg).bold(),
            )),
            PageItem::Page(n) => spans.push(Span::raw(format!(" {} ", n))),
            PageItem::Ellipsis => spans.push(Span::styled(" … ", dim)),
        }
    }
    spans.push(Span::styled(
        " » ",
        if control.has_next() { Style::default().fg(theme.fg) } else { dim },
    ));
    spans.push(Span::styled(
        format!("  {}  ·  {}/page", control.range_label(), control.items_per_page),
        dim,
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

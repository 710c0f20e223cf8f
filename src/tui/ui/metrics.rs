//! Dashboard view: platform metrics at a glance

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::formatting::{format_bytes, format_count, format_money, percent_bar};
use crate::models::PlatformMetrics;
use crate::tui::app::App;
use crate::tui::theme::Theme;

use super::widgets::{section_header, spinner};

pub fn render_dashboard(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let mut title = " Dashboard ".to_string();
    if app.metrics.is_loading() {
        title.push_str(&format!("{} ", spinner(app.spinner)));
    }
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .title(title);
    if let Some(error) = app.metrics.error() {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {} [x] dismiss  [r] retry ", error),
            Style::default().fg(theme.negative).bg(theme.banner_bg).bold(),
        )));
    }
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(metrics) = app.metrics.data() else {
        let msg = if app.metrics.is_loading() {
            "Loading metrics..."
        } else {
            "Metrics unavailable"
        };
        let para = Paragraph::new(msg)
            .style(Style::default().fg(theme.muted))
            .alignment(Alignment::Center);
        frame.render_widget(para, inner);
        return;
    };

    let columns = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(inner);
    frame.render_widget(Paragraph::new(tenant_lines(metrics, theme)), columns[0]);
    frame.render_widget(Paragraph::new(operations_lines(app, metrics, theme)), columns[1]);
}

fn stat(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<20}", label), Style::default().bold()),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn tenant_lines(metrics: &PlatformMetrics, theme: &Theme) -> Vec<Line<'static>> {
    let counts = &metrics.tenants;
    let share = metrics.active_share();
    vec![
        Line::from(""),
        section_header("Tenants", theme),
        stat("Total", format_count(counts.total), theme.fg),
        stat("Active", format_count(counts.active), theme.positive),
        stat("Trial", format_count(counts.trial), theme.info),
        stat("Suspended", format_count(counts.suspended), theme.warning),
        stat("Deactivated", format_count(counts.deactivated), theme.muted),
        Line::from(vec![
            Span::styled(format!("  {:<20}", "Active share"), Style::default().bold()),
            Span::styled(percent_bar(share), Style::default().fg(theme.share_color(share))),
            Span::raw(format!(" {:.0}%", share)),
        ]),
        Line::from(""),
        section_header("Usage", theme),
        stat("Users", format_count(metrics.total_users), theme.fg),
        stat("Storage", format_bytes(metrics.storage_used), theme.fg),
    ]
}

fn operations_lines(app: &App, metrics: &PlatformMetrics, theme: &Theme) -> Vec<Line<'static>> {
    let revenue = &metrics.revenue;
    let currency = metrics.currency();
    let mut lines = vec![
        Line::from(""),
        section_header("Revenue", theme),
        stat("Monthly recurring", format_money(revenue.monthly_recurring, currency), theme.positive),
        stat("Outstanding", format_money(revenue.outstanding, currency), theme.fg),
        stat(
            "Overdue invoices",
            format_count(revenue.overdue_invoices),
            theme.tone(metrics.overdue_tone()),
        ),
        Line::from(""),
        section_header("Health", theme),
        stat("Errors (24h)", format_count(metrics.errors_last_24h), theme.fg),
        stat(
            "Unresolved errors",
            format_count(metrics.unresolved_errors),
            theme.tone(metrics.error_tone()),
        ),
        stat("Pending recoveries", format_count(metrics.pending_recoveries), theme.fg),
    ];
    if let Some(loaded) = app.metrics_loaded {
        let format = format!("{} %H:%M:%S", app.config.display.date_format);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  Updated {}", loaded.format(&format)),
            Style::default().fg(theme.muted),
        )));
    }
    lines
}

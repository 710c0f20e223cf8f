//! CLI rendering: resource tables, pagination footer and the metrics box

use chrono::{DateTime, Local, NaiveDate};
use owo_colors::OwoColorize;
use tabled::builder::Builder;
use tabled::settings::object::Rows;
use tabled::settings::{Alignment, Modify, Style, Width};

use crate::formatting::layout::BOX_WIDTH;
use crate::formatting::{format_bytes, format_count, format_money, percent_bar};
use crate::list::{ListQuery, Page, PageItem, PaginationControl, Resource, Tone};
use crate::models::PlatformMetrics;

/// Apply a semantic tone as a terminal color
pub fn paint(text: &str, tone: Tone) -> String {
    match tone {
        Tone::Plain => text.to_string(),
        Tone::Positive => text.green().to_string(),
        Tone::Info => text.cyan().to_string(),
        Tone::Warning => text.yellow().to_string(),
        Tone::Negative => text.bright_red().to_string(),
        Tone::Muted => text.bright_black().to_string(),
    }
}

/// Render one page of a resource list as a table with a pagination footer
pub fn format_page<R: Resource>(page: &Page<R>, query: &ListQuery, today: NaiveDate) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}", R::KIND.title().bold()));
    if !query.filters.is_empty() {
        output.push_str(&format!("  {}", query.filters.summary().bright_black()));
    }
    output.push('\n');

    if page.is_empty() {
        let message = if query.filters.is_empty() {
            format!("No {} found", R::KIND.title().to_lowercase())
        } else {
            format!("No {} match the current filters", R::KIND.title().to_lowercase())
        };
        output.push_str(&format!("{}\n", message.yellow()));
        return output;
    }

    let columns = R::columns();
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| {
        if query.sort.is_active(c.field) {
            format!("{} {}", c.title, query.sort.order.arrow())
        } else {
            c.title.to_string()
        }
    }));
    for row in &page.items {
        builder.push_record(columns.iter().map(|c| paint(&c.render(row, today), c.tone_of(row, today))));
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Width::wrap(200).keep_words(true))
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    output.push_str(&table.to_string());
    output.push('\n');
    output.push_str(&format_pagination(&PaginationControl::new(
        page.page,
        page.total_pages,
        page.total,
        page.limit,
    )));
    output
}

/// `Showing 21-30 of 95   1 … 2 [3] 4 … 10`
pub fn format_pagination(control: &PaginationControl) -> String {
    let strip: Vec<String> = control
        .window()
        .into_iter()
        .map(|item| match item {
            PageItem::Page(p) if p == control.current_page => format!("[{}]", p).bold().to_string(),
            PageItem::Page(p) => p.to_string(),
            PageItem::Ellipsis => "…".bright_black().to_string(),
        })
        .collect();
    format!("{}   {}", control.range_label(), strip.join(" "))
}

/// Strip ANSI color codes to calculate visible width
fn strip_ansi(s: &str) -> String {
    let mut result = String::new();
    let mut in_escape = false;

    for ch in s.chars() {
        if ch == '\x1b' {
            in_escape = true;
        } else if in_escape && ch == 'm' {
            in_escape = false;
        } else if !in_escape {
            result.push(ch);
        }
    }

    result
}

/// Pad a line to fit within the box
fn pad_line(content: &str) -> String {
    let visible_len = strip_ansi(content).chars().count();
    let padding = " ".repeat(BOX_WIDTH.saturating_sub(visible_len));
    format!("{}{}{}{}", "│".blue(), content, padding, "│".blue())
}

fn box_rule(left: char, title: &str, right: char) -> String {
    let title = if title.is_empty() { String::new() } else { format!(" {} ", title) };
    let fill = BOX_WIDTH.saturating_sub(title.chars().count());
    let lead = fill / 2;
    format!("{}{}{}{}{}", left, "─".repeat(lead), title, "─".repeat(fill - lead), right)
        .blue()
        .to_string()
}

/// Super-admin dashboard as a boxed summary
pub fn format_metrics(metrics: &PlatformMetrics, as_of: DateTime<Local>) -> String {
    let blank = pad_line("");
    let currency = metrics.currency();
    let t = &metrics.tenants;

    let lines = [
        format!("  {} (as of {})", "Platform Overview".bold(), as_of.format("%H:%M:%S")),
        String::new(),
        format!(
            "  {}: {} total • {} active • {} trial • {} • {} deactivated",
            "Tenants".green(),
            format_count(t.total),
            format_count(t.active),
            format_count(t.trial),
            format!("{} suspended", t.suspended).yellow(),
            t.deactivated
        ),
        format!("  {}  {} {:.1}%", "Healthy".green(), percent_bar(metrics.active_share()), metrics.active_share()),
        format!(
            "  {}: {} users • {} stored",
            "Usage".blue(),
            format_count(metrics.total_users),
            format_bytes(metrics.storage_used)
        ),
        format!(
            "  {}: {} MRR • {} outstanding • {}",
            "Revenue".magenta(),
            format_money(metrics.revenue.monthly_recurring, currency),
            format_money(metrics.revenue.outstanding, currency),
            paint(
                &format!("{} overdue invoices", metrics.revenue.overdue_invoices),
                metrics.overdue_tone()
            )
        ),
        format!(
            "  {}: {} in last 24h • {} • {} recoveries pending",
            "Errors".red(),
            metrics.errors_last_24h,
            paint(&format!("{} unresolved", metrics.unresolved_errors), metrics.error_tone()),
            metrics.pending_recoveries
        ),
    ];

    let mut output = String::new();
    output.push_str(&format!("\n{}\n", box_rule('╭', "Platform Metrics", '╮')));
    output.push_str(&format!("{}\n", blank));
    for line in &lines {
        output.push_str(&format!("{}\n", pad_line(line)));
    }
    output.push_str(&format!("{}\n", blank));
    output.push_str(&format!("{}\n", box_rule('╰', "", '╯')));
    output
}

//! Shared formatting utilities used by both CLI and TUI
//!
//! Truncation, money, byte size and date/time rendering live here so the
//! table columns, detail modals and CLI output agree on one format.

use chrono::{DateTime, NaiveDate, Utc};

/// Memory size constants (in bytes)
pub mod size {
    pub const KB: u64 = 1024;
    pub const MB: u64 = KB * 1024;
    pub const GB: u64 = MB * 1024;
    pub const TB: u64 = GB * 1024;
}

/// Layout constants used across CLI and TUI
pub mod layout {
    pub const BOX_WIDTH: usize = 78;
    pub const BAR_LENGTH: usize = 20;
}

/// Truncate a string to a maximum length (in characters), adding "..." at the end if truncated.
///
/// This function is Unicode-safe and counts characters, not bytes.
///
/// # Examples
/// ```
/// use tenantdesk::formatting::truncate_string;
/// assert_eq!(truncate_string("hello", 10), "hello");
/// assert_eq!(truncate_string("hello world", 8), "hello...");
/// ```
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        // Edge case: if max_len is very small, just truncate without ellipsis
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format raw bytes to human-readable size.
///
/// # Examples
/// ```
/// use tenantdesk::formatting::format_bytes;
/// assert_eq!(format_bytes(512), "512B");
/// assert_eq!(format_bytes(1536), "1.5K");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    use size::{GB, KB, MB, TB};

    if bytes >= TB {
        format!("{:.1}T", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1}G", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}M", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}K", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Insert thousands separators into a non-negative integer string
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a count with thousands separators (`12,400`)
#[must_use]
pub fn format_count(n: u64) -> String {
    group_thousands(&n.to_string())
}

/// Format an amount with two decimals and its currency.
///
/// Known currencies get their symbol, anything else is suffixed with the code.
#[must_use]
pub fn format_money(amount: f64, currency: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let body = format!("{}.{:02}", group_thousands(&(cents / 100).to_string()), cents % 100);
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    match currency.to_ascii_uppercase().as_str() {
        "USD" => format!("{}${}", sign, body),
        "EUR" => format!("{}€{}", sign, body),
        "GBP" => format!("{}£{}", sign, body),
        other => format!("{}{} {}", sign, body, other),
    }
}

/// `YYYY-MM-DD`, or `-` when absent
#[must_use]
pub fn format_opt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Compact UTC timestamp for table cells
#[must_use]
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Format elapsed time since `then` as "5m ago", "3h ago", "2d ago".
#[must_use]
pub fn format_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 0 {
        return "just now".to_string();
    }
    match secs {
        0..=59 => format!("{}s ago", secs),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

/// Text progress bar of `layout::BAR_LENGTH` cells
#[must_use]
pub fn percent_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * layout::BAR_LENGTH as f64).round() as usize;
    format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(layout::BAR_LENGTH - filled)
    )
}

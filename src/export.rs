//! Export of list data, either generated by the server or rendered locally
//!
//! Server exports (`POST /{resource}/export`) return file bytes for the
//! current filters. The local CSV export renders the rows on screen through
//! the same column definitions the table uses.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

use crate::list::{Resource, ResourceKind};

/// Server-side export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Pdf,
    Excel,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Pdf, ExportFormat::Excel];

    /// Value sent in the request body
    #[must_use]
    pub fn wire(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "excel",
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Excel => "Excel",
        }
    }
}

/// `{Resource}_{YYYYmmdd_HHMMSS}.{ext}`
#[must_use]
pub fn export_filename(kind: ResourceKind, extension: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        kind.export_name(),
        now.format("%Y%m%d_%H%M%S"),
        extension
    )
}

/// Escape a string for CSV (handle commas, quotes, newlines)
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Render rows as CSV using the table's column titles and cell text
pub fn rows_to_csv<R: Resource>(rows: &[R], today: NaiveDate) -> String {
    let columns = R::columns();
    let mut out = columns
        .iter()
        .map(|c| escape_csv(c.title))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    for row in rows {
        let line = columns
            .iter()
            .map(|c| escape_csv(&c.render(row, today)))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Reduce a name built from server data to a single safe path component
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write export bytes into `dir`, creating it when needed.
///
/// `file_name` is sanitized, so the file always lands directly in `dir`.
pub fn write_export(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(sanitize_file_name(file_name));
    std::fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "export written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Invoice, InvoiceStatus};
    use chrono::TimeZone;

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("hello"), "hello");
        assert_eq!(escape_csv(""), "");
        assert_eq!(escape_csv("hello,world"), "\"hello,world\"");
        assert_eq!(escape_csv("say \"hello\""), "\"say \"\"hello\"\"\"");
        assert_eq!(escape_csv("line1\nline2"), "\"line1\nline2\"");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Receipt_INV-7.pdf"), "Receipt_INV-7.pdf");
        assert_eq!(sanitize_file_name("Receipt_../../etc/passwd.pdf"), "Receipt_.._.._etc_passwd.pdf");
        assert_eq!(sanitize_file_name("..\\boot.ini"), "_boot.ini");
        assert_eq!(sanitize_file_name(".."), "download");
        assert_eq!(sanitize_file_name(" a\nb "), "a_b");
    }

    #[test]
    fn test_write_export_stays_in_dir() {
        let dir = std::env::temp_dir().join(format!("tenantdesk-export-{}", std::process::id()));
        let path = write_export(&dir, "Receipt_../../escape.pdf", b"%PDF").unwrap();
        assert_eq!(path.parent(), Some(dir.as_path()));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_export_filename() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            export_filename(ResourceKind::Invoices, ExportFormat::Excel.extension(), now),
            "Invoices_20260304_050607.xlsx"
        );
        assert_eq!(
            export_filename(ResourceKind::Errors, "csv", now),
            "ErrorLogs_20260304_050607.csv"
        );
    }

    #[test]
    fn test_rows_to_csv_uses_table_columns() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let rows = vec![Invoice {
            id: "i1".to_string(),
            invoice_number: "INV-1".to_string(),
            tenant_name: "Acme, Inc".to_string(),
            amount: 1200.0,
            status: InvoiceStatus::Paid,
            ..Invoice::default()
        }];
        let csv = rows_to_csv(&rows, today);
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("Invoice,Tenant,Amount,Status"));
        assert_eq!(
            lines.next().unwrap(),
            "INV-1,\"Acme, Inc\",\"$1,200.00\",Paid,-,-,-"
        );
    }
}

//! Row matching for committed filters
//!
//! Used by the in-memory backend to answer list queries the way the server
//! does. The free-text `search` filter supports:
//! - Plain text: matches against each row's searchable text
//! - Field prefix: `field:value` for a specific field (e.g. `status:trial`)
//! - Negation with `!` prefix
//! - Multiple terms separated by spaces, all must match (AND logic)

use super::query::{FilterValue, Filters};

/// Filter key carrying free-text search
pub const SEARCH_FIELD: &str = "search";

/// Field access needed to match a row against filters
pub trait Matchable {
    /// Values searched by plain terms
    fn search_text(&self) -> Vec<String>;

    /// Scalar value of a named field, lowercase comparison applies
    fn field_value(&self, field: &str) -> Option<String>;

    /// Date of a named field, used by range filters
    fn field_date(&self, field: &str) -> Option<chrono::NaiveDate>;
}

/// Check a row against every committed filter
pub fn row_matches<R: Matchable + ?Sized>(row: &R, filters: &Filters) -> bool {
    filters.iter().all(|(field, value)| match value {
        FilterValue::Text(text) if field == SEARCH_FIELD => search_matches(row, text),
        FilterValue::Text(text) => row
            .field_value(field)
            .is_some_and(|v| v.eq_ignore_ascii_case(text.trim())),
        FilterValue::Range(range) => row.field_date(field).is_some_and(|d| range.contains(d)),
    })
}

/// Evaluate a free-text search expression
pub fn search_matches<R: Matchable + ?Sized>(row: &R, search: &str) -> bool {
    let terms: Vec<&str> = search.split_whitespace().collect();
    if terms.is_empty() {
        return true;
    }

    let haystacks: Vec<String> = row.search_text().iter().map(|s| s.to_lowercase()).collect();

    terms.iter().all(|term| {
        let (negated, term) = match term.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, *term),
        };

        let matches = if let Some((field, value)) = term.split_once(':') {
            let value = value.to_lowercase();
            row.field_value(&field.to_lowercase())
                .is_some_and(|v| v.to_lowercase().contains(&value))
        } else {
            let value = term.to_lowercase();
            haystacks.iter().any(|h| h.contains(&value))
        };

        if negated { !matches } else { matches }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::query::DateRange;
    use chrono::NaiveDate;

    struct Row {
        name: &'static str,
        status: &'static str,
        created: NaiveDate,
    }

    impl Matchable for Row {
        fn search_text(&self) -> Vec<String> {
            vec![self.name.to_string()]
        }

        fn field_value(&self, field: &str) -> Option<String> {
            match field {
                "name" => Some(self.name.to_string()),
                "status" => Some(self.status.to_string()),
                _ => None,
            }
        }

        fn field_date(&self, field: &str) -> Option<NaiveDate> {
            (field == "createdAt").then_some(self.created)
        }
    }

    fn acme() -> Row {
        Row {
            name: "Acme Corp",
            status: "active",
            created: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
        }
    }

    #[test]
    fn test_plain_search() {
        let row = acme();
        assert!(search_matches(&row, "acme"));
        assert!(search_matches(&row, "ACME corp"));
        assert!(!search_matches(&row, "beta"));
        assert!(search_matches(&row, "  "));
    }

    #[test]
    fn test_field_prefix_and_negation() {
        let row = acme();
        assert!(search_matches(&row, "status:act"));
        assert!(!search_matches(&row, "!status:active"));
        assert!(search_matches(&row, "acme !status:suspended"));
        // Unknown field prefix never matches
        assert!(!search_matches(&row, "plan:pro"));
    }

    #[test]
    fn test_row_matches_choice_and_range() {
        let row = acme();
        let mut filters = Filters::new();
        filters.set_text("status", "Active");
        assert!(row_matches(&row, &filters));

        filters.set_range(
            "createdAt",
            DateRange {
                from: NaiveDate::from_ymd_opt(2026, 3, 1),
                to: None,
            },
        );
        assert!(!row_matches(&row, &filters));

        filters.remove("createdAt");
        filters.set_text("status", "suspended");
        assert!(!row_matches(&row, &filters));
    }
}

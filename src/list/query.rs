//! List query state shared by every paginated resource
//!
//! A `ListQuery` is the committed view state of one list page: which page,
//! how many rows, how the rows are sorted and which filters are active.
//! Page containers own one each and turn it into request parameters.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use super::table::SortState;

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    #[must_use]
    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }
}

/// Inclusive date range filter. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = self.from.map(|d| d.to_string()).unwrap_or_else(|| "…".to_string());
        let to = self.to.map(|d| d.to_string()).unwrap_or_else(|| "…".to_string());
        write!(f, "{}..{}", from, to)
    }
}

/// A single filter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Range(DateRange),
}

impl FilterValue {
    /// Empty text and fully open ranges carry no constraint
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.trim().is_empty(),
            FilterValue::Range(r) => r.is_open(),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s.as_str()),
            FilterValue::Range(_) => None,
        }
    }

    #[must_use]
    pub fn as_range(&self) -> Option<&DateRange> {
        match self {
            FilterValue::Range(r) => Some(r),
            FilterValue::Text(_) => None,
        }
    }
}

/// Committed filter set keyed by field name.
///
/// Empty values are never stored, so an all-cleared set compares equal to
/// `Filters::default()`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filters(BTreeMap<String, FilterValue>);

impl Filters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, removing it when the value is empty
    pub fn set(&mut self, field: &str, value: FilterValue) {
        if value.is_empty() {
            self.0.remove(field);
        } else {
            self.0.insert(field.to_string(), value);
        }
    }

    pub fn set_text(&mut self, field: &str, text: impl Into<String>) {
        self.set(field, FilterValue::Text(text.into()));
    }

    pub fn set_range(&mut self, field: &str, range: DateRange) {
        self.set(field, FilterValue::Range(range));
    }

    pub fn remove(&mut self, field: &str) {
        self.0.remove(field);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.0.get(field)
    }

    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FilterValue::as_text)
    }

    #[must_use]
    pub fn range(&self, field: &str) -> Option<&DateRange> {
        self.get(field).and_then(FilterValue::as_range)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Short human-readable summary, e.g. `status=suspended search=acme`
    #[must_use]
    pub fn summary(&self) -> String {
        self.iter()
            .map(|(k, v)| match v {
                FilterValue::Text(s) => format!("{}={}", k, s.trim()),
                FilterValue::Range(r) => format!("{}={}", k, r),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Flatten into request parameters.
    ///
    /// Date ranges on field `f` become `fFrom` / `fTo`.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        for (key, value) in self.iter() {
            match value {
                FilterValue::Text(s) => params.push((key.to_string(), s.trim().to_string())),
                FilterValue::Range(r) => {
                    if let Some(from) = r.from {
                        params.push((format!("{}From", key), from.format("%Y-%m-%d").to_string()));
                    }
                    if let Some(to) = r.to {
                        params.push((format!("{}To", key), to.format("%Y-%m-%d").to_string()));
                    }
                }
            }
        }
        params
    }
}

/// Committed list state for one page container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    page: u32,
    limit: u32,
    pub sort: SortState,
    pub filters: Filters,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, "", SortOrder::Asc)
    }
}

impl ListQuery {
    /// Create a query on page 1. A zero limit falls back to the default size.
    pub fn new(limit: u32, sort_by: &str, sort_order: SortOrder) -> Self {
        Self {
            page: 1,
            limit: if limit == 0 { DEFAULT_PAGE_SIZE } else { limit },
            sort: SortState::new(sort_by, sort_order),
            filters: Filters::default(),
        }
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Move to a page (values below 1 are raised to 1)
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Change the page size. Always returns to page 1.
    pub fn set_page_size(&mut self, limit: u32) {
        if limit > 0 {
            self.limit = limit;
        }
        self.page = 1;
    }

    /// Replace the committed filters and return to page 1
    pub fn apply_filters(&mut self, filters: Filters) {
        self.filters = filters;
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.apply_filters(Filters::default());
    }

    /// Column header click. Stays on the current page.
    pub fn toggle_sort(&mut self, field: &str) -> SortOrder {
        self.sort.click(field)
    }

    /// Pull the page back into `[1, total_pages]`. Returns true if it moved.
    pub fn clamp_to(&mut self, total_pages: u32) -> bool {
        let clamped = self.page.clamp(1, total_pages.max(1));
        let moved = clamped != self.page;
        self.page = clamped;
        moved
    }

    /// Request parameters in wire order
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        if !self.sort.field.is_empty() {
            params.push(("sortBy".to_string(), self.sort.field.clone()));
            params.push(("sortOrder".to_string(), self.sort.order.as_str().to_string()));
        }
        params.extend(self.filters.to_params());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_change_resets_page() {
        let mut query = ListQuery::new(20, "name", SortOrder::Asc);
        for start in [2, 5, 40] {
            query.set_page(start);
            query.set_page_size(50);
            assert_eq!(query.page(), 1);
            assert_eq!(query.limit(), 50);
        }
    }

    #[test]
    fn test_zero_page_size_is_ignored() {
        let mut query = ListQuery::new(0, "", SortOrder::Asc);
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);
        query.set_page(3);
        query.set_page_size(0);
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_sort_toggle() {
        let mut query = ListQuery::new(20, "", SortOrder::Asc);
        assert_eq!(query.toggle_sort("name"), SortOrder::Asc);
        assert_eq!(query.toggle_sort("name"), SortOrder::Desc);
        // Different column resets to ascending regardless of previous order
        assert_eq!(query.toggle_sort("createdAt"), SortOrder::Asc);
        assert_eq!(query.sort.field, "createdAt");
    }

    #[test]
    fn test_apply_then_clear_matches_initial() {
        let initial = ListQuery::new(20, "name", SortOrder::Asc);
        let mut query = initial.clone();

        let mut filters = Filters::new();
        filters.set_text("status", "suspended");
        filters.set_range(
            "createdAt",
            DateRange {
                from: NaiveDate::from_ymd_opt(2026, 1, 1),
                to: None,
            },
        );
        query.apply_filters(filters);
        assert_eq!(query.filters.len(), 2);

        query.clear_filters();
        assert_eq!(query.filters, initial.filters);
        assert_eq!(query, initial);
    }

    #[test]
    fn test_empty_values_are_not_stored() {
        let mut filters = Filters::new();
        filters.set_text("search", "   ");
        filters.set_range("date", DateRange::default());
        assert!(filters.is_empty());

        filters.set_text("search", "acme");
        filters.set_text("search", "");
        assert!(filters.is_empty());
    }

    #[test]
    fn test_clamp_to_total_pages() {
        let mut query = ListQuery::new(10, "", SortOrder::Asc);
        query.set_page(9);
        assert!(query.clamp_to(4));
        assert_eq!(query.page(), 4);
        assert!(!query.clamp_to(4));
        assert!(query.clamp_to(0));
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_params_order_and_ranges() {
        let mut query = ListQuery::new(10, "dueDate", SortOrder::Desc);
        let mut filters = Filters::new();
        filters.set_text("status", "unpaid");
        filters.set_range(
            "date",
            DateRange {
                from: NaiveDate::from_ymd_opt(2026, 3, 1),
                to: NaiveDate::from_ymd_opt(2026, 3, 31),
            },
        );
        query.apply_filters(filters);

        let params = query.to_params();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["page", "limit", "sortBy", "sortOrder", "dateFrom", "dateTo", "status"]
        );
        assert_eq!(params[3].1, "desc");
        assert_eq!(params[4].1, "2026-03-01");
    }

    #[test]
    fn test_date_range_contains() {
        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2026, 1, 10),
            to: None,
        };
        assert!(range.contains(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2026, 1, 9).unwrap()));
    }
}

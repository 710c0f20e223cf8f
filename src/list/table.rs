//! Data table contract: render-state selection, column declarations, sort
//! toggling and per-row actions
//!
//! Nothing here renders. The CLI (`display`) and the TUI (`tui::ui::table`)
//! both consume these declarations.

use chrono::NaiveDate;

use super::query::SortOrder;

/// What the table body should show
#[derive(Debug, PartialEq)]
pub enum TableView<'a, T> {
    /// Placeholder rows while the first page is loading
    Skeleton(u32),
    /// Settled with nothing to show
    Empty,
    /// Populated rows, possibly stale while a refetch is in flight
    Rows(&'a [T]),
}

/// Pick the table body state. Precedence: skeleton, empty, rows.
pub fn table_view<T>(rows: &[T], loading: bool, limit: u32) -> TableView<'_, T> {
    if rows.is_empty() {
        if loading {
            TableView::Skeleton(limit)
        } else {
            TableView::Empty
        }
    } else {
        TableView::Rows(rows)
    }
}

/// Active sort column and direction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    pub field: String,
    pub order: SortOrder,
}

impl SortState {
    pub fn new(field: &str, order: SortOrder) -> Self {
        Self {
            field: field.to_string(),
            order,
        }
    }

    /// Header click: same column flips the order, another column starts ascending
    pub fn click(&mut self, field: &str) -> SortOrder {
        if self.field == field {
            self.order = self.order.toggled();
        } else {
            self.field = field.to_string();
            self.order = SortOrder::Asc;
        }
        self.order
    }

    #[must_use]
    pub fn is_active(&self, field: &str) -> bool {
        !self.field.is_empty() && self.field == field
    }
}

/// Semantic color of a cell, mapped to concrete colors by each front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Plain,
    Positive,
    Info,
    Warning,
    Negative,
    Muted,
}

/// One declared table column
pub struct Column<R> {
    /// Sort field sent to the backend
    pub field: &'static str,
    pub title: &'static str,
    pub width: u16,
    pub sortable: bool,
    pub cell: fn(&R, NaiveDate) -> String,
    pub tone: Option<fn(&R, NaiveDate) -> Tone>,
}

impl<R> Column<R> {
    pub const fn new(field: &'static str, title: &'static str, width: u16, cell: fn(&R, NaiveDate) -> String) -> Self {
        Self {
            field,
            title,
            width,
            sortable: false,
            cell,
            tone: None,
        }
    }

    #[must_use]
    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    #[must_use]
    pub const fn toned(mut self, tone: fn(&R, NaiveDate) -> Tone) -> Self {
        self.tone = Some(tone);
        self
    }

    pub fn render(&self, row: &R, today: NaiveDate) -> String {
        (self.cell)(row, today)
    }

    pub fn tone_of(&self, row: &R, today: NaiveDate) -> Tone {
        self.tone.map(|f| f(row, today)).unwrap_or_default()
    }
}

/// Apply a header click if the column is sortable.
///
/// Returns the new order, or `None` when the column does not sort.
pub fn click_header<R>(columns: &[Column<R>], index: usize, sort: &mut SortState) -> Option<SortOrder> {
    let column = columns.get(index)?;
    if !column.sortable {
        return None;
    }
    Some(sort.click(column.field))
}

/// Index of the column under terminal column `x` in a bordered table.
///
/// Columns are laid out left to right with one cell of spacing; the last
/// column takes whatever remains. Spacing and the border hit nothing.
#[must_use]
pub fn column_at(widths: &[u16], x: u16) -> Option<usize> {
    let mut start = 1u16;
    for (i, width) in widths.iter().enumerate() {
        if x < start {
            return None;
        }
        let end = start.saturating_add(*width);
        if x < end || i + 1 == widths.len() {
            return Some(i);
        }
        start = end.saturating_add(1);
    }
    None
}

/// Row-level actions across every list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    View,
    // Tenants
    Suspend,
    Activate,
    Trial,
    Subscription,
    ChangeState,
    Deactivate,
    // Invoices
    Pay,
    Receipt,
    // Deleted documents
    Restore,
    Upload,
    // Error logs
    Resolve,
}

impl RowAction {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RowAction::View => "View details",
            RowAction::Suspend => "Suspend",
            RowAction::Activate => "Activate",
            RowAction::Trial => "Manage trial",
            RowAction::Subscription => "Manage subscription",
            RowAction::ChangeState => "Change state",
            RowAction::Deactivate => "Deactivate",
            RowAction::Pay => "Pay",
            RowAction::Receipt => "Receipt",
            RowAction::Restore => "Restore",
            RowAction::Upload => "Upload file",
            RowAction::Resolve => "Mark resolved",
        }
    }

    /// Actions that change server state ask for confirmation in the UI
    #[must_use]
    pub fn is_destructive(self) -> bool {
        matches!(self, RowAction::Suspend | RowAction::Deactivate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_view_precedence() {
        let empty: [u8; 0] = [];
        assert_eq!(table_view(&empty, true, 20), TableView::Skeleton(20));
        assert_eq!(table_view(&empty, false, 20), TableView::Empty);

        // Stale rows stay visible during a background refetch
        let rows = [1u8, 2];
        assert_eq!(table_view(&rows, true, 20), TableView::Rows(&rows[..]));
        assert_eq!(table_view(&rows, false, 20), TableView::Rows(&rows[..]));
    }

    #[test]
    fn test_sort_click_same_column_twice() {
        let mut sort = SortState::default();
        assert_eq!(sort.click("name"), SortOrder::Asc);
        assert_eq!(sort.click("name"), SortOrder::Desc);
        assert_eq!(sort.click("name"), SortOrder::Asc);
    }

    #[test]
    fn test_sort_click_other_column_resets() {
        let mut sort = SortState::new("name", SortOrder::Desc);
        assert_eq!(sort.click("createdAt"), SortOrder::Asc);
        assert!(sort.is_active("createdAt"));
        assert!(!sort.is_active("name"));
    }

    #[test]
    fn test_column_at() {
        let widths = [4, 6, 3];
        assert_eq!(column_at(&widths, 0), None);
        assert_eq!(column_at(&widths, 1), Some(0));
        assert_eq!(column_at(&widths, 4), Some(0));
        assert_eq!(column_at(&widths, 5), None);
        assert_eq!(column_at(&widths, 6), Some(1));
        assert_eq!(column_at(&widths, 13), Some(2));
        assert_eq!(column_at(&widths, 80), Some(2));
        assert_eq!(column_at(&[], 3), None);
    }

    #[test]
    fn test_only_sortable_columns_react() {
        let columns: Vec<Column<u32>> = vec![
            Column::<u32>::new("id", "ID", 6, |r, _| r.to_string()).sortable(),
            Column::<u32>::new("actions", "Actions", 10, |_, _| String::new()),
        ];
        let mut sort = SortState::default();
        assert_eq!(click_header(&columns, 1, &mut sort), None);
        assert_eq!(sort, SortState::default());
        assert_eq!(click_header(&columns, 0, &mut sort), Some(SortOrder::Asc));
        assert_eq!(click_header(&columns, 9, &mut sort), None);
    }
}

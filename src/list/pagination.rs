//! Pagination control: page-number windowing and navigation bounds

/// Page sizes offered by the page-size selector
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 20, 50, 100];

/// Show every page number up to this many pages
const FULL_WINDOW_MAX: u32 = 7;

/// An entry in the rendered page-number strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Compute the visible page numbers for the pagination strip.
///
/// Up to 7 pages are shown in full. Beyond that the first and last page are
/// always shown, with a run of three consecutive pages centred on `current`
/// (shifted to stay inside `2..=total_pages-1`) and an ellipsis wherever two
/// neighbouring shown pages are more than one apart.
#[must_use]
pub fn page_window(current: u32, total_pages: u32) -> Vec<PageItem> {
    let total = total_pages.max(1);
    if total <= FULL_WINDOW_MAX {
        return (1..=total).map(PageItem::Page).collect();
    }

    let current = current.clamp(1, total);
    let start = current.saturating_sub(1).clamp(2, total - 3);
    let end = start + 2;

    let mut shown = vec![1];
    shown.extend(start..=end);
    shown.push(total);

    let mut items = Vec::with_capacity(shown.len() + 2);
    let mut previous: Option<u32> = None;
    for page in shown {
        if let Some(prev) = previous
            && page - prev > 1
        {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(page));
        previous = Some(page);
    }
    items
}

/// Pagination state as seen by the control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationControl {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl PaginationControl {
    #[must_use]
    pub fn new(current_page: u32, total_pages: u32, total_items: u64, items_per_page: u32) -> Self {
        Self {
            current_page: current_page.max(1),
            total_pages: total_pages.max(1),
            total_items,
            items_per_page: items_per_page.max(1),
        }
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Page to emit for a click, or `None` for the current or an out-of-range page
    #[must_use]
    pub fn go_to(&self, page: u32) -> Option<u32> {
        if page == self.current_page || page < 1 || page > self.total_pages {
            None
        } else {
            Some(page)
        }
    }

    #[must_use]
    pub fn next(&self) -> Option<u32> {
        self.go_to(self.current_page.saturating_add(1))
    }

    #[must_use]
    pub fn previous(&self) -> Option<u32> {
        self.go_to(self.current_page.saturating_sub(1))
    }

    #[must_use]
    pub fn first(&self) -> Option<u32> {
        self.go_to(1)
    }

    #[must_use]
    pub fn last(&self) -> Option<u32> {
        self.go_to(self.total_pages)
    }

    #[must_use]
    pub fn window(&self) -> Vec<PageItem> {
        page_window(self.current_page, self.total_pages)
    }

    /// "Showing 21-30 of 95"
    #[must_use]
    pub fn range_label(&self) -> String {
        if self.total_items == 0 {
            return "No results".to_string();
        }
        let start = u64::from(self.current_page - 1) * u64::from(self.items_per_page) + 1;
        if start > self.total_items {
            return format!("Showing 0 of {}", self.total_items);
        }
        let end = (start + u64::from(self.items_per_page) - 1).min(self.total_items);
        format!("Showing {}-{} of {}", start, end, self.total_items)
    }
}

/// Next entry in the page-size selector, wrapping around
#[must_use]
pub fn next_page_size(current: u32) -> u32 {
    let idx = PAGE_SIZE_OPTIONS.iter().position(|&s| s == current);
    match idx {
        Some(i) => PAGE_SIZE_OPTIONS[(i + 1) % PAGE_SIZE_OPTIONS.len()],
        None => PAGE_SIZE_OPTIONS[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::{Ellipsis, Page};

    fn pages(items: &[PageItem]) -> Vec<u32> {
        items
            .iter()
            .filter_map(|i| match i {
                Page(p) => Some(*p),
                Ellipsis => None,
            })
            .collect()
    }

    #[test]
    fn test_small_totals_show_everything() {
        assert_eq!(page_window(1, 1), vec![Page(1)]);
        assert_eq!(page_window(4, 7), (1..=7).map(Page).collect::<Vec<_>>());
        // Zero pages still renders page 1
        assert_eq!(page_window(1, 0), vec![Page(1)]);
    }

    #[test]
    fn test_window_in_the_middle() {
        assert_eq!(
            page_window(10, 20),
            vec![Page(1), Ellipsis, Page(9), Page(10), Page(11), Ellipsis, Page(20)]
        );
    }

    #[test]
    fn test_window_at_edges() {
        assert_eq!(
            page_window(1, 20),
            vec![Page(1), Page(2), Page(3), Page(4), Ellipsis, Page(20)]
        );
        assert_eq!(
            page_window(20, 20),
            vec![Page(1), Ellipsis, Page(17), Page(18), Page(19), Page(20)]
        );
        assert_eq!(
            page_window(3, 8),
            vec![Page(1), Page(2), Page(3), Page(4), Ellipsis, Page(8)]
        );
    }

    #[test]
    fn test_window_never_leaves_range() {
        for total in 0..=40 {
            for current in 0..=45 {
                let items = page_window(current, total);
                let shown = pages(&items);
                let max = total.max(1);
                assert!(shown.iter().all(|&p| p >= 1 && p <= max), "{current}/{total}");
                assert_eq!(shown.first(), Some(&1));
                assert_eq!(shown.last(), Some(&max));
                // Strictly increasing, no duplicates
                assert!(shown.windows(2).all(|w| w[0] < w[1]));
                // Ellipsis only where pages are actually skipped
                for (i, item) in items.iter().enumerate() {
                    if *item == Ellipsis {
                        let (Page(a), Page(b)) = (items[i - 1], items[i + 1]) else {
                            panic!("ellipsis must sit between pages");
                        };
                        assert!(b - a > 1);
                    }
                }
            }
        }
    }

    #[test]
    fn test_navigation_bounds() {
        let control = PaginationControl::new(1, 5, 45, 10);
        assert!(!control.has_previous());
        assert_eq!(control.previous(), None);
        assert_eq!(control.next(), Some(2));
        assert_eq!(control.go_to(1), None);
        assert_eq!(control.go_to(6), None);
        assert_eq!(control.go_to(0), None);
        assert_eq!(control.last(), Some(5));

        let at_end = PaginationControl::new(5, 5, 45, 10);
        assert_eq!(at_end.next(), None);
        assert_eq!(at_end.previous(), Some(4));
    }

    #[test]
    fn test_range_label() {
        assert_eq!(PaginationControl::new(3, 5, 45, 10).range_label(), "Showing 21-30 of 45");
        assert_eq!(PaginationControl::new(5, 5, 45, 10).range_label(), "Showing 41-45 of 45");
        assert_eq!(PaginationControl::new(1, 1, 0, 10).range_label(), "No results");
        // Past the last page
        assert_eq!(PaginationControl::new(9, 3, 48, 20).range_label(), "Showing 0 of 48");
    }

    #[test]
    fn test_next_page_size_cycles() {
        assert_eq!(next_page_size(10), 20);
        assert_eq!(next_page_size(100), 10);
        assert_eq!(next_page_size(33), 10);
    }
}

//! Normalized page of results
//!
//! Every list endpoint is reduced to this shape at the API boundary, so
//! nothing above the client has to care which envelope the backend used.

/// Number of pages for a result set. Never less than 1.
#[must_use]
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(limit));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// One page of a paginated list
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Build a page, deriving `total_pages` and enforcing `items.len() <= limit`
    pub fn new(mut items: Vec<T>, page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        if items.len() > limit as usize {
            tracing::warn!(
                received = items.len(),
                limit,
                "Backend returned more rows than requested, truncating"
            );
            items.truncate(limit as usize);
        }
        // A page can never report fewer rows in total than it carries
        let total = total.max(items.len() as u64);
        Self {
            items,
            page: page.max(1),
            limit,
            total,
            total_pages: total_pages(total, limit),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

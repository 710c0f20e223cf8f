//! Page container: one resource list with its query, filters, slice,
//! cursor and record modal
//!
//! Everything here is synchronous. Operations that change the query hand
//! back a `FetchTicket`; the app turns tickets into spawned fetches and
//! routes the answers back through `loaded` / `failed`.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDate};

use crate::list::pagination::next_page_size;
use crate::list::{
    FilterPanel, Filters, ListQuery, Page, PaginationControl, RequestId, Resource, ResourceKind, RowAction, Slice,
    click_header, column_at,
};
use crate::modal::{ActionPlan, Modal, Submission};
use crate::tui::event::KeyAction;

use super::state::ListState;

/// A fetch the app must issue
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub kind: ResourceKind,
    pub request: RequestId,
    pub query: ListQuery,
}

/// Outcome of a key press inside the record modal
#[derive(Debug)]
pub enum ModalInput {
    Ignored,
    Changed,
    Closed,
    Submit(Submission),
    Yank(String),
}

/// How opening a row action turned out
#[derive(Debug)]
pub enum Opened {
    /// A modal is now showing
    Modal,
    /// Work to run straight away
    Run(Submission),
    /// Nothing selected or the action does not apply
    Nothing,
}

#[derive(Debug)]
pub struct ListPage<R: Resource> {
    pub query: ListQuery,
    pub panel: FilterPanel,
    pub slice: Slice<Page<R>>,
    pub cursor: ListState,
    pub modal: Option<Modal<R>>,
    /// Bumped every time filters are committed
    generation: u64,
    /// Live-mode filters waiting for the debounce to elapse
    pending: Option<(Filters, Instant)>,
    debounce: Duration,
    pub last_loaded: Option<DateTime<Local>>,
}

impl<R: Resource> ListPage<R> {
    pub fn new(page_size: u32, debounce: Duration) -> Self {
        let (sort_by, order) = R::default_sort();
        Self {
            query: ListQuery::new(page_size, sort_by, order),
            panel: FilterPanel::new(R::filter_fields(), R::filter_mode()),
            slice: Slice::new(),
            cursor: ListState::default(),
            modal: None,
            generation: 0,
            pending: None,
            debounce,
            last_loaded: None,
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[R] {
        self.slice.rows()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&R> {
        self.rows().get(self.cursor.selected)
    }

    /// First fetch when the view is shown
    pub fn ensure_loaded(&mut self) -> Option<FetchTicket> {
        (!self.slice.has_requested()).then(|| self.refetch())
    }

    /// Issue the current query again
    pub fn refetch(&mut self) -> FetchTicket {
        let request = self.slice.request();
        tracing::debug!(resource = %R::KIND, request_id = request.get(), page = self.query.page(), "list request");
        FetchTicket {
            kind: R::KIND,
            request,
            query: self.query.clone(),
        }
    }

    /// Apply a fetched page. Pulls the page back in range and refetches when
    /// the result set shrank below the requested page.
    pub fn loaded(&mut self, request: RequestId, page: Page<R>) -> Option<FetchTicket> {
        let total_pages = page.total_pages;
        if !self.slice.succeed(request, page) {
            return None;
        }
        self.last_loaded = Some(Local::now());
        self.cursor.clamp(self.rows().len());
        if self.query.clamp_to(total_pages) {
            tracing::debug!(resource = %R::KIND, page = self.query.page(), "page out of range, clamping");
            return Some(self.refetch());
        }
        None
    }

    /// Record a failed fetch. Returns false for stale failures.
    pub fn failed(&mut self, request: RequestId, error: String) -> bool {
        self.slice.fail(request, error)
    }

    // ------------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn pagination(&self) -> PaginationControl {
        match self.slice.data() {
            Some(page) => PaginationControl::new(self.query.page(), page.total_pages, page.total, self.query.limit()),
            None => PaginationControl::new(self.query.page(), 1, 0, self.query.limit()),
        }
    }

    fn move_to(&mut self, target: Option<u32>) -> Option<FetchTicket> {
        let page = target?;
        self.query.set_page(page);
        self.cursor.move_to_top();
        Some(self.refetch())
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        let target = self.pagination().next();
        self.move_to(target)
    }

    pub fn prev_page(&mut self) -> Option<FetchTicket> {
        let target = self.pagination().previous();
        self.move_to(target)
    }

    pub fn first_page(&mut self) -> Option<FetchTicket> {
        let target = self.pagination().first();
        self.move_to(target)
    }

    pub fn last_page(&mut self) -> Option<FetchTicket> {
        let target = self.pagination().last();
        self.move_to(target)
    }

    pub fn go_to(&mut self, page: u32) -> Option<FetchTicket> {
        let target = self.pagination().go_to(page);
        self.move_to(target)
    }

    /// Step through the page-size options; always lands on page 1
    pub fn cycle_page_size(&mut self) -> FetchTicket {
        self.query.set_page_size(next_page_size(self.query.limit()));
        self.cursor.move_to_top();
        self.refetch()
    }

    // ------------------------------------------------------------------------
    // Sorting
    // ------------------------------------------------------------------------

    /// `(field, title)` of every sortable column
    #[must_use]
    pub fn sortable_fields(&self) -> Vec<(&'static str, &'static str)> {
        R::columns()
            .into_iter()
            .filter(|c| c.sortable)
            .map(|c| (c.field, c.title))
            .collect()
    }

    pub fn sort_by(&mut self, field: &str) -> FetchTicket {
        let order = self.query.toggle_sort(field);
        tracing::debug!(resource = %R::KIND, field, order = order.as_str(), "sort changed");
        self.refetch()
    }

    /// Mouse click on the header row at terminal column `x`
    pub fn click_header_at(&mut self, x: u16) -> Option<FetchTicket> {
        let columns = R::columns();
        let widths: Vec<u16> = columns.iter().map(|c| c.width).collect();
        let index = column_at(&widths, x)?;
        let order = click_header(&columns, index, &mut self.query.sort)?;
        tracing::debug!(resource = %R::KIND, field = columns[index].field, order = order.as_str(), "sort changed");
        Some(self.refetch())
    }

    // ------------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------------

    #[must_use]
    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn has_pending_filters(&self) -> bool {
        self.pending.is_some()
    }

    fn commit(&mut self, filters: Filters) -> FetchTicket {
        self.pending = None;
        self.query.apply_filters(filters);
        self.generation += 1;
        self.panel.sync(&self.query.filters, self.generation);
        self.cursor.move_to_top();
        self.refetch()
    }

    /// Run an edit against the filter panel. Live panels schedule the emitted
    /// filters behind the debounce.
    pub fn edit_filters(&mut self, edit: impl FnOnce(&mut FilterPanel) -> Option<Filters>) {
        if let Some(filters) = edit(&mut self.panel) {
            self.pending = Some((filters, Instant::now() + self.debounce));
        }
    }

    /// Explicit apply of the current draft
    pub fn apply_filters(&mut self) -> FetchTicket {
        let draft = self.panel.apply();
        self.commit(draft)
    }

    pub fn clear_filters(&mut self) -> FetchTicket {
        let empty = self.panel.clear();
        self.commit(empty)
    }

    /// Commit debounced live filters once their deadline passed
    pub fn tick(&mut self, now: Instant) -> Option<FetchTicket> {
        let due = self.pending.as_ref().is_some_and(|(_, deadline)| *deadline <= now);
        if !due {
            return None;
        }
        let (filters, _) = self.pending.take()?;
        if filters == self.query.filters {
            return None;
        }
        Some(self.commit(filters))
    }

    // ------------------------------------------------------------------------
    // Row actions and the record modal
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn actions(&self, today: NaiveDate) -> Vec<RowAction> {
        self.selected().map(|row| row.actions(today)).unwrap_or_default()
    }

    /// Start a row action on the selected row.
    ///
    /// With `confirm_quick` off, suspend and activate skip their form and
    /// submit with its defaults.
    pub fn open_action(&mut self, action: RowAction, today: NaiveDate, confirm_quick: bool) -> Opened {
        let Some(row) = self.selected().cloned() else {
            return Opened::Nothing;
        };
        match row.plan(action, today) {
            Some(ActionPlan::Detail) => {
                self.modal = Some(Modal::detail(row));
                Opened::Modal
            }
            Some(ActionPlan::Form(form)) => {
                self.modal = Some(Modal::with_form(row, action, form));
                if !confirm_quick && matches!(action, RowAction::Suspend | RowAction::Activate) {
                    return match self.submit_modal(today) {
                        Some(submission) => Opened::Run(submission),
                        None => Opened::Modal,
                    };
                }
                Opened::Modal
            }
            Some(ActionPlan::Immediate(submission)) => Opened::Run(submission),
            None => Opened::Nothing,
        }
    }

    /// Validate the open form; `None` leaves the modal open with its errors
    pub fn submit_modal(&mut self, today: NaiveDate) -> Option<Submission> {
        self.modal.as_mut()?.submit(today)
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.modal.as_ref().is_some_and(|m| m.submitting)
    }

    /// Close the modal unless a submission is in flight
    pub fn close_modal(&mut self) -> bool {
        if self.is_submitting() {
            return false;
        }
        self.modal.take().is_some()
    }

    /// Keyboard handling for the open record modal
    pub fn modal_input(&mut self, action: KeyAction, today: NaiveDate) -> ModalInput {
        if action == KeyAction::Escape {
            return if self.close_modal() { ModalInput::Closed } else { ModalInput::Ignored };
        }
        let Some(modal) = self.modal.as_mut() else {
            return ModalInput::Ignored;
        };
        if modal.submitting {
            return ModalInput::Ignored;
        }

        let Some(form) = modal.form.as_mut() else {
            // Read-only detail view
            return match action {
                KeyAction::Select => {
                    self.modal = None;
                    ModalInput::Closed
                }
                KeyAction::MoveDown | KeyAction::MouseScrollDown | KeyAction::PageDown => {
                    modal.scroll = modal.scroll.saturating_add(1);
                    ModalInput::Changed
                }
                KeyAction::MoveUp | KeyAction::MouseScrollUp | KeyAction::PageUp => {
                    modal.scroll = modal.scroll.saturating_sub(1);
                    ModalInput::Changed
                }
                KeyAction::YankId => ModalInput::Yank(modal.target.id().to_string()),
                _ => ModalInput::Ignored,
            };
        };

        match action {
            KeyAction::Select => match self.submit_modal(today) {
                Some(submission) => ModalInput::Submit(submission),
                None => ModalInput::Changed,
            },
            KeyAction::FocusNext => {
                form.focus_next();
                ModalInput::Changed
            }
            KeyAction::FocusPrev => {
                form.focus_prev();
                ModalInput::Changed
            }
            KeyAction::CycleNext => {
                form.cycle(true);
                ModalInput::Changed
            }
            KeyAction::CyclePrev => {
                form.cycle(false);
                ModalInput::Changed
            }
            KeyAction::InputBackspace => {
                form.backspace();
                ModalInput::Changed
            }
            KeyAction::InputClear => {
                form.clear_focused();
                ModalInput::Changed
            }
            KeyAction::InputChar(c) => {
                form.type_char(c);
                ModalInput::Changed
            }
            _ => ModalInput::Ignored,
        }
    }

    /// The backend accepted the submission
    pub fn submission_succeeded(&mut self) {
        if self.is_submitting() {
            self.modal = None;
        }
    }

    /// The backend refused: keep the form and its values, show the reason
    pub fn submission_failed(&mut self, message: &str) {
        if let Some(modal) = self.modal.as_mut()
            && modal.submitting
        {
            modal.rejected(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::{QuickRange, SortOrder};
    use crate::models::{ActivityLog, Invoice, InvoiceStatus, Tenant, TenantStatus};

    fn tenants(n: usize) -> Vec<Tenant> {
        (0..n)
            .map(|i| Tenant {
                id: format!("t{}", i),
                name: format!("Tenant {}", i),
                status: TenantStatus::Active,
                ..Tenant::default()
            })
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn test_first_view_fetches_once() {
        let mut page: ListPage<Tenant> = ListPage::new(20, Duration::ZERO);
        let ticket = page.ensure_loaded().unwrap();
        assert_eq!(ticket.kind, ResourceKind::Tenants);
        assert_eq!(ticket.query.page(), 1);
        assert!(page.slice.is_loading());
        assert!(page.ensure_loaded().is_none());
    }

    #[test]
    fn test_header_click_sorts_sortable_columns() {
        let mut page: ListPage<Tenant> = ListPage::new(10, Duration::ZERO);
        // Name spans columns 1..=24, subdomain starts at 26 and does not sort
        assert!(page.click_header_at(30).is_none());
        assert!(page.query.sort.is_active("createdAt"));

        let ticket = page.click_header_at(3).unwrap();
        assert!(ticket.query.sort.is_active("name"));
        assert_eq!(ticket.query.sort.order, SortOrder::Asc);
        assert_eq!(page.click_header_at(3).unwrap().query.sort.order, SortOrder::Desc);
    }

    #[test]
    fn test_stale_page_is_dropped() {
        let mut page: ListPage<Tenant> = ListPage::new(10, Duration::ZERO);
        let first = page.refetch();
        page.slice.succeed(first.request, Page::new(tenants(10), 1, 10, 30));
        let slow = page.next_page().unwrap();
        let fast = page.next_page().unwrap();
        assert_eq!(fast.query.page(), 3);
        assert!(page.loaded(slow.request, Page::new(tenants(3), 9, 10, 30)).is_none());
        assert_eq!(page.rows().len(), 10);
        assert!(page.slice.is_loading());

        page.loaded(fast.request, Page::new(tenants(10), 3, 10, 30));
        assert!(!page.slice.is_loading());
        assert_eq!(page.pagination().current_page, 3);
    }

    #[test]
    fn test_shrunken_result_clamps_page() {
        let mut page: ListPage<Tenant> = ListPage::new(10, Duration::ZERO);
        page.query.set_page(5);
        let ticket = page.refetch();
        let again = page.loaded(ticket.request, Page::new(Vec::new(), 5, 10, 25)).unwrap();
        assert_eq!(again.query.page(), 3);
        assert_eq!(page.query.page(), 3);
    }

    #[test]
    fn test_page_size_returns_to_first_page() {
        let mut page: ListPage<Tenant> = ListPage::new(20, Duration::ZERO);
        page.query.set_page(4);
        let ticket = page.cycle_page_size();
        assert_eq!(ticket.query.page(), 1);
        assert_eq!(ticket.query.limit(), 50);
    }

    #[test]
    fn test_navigation_stays_in_range() {
        let mut page: ListPage<Tenant> = ListPage::new(10, Duration::ZERO);
        let ticket = page.refetch();
        page.loaded(ticket.request, Page::new(tenants(10), 1, 10, 25));
        assert!(page.prev_page().is_none());
        assert!(page.first_page().is_none());
        assert_eq!(page.last_page().unwrap().query.page(), 3);
        assert!(page.go_to(9).is_none());
    }

    #[test]
    fn test_sort_toggles_and_resets() {
        let mut page: ListPage<Tenant> = ListPage::new(10, Duration::ZERO);
        assert_eq!(page.query.sort.field, "createdAt");
        let ticket = page.sort_by("name");
        assert_eq!(ticket.query.sort.order, SortOrder::Asc);
        let ticket = page.sort_by("name");
        assert_eq!(ticket.query.sort.order, SortOrder::Desc);
        let ticket = page.sort_by("plan");
        assert_eq!(ticket.query.sort.field, "plan");
        assert_eq!(ticket.query.sort.order, SortOrder::Asc);
        assert!(page.sortable_fields().iter().any(|(f, _)| *f == "name"));
    }

    #[test]
    fn test_explicit_filters_apply_then_clear() {
        let mut page: ListPage<Tenant> = ListPage::new(10, Duration::ZERO);
        let initial = page.query.clone();
        page.query.set_page(3);
        page.edit_filters(|panel| {
            panel.focus_next();
            panel.cycle(true)
        });
        assert!(!page.has_pending_filters());

        let ticket = page.apply_filters();
        assert_eq!(ticket.query.page(), 1);
        assert_eq!(ticket.query.filters.text("status"), Some("active"));

        let ticket = page.clear_filters();
        assert_eq!(ticket.query.filters, initial.filters);
        assert!(page.panel.draft().is_empty());
    }

    #[test]
    fn test_live_filters_wait_for_debounce() {
        let mut page: ListPage<ActivityLog> = ListPage::new(10, Duration::from_millis(300));
        page.edit_filters(|panel| panel.type_char('x'));
        page.edit_filters(|panel| panel.type_char('y'));
        assert!(page.has_pending_filters());

        let now = Instant::now();
        assert!(page.tick(now).is_none());
        let ticket = page.tick(now + Duration::from_secs(1)).unwrap();
        assert_eq!(ticket.query.filters.text("search"), Some("xy"));
        assert!(!page.has_pending_filters());
        assert_eq!(page.generation(), 1);
    }

    #[test]
    fn test_quick_range_is_live_on_live_pages() {
        let mut page: ListPage<ActivityLog> = ListPage::new(10, Duration::ZERO);
        page.edit_filters(|panel| panel.quick_range(QuickRange::Last7Days, today()));
        let ticket = page.tick(Instant::now()).unwrap();
        assert!(ticket.query.filters.range("date").is_some());
    }

    #[test]
    fn test_modal_lifecycle() {
        let mut page: ListPage<Invoice> = ListPage::new(10, Duration::ZERO);
        let ticket = page.refetch();
        let invoice = Invoice {
            id: "i1".to_string(),
            invoice_number: "INV-1".to_string(),
            amount: 100.0,
            status: InvoiceStatus::Unpaid,
            due_date: NaiveDate::from_ymd_opt(2026, 4, 1),
            ..Invoice::default()
        };
        page.loaded(ticket.request, Page::new(vec![invoice], 1, 10, 1));

        assert!(matches!(page.open_action(RowAction::Receipt, today(), true), Opened::Nothing));
        assert!(matches!(page.open_action(RowAction::Pay, today(), true), Opened::Modal));
        // Bank transfers need a reference
        assert!(page.submit_modal(today()).is_none());
        let form = page.modal.as_mut().unwrap().form.as_mut().unwrap();
        form.set("transactionReference", "TX-1");
        assert!(page.submit_modal(today()).is_some());
        assert!(page.is_submitting());
        // No double submission and no closing while in flight
        assert!(page.submit_modal(today()).is_none());
        assert!(!page.close_modal());

        page.submission_failed("card declined");
        let modal = page.modal.as_ref().unwrap();
        assert!(!modal.submitting);
        assert!(modal.errors.iter().any(|(_, m)| m == "card declined"));

        page.submit_modal(today());
        page.submission_succeeded();
        assert!(page.modal.is_none());
    }

    #[test]
    fn test_form_keys_edit_and_submit() {
        let mut page: ListPage<Tenant> = ListPage::new(10, Duration::ZERO);
        let ticket = page.refetch();
        page.loaded(ticket.request, Page::new(tenants(1), 1, 10, 1));
        assert!(matches!(page.open_action(RowAction::Deactivate, today(), true), Opened::Modal));

        // Empty reason fails validation and keeps the modal
        assert!(matches!(page.modal_input(KeyAction::Select, today()), ModalInput::Changed));
        assert!(page.modal.as_ref().unwrap().errors.get("reason").is_some());

        for c in "contract ended".chars() {
            page.modal_input(KeyAction::InputChar(c), today());
        }
        match page.modal_input(KeyAction::Select, today()) {
            ModalInput::Submit(Submission::Mutation(m)) => {
                assert_eq!(m.body["reason"], "contract ended");
                assert_eq!(m.body["newStatus"], "deactivated");
            }
            other => panic!("expected submission, got {:?}", other),
        }
        // Escape is ignored while the request is in flight
        assert!(matches!(page.modal_input(KeyAction::Escape, today()), ModalInput::Ignored));
    }

    #[test]
    fn test_detail_modal_scrolls_and_closes() {
        let mut page: ListPage<Tenant> = ListPage::new(10, Duration::ZERO);
        let ticket = page.refetch();
        page.loaded(ticket.request, Page::new(tenants(2), 1, 10, 2));
        page.cursor.select(1, 2);
        assert!(matches!(page.open_action(RowAction::View, today(), true), Opened::Modal));
        page.modal_input(KeyAction::MoveDown, today());
        assert_eq!(page.modal.as_ref().unwrap().scroll, 1);
        match page.modal_input(KeyAction::YankId, today()) {
            ModalInput::Yank(id) => assert_eq!(id, "t1"),
            other => panic!("expected yank, got {:?}", other),
        }
        assert!(matches!(page.modal_input(KeyAction::Escape, today()), ModalInput::Closed));
        assert!(page.modal.is_none());
    }

    #[test]
    fn test_quick_actions_without_confirmation() {
        let mut page: ListPage<Tenant> = ListPage::new(10, Duration::ZERO);
        let ticket = page.refetch();
        page.loaded(ticket.request, Page::new(tenants(1), 1, 10, 1));

        match page.open_action(RowAction::Suspend, today(), false) {
            Opened::Run(Submission::Mutation(m)) => assert!(m.path.ends_with("/status")),
            other => panic!("expected immediate mutation, got {:?}", other),
        }
        assert!(page.is_submitting());

        let mut page: ListPage<Tenant> = ListPage::new(10, Duration::ZERO);
        let ticket = page.refetch();
        page.loaded(ticket.request, Page::new(tenants(1), 1, 10, 1));
        assert!(matches!(page.open_action(RowAction::Suspend, today(), true), Opened::Modal));
    }
}

//! Application state and core logic for the TUI
//!
//! This module contains the main App struct and all associated state management.
//! The architecture follows a TEA-inspired pattern with mutable state and method-based updates.
//! Background work (fetches, mutations, uploads, exports) is spawned through
//! the runtime's [`Spawner`] and reports back through the data channel.

mod page;
mod state;

pub use page::{FetchTicket, ListPage, ModalInput, Opened};
pub use state::{ListState, MenuState, ModalState, View};

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::sync::mpsc;

use crate::api::upload::upload_document;
use crate::api::{AdminApi, ApiError, Backend, Progress, fetch_page};
use crate::export::{ExportFormat, export_filename, rows_to_csv, write_export};
use crate::list::{ListQuery, QuickRange, RequestId, Resource, ResourceKind, RowAction, Slice};
use crate::modal::{FollowUp, Mutation, Submission, payment};
use crate::models::{
    ActivityLog, AppConfig, DeletedDocument, ErrorLog, Invoice, PlatformMetrics, Tenant, TenantStateRecord,
};
use crate::notify::{Level, Notifier};
use crate::session;
use crate::tui::event::{DataEvent, EventResult, InputEvent, InputMode, KeyAction, LoadedPage};
use crate::tui::runtime::Spawner;

/// Bind `$page` to the shared list page of `$kind` and evaluate `$body`
macro_rules! with_page {
    ($pages:expr, $kind:expr, |$page:ident| $body:expr) => {{
        let pages = $pages;
        match $kind {
            $crate::list::ResourceKind::Tenants => {
                let $page = &pages.tenants;
                $body
            }
            $crate::list::ResourceKind::TenantStates => {
                let $page = &pages.tenant_states;
                $body
            }
            $crate::list::ResourceKind::Invoices => {
                let $page = &pages.invoices;
                $body
            }
            $crate::list::ResourceKind::Activity => {
                let $page = &pages.activity;
                $body
            }
            $crate::list::ResourceKind::Errors => {
                let $page = &pages.errors;
                $body
            }
            $crate::list::ResourceKind::Documents => {
                let $page = &pages.documents;
                $body
            }
        }
    }};
}

/// Mutable counterpart of `with_page!`
macro_rules! with_page_mut {
    ($pages:expr, $kind:expr, |$page:ident| $body:expr) => {{
        let pages = $pages;
        match $kind {
            $crate::list::ResourceKind::Tenants => {
                let $page = &mut pages.tenants;
                $body
            }
            $crate::list::ResourceKind::TenantStates => {
                let $page = &mut pages.tenant_states;
                $body
            }
            $crate::list::ResourceKind::Invoices => {
                let $page = &mut pages.invoices;
                $body
            }
            $crate::list::ResourceKind::Activity => {
                let $page = &mut pages.activity;
                $body
            }
            $crate::list::ResourceKind::Errors => {
                let $page = &mut pages.errors;
                $body
            }
            $crate::list::ResourceKind::Documents => {
                let $page = &mut pages.documents;
                $body
            }
        }
    }};
}

pub(crate) use with_page;

/// Rows hidden behind the header, filter bar, table chrome and status lines
pub const CHROME_ROWS: u16 = 9;

/// Screen row of the first table body line
const TABLE_BODY_TOP: u16 = 6;

/// One page container per resource list
#[derive(Debug)]
pub struct Pages {
    pub tenants: ListPage<Tenant>,
    pub tenant_states: ListPage<TenantStateRecord>,
    pub invoices: ListPage<Invoice>,
    pub activity: ListPage<ActivityLog>,
    pub errors: ListPage<ErrorLog>,
    pub documents: ListPage<DeletedDocument>,
}

impl Pages {
    pub fn new(config: &AppConfig) -> Self {
        let size = config.list.page_size;
        let debounce = Duration::from_millis(config.list.search_debounce_ms);
        Self {
            tenants: ListPage::new(size, debounce),
            tenant_states: ListPage::new(size, debounce),
            invoices: ListPage::new(size, debounce),
            activity: ListPage::new(size, debounce),
            errors: ListPage::new(size, debounce),
            documents: ListPage::new(size, debounce),
        }
    }

    /// Route a fetched page to its container
    fn loaded(&mut self, request: RequestId, loaded: LoadedPage) -> Option<FetchTicket> {
        match loaded {
            LoadedPage::Tenants(page) => self.tenants.loaded(request, page),
            LoadedPage::TenantStates(page) => self.tenant_states.loaded(request, page),
            LoadedPage::Invoices(page) => self.invoices.loaded(request, page),
            LoadedPage::Activity(page) => self.activity.loaded(request, page),
            LoadedPage::Errors(page) => self.errors.loaded(request, page),
            LoadedPage::Documents(page) => self.documents.loaded(request, page),
        }
    }
}

/// Fetch one page of `kind` for `query`
pub async fn load_page<A: AdminApi>(api: &A, kind: ResourceKind, query: &ListQuery) -> Result<LoadedPage, ApiError> {
    Ok(match kind {
        ResourceKind::Tenants => LoadedPage::Tenants(fetch_page(api, query).await?),
        ResourceKind::TenantStates => LoadedPage::TenantStates(fetch_page(api, query).await?),
        ResourceKind::Invoices => LoadedPage::Invoices(fetch_page(api, query).await?),
        ResourceKind::Activity => LoadedPage::Activity(fetch_page(api, query).await?),
        ResourceKind::Errors => LoadedPage::Errors(fetch_page(api, query).await?),
        ResourceKind::Documents => LoadedPage::Documents(fetch_page(api, query).await?),
    })
}

/// Main application state
pub struct App {
    // Lifecycle
    pub running: bool,

    // View State
    pub current_view: View,
    pub previous_view: View,

    // App-level overlays (help, filter editing, menus)
    pub modal: ModalState,

    // One container per list, plus the dashboard slice
    pub pages: Pages,
    pub metrics: Slice<PlatformMetrics>,
    pub metrics_loaded: Option<DateTime<Local>>,
    metrics_stale: bool,

    // Injected notification service
    pub notifier: Box<dyn Notifier>,

    /// Advances on every tick, drives the spinner
    pub spinner: usize,

    // Configuration
    pub config: AppConfig,

    // Communication
    pub api: Arc<Backend>,
    pub data_tx: mpsc::Sender<DataEvent>,
    tasks: Spawner,
}

impl App {
    /// Create a new App bound to a backend and the data channel sender.
    ///
    /// Nothing is fetched until `start` is called.
    pub fn new(
        config: AppConfig,
        api: Arc<Backend>,
        data_tx: mpsc::Sender<DataEvent>,
        tasks: Spawner,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let view = View::from_setting(&config.display.default_view);
        Self {
            running: true,
            current_view: view,
            previous_view: view,
            modal: ModalState::None,
            pages: Pages::new(&config),
            metrics: Slice::new(),
            metrics_loaded: None,
            metrics_stale: false,
            notifier,
            spinner: 0,
            config,
            api,
            data_tx,
            tasks,
        }
    }

    /// Issue the first fetch for the startup view
    pub fn start(&mut self) {
        self.load_current_view();
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    #[must_use]
    pub fn current_kind(&self) -> Option<ResourceKind> {
        self.current_view.kind()
    }

    /// Size the list viewports to the terminal height
    pub fn set_viewport(&mut self, height: u16) {
        let rows = usize::from(height.saturating_sub(CHROME_ROWS)).max(1);
        for kind in ResourceKind::ALL {
            with_page_mut!(&mut self.pages, kind, |page| {
                page.cursor.visible_count = rows;
                let len = page.rows().len();
                page.cursor.clamp(len);
            });
        }
    }

    fn record_modal_open(&self, kind: ResourceKind) -> bool {
        with_page!(&self.pages, kind, |page| page.modal.is_some())
    }

    /// Text entry while editing filters or a form that is not in flight
    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        if self.modal.is_editing_filter() {
            return InputMode::TextEntry;
        }
        let Some(kind) = self.current_kind() else {
            return InputMode::Normal;
        };
        let typing = with_page!(&self.pages, kind, |page| page
            .modal
            .as_ref()
            .is_some_and(|m| m.form.is_some() && !m.submitting));
        if typing { InputMode::TextEntry } else { InputMode::Normal }
    }

    /// Anything in flight that the spinner should reflect
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.metrics.is_loading()
            || ResourceKind::ALL
                .into_iter()
                .any(|kind| with_page!(&self.pages, kind, |page| page.slice.is_loading() || page.is_submitting()))
    }

    /// Handle an input event
    pub fn handle_input(&mut self, event: InputEvent) -> EventResult {
        match event {
            InputEvent::Key(key_event) => {
                let action = KeyAction::from_key_event(key_event, self.input_mode());
                self.handle_action(action)
            }
            InputEvent::Resize(_, height) => {
                self.set_viewport(height);
                EventResult::Continue
            }
            InputEvent::Mouse(mouse_event) => {
                let action = KeyAction::from_mouse_event(mouse_event);
                self.handle_action(action)
            }
        }
    }

    /// Handle a key action
    fn handle_action(&mut self, action: KeyAction) -> EventResult {
        if action == KeyAction::Unknown {
            return EventResult::Unchanged;
        }

        // Help overlay takes priority
        if matches!(self.modal, ModalState::Help) {
            match action {
                KeyAction::Escape | KeyAction::ShowHelp | KeyAction::Quit => {
                    self.modal = ModalState::None;
                    return EventResult::Continue;
                }
                _ => return EventResult::Unchanged,
            }
        }

        if action == KeyAction::Quit {
            self.running = false;
            return EventResult::Quit;
        }

        // Record modals take priority over everything on their page
        if let Some(kind) = self.current_kind()
            && self.record_modal_open(kind)
        {
            return self.handle_record_modal(kind, action);
        }

        if self.modal.is_editing_filter() {
            return self.handle_filter_action(action);
        }
        if self.modal.is_blocking() {
            return self.handle_menu_action(action);
        }

        if let Some(result) = self.handle_navigation(&action) {
            return result;
        }

        if let Some(result) = self.handle_view_switch(&action) {
            return result;
        }

        if let Some(result) = self.handle_pagination(&action) {
            return result;
        }

        match action {
            KeyAction::Select => {
                if let Some(kind) = self.current_kind() {
                    self.run_action(kind, RowAction::View);
                }
                EventResult::Continue
            }
            KeyAction::OpenActions => {
                self.open_actions_menu();
                EventResult::Continue
            }
            KeyAction::Refresh => {
                self.refresh();
                EventResult::Continue
            }
            KeyAction::OpenFilter => {
                if self.current_kind().is_some() {
                    self.modal = ModalState::Filter;
                }
                EventResult::Continue
            }
            KeyAction::ClearFilters => {
                if let Some(kind) = self.current_kind() {
                    let ticket = with_page_mut!(&mut self.pages, kind, |page| page.clear_filters());
                    self.spawn_fetch(ticket);
                }
                EventResult::Continue
            }
            KeyAction::QuickRange(index) => {
                self.quick_range(index, true);
                EventResult::Continue
            }
            KeyAction::OpenSort => {
                self.open_sort_menu();
                EventResult::Continue
            }
            KeyAction::ToggleSort => {
                if let Some(kind) = self.current_kind() {
                    let ticket = with_page_mut!(&mut self.pages, kind, |page| {
                        let field = page.query.sort.field.clone();
                        page.sort_by(&field)
                    });
                    self.spawn_fetch(ticket);
                }
                EventResult::Continue
            }
            KeyAction::YankId => {
                self.yank_selected_id();
                EventResult::Continue
            }
            KeyAction::ExportServer => {
                if self.current_kind().is_some() {
                    self.modal = ModalState::export_menu();
                }
                EventResult::Continue
            }
            KeyAction::ExportCsv => {
                self.export_csv();
                EventResult::Continue
            }
            KeyAction::DismissBanner | KeyAction::Escape => {
                self.dismiss_banner();
                EventResult::Continue
            }
            KeyAction::ShowHelp => {
                self.modal = ModalState::Help;
                EventResult::Continue
            }
            KeyAction::MouseClick { row, column } => {
                self.handle_mouse_click(row, column);
                EventResult::Continue
            }
            _ => EventResult::Unchanged,
        }
    }

    /// Handle navigation actions (returns Some if action was handled)
    fn handle_navigation(&mut self, action: &KeyAction) -> Option<EventResult> {
        let kind = self.current_kind()?;
        let step: fn(&mut ListState, usize) = match action {
            KeyAction::MoveUp | KeyAction::MouseScrollUp => |state, len| state.move_up(len),
            KeyAction::MoveDown | KeyAction::MouseScrollDown => |state, len| state.move_down(len),
            KeyAction::MoveToTop => |state, _| state.move_to_top(),
            KeyAction::MoveToBottom => |state, len| state.move_to_bottom(len),
            KeyAction::PageUp => |state, len| state.page_up(len),
            KeyAction::PageDown => |state, len| state.page_down(len),
            _ => return None,
        };
        with_page_mut!(&mut self.pages, kind, |page| {
            let len = page.rows().len();
            step(&mut page.cursor, len);
        });
        Some(EventResult::Continue)
    }

    /// Handle view switching actions (returns Some if action was handled)
    fn handle_view_switch(&mut self, action: &KeyAction) -> Option<EventResult> {
        let view = match action {
            KeyAction::SwitchToDashboard => View::Dashboard,
            KeyAction::SwitchTo(kind) => View::List(*kind),
            KeyAction::NextView => self.current_view.next(),
            KeyAction::PrevView => self.current_view.prev(),
            _ => return None,
        };
        self.switch_view(view);
        Some(EventResult::Continue)
    }

    /// Page navigation on the current list (returns Some if action was handled)
    fn handle_pagination(&mut self, action: &KeyAction) -> Option<EventResult> {
        let kind = self.current_kind()?;
        let ticket = match action {
            KeyAction::NextPage => with_page_mut!(&mut self.pages, kind, |page| page.next_page()),
            KeyAction::PrevPage => with_page_mut!(&mut self.pages, kind, |page| page.prev_page()),
            KeyAction::FirstPage => with_page_mut!(&mut self.pages, kind, |page| page.first_page()),
            KeyAction::LastPage => with_page_mut!(&mut self.pages, kind, |page| page.last_page()),
            KeyAction::CyclePageSize => Some(with_page_mut!(&mut self.pages, kind, |page| page.cycle_page_size())),
            _ => return None,
        };
        Some(match ticket {
            Some(ticket) => {
                self.spawn_fetch(ticket);
                EventResult::Continue
            }
            None => EventResult::Unchanged,
        })
    }

    /// Handle mouse click to select a row in the current list
    fn handle_mouse_click(&mut self, row: u16, column: u16) {
        let Some(kind) = self.current_kind() else {
            return;
        };
        if row + 1 == TABLE_BODY_TOP {
            if let Some(ticket) = with_page_mut!(&mut self.pages, kind, |page| page.click_header_at(column)) {
                self.spawn_fetch(ticket);
            }
            return;
        }
        if row < TABLE_BODY_TOP {
            return;
        }
        let clicked = usize::from(row - TABLE_BODY_TOP);
        with_page_mut!(&mut self.pages, kind, |page| {
            let len = page.rows().len();
            let target = page.cursor.scroll_offset + clicked;
            if target < len {
                page.cursor.select(target, len);
            }
        });
    }

    /// Keys while a record modal is open on the current page
    fn handle_record_modal(&mut self, kind: ResourceKind, action: KeyAction) -> EventResult {
        let today = self.today();
        let input = with_page_mut!(&mut self.pages, kind, |page| page.modal_input(action, today));
        match input {
            ModalInput::Ignored => EventResult::Unchanged,
            ModalInput::Changed | ModalInput::Closed => EventResult::Continue,
            ModalInput::Submit(submission) => {
                self.run_submission(kind, submission);
                EventResult::Continue
            }
            ModalInput::Yank(id) => {
                self.yank(&id);
                EventResult::Continue
            }
        }
    }

    fn handle_filter_action(&mut self, action: KeyAction) -> EventResult {
        let Some(kind) = self.current_kind() else {
            self.modal = ModalState::None;
            return EventResult::Continue;
        };
        match action {
            KeyAction::Escape => {
                // Leave editing; the draft stays for next time
                self.modal = ModalState::None;
            }
            KeyAction::Select => {
                self.modal = ModalState::None;
                let ticket = with_page_mut!(&mut self.pages, kind, |page| page.apply_filters());
                self.spawn_fetch(ticket);
            }
            KeyAction::ClearFilters => {
                let ticket = with_page_mut!(&mut self.pages, kind, |page| page.clear_filters());
                self.spawn_fetch(ticket);
            }
            KeyAction::QuickRange(index) => self.quick_range(index, false),
            KeyAction::FocusNext => with_page_mut!(&mut self.pages, kind, |page| page.panel.focus_next()),
            KeyAction::FocusPrev => with_page_mut!(&mut self.pages, kind, |page| page.panel.focus_prev()),
            KeyAction::CycleNext => with_page_mut!(&mut self.pages, kind, |page| page.edit_filters(|p| p.cycle(true))),
            KeyAction::CyclePrev => {
                with_page_mut!(&mut self.pages, kind, |page| page.edit_filters(|p| p.cycle(false)));
            }
            KeyAction::InputBackspace => {
                with_page_mut!(&mut self.pages, kind, |page| page.edit_filters(|p| p.backspace()));
            }
            KeyAction::InputClear => {
                with_page_mut!(&mut self.pages, kind, |page| page.edit_filters(|p| p.clear_field()));
            }
            KeyAction::InputChar(c) => {
                with_page_mut!(&mut self.pages, kind, |page| page.edit_filters(|p| p.type_char(c)));
            }
            _ => return EventResult::Unchanged,
        }
        EventResult::Continue
    }

    /// Fill the date range with a preset. From the list (not the filter
    /// editor) the preset is applied straight away.
    fn quick_range(&mut self, index: usize, apply: bool) {
        let (Some(kind), Some(range)) = (self.current_kind(), QuickRange::ALL.get(index).copied()) else {
            return;
        };
        let today = self.today();
        let ticket = with_page_mut!(&mut self.pages, kind, |page| {
            page.edit_filters(|p| p.quick_range(range, today));
            apply.then(|| page.apply_filters())
        });
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }
    }

    /// Handle actions in the action, sort and export menus
    fn handle_menu_action(&mut self, action: KeyAction) -> EventResult {
        match action {
            KeyAction::Escape => {
                self.modal = ModalState::None;
                EventResult::Continue
            }
            KeyAction::MoveUp | KeyAction::MouseScrollUp => {
                if let Some(menu) = self.modal.menu_mut() {
                    menu.move_up();
                }
                EventResult::Continue
            }
            KeyAction::MoveDown | KeyAction::MouseScrollDown => {
                if let Some(menu) = self.modal.menu_mut() {
                    menu.move_down();
                }
                EventResult::Continue
            }
            KeyAction::Select => {
                let Some(kind) = self.current_kind() else {
                    self.modal = ModalState::None;
                    return EventResult::Continue;
                };
                match std::mem::take(&mut self.modal) {
                    ModalState::Actions { actions, menu } => {
                        if let Some(&row_action) = actions.get(menu.selected) {
                            self.run_action(kind, row_action);
                        }
                    }
                    ModalState::Sort { fields, menu } => {
                        if let Some((field, _)) = fields.get(menu.selected) {
                            let ticket = with_page_mut!(&mut self.pages, kind, |page| page.sort_by(field));
                            self.spawn_fetch(ticket);
                        }
                    }
                    ModalState::Export { menu } => {
                        if let Some(&format) = ExportFormat::ALL.get(menu.selected) {
                            self.export_server(kind, format);
                        }
                    }
                    other => self.modal = other,
                }
                EventResult::Continue
            }
            _ => EventResult::Unchanged,
        }
    }

    fn open_actions_menu(&mut self) {
        let Some(kind) = self.current_kind() else {
            return;
        };
        let today = self.today();
        let actions = with_page!(&self.pages, kind, |page| page.actions(today));
        if actions.is_empty() {
            return;
        }
        self.modal = ModalState::Actions {
            menu: MenuState::new(actions.len()),
            actions,
        };
    }

    fn open_sort_menu(&mut self) {
        let Some(kind) = self.current_kind() else {
            return;
        };
        let (fields, current) = with_page!(&self.pages, kind, |page| {
            let fields = page.sortable_fields();
            let current = fields.iter().position(|(f, _)| page.query.sort.is_active(f)).unwrap_or(0);
            (fields, current)
        });
        self.modal = ModalState::Sort {
            menu: MenuState::at(fields.len(), current),
            fields,
        };
    }

    fn switch_view(&mut self, view: View) {
        if view == self.current_view {
            return;
        }
        self.previous_view = self.current_view;
        self.current_view = view;
        self.modal = ModalState::None;
        self.load_current_view();
    }

    /// First fetch for the visible view, or a refresh of stale dashboard numbers
    fn load_current_view(&mut self) {
        match self.current_view {
            View::Dashboard => {
                if !self.metrics.has_requested() || self.metrics_stale {
                    self.fetch_metrics();
                }
            }
            View::List(kind) => {
                if let Some(ticket) = with_page_mut!(&mut self.pages, kind, |page| page.ensure_loaded()) {
                    self.spawn_fetch(ticket);
                }
            }
        }
    }

    fn refresh(&mut self) {
        match self.current_view {
            View::Dashboard => self.fetch_metrics(),
            View::List(kind) => {
                let ticket = with_page_mut!(&mut self.pages, kind, |page| page.refetch());
                self.spawn_fetch(ticket);
            }
        }
    }

    fn dismiss_banner(&mut self) {
        self.notifier.dismiss();
        match self.current_view {
            View::Dashboard => self.metrics.dismiss_error(),
            View::List(kind) => with_page_mut!(&mut self.pages, kind, |page| page.slice.dismiss_error()),
        }
    }

    // ------------------------------------------------------------------------
    // Background work
    // ------------------------------------------------------------------------

    /// Fetch a list page in the background
    ///
    /// Exactly one request per ticket. The answer carries the ticket's
    /// request id so the page can drop it if a newer request went out.
    fn spawn_fetch(&self, ticket: FetchTicket) {
        let api = Arc::clone(&self.api);
        let data_tx = self.data_tx.clone();
        self.tasks.spawn(async move {
            let FetchTicket { kind, request, query } = ticket;
            let result = load_page(&*api, kind, &query).await.map_err(|e| {
                tracing::warn!(resource = %kind, request_id = request.get(), error = %e, "list fetch failed");
                session::forget_if_rejected(&e);
                e.to_string()
            });
            let _ = data_tx.send(DataEvent::Fetched { kind, request, result }).await;
        });
    }

    fn fetch_metrics(&mut self) {
        let request = self.metrics.request();
        let api = Arc::clone(&self.api);
        let data_tx = self.data_tx.clone();
        self.tasks.spawn(async move {
            let result = api.metrics().await.map_err(|e| {
                tracing::warn!(error = %e, "metrics fetch failed");
                session::forget_if_rejected(&e);
                e.to_string()
            });
            let _ = data_tx.send(DataEvent::Metrics { request, result }).await;
        });
    }

    /// Start a row action on the selected row of `kind`
    fn run_action(&mut self, kind: ResourceKind, action: RowAction) {
        let today = self.today();
        let confirm = self.config.behavior.confirm_quick_actions;
        let opened = with_page_mut!(&mut self.pages, kind, |page| page.open_action(action, today, confirm));
        if let Opened::Run(submission) = opened {
            self.run_submission(kind, submission);
        }
    }

    /// Send validated modal work to the backend
    fn run_submission(&mut self, kind: ResourceKind, submission: Submission) {
        match submission {
            Submission::Mutation(mutation) => self.spawn_mutation(kind, mutation),
            Submission::Upload(request) => {
                let api = Arc::clone(&self.api);
                let data_tx = self.data_tx.clone();
                let progress_tx = self.data_tx.clone();
                // Progress may be dropped when the channel is full
                let progress: Progress = Arc::new(move |sent, total| {
                    let _ = progress_tx.try_send(DataEvent::UploadProgress { sent, total });
                });
                self.tasks.spawn(async move {
                    let result = upload_document(&*api, &request, progress).await.map_err(|e| e.to_string());
                    let _ = data_tx.send(DataEvent::UploadDone { result }).await;
                });
            }
            Submission::Download(download) => {
                self.notifier
                    .notify(Level::Info, format!("Downloading {}…", download.file_name));
                let dir = self.config.export_dir();
                let api = Arc::clone(&self.api);
                let data_tx = self.data_tx.clone();
                self.tasks.spawn(async move {
                    let result = match api.download(&download.path).await {
                        Ok(bytes) => write_export(&dir, &download.file_name, &bytes).map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    let _ = data_tx
                        .send(DataEvent::Saved {
                            what: download.file_name,
                            result,
                        })
                        .await;
                });
            }
        }
    }

    fn spawn_mutation(&self, kind: ResourceKind, mutation: Mutation) {
        let api = Arc::clone(&self.api);
        let data_tx = self.data_tx.clone();
        self.tasks.spawn(async move {
            let result = match api.mutate(&mutation).await {
                Ok(server_message) => {
                    tracing::debug!(path = %mutation.path, ?server_message, "mutation accepted");
                    Ok(mutation.success)
                }
                Err(e) => Err(e.to_string()),
            };
            let _ = data_tx
                .send(DataEvent::MutationDone {
                    kind,
                    result,
                    follow_up: mutation.follow_up,
                })
                .await;
        });
    }

    fn export_server(&mut self, kind: ResourceKind, format: ExportFormat) {
        let filters = with_page!(&self.pages, kind, |page| page.query.filters.clone());
        let dir = self.config.export_dir();
        let file_name = export_filename(kind, format.extension(), Utc::now());
        self.notifier
            .notify(Level::Info, format!("Exporting {} as {}…", kind.title(), format.label()));

        let api = Arc::clone(&self.api);
        let data_tx = self.data_tx.clone();
        self.tasks.spawn(async move {
            let result = match api.export(kind, format, &filters).await {
                Ok(bytes) => write_export(&dir, &file_name, &bytes).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            let what = format!("{} export", kind.title());
            let _ = data_tx.send(DataEvent::Saved { what, result }).await;
        });
    }

    /// Write the visible page as CSV without a round trip
    fn export_csv(&mut self) {
        let Some(kind) = self.current_kind() else {
            self.notifier
                .notify(Level::Warning, "Export is only available on list views".to_string());
            return;
        };
        let today = self.today();
        let (csv, count) = with_page!(&self.pages, kind, |page| (rows_to_csv(page.rows(), today), page.rows().len()));
        let file_name = export_filename(kind, "csv", Utc::now());
        match write_export(&self.config.export_dir(), &file_name, csv.as_bytes()) {
            Ok(path) => self
                .notifier
                .notify(Level::Success, format!("Exported {} rows to {}", count, path.display())),
            Err(e) => self
                .notifier
                .notify(Level::Error, format!("Failed to write {}: {}", file_name, e)),
        }
    }

    /// Copy the selected row's id to the clipboard
    fn yank_selected_id(&mut self) {
        let Some(kind) = self.current_kind() else {
            return;
        };
        if let Some(id) = with_page!(&self.pages, kind, |page| page.selected().map(|row| row.id().to_string())) {
            self.yank(&id);
        }
    }

    fn yank(&mut self, text: &str) {
        match self.copy_to_clipboard(text) {
            Ok(()) => self.notifier.notify(Level::Success, format!("Copied: {}", text)),
            Err(e) => self.notifier.notify(Level::Warning, format!("Failed to copy: {}", e)),
        }
    }

    /// Attempt to copy text to the system clipboard
    fn copy_to_clipboard(&self, text: &str) -> Result<(), String> {
        if !self.config.behavior.copy_to_clipboard {
            return Err("clipboard disabled in config".to_string());
        }
        arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text.to_string()))
            .map_err(|e| e.to_string())
    }

    // ------------------------------------------------------------------------
    // Data events
    // ------------------------------------------------------------------------

    /// Handle a data event
    pub fn handle_data(&mut self, event: DataEvent) -> EventResult {
        match event {
            DataEvent::Tick => self.handle_tick(),
            DataEvent::Fetched { kind, request, result } => {
                match result {
                    Ok(loaded) => {
                        tracing::debug!(resource = %loaded.kind(), request_id = request.get(), "page received");
                        if let Some(ticket) = self.pages.loaded(request, loaded) {
                            self.spawn_fetch(ticket);
                        }
                    }
                    Err(error) => {
                        with_page_mut!(&mut self.pages, kind, |page| page.failed(request, error));
                    }
                }
                EventResult::Continue
            }
            DataEvent::Metrics { request, result } => {
                match result {
                    Ok(metrics) => {
                        if self.metrics.succeed(request, metrics) {
                            self.metrics_loaded = Some(Local::now());
                            self.metrics_stale = false;
                        }
                    }
                    Err(error) => {
                        self.metrics.fail(request, error);
                    }
                }
                EventResult::Continue
            }
            DataEvent::MutationDone {
                kind,
                result,
                follow_up,
            } => {
                self.finish_submission(kind, result, follow_up);
                EventResult::Continue
            }
            DataEvent::UploadProgress { sent, total } => {
                if let Some(modal) = self.pages.documents.modal.as_mut()
                    && modal.submitting
                {
                    modal.progress = Some((sent, total));
                }
                EventResult::Continue
            }
            DataEvent::UploadDone { result } => {
                self.finish_submission(ResourceKind::Documents, result, FollowUp::Refetch);
                EventResult::Continue
            }
            DataEvent::Saved { what, result } => {
                match result {
                    Ok(path) => self
                        .notifier
                        .notify(Level::Success, format!("Saved {} to {}", what, path.display())),
                    Err(e) => self.notifier.notify(Level::Error, format!("{} failed: {}", what, e)),
                }
                EventResult::Continue
            }
        }
    }

    fn handle_tick(&mut self) -> EventResult {
        self.spinner = self.spinner.wrapping_add(1);
        let now = Instant::now();
        let mut fetched = false;
        for kind in ResourceKind::ALL {
            if let Some(ticket) = with_page_mut!(&mut self.pages, kind, |page| page.tick(now)) {
                self.spawn_fetch(ticket);
                fetched = true;
            }
        }
        if fetched || self.is_busy() || self.notifier.current().is_some() {
            EventResult::Continue
        } else {
            EventResult::Unchanged
        }
    }

    /// Close or reopen the modal after the backend answered, then notify
    fn finish_submission(&mut self, kind: ResourceKind, result: Result<String, String>, follow_up: FollowUp) {
        match result {
            Ok(message) => {
                with_page_mut!(&mut self.pages, kind, |page| page.submission_succeeded());
                self.notifier.notify(Level::Success, message);
                self.metrics_stale = true;
                self.apply_follow_up(kind, follow_up);
            }
            Err(error) => {
                with_page_mut!(&mut self.pages, kind, |page| page.submission_failed(&error));
                self.notifier.notify(Level::Error, error);
            }
        }
    }

    fn apply_follow_up(&mut self, kind: ResourceKind, follow_up: FollowUp) {
        match follow_up {
            FollowUp::Refetch => {
                let ticket = with_page_mut!(&mut self.pages, kind, |page| page.refetch());
                self.spawn_fetch(ticket);
            }
            FollowUp::MarkInvoicePaid { id, paid_on } => {
                let patched = self
                    .pages
                    .invoices
                    .slice
                    .update_row(|invoice| invoice.id == id, |invoice| payment::mark_paid(invoice, paid_on));
                if !patched {
                    let ticket = self.pages.invoices.refetch();
                    self.spawn_fetch(ticket);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::models::InvoiceStatus;
    use crate::notify::ToastNotifier;
    use crate::tui::runtime::TuiRuntime;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn app_on(view: &str) -> (App, mpsc::Receiver<DataEvent>) {
        let (data_tx, data_rx) = mpsc::channel(32);
        let mut config = AppConfig::default();
        config.display.default_view = view.to_string();
        config.behavior.copy_to_clipboard = false;
        let api = Arc::new(Backend::Memory(MemoryBackend::demo()));
        let app = App::new(config, api, data_tx, Spawner::default(), Box::new(ToastNotifier::default()));
        (app, data_rx)
    }

    async fn pump(app: &mut App, rx: &mut mpsc::Receiver<DataEvent>) {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for data event")
            .expect("data channel closed");
        app.handle_data(event);
    }

    fn press(app: &mut App, code: KeyCode) -> EventResult {
        app.handle_input(InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[tokio::test]
    async fn test_startup_loads_default_view() {
        let (mut app, mut rx) = app_on("tenants");
        app.start();
        assert!(app.pages.tenants.slice.is_loading());
        pump(&mut app, &mut rx).await;

        let page = &app.pages.tenants;
        assert_eq!(page.rows().len(), 20);
        assert_eq!(page.pagination().total_pages, 3);
        assert!(page.slice.error().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_in_flight_fetch() {
        let runtime = TuiRuntime::new();
        let spawner = runtime.spawner();
        let (data_tx, mut rx) = mpsc::channel(32);
        let mut config = AppConfig::default();
        config.display.default_view = "invoices".to_string();
        let api = Arc::new(Backend::Memory(MemoryBackend::demo().with_latency(Duration::from_secs(60))));
        let mut app = App::new(config, api, data_tx, spawner.clone(), Box::new(ToastNotifier::default()));

        app.start();
        assert_eq!(spawner.pending(), 1);

        tokio::time::timeout(Duration::from_secs(3), runtime.shutdown()).await.unwrap();
        assert_eq!(spawner.pending(), 0);
        drop(app);
        // The cancelled fetch never reports back
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_paging_keys() {
        let (mut app, mut rx) = app_on("tenants");
        app.start();
        pump(&mut app, &mut rx).await;

        press(&mut app, KeyCode::Char(']'));
        pump(&mut app, &mut rx).await;
        assert_eq!(app.pages.tenants.pagination().current_page, 2);

        press(&mut app, KeyCode::Char('}'));
        pump(&mut app, &mut rx).await;
        assert_eq!(app.pages.tenants.rows().len(), 8);

        // Already on the last page
        assert_eq!(press(&mut app, KeyCode::Char('}')), EventResult::Unchanged);
    }

    #[tokio::test]
    async fn test_only_latest_page_is_applied() {
        let (mut app, mut rx) = app_on("tenants");
        app.start();
        pump(&mut app, &mut rx).await;

        press(&mut app, KeyCode::Char(']'));
        press(&mut app, KeyCode::Char(']'));
        pump(&mut app, &mut rx).await;
        pump(&mut app, &mut rx).await;

        let page = &app.pages.tenants;
        assert_eq!(page.query.page(), 3);
        assert_eq!(page.rows().len(), 8);
        assert!(!page.slice.is_loading());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_rows_and_can_be_dismissed() {
        let (mut app, mut rx) = app_on("tenants");
        app.start();
        pump(&mut app, &mut rx).await;

        if let Backend::Memory(memory) = app.api.as_ref() {
            memory.fail_next(503);
        }
        press(&mut app, KeyCode::Char('r'));
        pump(&mut app, &mut rx).await;

        let page = &app.pages.tenants;
        assert!(page.slice.error().unwrap().contains("temporarily unavailable"));
        assert_eq!(page.rows().len(), 20);

        press(&mut app, KeyCode::Char('x'));
        assert!(app.pages.tenants.slice.error().is_none());
    }

    #[tokio::test]
    async fn test_filter_editor_applies_status() {
        let (mut app, mut rx) = app_on("tenants");
        app.start();
        pump(&mut app, &mut rx).await;

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.input_mode(), InputMode::TextEntry);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        // Explicit panels do not fetch while editing
        assert!(!app.pages.tenants.slice.is_loading());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode(), InputMode::Normal);
        pump(&mut app, &mut rx).await;

        let page = &app.pages.tenants;
        assert_eq!(page.query.filters.text("status"), Some("active"));
        assert!(!page.rows().is_empty());
        assert!(page.rows().iter().all(|t| t.status.as_str() == "active"));

        let ctrl_l = KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL);
        app.handle_input(InputEvent::Key(ctrl_l));
        pump(&mut app, &mut rx).await;
        assert!(app.pages.tenants.query.filters.is_empty());
        assert_eq!(app.pages.tenants.pagination().total_items, 48);
    }

    #[tokio::test]
    async fn test_pay_invoice_patches_row() {
        let (mut app, mut rx) = app_on("invoices");
        app.start();
        pump(&mut app, &mut rx).await;

        let index = open_pay_form(&mut app);
        let form = app.pages.invoices.modal.as_mut().unwrap().form.as_mut().unwrap();
        form.set("transactionReference", "TX-42");
        press(&mut app, KeyCode::Enter);
        assert!(app.pages.invoices.is_submitting());
        pump(&mut app, &mut rx).await;

        assert!(app.pages.invoices.modal.is_none());
        assert_eq!(app.pages.invoices.rows()[index].status, InvoiceStatus::Paid);
        assert_eq!(app.notifier.current().map(|t| t.level), Some(Level::Success));
    }

    #[tokio::test]
    async fn test_partial_payment_is_not_marked_paid() {
        let (mut app, mut rx) = app_on("invoices");
        app.start();
        pump(&mut app, &mut rx).await;

        let index = open_pay_form(&mut app);
        let before = app.pages.invoices.rows()[index].clone();
        let form = app.pages.invoices.modal.as_mut().unwrap().form.as_mut().unwrap();
        form.set("amount", "1");
        form.set("transactionReference", "TX-43");
        press(&mut app, KeyCode::Enter);
        pump(&mut app, &mut rx).await;

        // Mutation accepted, the page refetches instead of patching
        assert!(app.pages.invoices.modal.is_none());
        assert_ne!(app.pages.invoices.rows()[index].status, InvoiceStatus::Paid);
        assert!(app.pages.invoices.slice.is_loading());
        pump(&mut app, &mut rx).await;

        let after = app.pages.invoices.rows().iter().find(|i| i.id == before.id).unwrap();
        assert_ne!(after.status, InvoiceStatus::Paid);
        assert!((after.amount - (before.amount - 1.0)).abs() < 0.01);
    }

    /// Select a payable invoice and open its payment form, returning the row index
    fn open_pay_form(app: &mut App) -> usize {
        let today = app.today();
        let index = app
            .pages
            .invoices
            .rows()
            .iter()
            .position(|i| i.actions(today).contains(&RowAction::Pay) && i.amount > 2.0)
            .expect("demo data has a payable invoice");
        let len = app.pages.invoices.rows().len();
        app.pages.invoices.cursor.select(index, len);

        press(app, KeyCode::Char('a'));
        let ModalState::Actions { actions, .. } = &app.modal else {
            panic!("actions menu not open");
        };
        let pay = actions.iter().position(|a| *a == RowAction::Pay).unwrap();
        for _ in 0..pay {
            press(app, KeyCode::Down);
        }
        press(app, KeyCode::Enter);
        assert_eq!(app.input_mode(), InputMode::TextEntry);
        index
    }

    #[tokio::test]
    async fn test_rejected_mutation_keeps_modal_open() {
        let (mut app, mut rx) = app_on("tenants");
        app.start();
        pump(&mut app, &mut rx).await;

        let today = app.today();
        let index = app
            .pages
            .tenants
            .rows()
            .iter()
            .position(|t| t.actions(today).contains(&RowAction::ChangeState))
            .expect("demo data has a tenant that can change state");
        let len = app.pages.tenants.rows().len();
        app.pages.tenants.cursor.select(index, len);

        press(&mut app, KeyCode::Char('a'));
        let ModalState::Actions { actions, .. } = &app.modal else {
            panic!("actions menu not open");
        };
        let change = actions.iter().position(|a| *a == RowAction::ChangeState).unwrap();
        for _ in 0..change {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Enter);

        let modal = app.pages.tenants.modal.as_mut().unwrap();
        let form = modal.form.as_mut().unwrap();
        let other = if modal.target.status.as_str() == "locked" { "active" } else { "locked" };
        form.set("newStatus", other);
        form.set("reason", "billing dispute");

        if let Backend::Memory(memory) = app.api.as_ref() {
            memory.fail_next(403);
        }
        press(&mut app, KeyCode::Enter);
        pump(&mut app, &mut rx).await;

        let modal = app.pages.tenants.modal.as_ref().expect("modal stays open");
        assert!(!modal.submitting);
        assert_eq!(modal.form.as_ref().unwrap().raw("reason"), "billing dispute");
        assert_eq!(app.notifier.current().map(|t| t.level), Some(Level::Error));
    }

    #[tokio::test]
    async fn test_dashboard_loads_metrics() {
        let (mut app, mut rx) = app_on("dashboard");
        app.start();
        pump(&mut app, &mut rx).await;
        assert!(app.metrics.data().is_some_and(|m| m.tenants.total == 48));
        assert!(app.metrics_loaded.is_some());

        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.current_view, View::List(ResourceKind::Tenants));
        assert!(app.pages.tenants.slice.is_loading());
    }

    #[test]
    fn test_quit_and_help_keys() {
        let (mut app, _rx) = app_on("dashboard");

        press(&mut app, KeyCode::Char('?'));
        assert!(matches!(app.modal, ModalState::Help));
        // q closes help before it quits
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        assert_eq!(press(&mut app, KeyCode::Char('q')), EventResult::Quit);
        assert!(!app.running);
    }
}

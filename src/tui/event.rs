//! Event types for the TUI
//!
//! This module implements a dual-channel event architecture:
//! - InputEvent: Priority channel for user input (never dropped)
//! - DataEvent: Results of background fetches, mutations and uploads

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};

use crate::list::{Page, RequestId, ResourceKind};
use crate::modal::FollowUp;
use crate::models::{ActivityLog, DeletedDocument, ErrorLog, Invoice, PlatformMetrics, Tenant, TenantStateRecord};

/// Input events from the terminal (priority channel - never dropped)
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Keyboard input
    Key(KeyEvent),
    /// Mouse input
    Mouse(MouseEvent),
    /// Terminal resize
    Resize(u16, u16),
}

/// A fetched page, tagged by resource
#[derive(Debug)]
pub enum LoadedPage {
    Tenants(Page<Tenant>),
    TenantStates(Page<TenantStateRecord>),
    Invoices(Page<Invoice>),
    Activity(Page<ActivityLog>),
    Errors(Page<ErrorLog>),
    Documents(Page<DeletedDocument>),
}

impl LoadedPage {
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            LoadedPage::Tenants(_) => ResourceKind::Tenants,
            LoadedPage::TenantStates(_) => ResourceKind::TenantStates,
            LoadedPage::Invoices(_) => ResourceKind::Invoices,
            LoadedPage::Activity(_) => ResourceKind::Activity,
            LoadedPage::Errors(_) => ResourceKind::Errors,
            LoadedPage::Documents(_) => ResourceKind::Documents,
        }
    }
}

/// Data and control events (data channel)
#[derive(Debug)]
pub enum DataEvent {
    /// Clock tick for toasts, spinners and the live-filter debounce
    Tick,

    /// A list fetch finished
    Fetched {
        kind: ResourceKind,
        request: RequestId,
        result: Result<LoadedPage, String>,
    },

    /// Dashboard metrics fetch finished
    Metrics {
        request: RequestId,
        result: Result<PlatformMetrics, String>,
    },

    /// A modal submission finished (success message or error)
    MutationDone {
        kind: ResourceKind,
        result: Result<String, String>,
        follow_up: FollowUp,
    },

    /// Bytes sent so far for the running upload
    UploadProgress { sent: u64, total: u64 },

    /// Upload flow finished
    UploadDone { result: Result<String, String> },

    /// A server export or receipt download was written to disk
    Saved {
        what: String,
        result: Result<PathBuf, String>,
    },
}

/// Result of processing an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Continue running, UI needs redraw
    Continue,
    /// Continue running, no UI change needed
    Unchanged,
    /// Quit the application
    Quit,
}

/// Where keystrokes go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Single-key commands
    Normal,
    /// Typing into the filter panel or a form
    TextEntry,
}

/// Key action mappings for the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // Navigation
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    PageUp,
    PageDown,

    // Pagination
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    CyclePageSize,

    // View switching
    SwitchToDashboard,
    SwitchTo(ResourceKind),
    NextView,
    PrevView,

    // Actions
    Select,
    OpenActions,
    Refresh,
    OpenFilter,
    ClearFilters,
    OpenSort,
    ToggleSort,
    YankId,
    ExportServer,
    ExportCsv,
    DismissBanner,

    // UI
    ShowHelp,
    Escape,
    Quit,

    // Text entry
    FocusNext,
    FocusPrev,
    CycleNext,
    CyclePrev,
    InputClear,
    InputBackspace,
    InputChar(char),
    QuickRange(usize),

    // Mouse actions
    MouseClick { row: u16, column: u16 },
    MouseScrollUp,
    MouseScrollDown,

    // Unknown/unhandled
    Unknown,
}

impl KeyAction {
    /// Map a mouse event to an action
    pub fn from_mouse_event(event: MouseEvent) -> Self {
        use crossterm::event::{MouseButton, MouseEventKind};

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => KeyAction::MouseClick {
                row: event.row,
                column: event.column,
            },
            MouseEventKind::ScrollUp => KeyAction::MouseScrollUp,
            MouseEventKind::ScrollDown => KeyAction::MouseScrollDown,
            _ => KeyAction::Unknown,
        }
    }

    /// Map a key event to an action based on current mode
    pub fn from_key_event(event: KeyEvent, mode: InputMode) -> Self {
        let KeyEvent { code, modifiers, .. } = event;
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        // Shared by both modes
        match code {
            KeyCode::Char('c') if ctrl => return KeyAction::Quit,
            KeyCode::Char('l') if ctrl => return KeyAction::ClearFilters,
            KeyCode::F(n @ 2..=4) => return KeyAction::QuickRange(usize::from(n - 2)),
            _ => {}
        }

        if mode == InputMode::TextEntry {
            return match code {
                KeyCode::Esc => KeyAction::Escape,
                KeyCode::Enter => KeyAction::Select,
                KeyCode::Tab | KeyCode::Down => KeyAction::FocusNext,
                KeyCode::BackTab | KeyCode::Up => KeyAction::FocusPrev,
                KeyCode::Right => KeyAction::CycleNext,
                KeyCode::Left => KeyAction::CyclePrev,
                KeyCode::Backspace => KeyAction::InputBackspace,
                KeyCode::Char('u') if ctrl => KeyAction::InputClear,
                KeyCode::Char(c) if !ctrl => KeyAction::InputChar(c),
                _ => KeyAction::Unknown,
            };
        }

        match code {
            KeyCode::Char('q') => KeyAction::Quit,

            // Ctrl+ combinations must come before bare character matches
            KeyCode::Char('d') if ctrl => KeyAction::PageDown,
            KeyCode::Char('u') if ctrl => KeyAction::PageUp,

            // Navigation
            KeyCode::Char('j') | KeyCode::Down => KeyAction::MoveDown,
            KeyCode::Char('k') | KeyCode::Up => KeyAction::MoveUp,
            KeyCode::Char('g') | KeyCode::Home => KeyAction::MoveToTop,
            KeyCode::Char('G') | KeyCode::End => KeyAction::MoveToBottom,
            KeyCode::PageDown => KeyAction::PageDown,
            KeyCode::PageUp => KeyAction::PageUp,

            // Pagination
            KeyCode::Char(']') | KeyCode::Char('n') | KeyCode::Right => KeyAction::NextPage,
            KeyCode::Char('[') | KeyCode::Char('p') | KeyCode::Left => KeyAction::PrevPage,
            KeyCode::Char('{') => KeyAction::FirstPage,
            KeyCode::Char('}') => KeyAction::LastPage,
            KeyCode::Char('L') => KeyAction::CyclePageSize,

            // View switching
            KeyCode::Char('1') => KeyAction::SwitchToDashboard,
            KeyCode::Char('2') => KeyAction::SwitchTo(ResourceKind::Tenants),
            KeyCode::Char('3') => KeyAction::SwitchTo(ResourceKind::TenantStates),
            KeyCode::Char('4') => KeyAction::SwitchTo(ResourceKind::Invoices),
            KeyCode::Char('5') => KeyAction::SwitchTo(ResourceKind::Activity),
            KeyCode::Char('6') => KeyAction::SwitchTo(ResourceKind::Errors),
            KeyCode::Char('7') => KeyAction::SwitchTo(ResourceKind::Documents),
            KeyCode::Tab => KeyAction::NextView,
            KeyCode::BackTab => KeyAction::PrevView,

            // Actions
            KeyCode::Enter => KeyAction::Select,
            KeyCode::Char('a') => KeyAction::OpenActions,
            KeyCode::Char('r') => KeyAction::Refresh,
            KeyCode::Char('f') | KeyCode::Char('/') => KeyAction::OpenFilter,
            KeyCode::Char('s') => KeyAction::OpenSort,
            KeyCode::Char('S') => KeyAction::ToggleSort,
            KeyCode::Char('y') => KeyAction::YankId,
            KeyCode::Char('e') => KeyAction::ExportServer,
            KeyCode::Char('E') => KeyAction::ExportCsv,
            KeyCode::Char('x') => KeyAction::DismissBanner,

            // Help
            KeyCode::Char('?') | KeyCode::F(1) => KeyAction::ShowHelp,
            KeyCode::Esc => KeyAction::Escape,

            _ => KeyAction::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_action_quit() {
        assert_eq!(KeyAction::from_key_event(key(KeyCode::Char('q')), InputMode::Normal), KeyAction::Quit);
        // In text entry 'q' is just a letter
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Char('q')), InputMode::TextEntry),
            KeyAction::InputChar('q')
        );
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(KeyAction::from_key_event(ctrl_c, InputMode::TextEntry), KeyAction::Quit);
    }

    #[test]
    fn test_key_action_navigation() {
        assert_eq!(KeyAction::from_key_event(key(KeyCode::Char('j')), InputMode::Normal), KeyAction::MoveDown);
        assert_eq!(KeyAction::from_key_event(key(KeyCode::Char('k')), InputMode::Normal), KeyAction::MoveUp);
        assert_eq!(KeyAction::from_key_event(key(KeyCode::Char(']')), InputMode::Normal), KeyAction::NextPage);
        assert_eq!(KeyAction::from_key_event(key(KeyCode::Char('}')), InputMode::Normal), KeyAction::LastPage);
    }

    #[test]
    fn test_view_keys() {
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Char('1')), InputMode::Normal),
            KeyAction::SwitchToDashboard
        );
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Char('4')), InputMode::Normal),
            KeyAction::SwitchTo(ResourceKind::Invoices)
        );
    }

    #[test]
    fn test_text_entry_ctrl_u() {
        // In text entry, Ctrl+U clears the focused field
        let event = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(KeyAction::from_key_event(event, InputMode::TextEntry), KeyAction::InputClear);

        // In normal mode, Ctrl+U is page up
        assert_eq!(KeyAction::from_key_event(event, InputMode::Normal), KeyAction::PageUp);
    }

    #[test]
    fn test_quick_ranges_work_in_both_modes() {
        for mode in [InputMode::Normal, InputMode::TextEntry] {
            assert_eq!(KeyAction::from_key_event(key(KeyCode::F(2)), mode), KeyAction::QuickRange(0));
            assert_eq!(KeyAction::from_key_event(key(KeyCode::F(4)), mode), KeyAction::QuickRange(2));
        }
        assert_eq!(KeyAction::from_key_event(key(KeyCode::F(5)), InputMode::Normal), KeyAction::Unknown);
    }
}

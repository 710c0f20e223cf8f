//! Application state types for the TUI
//!
//! This module contains the view-independent state:
//! - Current view (dashboard or one of the resource lists)
//! - Overlay states (Help, Filter, Actions, Sort, Export)
//! - Selection and navigation state (ListState)

use crate::export::ExportFormat;
use crate::list::{ResourceKind, RowAction};

// ============================================================================
// Menu State
// ============================================================================

/// Cursor over a short vertical menu
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    pub selected: usize,
    len: usize,
}

impl MenuState {
    pub fn new(len: usize) -> Self {
        Self { selected: 0, len }
    }

    /// Start on a given entry, clamped to the menu
    pub fn at(len: usize, selected: usize) -> Self {
        Self {
            selected: selected.min(len.saturating_sub(1)),
            len,
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.len {
            self.selected += 1;
        }
    }
}

// ============================================================================
// Selection State
// ============================================================================

/// List state with selection and scroll tracking
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub selected: usize,
    pub scroll_offset: usize,
    pub visible_count: usize,
}

impl ListState {
    pub fn clamp(&mut self, list_len: usize) {
        if list_len == 0 {
            self.selected = 0;
            self.scroll_offset = 0;
        } else {
            self.selected = self.selected.min(list_len - 1);
            if self.selected < self.scroll_offset {
                self.scroll_offset = self.selected;
            } else if self.visible_count > 0 && self.selected >= self.scroll_offset + self.visible_count {
                self.scroll_offset = self.selected.saturating_sub(self.visible_count - 1);
            }
        }
    }

    pub fn select(&mut self, index: usize, list_len: usize) {
        self.selected = index;
        self.clamp(list_len);
    }

    pub fn move_up(&mut self, list_len: usize) {
        if self.selected > 0 {
            self.selected -= 1;
            self.clamp(list_len);
        }
    }

    pub fn move_down(&mut self, list_len: usize) {
        if list_len > 0 && self.selected < list_len - 1 {
            self.selected += 1;
            self.clamp(list_len);
        }
    }

    pub fn move_to_top(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn move_to_bottom(&mut self, list_len: usize) {
        if list_len > 0 {
            self.selected = list_len - 1;
            if self.visible_count > 0 {
                self.scroll_offset = list_len.saturating_sub(self.visible_count);
            }
        }
    }

    pub fn page_up(&mut self, list_len: usize) {
        let jump = self.visible_count.max(1) / 2;
        self.selected = self.selected.saturating_sub(jump);
        self.clamp(list_len);
    }

    pub fn page_down(&mut self, list_len: usize) {
        let jump = self.visible_count.max(1) / 2;
        self.selected = self.selected.saturating_add(jump);
        self.clamp(list_len);
    }
}

// ============================================================================
// View Enum
// ============================================================================

/// Current view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    List(ResourceKind),
}

impl View {
    /// Dashboard first, then every list in tab order
    pub const ALL: [View; 7] = [
        View::Dashboard,
        View::List(ResourceKind::Tenants),
        View::List(ResourceKind::TenantStates),
        View::List(ResourceKind::Invoices),
        View::List(ResourceKind::Activity),
        View::List(ResourceKind::Errors),
        View::List(ResourceKind::Documents),
    ];

    fn position(self) -> usize {
        View::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    #[must_use]
    pub fn next(self) -> Self {
        View::ALL[(self.position() + 1) % View::ALL.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        View::ALL[(self.position() + View::ALL.len() - 1) % View::ALL.len()]
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::List(kind) => kind.title(),
        }
    }

    #[must_use]
    pub fn kind(self) -> Option<ResourceKind> {
        match self {
            View::Dashboard => None,
            View::List(kind) => Some(kind),
        }
    }

    /// Parse the `display.default_view` setting
    #[must_use]
    pub fn from_setting(name: &str) -> Self {
        <ResourceKind as clap::ValueEnum>::from_str(name.trim(), true)
            .map(View::List)
            .unwrap_or_default()
    }
}

// ============================================================================
// Overlay State
// ============================================================================

/// Overlay state - only one overlay can be active at a time.
///
/// Record modals (detail and action forms) belong to the page that opened
/// them; this enum covers the app-level overlays drawn above any view.
#[derive(Debug, Default)]
pub enum ModalState {
    #[default]
    None,
    Help,
    /// Typing into the current page's filter panel
    Filter,
    /// Row actions for the selected row
    Actions {
        actions: Vec<RowAction>,
        menu: MenuState,
    },
    /// Sortable columns of the current list
    Sort {
        fields: Vec<(&'static str, &'static str)>,
        menu: MenuState,
    },
    /// Server export format picker
    Export { menu: MenuState },
}

impl ModalState {
    /// Check if any overlay is currently active
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, ModalState::None)
    }

    /// Check if the overlay is blocking (requires explicit dismissal)
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            ModalState::Actions { .. } | ModalState::Sort { .. } | ModalState::Export { .. }
        )
    }

    #[must_use]
    pub fn is_editing_filter(&self) -> bool {
        matches!(self, ModalState::Filter)
    }

    pub fn menu_mut(&mut self) -> Option<&mut MenuState> {
        match self {
            ModalState::Actions { menu, .. } | ModalState::Sort { menu, .. } | ModalState::Export { menu } => {
                Some(menu)
            }
            _ => None,
        }
    }

    pub fn export_menu() -> Self {
        ModalState::Export {
            menu: MenuState::new(ExportFormat::ALL.len()),
        }
    }
}

//! Terminal User Interface for tenantdesk
//!
//! This module provides an interactive TUI over the admin API.
//! It features:
//! - One paginated, filterable list per resource plus a metrics dashboard
//! - Dual-channel event architecture (priority input, background results)
//! - Keyboard-driven navigation, row actions and modal forms
//! - Graceful degradation when the backend is unavailable

pub mod app;
pub mod event;
pub mod runtime;
pub mod theme;
pub mod ui;

use std::io::{self, IsTerminal, stdout};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use crate::api::Backend;
use crate::models::AppConfig;
use crate::notify::{Level, Notifier, ToastNotifier};
use crate::tui::app::App;
use crate::tui::runtime::{TuiRuntime, create_channels, run_event_loop, spawn_input_task, spawn_tick_task};

/// Terminal capability requirements for TUI mode
#[derive(Debug)]
pub struct TerminalCapabilities {
    pub is_tty: bool,
    pub term_type: String,
    pub supports_alternate_screen: bool,
}

impl TerminalCapabilities {
    /// Detect terminal capabilities
    pub fn detect() -> Self {
        let is_tty = stdout().is_terminal();
        let term_type = std::env::var("TERM").unwrap_or_default();
        Self::from_parts(is_tty, term_type)
    }

    fn from_parts(is_tty: bool, term_type: String) -> Self {
        // Check for known problematic terminals
        let supports_alternate_screen = !matches!(term_type.as_str(), "dumb" | "" | "unknown");
        Self {
            is_tty,
            term_type,
            supports_alternate_screen,
        }
    }

    /// Check if terminal is suitable for TUI mode
    pub fn is_suitable(&self) -> bool {
        self.is_tty && self.supports_alternate_screen
    }

    /// Get error message for unsuitable terminal
    pub fn error_message(&self) -> String {
        if !self.is_tty {
            "TUI mode requires an interactive terminal (stdout is not a TTY).\n\
             Hint: Use non-TUI commands like 'tenantdesk tenants' or 'tenantdesk metrics' instead."
                .to_string()
        } else if !self.supports_alternate_screen {
            format!(
                "Terminal type '{}' may not support TUI mode.\n\
                 Hint: Set TERM to a supported value (e.g., xterm-256color) or use CLI mode.",
                if self.term_type.is_empty() { "(unset)" } else { &self.term_type }
            )
        } else {
            "Unknown terminal capability issue.".to_string()
        }
    }
}

/// Run the TUI application
pub async fn run_tui(config: AppConfig, backend: Backend, warnings: Vec<String>) -> Result<()> {
    // Check terminal capabilities before attempting TUI mode
    let capabilities = TerminalCapabilities::detect();
    if !capabilities.is_suitable() {
        bail!("{}", capabilities.error_message());
    }

    tracing::info!(backend = %backend.describe(), "starting TUI");

    let mut terminal = setup_terminal()?;
    let (input_tx, input_rx, data_tx, data_rx) = create_channels();

    let mut notifier = ToastNotifier::default();
    for warning in warnings {
        notifier.notify(Level::Warning, warning);
    }

    let runtime = TuiRuntime::new();
    let spawner = runtime.spawner();
    spawn_input_task(&spawner, input_tx);
    spawn_tick_task(&spawner, data_tx.clone());

    let mut app = App::new(config, Arc::new(backend), data_tx, spawner, Box::new(notifier));
    if let Ok(size) = terminal.size() {
        app.set_viewport(size.height);
    }
    app.start();

    let result = run_event_loop(app, input_rx, data_rx, |app| {
        terminal.draw(|frame| ui::render(app, frame))?;
        Ok(())
    })
    .await;

    runtime.shutdown().await;
    restore_terminal(&mut terminal)?;

    result
}

/// Setup the terminal for TUI mode
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI with the tokio runtime (entry point from main)
pub fn run(config: AppConfig, backend: Backend, warnings: Vec<String>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    rt.block_on(run_tui(config, backend, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_capabilities() {
        assert!(TerminalCapabilities::from_parts(true, "xterm-256color".to_string()).is_suitable());
        let dumb = TerminalCapabilities::from_parts(true, "dumb".to_string());
        assert!(!dumb.is_suitable());
        assert!(dumb.error_message().contains("dumb"));
        let piped = TerminalCapabilities::from_parts(false, "xterm".to_string());
        assert!(piped.error_message().contains("not a TTY"));
    }
}

//! Notification service injected into the app and CLI
//!
//! List code never prints or pops toasts itself. It calls a `Notifier`,
//! which the TUI backs with timed toasts and the CLI backs with colored
//! stderr lines.

use std::time::{Duration, Instant};

use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl Level {
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Level::Success => "✓",
            Level::Info => "i",
            Level::Warning => "!",
            Level::Error => "✗",
        }
    }
}

/// A transient message with its creation time
#[derive(Debug, Clone)]
pub struct Toast {
    pub level: Level,
    pub message: String,
    pub created: Instant,
}

impl Toast {
    #[must_use]
    pub fn is_visible(&self, ttl: Duration) -> bool {
        self.created.elapsed() < ttl
    }
}

pub trait Notifier: Send {
    fn notify(&mut self, level: Level, message: String);

    /// Toast currently on screen, if the implementation keeps any
    fn current(&self) -> Option<&Toast> {
        None
    }

    /// Drop the toast on screen, if any
    fn dismiss(&mut self) {}

    fn success(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.notify(Level::Success, message.into());
    }

    fn error(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.notify(Level::Error, message.into());
    }
}

/// Keeps the latest toast for the status bar
#[derive(Debug)]
pub struct ToastNotifier {
    toast: Option<Toast>,
    ttl: Duration,
}

impl Default for ToastNotifier {
    fn default() -> Self {
        Self::new(Duration::from_secs(4))
    }
}

impl ToastNotifier {
    pub fn new(ttl: Duration) -> Self {
        Self { toast: None, ttl }
    }
}

impl Notifier for ToastNotifier {
    fn notify(&mut self, level: Level, message: String) {
        tracing::debug!(?level, %message, "notification");
        self.toast = Some(Toast {
            level,
            message,
            created: Instant::now(),
        });
    }

    fn current(&self) -> Option<&Toast> {
        self.toast.as_ref().filter(|t| t.is_visible(self.ttl))
    }

    fn dismiss(&mut self) {
        self.toast = None;
    }
}

/// Prints to stderr so stdout stays clean for table output
#[derive(Debug, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&mut self, level: Level, message: String) {
        let line = format!("{} {}", level.icon(), message);
        match level {
            Level::Success => eprintln!("{}", line.green()),
            Level::Info => eprintln!("{}", line.cyan()),
            Level::Warning => eprintln!("{}", line.yellow()),
            Level::Error => eprintln!("{}", line.red().bold()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_replaces_previous() {
        let mut n = ToastNotifier::default();
        assert!(n.current().is_none());
        n.success("Payment recorded");
        n.error("Upload failed");
        let toast = n.current().unwrap();
        assert_eq!(toast.level, Level::Error);
        assert_eq!(toast.message, "Upload failed");
        n.dismiss();
        assert!(n.current().is_none());
    }

    #[test]
    fn test_toast_expires() {
        let mut n = ToastNotifier::new(Duration::ZERO);
        n.success("gone");
        assert!(n.current().is_none());
    }
}

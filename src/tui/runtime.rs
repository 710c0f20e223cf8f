//! Async runtime and task management for the TUI
//!
//! Two channels feed the main loop:
//! - Input (priority): key, mouse and resize events, never dropped
//! - Data: fetch results, mutation outcomes and clock ticks
//!
//! Every background task goes through a [`Spawner`] so that shutdown can
//! cancel in-flight requests and wait for them to wind down.

use std::future::Future;
use std::io::ErrorKind;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::tui::app::App;
use crate::tui::event::{DataEvent, EventResult, InputEvent};

const INPUT_CHANNEL_CAPACITY: usize = 16;
const DATA_CHANNEL_CAPACITY: usize = 64;

/// Drives toast expiry, the spinner and the live-filter debounce
const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// How long shutdown waits for cancelled tasks
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Starts background work that the runtime can cancel and join
#[derive(Clone, Default)]
pub struct Spawner {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl Spawner {
    /// Run `work` until it completes or the runtime shuts down
    pub fn spawn<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = work => {}
            }
        });
    }

    /// Tasks still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }
}

/// Owns the spawner and tears it down on exit
pub struct TuiRuntime {
    spawner: Spawner,
}

impl TuiRuntime {
    pub fn new() -> Self {
        Self {
            spawner: Spawner::default(),
        }
    }

    /// Handle for the app and the event tasks
    pub fn spawner(&self) -> Spawner {
        self.spawner.clone()
    }

    /// Cancel outstanding work and wait briefly for it to stop
    pub async fn shutdown(self) {
        let Spawner { tracker, cancel } = self.spawner;
        cancel.cancel();
        tracker.close();
        let left = tracker.len();
        if tokio::time::timeout(SHUTDOWN_GRACE, tracker.wait()).await.is_err() {
            tracing::debug!(left, "background tasks did not stop in time");
        }
    }
}

fn is_disconnect(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::UnexpectedEof
    )
}

/// Forward terminal events to the input channel
pub fn spawn_input_task(spawner: &Spawner, tx: mpsc::Sender<InputEvent>) {
    spawner.spawn(async move {
        let mut reader = EventStream::new();
        while let Some(event) = reader.next().await {
            let input = match event {
                Ok(Event::Key(key)) => InputEvent::Key(key),
                Ok(Event::Mouse(mouse)) => InputEvent::Mouse(mouse),
                Ok(Event::Resize(w, h)) => InputEvent::Resize(w, h),
                Ok(_) => continue,
                Err(e) if is_disconnect(&e) => {
                    tracing::info!(error = %e, "terminal disconnected");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "terminal event read error");
                    continue;
                }
            };
            if tx.send(input).await.is_err() {
                break;
            }
        }
    });
}

/// Emit `DataEvent::Tick` on a fixed interval.
///
/// Ticks are dropped rather than queued when the data channel is full.
pub fn spawn_tick_task(spawner: &Spawner, tx: mpsc::Sender<DataEvent>) {
    spawner.spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if tx.is_closed() {
                break;
            }
            let _ = tx.try_send(DataEvent::Tick);
        }
    });
}

/// Run the main TUI event loop
///
/// Input is polled first so a burst of completed fetches cannot starve the
/// keyboard. The screen is redrawn only when a handler reports a change.
pub async fn run_event_loop(
    mut app: App,
    mut input_rx: mpsc::Receiver<InputEvent>,
    mut data_rx: mpsc::Receiver<DataEvent>,
    mut render: impl FnMut(&App) -> Result<()>,
) -> Result<()> {
    render(&app)?;
    while app.running {
        let outcome = tokio::select! {
            biased;
            Some(input) = input_rx.recv() => app.handle_input(input),
            Some(data) = data_rx.recv() => app.handle_data(data),
            else => break,
        };
        match outcome {
            EventResult::Quit => break,
            EventResult::Continue => render(&app)?,
            EventResult::Unchanged => {}
        }
    }
    Ok(())
}

/// Create the input and data channels
pub fn create_channels() -> (
    mpsc::Sender<InputEvent>,
    mpsc::Receiver<InputEvent>,
    mpsc::Sender<DataEvent>,
    mpsc::Receiver<DataEvent>,
) {
    let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
    let (data_tx, data_rx) = mpsc::channel(DATA_CHANNEL_CAPACITY);
    (input_tx, input_rx, data_tx, data_rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tick_task_stops_on_shutdown() {
        let runtime = TuiRuntime::new();
        let (tx, mut rx) = mpsc::channel(4);
        spawn_tick_task(&runtime.spawner(), tx);

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert!(matches!(first, Some(DataEvent::Tick)));

        tokio::time::timeout(Duration::from_secs(3), runtime.shutdown()).await.unwrap();
        // Drain anything queued before the cancel, then the sender is gone
        while rx.try_recv().is_ok() {}
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_pending_work() {
        let runtime = TuiRuntime::new();
        let spawner = runtime.spawner();
        spawner.spawn(std::future::pending());
        spawner.spawn(std::future::pending());
        assert_eq!(spawner.pending(), 2);

        tokio::time::timeout(Duration::from_secs(3), runtime.shutdown()).await.unwrap();
        assert_eq!(spawner.pending(), 0);
    }
}

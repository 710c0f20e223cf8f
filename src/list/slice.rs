//! Async request state for one list resource
//!
//! Lifecycle: `Idle -> Loading -> (Success | Failure)`, re-entrant on the next
//! request. Data from the previous fetch stays in place while a new request is
//! in flight and after a failure, so tables keep rendering stale rows instead
//! of flickering.
//!
//! Every request gets a monotonic id. Only the response to the most recent
//! request is applied; late answers to superseded requests are dropped so a
//! slow response can never overwrite a newer one.

use super::page::Page;

/// Identifies one issued request within a slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Settled interpretation of an `AsyncState`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Failure,
}

/// Tri-state request container
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for AsyncState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> AsyncState<T> {
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Failure
        } else if self.data.is_some() {
            Phase::Success
        } else {
            Phase::Idle
        }
    }
}

/// Request-tracking wrapper around `AsyncState`.
///
/// Works for any payload; list slices hold a `Page<T>`, the metrics
/// dashboard holds a single object.
#[derive(Debug, Clone)]
pub struct Slice<T> {
    state: AsyncState<T>,
    latest: u64,
}

impl<T> Default for Slice<T> {
    fn default() -> Self {
        Self {
            state: AsyncState::default(),
            latest: 0,
        }
    }
}

impl<T> Slice<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &AsyncState<T> {
        &self.state
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.state.data.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// True once any request has been issued
    #[must_use]
    pub fn has_requested(&self) -> bool {
        self.latest > 0
    }

    /// Begin a request: mark loading, clear the error, keep the data
    pub fn request(&mut self) -> RequestId {
        self.latest += 1;
        self.state.loading = true;
        self.state.error = None;
        RequestId(self.latest)
    }

    #[must_use]
    pub fn is_current(&self, id: RequestId) -> bool {
        id.0 == self.latest
    }

    /// Apply a successful response. Returns false if the response was stale.
    pub fn succeed(&mut self, id: RequestId, data: T) -> bool {
        if !self.is_current(id) {
            tracing::debug!(request = %id, latest = self.latest, "Dropping stale response");
            return false;
        }
        self.state.loading = false;
        self.state.data = Some(data);
        self.state.error = None;
        true
    }

    /// Apply a failed response. Data is retained. Returns false if stale.
    pub fn fail(&mut self, id: RequestId, message: impl Into<String>) -> bool {
        if !self.is_current(id) {
            tracing::debug!(request = %id, latest = self.latest, "Dropping stale failure");
            return false;
        }
        self.state.loading = false;
        self.state.error = Some(message.into());
        true
    }

    /// User dismissed the error banner
    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }
}

impl<T> Slice<Page<T>> {
    /// Rows of the last fetched page (empty before the first success)
    #[must_use]
    pub fn rows(&self) -> &[T] {
        self.data().map(|p| p.items.as_slice()).unwrap_or(&[])
    }

    /// Patch a single row in place. Used only for optimistic updates.
    pub fn update_row(&mut self, pred: impl Fn(&T) -> bool, f: impl FnOnce(&mut T)) -> bool {
        if let Some(page) = self.state.data.as_mut()
            && let Some(row) = page.items.iter_mut().find(|r| pred(r))
        {
            f(row);
            return true;
        }
        false
    }
}

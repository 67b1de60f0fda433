use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::state::{QueryState, QueryStatus};
use crate::api::ApiError;

/// A caller's view of one cache entry.
///
/// The view only advances when the caller awaits [`changed`](Self::changed)
/// or [`settled`](Self::settled). After [`cancel`](Self::cancel) it never
/// advances again, even though the underlying request still runs to
/// completion and fills the shared cache.
pub struct QueryHandle<T> {
    rx: watch::Receiver<QueryState<T>>,
    seen: QueryState<T>,
    cancel: CancellationToken,
}

impl<T: Send + Sync + 'static> QueryHandle<T> {
    pub(crate) fn new(mut rx: watch::Receiver<QueryState<T>>) -> Self {
        let seen = rx.borrow_and_update().clone();
        Self {
            rx,
            seen,
            cancel: CancellationToken::new(),
        }
    }

    /// Last state this handle observed.
    pub fn state(&self) -> &QueryState<T> {
        &self.seen
    }

    pub fn status(&self) -> QueryStatus {
        self.seen.status()
    }

    pub fn data(&self) -> Option<Arc<T>> {
        self.seen.data()
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.seen.error()
    }

    pub fn is_loading(&self) -> bool {
        self.seen.is_loading()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop observing. Results that arrive later are not applied to this handle.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the next state. `None` once cancelled.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        if self.cancel.is_cancelled() {
            return None;
        }

        let cancel = self.cancel.clone();
        let updated = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            res = self.rx.changed() => res.is_ok(),
        };

        if !updated || self.cancel.is_cancelled() {
            return None;
        }
        self.seen = self.rx.borrow_and_update().clone();
        Some(self.seen.clone())
    }

    /// Wait until the query succeeds or fails.
    pub async fn settled(&mut self) -> Result<Arc<T>, ApiError> {
        loop {
            match &self.seen {
                QueryState::Success(data) => return Ok(Arc::clone(data)),
                QueryState::Error(err) => return Err(err.clone()),
                QueryState::Idle | QueryState::Loading => {}
            }
            if self.changed().await.is_none() {
                return Err(ApiError::Cancelled);
            }
        }
    }

    /// Run `callback` with the current state, then on every later change,
    /// from a background task.
    ///
    /// Dropping the returned [`Subscription`] cancels the handle, after which
    /// the callback is never invoked again.
    pub fn subscribe<F>(mut self, mut callback: F) -> Subscription
    where
        F: FnMut(QueryState<T>) + Send + 'static,
    {
        let token = self.cancel.clone();
        tokio::spawn(async move {
            if self.is_cancelled() {
                return;
            }
            callback(self.state().clone());

            while let Some(state) = self.changed().await {
                if self.is_cancelled() {
                    break;
                }
                callback(state);
            }
        });

        Subscription {
            _guard: token.drop_guard(),
        }
    }

    /// State changes as a stream, ending on cancellation.
    pub fn into_stream(self) -> impl Stream<Item = QueryState<T>> + Send + 'static {
        let cancel = self.cancel.clone();
        WatchStream::from_changes(self.rx).take_until(cancel.cancelled_owned())
    }
}

/// Keeps a [`QueryHandle::subscribe`] callback alive.
pub struct Subscription {
    _guard: DropGuard,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

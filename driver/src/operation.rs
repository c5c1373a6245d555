//! Pending operations: the only thing a computation may wait on.

use std::fmt;
use std::future::{Future, IntoFuture};

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, TryFutureExt};
use tokio::sync::oneshot;

/// An asynchronous unit that eventually yields a success value or a failure.
///
/// Wraps any `Send` future of `Result<V, E>`. Awaiting it registers the success
/// and failure continuations together; each fires at most once.
pub struct PendingOperation<V, E> {
    future: BoxFuture<'static, Result<V, E>>,
}

impl<V, E> fmt::Debug for PendingOperation<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOperation").finish_non_exhaustive()
    }
}

impl<V, E> PendingOperation<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self {
            future: future.boxed(),
        }
    }

    /// An operation that has already settled.
    pub fn ready(result: Result<V, E>) -> Self {
        Self::new(std::future::ready(result))
    }

    /// Transform the success value, leaving failures untouched.
    pub fn map_ok<U, F>(self, f: F) -> PendingOperation<U, E>
    where
        U: Send + 'static,
        F: FnOnce(V) -> U + Send + 'static,
    {
        PendingOperation::new(self.future.map_ok(f))
    }

    /// Transform the failure, leaving success values untouched.
    pub fn map_err<E2, F>(self, f: F) -> PendingOperation<V, E2>
    where
        E2: Send + 'static,
        F: FnOnce(E) -> E2 + Send + 'static,
    {
        PendingOperation::new(self.future.map_err(f))
    }
}

impl<V, E> IntoFuture for PendingOperation<V, E> {
    type Output = Result<V, E>;
    type IntoFuture = BoxFuture<'static, Result<V, E>>;

    fn into_future(self) -> Self::IntoFuture {
        self.future
    }
}

/// Create an operation settled later through the returned [`Settler`].
///
/// Bridges callback-style producers into a [`PendingOperation`]. If the settler
/// is dropped without settling, the operation stays pending forever.
#[must_use]
pub fn deferred<V, E>() -> (Settler<V, E>, PendingOperation<V, E>)
where
    V: Send + 'static,
    E: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let operation = PendingOperation::new(async move {
        if let Ok(result) = rx.await {
            return result;
        }
        tracing::warn!("Settler dropped without settling; operation will never complete");
        std::future::pending().await
    });
    (Settler { tx }, operation)
}

/// Write side of a [`deferred`] operation.
///
/// Settling consumes the settler, so an operation settles at most once. Settling
/// after the operation itself was dropped is a no-op.
#[derive(Debug)]
pub struct Settler<V, E> {
    tx: oneshot::Sender<Result<V, E>>,
}

impl<V, E> Settler<V, E> {
    pub fn resolve(self, value: V) {
        self.settle(Ok(value));
    }

    pub fn reject(self, error: E) {
        self.settle(Err(error));
    }

    pub fn settle(self, result: Result<V, E>) {
        if self.tx.send(result).is_err() {
            tracing::debug!("Late settlement ignored; operation no longer awaited");
        }
    }
}

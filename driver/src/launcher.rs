//! Coroutine launcher: the entry point callers use.
//!
//! A launch builds a fresh computation from a factory, drives it on its own
//! tokio task, and hands back a [`DeferredResult`] that settles exactly once.
//! Launches are independent of each other: nothing is cached, deduplicated, or
//! retried, and no state is shared between them.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::Instrument;

use crate::computation::Computation;
use crate::error::{DriveError, Outcome};
use crate::executor::{Input, drive};

static NEXT_LAUNCH_ID: AtomicU64 = AtomicU64::new(1);

/// The eventual outcome of one launch.
///
/// Resolves to the computation's final value, or to the first failure it did not
/// recover from. Dropping it does not stop the run; the computation keeps going
/// and its outcome is discarded.
#[derive(Debug)]
#[must_use = "a DeferredResult does nothing to the run when dropped; await it to observe the outcome"]
pub struct DeferredResult<T, E> {
    launch_id: u64,
    receiver: oneshot::Receiver<Outcome<T, E>>,
}

impl<T, E> DeferredResult<T, E> {
    #[must_use]
    pub const fn launch_id(&self) -> u64 {
        self.launch_id
    }
}

impl<T, E> Future for DeferredResult<T, E> {
    type Output = Result<T, DriveError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome.into_result()),
            Poll::Ready(Err(_)) => {
                tracing::warn!(launch_id = this.launch_id, "Launch ended without settling");
                Poll::Ready(Err(DriveError::Abandoned))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Launch a computation built by a zero-argument factory.
///
/// Outside a tokio runtime the launch rejects with [`DriveError::Abandoned`].
pub fn launch<C, F>(factory: F) -> DeferredResult<C::Output, C::Error>
where
    C: Computation,
    F: FnOnce() -> Result<C, C::Error>,
{
    launch_with(|()| factory(), ())
}

/// Launch a computation built by `factory(argument)`.
///
/// If the factory fails, the result is already rejected with
/// [`DriveError::Factory`] and nothing is driven. Outside a tokio runtime the
/// factory still runs, but the launch rejects with [`DriveError::Abandoned`].
pub fn launch_with<A, C, F>(factory: F, argument: A) -> DeferredResult<C::Output, C::Error>
where
    C: Computation,
    F: FnOnce(A) -> Result<C, C::Error>,
{
    let launch_id = NEXT_LAUNCH_ID.fetch_add(1, Ordering::Relaxed);
    let (tx, receiver) = oneshot::channel();

    let computation = match factory(argument) {
        Ok(computation) => computation,
        Err(error) => {
            tracing::warn!(launch_id, "Computation factory failed; nothing to drive");
            let _ = tx.send(Outcome::Rejected(DriveError::Factory(error)));
            return DeferredResult {
                launch_id,
                receiver,
            };
        }
    };

    let Ok(runtime) = Handle::try_current() else {
        tracing::warn!(launch_id, "No tokio runtime to drive the computation on");
        let _ = tx.send(Outcome::Rejected(DriveError::Abandoned));
        return DeferredResult {
            launch_id,
            receiver,
        };
    };

    let on_settled = move |outcome: Outcome<C::Output, C::Error>| {
        match &outcome {
            Outcome::Resolved(_) => tracing::debug!("Launch resolved"),
            Outcome::Rejected(error) => {
                tracing::info!(kind = error.kind(), "Launch rejected");
            }
        }
        if tx.send(outcome).is_err() {
            tracing::trace!("Launch result dropped by caller");
        }
    };

    let span = tracing::debug_span!("launch", launch_id);
    runtime.spawn(drive(computation, Input::Start, on_settled).instrument(span));

    DeferredResult {
        launch_id,
        receiver,
    }
}

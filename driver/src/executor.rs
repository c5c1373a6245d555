//! Step executor: drives one computation to exactly one [`Outcome`].
//!
//! # State Machine
//!
//! ```text
//!            ┌──────────── Value(v) / Failure(e) ◄────────────┐
//!            ▼                                                 │
//! Input ─► advance ─► Finished(r) ─► settle Resolved(r)        │
//!            │                                                 │
//!            ├─► Pending(Operation(op)) ─► await op ───────────┘
//!            ├─► Pending(Bare(_)) ─► settle Rejected(ContractViolation)
//!            └─► Err(e) ─► settle Rejected(Failed(e))
//! ```
//!
//! Advances are strictly sequential: the next advance happens only after the
//! awaited operation has settled and its result has been fed back in. Awaiting
//! never blocks a thread; the executor is an ordinary future.
//!
//! A failed operation is fed back through [`Computation::resume_with_failure`]
//! instead of terminating, so the computation's own recovery logic sees it first.

use crate::computation::{Advance, Computation, Progress, Suspension};
use crate::error::{ContractViolation, DriveError, Outcome};

/// The first thing fed into a computation when driving starts.
#[derive(Debug)]
pub enum Input<V, E> {
    /// Not yet started.
    Start,
    /// Mid-flight; resume with a value.
    Value(V),
    /// Mid-flight; resume with a failure.
    Failure(E),
}

impl<V, E> From<Result<V, E>> for Input<V, E> {
    fn from(result: Result<V, E>) -> Self {
        match result {
            Ok(value) => Input::Value(value),
            Err(error) => Input::Failure(error),
        }
    }
}

/// Settle-once latch around the completion callback.
///
/// Every terminal path goes through [`SettleOnce::settle`]; only the first call
/// reaches the callback.
pub(crate) struct SettleOnce<F> {
    callback: Option<F>,
}

impl<F> SettleOnce<F> {
    pub(crate) const fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub(crate) const fn is_settled(&self) -> bool {
        self.callback.is_none()
    }

    /// Returns `false` when the latch was already closed and `outcome` was dropped.
    pub(crate) fn settle<T>(&mut self, outcome: T) -> bool
    where
        F: FnOnce(T),
    {
        match self.callback.take() {
            Some(callback) => {
                callback(outcome);
                true
            }
            None => {
                tracing::warn!("Ignoring duplicate settlement");
                false
            }
        }
    }
}

/// Drives a single computation.
pub struct StepExecutor<C, F> {
    computation: C,
    latch: SettleOnce<F>,
    steps: usize,
}

impl<C, F> StepExecutor<C, F>
where
    C: Computation,
    F: FnOnce(Outcome<C::Output, C::Error>),
{
    pub const fn new(computation: C, on_settled: F) -> Self {
        Self {
            computation,
            latch: SettleOnce::new(on_settled),
            steps: 0,
        }
    }

    pub async fn run(mut self, input: Input<C::Value, C::Error>) {
        let mut input = input;

        while !self.latch.is_settled() {
            let progress = match self.advance(input) {
                Ok(progress) => progress,
                Err(error) => {
                    tracing::debug!(step = self.steps, "Computation raised; rejecting");
                    self.settle(Outcome::Rejected(DriveError::Failed(error)));
                    break;
                }
            };

            let operation = match progress {
                Progress::Finished(result) => {
                    tracing::debug!(step = self.steps, "Computation finished");
                    self.settle(Outcome::Resolved(result));
                    break;
                }
                Progress::Pending(Suspension::Operation(operation)) => operation,
                Progress::Pending(Suspension::Bare(_)) => {
                    tracing::warn!(
                        step = self.steps,
                        "Computation yielded a plain value instead of a pending operation"
                    );
                    let violation = ContractViolation { step: self.steps };
                    self.settle(Outcome::Rejected(violation.into()));
                    break;
                }
            };

            input = match operation.await {
                Ok(value) => Input::Value(value),
                Err(error) => {
                    tracing::debug!(step = self.steps, "Operation failed; handing failure back");
                    Input::Failure(error)
                }
            };
        }
    }

    fn advance(&mut self, input: Input<C::Value, C::Error>) -> Advance<C> {
        self.steps += 1;
        tracing::trace!(step = self.steps, "Advancing computation");
        match input {
            Input::Start => self.computation.start(),
            Input::Value(value) => self.computation.resume(value),
            Input::Failure(error) => self.computation.resume_with_failure(error),
        }
    }

    fn settle(&mut self, outcome: Outcome<C::Output, C::Error>) {
        let resolved = outcome.is_resolved();
        if self.latch.settle(outcome) {
            tracing::debug!(steps = self.steps, resolved, "Computation settled");
        }
    }
}

/// Drive `computation` to completion, reporting through `on_settled` exactly once.
///
/// `input` is what the first advance feeds in: [`Input::Start`] for a fresh
/// computation, or a value/failure when taking over one mid-flight.
pub async fn drive<C, F>(computation: C, input: Input<C::Value, C::Error>, on_settled: F)
where
    C: Computation,
    F: FnOnce(Outcome<C::Output, C::Error>),
{
    StepExecutor::new(computation, on_settled).run(input).await;
}

/// [`drive`], returning the outcome instead of reporting it through a callback.
pub async fn drive_to_outcome<C>(
    computation: C,
    input: Input<C::Value, C::Error>,
) -> Outcome<C::Output, C::Error>
where
    C: Computation,
{
    let mut settled = None;
    drive(computation, input, |outcome| settled = Some(outcome)).await;
    settled.unwrap_or(Outcome::Rejected(DriveError::Abandoned))
}

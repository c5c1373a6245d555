//! The resumable computation contract.

use crate::operation::PendingOperation;

/// A resumable unit of work, advanced one suspension at a time by the executor.
///
/// Each advance returns either the next thing the computation waits on or its
/// final result. Returning `Err` means the computation raised past its own
/// boundary; the executor never resumes it again after that.
///
/// Once an advance has returned [`Progress::Finished`] or `Err`, the computation
/// must not be advanced again. The executor upholds this; callers driving a
/// computation by hand must too.
pub trait Computation: Send + 'static {
    /// Success value of the operations this computation waits on.
    type Value: Send + 'static;
    /// Final result.
    type Output: Send + 'static;
    /// Failure carried by operations and raised by the computation itself.
    type Error: Send + 'static;

    fn start(&mut self) -> Advance<Self>;

    fn resume(&mut self, value: Self::Value) -> Advance<Self>;

    /// Feed a failed operation's error back in.
    ///
    /// The default has no recovery logic and re-raises the error unchanged.
    fn resume_with_failure(&mut self, error: Self::Error) -> Advance<Self> {
        Err(error)
    }
}

/// Result of one advance of computation `C`.
pub type Advance<C> = Result<
    Progress<<C as Computation>::Output, <C as Computation>::Value, <C as Computation>::Error>,
    <C as Computation>::Error,
>;

/// Where a computation stands after an advance.
#[derive(Debug)]
pub enum Progress<T, V, E> {
    /// Not finished; suspended on whatever it yielded.
    Pending(Suspension<V, E>),
    /// Completed normally. Falsy results (`""`, `0`, `false`) are ordinary results.
    Finished(T),
}

impl<T, V, E> Progress<T, V, E> {
    /// Suspend on `operation`.
    #[must_use]
    pub fn wait(operation: PendingOperation<V, E>) -> Self {
        Progress::Pending(Suspension::Operation(operation))
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Progress::Finished(_))
    }
}

/// What a pending computation yielded.
///
/// Only `Operation` can be waited on. `Bare` is a plain value handed back where an
/// asynchronous unit was expected; the executor rejects it as a contract violation
/// instead of treating it as a result.
#[derive(Debug)]
pub enum Suspension<V, E> {
    Operation(PendingOperation<V, E>),
    Bare(V),
}

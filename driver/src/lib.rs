//! Coroutine driver for stepwise asynchronous computations.
//!
//! # Architecture
//!
//! - [`Computation`] - a resumable routine advanced by `start`, `resume`, and
//!   `resume_with_failure`, each returning a [`Progress`]
//! - [`PendingOperation`] - the only thing a computation may suspend on
//! - [`drive`] - the step executor: advances one computation strictly
//!   sequentially and reports exactly one [`Outcome`]
//! - [`launch`] / [`launch_with`] - the entry point: builds a fresh computation,
//!   drives it on a tokio task, and returns a [`DeferredResult`]
//! - [`is_plain_record`] / [`is_plain_list`] - payload shape checks
//!
//! # Error Handling
//!
//! Failures are pushed into the computation first. An operation failure is fed
//! back through `resume_with_failure`, where the computation may recover; only
//! an unrecovered failure rejects the launch, carried unchanged in
//! [`DriveError::Failed`]. Yielding a plain value where an operation was
//! expected rejects with [`DriveError::ContractViolation`]. A failing factory
//! rejects with [`DriveError::Factory`] before anything runs.
//!
//! There is no cancellation and no timeout: an operation that never settles
//! leaves its launch pending forever. Put timeouts at the operation boundary.

mod classify;
mod computation;
mod error;
mod executor;
mod launcher;
mod operation;

pub use classify::{is_plain_list, is_plain_record};
pub use computation::{Advance, Computation, Progress, Suspension};
pub use error::{ContractViolation, DriveError, Outcome};
pub use executor::{Input, StepExecutor, drive, drive_to_outcome};
pub use launcher::{DeferredResult, launch, launch_with};
pub use operation::{PendingOperation, Settler, deferred};

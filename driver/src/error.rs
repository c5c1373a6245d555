use thiserror::Error;

/// A computation yielded a plain value where a pending operation was required.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("computation yielded a plain value at step {step} instead of a pending operation")]
pub struct ContractViolation {
    /// 1-based index of the advance that produced the bare value.
    pub step: usize,
}

/// Why a launch was rejected.
#[derive(Debug, Error)]
pub enum DriveError<E> {
    /// An operation failure the computation did not recover from, or an error the
    /// computation raised itself. Carried unchanged.
    #[error("{0}")]
    Failed(E),
    #[error(transparent)]
    ContractViolation(#[from] ContractViolation),
    /// The factory failed before any step ran.
    #[error("computation factory failed: {0}")]
    Factory(E),
    /// The driving task ended without settling (no runtime to spawn on, runtime
    /// shutdown, or a panic inside the computation).
    #[error("computation was abandoned before settling")]
    Abandoned,
}

impl<E> DriveError<E> {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            DriveError::Failed(_) => "failed",
            DriveError::ContractViolation(_) => "contract_violation",
            DriveError::Factory(_) => "factory",
            DriveError::Abandoned => "abandoned",
        }
    }

    /// The underlying failure, for the variants that carry one.
    pub fn into_failure(self) -> Option<E> {
        match self {
            DriveError::Failed(e) | DriveError::Factory(e) => Some(e),
            DriveError::ContractViolation(_) | DriveError::Abandoned => None,
        }
    }

    pub fn map_failure<E2>(self, f: impl FnOnce(E) -> E2) -> DriveError<E2> {
        match self {
            DriveError::Failed(e) => DriveError::Failed(f(e)),
            DriveError::Factory(e) => DriveError::Factory(f(e)),
            DriveError::ContractViolation(v) => DriveError::ContractViolation(v),
            DriveError::Abandoned => DriveError::Abandoned,
        }
    }
}

/// Final state of a driven computation. Exactly one is produced per drive.
#[derive(Debug)]
pub enum Outcome<T, E> {
    Resolved(T),
    Rejected(DriveError<E>),
}

impl<T, E> Outcome<T, E> {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Outcome::Resolved(_))
    }

    pub fn into_result(self) -> Result<T, DriveError<E>> {
        match self {
            Outcome::Resolved(value) => Ok(value),
            Outcome::Rejected(error) => Err(error),
        }
    }
}

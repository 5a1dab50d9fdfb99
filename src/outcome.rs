//! Tagged success/failure result of one fetch task

use crate::error::FetchError;

/// Result of a single task: exactly one of a value or a failure cause
///
/// Unlike `Result`, an `Outcome` is a value to be collected, not an error to be
/// propagated with `?`. A batch always yields one outcome per resource.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The task produced a value
    Success(T),
    /// The fetch or the task running it failed
    Failure(FetchError),
}

impl<T> Outcome<T> {
    /// Whether this is a [`Outcome::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Whether this is a [`Outcome::Failure`]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Borrow the success value, if any
    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// Borrow the failure cause, if any
    pub fn failure(&self) -> Option<&FetchError> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }

    /// Transform the success value, leaving failures untouched
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(err) => Outcome::Failure(err),
        }
    }

    /// Convert into a standard `Result`
    pub fn into_result(self) -> Result<T, FetchError> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, FetchError>> for Outcome<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(err),
        }
    }
}

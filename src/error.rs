//! Errors raised when the solver or manifold API is misused.

use thiserror::Error;

/// Contract violations reported at the call site that misused the API.
///
/// None of these are runtime data conditions: they indicate a caller bug and
/// the operation that returned them left all state untouched.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The updateable is already owned by a solver (this one or another).
    #[error("solver updateable already belongs to a solver")]
    AlreadyOwned,

    /// The updateable is not owned by the solver it was removed from.
    #[error("solver updateable does not belong to this solver")]
    NotOwned,

    /// A contact reduction was requested with no contacts and no candidates.
    #[error("cannot reduce an empty contact set")]
    EmptyContactSet,

    /// The worker pool backing the parallel looper could not be created.
    #[cfg(feature = "parallel")]
    #[error("failed to build the solver thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

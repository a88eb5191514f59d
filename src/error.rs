//! Error taxonomy surfaced by the engine (spec §7).
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// The seven error kinds spec.md §7 requires the engine to surface.
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    /// Invalid construction: a nil variable, empty domain, negative offset,
    /// mismatched arities, empty relation rows. Reported synchronously.
    #[error("validation error: {0}")]
    Validation(String),

    /// A constraint detected infeasibility during `propagate`. Local to the
    /// branch that triggered it; callers drop that branch.
    #[error("propagation inconsistency: {0}")]
    Inconsistent(String),

    /// The caller's context was cancelled or its deadline elapsed.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// `nodeLimit` was exhausted during optimization.
    #[error("search limit reached")]
    SearchLimitReached,

    /// `NegateEvaluator` was invoked where the stratification constraint
    /// failed. Non-retryable.
    #[error("stratification violation: predicate {current} is not strictly above {inner}")]
    Stratification { current: u64, inner: u64 },

    /// An operation unsupported in the current context, e.g. pushing into a
    /// lazy stream that has already materialized its result.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A stream was closed; surfaced only where callers must distinguish it
    /// from ordinary exhaustion (`take` on a closed stream otherwise just
    /// returns no more items without an error, per spec.md §7 item 7).
    #[error("stream closed")]
    StreamClosed,
}

impl Error {
    pub fn validation<T: fmt::Display>(msg: T) -> Error {
        Error::Validation(msg.to_string())
    }

    pub fn inconsistent<T: fmt::Display>(msg: T) -> Error {
        Error::Inconsistent(msg.to_string())
    }

    pub fn cancelled<T: fmt::Display>(msg: T) -> Error {
        Error::Cancelled(msg.to_string())
    }

    /// True for errors that are local to a branch and must not propagate
    /// beyond the enclosing search (spec.md §7 "Recovery policy").
    pub fn is_branch_local(&self) -> bool {
        matches!(self, Error::Inconsistent(_))
    }
}

/// A lightweight cooperative cancellation token, checked at every
/// suspension point (spec.md §5 "Cancellation and timeouts").
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(std::sync::Arc<std::sync::atomic::AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::cancelled("context cancelled"))
        } else {
            Ok(())
        }
    }
}

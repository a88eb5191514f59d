//! Thin `tracing` wrappers (spec §4.13), in the style of
//! `seanchatmangpt-knhk`/`inputlayer-inputlayer`'s constraint/query engine
//! instrumentation. The teacher has no logging at all; every call site
//! that uses these helpers is new ambient texture, not new behavior, so
//! they are infallible and never alter control flow.
use tracing::{debug, span, trace, warn, Level};

/// Wraps one `fd::solver::Solver::propagate` fixed-point pass.
pub fn propagation_span(constraint_count: usize) -> tracing::Span {
    span!(Level::DEBUG, "fd_propagate", constraints = constraint_count)
}

pub fn propagation_converged(iterations: u64) {
    debug!(iterations, "propagation reached a fixed point");
}

/// One SLG producer thread's lifecycle (spec §4.9).
pub fn subgoal_started(pred_id: u64, hash: u64) {
    trace!(pred_id, hash, "subgoal producer started");
}

pub fn subgoal_answer(pred_id: u64, hash: u64, answer_count: usize) {
    trace!(pred_id, hash, answer_count, "subgoal produced an answer");
}

pub fn subgoal_finished(pred_id: u64, hash: u64, answer_count: usize) {
    debug!(pred_id, hash, answer_count, "subgoal producer finished");
}

pub fn stratification_violation(parent: u64, child: u64) {
    warn!(parent, child, "negation crosses a recursive stratum; truth value is Undefined");
}

/// `NegateEvaluator`'s static stratum guard rejected a call (spec §4.10
/// step 1), distinct from the dynamic negative-edge SCC case above.
pub fn stratum_guard_rejected(current_pred_id: u64, inner_pred_id: u64) {
    warn!(current_pred_id, inner_pred_id, "negation stratum guard rejected call");
}

/// A branch-and-bound incumbent improved (spec §4.7).
pub fn incumbent_updated(objective_value: i64, minimize: bool) {
    debug!(objective_value, minimize, "branch-and-bound incumbent improved");
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn helpers_do_not_panic_without_a_subscriber() {
        let _span = propagation_span(3).entered();
        propagation_converged(2);
        subgoal_started(1, 42);
        subgoal_answer(1, 42, 1);
        subgoal_finished(1, 42, 1);
        stratification_violation(1, 2);
        stratum_guard_rejected(1, 2);
        incumbent_updated(10, true);
    }
}

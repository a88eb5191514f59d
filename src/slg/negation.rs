//! Well-founded negation (spec §4.10). Grounded on `chalk-engine`'s
//! "negative reduction" step and on `Simmypeet-slg-prolog-solver`'s
//! delay-set handling for `\+`, since the teacher's relational goals have
//! no negation-as-failure counterpart at all.
//!
//! [`NegateEvaluator`] is the primary construct (spec §4.10 steps 1-6): it
//! is installed as the `Evaluator` for the *negating* predicate's own
//! subgoal, and its `run` performs a single non-blocking read of the
//! inner subgoal's current answers/status rather than the three separate
//! fast/status/event paths the spec lists — a `SubgoalEntry`'s trie and
//! status are each readable without blocking, so the three checks collapse
//! into one snapshot read, with [`SLGEngine::is_in_negative_scc`] deciding
//! conditional vs. unconditional emission. Never blocking here matters: two
//! predicates negating each other could otherwise deadlock, each waiting on
//! the other's producer thread to finish before its own can.
//!
//! [`negation_truth`] is the separate blocking truth-probe the spec also
//! names, kept for callers that want a direct synchronous answer instead of
//! installing a tabled evaluator.
use super::{CallPattern, DelaySet, Evaluator, SLGEngine, SlgContext, SubgoalStatus};
use crate::error::{CancellationToken, Error, Result};
use crate::stream::Stream;
use crate::term::Term;
use std::sync::Arc;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NegationTruthValue {
    True,
    False,
    /// The negated subgoal and its negator lie in the same stratum's
    /// negative-edge cycle (spec §4.10 "stratification violation"); under
    /// well-founded semantics this is permanently `Undefined`, not an error.
    Undefined,
}

/// Fails (spec §4.10 step 1) if `current_pred_id`'s stratum does not
/// strictly exceed `inner_pred_id`'s, but only when strict stratification
/// has been opted into for either predicate via `SLGEngine::set_stratum`
/// (see [`SLGEngine::has_stratum`]) — predicates that never register a
/// stratum negate each other unchecked, matching every existing caller in
/// this crate that does not configure strata at all.
pub fn check_stratification(engine: &SLGEngine, current_pred_id: u64, inner_pred_id: u64) -> Result<()> {
    let enforced = engine.has_stratum(current_pred_id) || engine.has_stratum(inner_pred_id);
    if enforced && engine.stratum(current_pred_id) <= engine.stratum(inner_pred_id) {
        return Err(Error::Stratification { current: current_pred_id, inner: inner_pred_id });
    }
    Ok(())
}

/// The evaluator `NegateEvaluator(engine, currentPredId, innerPattern,
/// innerEvaluator)` installs for a negating predicate's own subgoal (spec
/// §4.10, §6). Recurses into `inner`, registers the reverse dependency and
/// negative edge the completion-propagation machinery in `trie.rs` needs,
/// and emits a single empty-binding answer: unconditional if inner is
/// known to have no answers and is not in a negative-edge SCC with the
/// negator, conditional (delay set `{inner.hash}`) otherwise. Emits
/// nothing at all if inner already has an answer.
pub struct NegateEvaluator {
    current_pred_id: u64,
    inner: CallPattern,
    inner_evaluator: Arc<dyn Evaluator>,
}

impl NegateEvaluator {
    pub fn new(current_pred_id: u64, inner: CallPattern, inner_evaluator: Arc<dyn Evaluator>) -> NegateEvaluator {
        NegateEvaluator { current_pred_id, inner, inner_evaluator }
    }
}

impl Evaluator for NegateEvaluator {
    fn run(&self, sc: &SlgContext) {
        let inner_hash = self.inner.hash();
        if check_stratification(sc.engine, self.current_pred_id, self.inner.pred_id).is_err() {
            crate::telemetry::stratum_guard_rejected(self.current_pred_id, self.inner.pred_id);
            return;
        }

        let (_stream, _pre_seq, inner_entry) =
            sc.engine.evaluate_with_handshake(sc.ctx, self.inner.clone(), self.inner_evaluator.clone());

        let parent_hash = sc.entry.hash();
        sc.engine.add_reverse_dep(inner_hash, parent_hash);
        sc.engine.add_negative_edge(parent_hash, inner_hash);

        // A snapshot read, not a blocking one: `scan_from`/`status` can
        // momentarily disagree with an insert landing between the two
        // calls, in which case this falls back to the conditional branch
        // rather than wrongly asserting `True` (the delay set then carries
        // the discrepancy until `inner` completes and simplification or
        // retraction resolves it for good).
        let (first, _has_more) = inner_entry.scan_from(0, 1);
        if !first.is_empty() {
            return;
        }

        // Conditional either because the cycle makes the outcome
        // permanently undecidable (spec §4.10 "isInNegativeSCC"), or
        // because inner simply hasn't finished yet (step 6); either way
        // completion propagation on `inner_hash` will later retract or
        // simplify this answer.
        let conditional = sc.engine.is_in_negative_scc(parent_hash, inner_hash) || inner_entry.status() == SubgoalStatus::Active;
        if conditional {
            let mut delay = DelaySet::new();
            delay.insert(inner_hash);
            sc.emit(Term::atom(1), delay);
        } else {
            sc.emit(Term::atom(1), DelaySet::new());
        }
    }
}

/// Evaluates `\+ inner` against `engine`, blocking until the inner
/// subgoal's tabled answer set is known to be final (spec §4.10
/// `NegationTruth`).
///
/// `parent` is the pattern of the goal performing the negation, used to
/// record the reverse dependency and negative edge driving
/// [`SLGEngine::is_in_negative_scc`].
pub fn negation_truth(
    engine: &Arc<SLGEngine>,
    ctx: &CancellationToken,
    parent: CallPattern,
    inner: CallPattern,
    inner_evaluator: Arc<dyn Evaluator>,
) -> Result<NegationTruthValue> {
    let parent_hash = parent.hash();
    let inner_hash = inner.hash();
    engine.add_negative_edge(parent_hash, inner_hash);
    engine.add_reverse_dep(inner_hash, parent_hash);

    if engine.is_in_negative_scc(parent_hash, inner_hash) {
        crate::telemetry::stratification_violation(parent_hash, inner_hash);
        return Ok(NegationTruthValue::Undefined);
    }

    let (stream, _pre_seq, entry) = engine.evaluate_with_handshake(ctx, inner, inner_evaluator);
    let _ = entry.status();
    let (answers, _has_more) = stream.take(ctx, 1)?;
    if !answers.is_empty() {
        return Ok(NegationTruthValue::False);
    }
    match entry.status() {
        SubgoalStatus::Invalidated => Ok(NegationTruthValue::Undefined),
        _ => Ok(NegationTruthValue::True),
    }
}

/// Adapts a raw `Goal` into an `Evaluator` suitable as `NegateEvaluator`'s
/// `innerEvaluator` (or any other tabled pattern) when the inner
/// computation is a one-off goal closure rather than an already-tabled
/// predicate: runs `goal` to completion against its own stream and
/// republishes each success as a presence marker (the negated goal's
/// bindings are never inspected downstream, only whether it succeeds at
/// all).
pub fn negate_evaluator(goal: crate::goal::Goal, subst: crate::subst::Substitution) -> Arc<dyn Evaluator> {
    Arc::new(move |sc: &SlgContext| {
        let stream = goal.call(sc.ctx, &subst);
        loop {
            match stream.take(sc.ctx, 16) {
                Ok((items, has_more)) => {
                    for _ in items {
                        sc.emit(Term::atom(1), DelaySet::new());
                    }
                    if !has_more {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::subst::Substitution;

    #[test]
    fn negation_of_failing_goal_is_true() {
        let engine = Arc::new(SLGEngine::new());
        let ctx = CancellationToken::new();
        let parent = CallPattern::new(1, Term::nil());
        let inner = CallPattern::new(2, Term::nil());
        let evaluator = negate_evaluator(crate::goal::failure(), Substitution::new());
        let truth = negation_truth(&engine, &ctx, parent, inner, evaluator).unwrap();
        assert_eq!(truth, NegationTruthValue::True);
    }

    #[test]
    fn negation_of_succeeding_goal_is_false() {
        let engine = Arc::new(SLGEngine::new());
        let ctx = CancellationToken::new();
        let parent = CallPattern::new(1, Term::nil());
        let inner = CallPattern::new(3, Term::nil());
        let evaluator = negate_evaluator(crate::goal::success(), Substitution::new());
        let truth = negation_truth(&engine, &ctx, parent, inner, evaluator).unwrap();
        assert_eq!(truth, NegationTruthValue::False);
    }

    #[test]
    fn self_referential_negation_is_undefined() {
        let engine = Arc::new(SLGEngine::new());
        let ctx = CancellationToken::new();
        let pattern = CallPattern::new(9, Term::nil());
        let evaluator = negate_evaluator(crate::goal::failure(), Substitution::new());
        let truth = negation_truth(&engine, &ctx, pattern.clone(), pattern, evaluator).unwrap();
        assert_eq!(truth, NegationTruthValue::Undefined);
    }

    #[test]
    fn negate_evaluator_emits_unconditional_answer_for_an_immediately_empty_inner() {
        let engine = Arc::new(SLGEngine::new());
        let ctx = CancellationToken::new();
        let parent = CallPattern::new(30, Term::nil());
        let inner = CallPattern::new(31, Term::nil());

        let inner_evaluator: Arc<dyn Evaluator> = Arc::new(|_sc: &SlgContext| {});
        let negator: Arc<dyn Evaluator> = Arc::new(NegateEvaluator::new(30, inner.clone(), inner_evaluator));
        let stream = engine.evaluate(&ctx, parent.clone(), negator);
        let (first, _) = stream.take(&ctx, 1).unwrap();
        assert_eq!(first, vec![Term::atom(1)]);

        // Re-query the same tabled pattern: an unconditional answer is
        // never retracted, however much later it is observed.
        std::thread::sleep(std::time::Duration::from_millis(20));
        let noop: Arc<dyn Evaluator> = Arc::new(|_sc: &SlgContext| {});
        let second = engine.evaluate(&ctx, parent, noop);
        let (live, _) = second.take(&ctx, 1).unwrap();
        assert_eq!(live, vec![Term::atom(1)]);
    }

    #[test]
    fn conditional_answer_is_retracted_once_a_delayed_inner_produces_an_answer() {
        let engine = Arc::new(SLGEngine::new());
        let ctx = CancellationToken::new();
        let parent = CallPattern::new(40, Term::nil());
        let inner = CallPattern::new(41, Term::nil());

        let inner_evaluator: Arc<dyn Evaluator> = Arc::new(|sc: &SlgContext| {
            std::thread::sleep(std::time::Duration::from_millis(30));
            sc.emit(Term::atom(1), DelaySet::new());
        });
        let negator: Arc<dyn Evaluator> = Arc::new(NegateEvaluator::new(40, inner.clone(), inner_evaluator));
        let stream = engine.evaluate(&ctx, parent.clone(), negator);

        // `inner` is still active with no answers at this point, so the
        // negation emits a conditional answer (spec §4.10 step 6).
        let (first, _) = stream.take(&ctx, 1).unwrap();
        assert_eq!(first, vec![Term::atom(1)]);

        // Once `inner` produces its delayed answer and completes, the
        // reverse dependency registered by `NegateEvaluator` retracts the
        // conditional answer above.
        std::thread::sleep(std::time::Duration::from_millis(60));
        let noop: Arc<dyn Evaluator> = Arc::new(|_sc: &SlgContext| {});
        let second = engine.evaluate(&ctx, parent, noop);
        let (live, has_more) = second.take(&ctx, 1).unwrap();
        assert!(live.is_empty());
        assert!(!has_more);
    }

    #[test]
    fn negate_evaluator_respects_an_explicit_stratification_guard() {
        let engine = Arc::new(SLGEngine::new());
        let ctx = CancellationToken::new();
        // Stratum 0 (current) does not strictly exceed stratum 0 (inner),
        // and stratification has been opted into for predicate 50.
        engine.set_stratum(50, 0);
        engine.set_stratum(51, 0);
        let parent = CallPattern::new(50, Term::nil());
        let inner = CallPattern::new(51, Term::nil());
        let inner_evaluator: Arc<dyn Evaluator> = Arc::new(|_sc: &SlgContext| {});
        let negator: Arc<dyn Evaluator> = Arc::new(NegateEvaluator::new(50, inner, inner_evaluator));
        let stream = engine.evaluate(&ctx, parent, negator);
        let (answers, has_more) = stream.take(&ctx, 1).unwrap();
        assert!(answers.is_empty());
        assert!(!has_more);
    }
}

//! Goal algebra: a goal is `(ctx, store) -> Stream` (spec §4.3).
//!
//! The teacher encodes goals as an enum (`Goal::Succeed/Fail/Dynamic`) closed
//! over a generic `Solve<U, E>` trait object and driven by a single-threaded
//! trampoline (`goal.rs`, `operator/conj.rs`, `operator/disj.rs`). Spec §4.2
//! requires a genuinely concurrent stream instead, so this module keeps the
//! teacher's "goal wraps a solvable thing" shape but makes the thing a plain
//! closure over `(&CancellationToken, &Substitution)`, and `Conj`/`Disj`
//! spawn producer threads that feed a shared `EagerStream` rather than
//! stepping a lazy tree node by node.
use crate::error::CancellationToken;
use crate::stream::{EagerStream, LazyStream, Stream, DEFAULT_BUFFER};
use crate::subst::Substitution;
use crate::term::Term;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type BoxedStream = Box<dyn Stream<Substitution>>;

/// A goal: given a cancellation token and an input store, produces a stream
/// of output stores. Cloning a `Goal` is an `Arc` bump.
#[derive(Clone)]
pub struct Goal(Arc<dyn Fn(&CancellationToken, &Substitution) -> BoxedStream + Send + Sync>);

impl Goal {
    pub fn new<F>(f: F) -> Goal
    where
        F: Fn(&CancellationToken, &Substitution) -> BoxedStream + Send + Sync + 'static,
    {
        Goal(Arc::new(f))
    }

    pub fn call(&self, ctx: &CancellationToken, s: &Substitution) -> BoxedStream {
        (self.0)(ctx, s)
    }
}

impl std::fmt::Debug for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Goal(..)")
    }
}

/// Emits the input store and closes.
pub fn success() -> Goal {
    Goal::new(|_ctx, s| {
        let s = s.clone();
        Box::new(LazyStream::new(move || vec![s]))
    })
}

/// Closes immediately without emitting.
pub fn failure() -> Goal {
    Goal::new(|_ctx, _s| Box::new(LazyStream::new(Vec::new)))
}

/// `Eq(a, b)`: unifies and emits the derived store, or nothing.
pub fn eq(a: Term, b: Term) -> Goal {
    Goal::new(move |_ctx, s| {
        let out = match crate::unify::unify(&a, &b, s) {
            Some(s2) => vec![s2],
            None => Vec::new(),
        };
        Box::new(LazyStream::new(move || out))
    })
}

/// `Fresh(name) -> Var`: allocates a unique, unbound logic variable.
pub fn fresh(name: &str) -> Term {
    Term::var(name)
}

/// Sequential composition: feeds each output of `gi` as input to `gi+1`.
/// Empty conjunction is `success`.
pub fn conj(goals: Vec<Goal>) -> Goal {
    if goals.is_empty() {
        return success();
    }
    Goal::new(move |ctx, s| {
        let ctx = ctx.clone();
        let s = s.clone();
        let goals = goals.clone();
        let (stream, tx) = EagerStream::<Substitution>::new(DEFAULT_BUFFER);
        let stream = Arc::new(stream);
        let producer = stream.clone();
        std::thread::spawn(move || {
            run_conj_chain(&goals, 0, &ctx, s, &tx);
            producer.close();
        });
        Box::new(stream)
    })
}

fn run_conj_chain(
    goals: &[Goal],
    i: usize,
    ctx: &CancellationToken,
    s: Substitution,
    tx: &crossbeam_channel::Sender<Substitution>,
) {
    if ctx.is_cancelled() {
        return;
    }
    if i == goals.len() {
        let _ = tx.send(s);
        return;
    }
    let branch = goals[i].call(ctx, &s);
    loop {
        match branch.take(ctx, 1) {
            Ok((items, has_more)) => {
                for item in items {
                    run_conj_chain(goals, i + 1, ctx, item, tx);
                }
                if !has_more {
                    break;
                }
            }
            Err(_) => break,
        }
    }
}

/// Interleaved composition: merges the outputs of all branches into one
/// stream. Branch order is not guaranteed, but every branch makes progress
/// (each runs on its own thread against a shared channel). Empty disjunction
/// is `failure`.
pub fn disj(goals: Vec<Goal>) -> Goal {
    if goals.is_empty() {
        return failure();
    }
    Goal::new(move |ctx, s| {
        let (stream, tx) = EagerStream::<Substitution>::new(DEFAULT_BUFFER);
        let stream = Arc::new(stream);
        let remaining = Arc::new(AtomicUsize::new(goals.len()));
        for g in goals.clone() {
            let ctx = ctx.clone();
            let s = s.clone();
            let tx = tx.clone();
            let stream = stream.clone();
            let remaining = remaining.clone();
            std::thread::spawn(move || {
                let branch = g.call(&ctx, &s);
                loop {
                    if ctx.is_cancelled() {
                        break;
                    }
                    match branch.take(&ctx, 1) {
                        Ok((items, has_more)) => {
                            for item in items {
                                let _ = tx.send(item);
                            }
                            if !has_more {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
                if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                    stream.close();
                }
            });
        }
        Box::new(stream)
    })
}

/// Wraps a goal-producing thunk so it is evaluated only when the goal is
/// actually invoked, not when it is constructed. Recursive relations (e.g.
/// `membero`) must wrap their self-calls in `defer` — without it, building
/// the goal for the recursive case would itself recurse without bound
/// before any store ever reaches it (the teacher's macros insert this delay
/// implicitly via `proto_vulcan_closure!`'s lazy expansion).
pub fn defer<F>(f: F) -> Goal
where
    F: Fn() -> Goal + Send + Sync + 'static,
{
    Goal::new(move |ctx, s| f().call(ctx, s))
}

/// Alias for [`conj`].
pub fn and(goals: Vec<Goal>) -> Goal {
    conj(goals)
}

/// Alias for [`disj`].
pub fn or(goals: Vec<Goal>) -> Goal {
    disj(goals)
}

/// Runs `f(q)` and deep-walks `q` in each of the first `n` stores. `n = 0`
/// means unbounded (`run_star`). Allocates its own `CancellationToken`; use
/// [`run_with_context`] to share one across a caller's own timeout or
/// cross-query cancellation.
pub fn run<F>(n: usize, f: F) -> Vec<Term>
where
    F: FnOnce(Term) -> Goal,
{
    run_with_context(&CancellationToken::new(), n, f)
}

/// Like [`run`], but against a `CancellationToken` the caller owns, so a
/// surrounding `WithTimeout` or an unrelated cancellation can stop this run
/// early without the caller having to race against its own stream.
pub fn run_with_context<F>(ctx: &CancellationToken, n: usize, f: F) -> Vec<Term>
where
    F: FnOnce(Term) -> Goal,
{
    let q = fresh("q");
    let goal = f(q.clone());
    let stream = goal.call(ctx, &Substitution::new());
    let mut results = Vec::new();
    loop {
        if n != 0 && results.len() >= n {
            break;
        }
        let want = if n == 0 { 64 } else { n - results.len() };
        match stream.take(ctx, want) {
            Ok((items, has_more)) => {
                for s in items {
                    results.push(s.deep_walk(&q));
                    if n != 0 && results.len() >= n {
                        ctx.cancel();
                        return results;
                    }
                }
                if !has_more {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    results
}

/// `Run(∞, f)`.
pub fn run_star<F>(f: F) -> Vec<Term>
where
    F: FnOnce(Term) -> Goal,
{
    run(0, f)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn success_emits_input_store() {
        let out = run(1, |q| eq(q, Term::atom(1)));
        assert_eq!(out, vec![Term::atom(1)]);
    }

    #[test]
    fn failure_emits_nothing() {
        let out: Vec<Term> = run(1, |_q| failure());
        assert!(out.is_empty());
    }

    #[test]
    fn conj_threads_store_through_each_goal() {
        let out = run(1, |q| {
            let x = fresh("x");
            conj(vec![eq(x.clone(), Term::atom(1)), eq(q, x)])
        });
        assert_eq!(out, vec![Term::atom(1)]);
    }

    #[test]
    fn disj_yields_every_branch() {
        let mut out = run(10, |q| disj(vec![eq(q.clone(), Term::atom(1)), eq(q, Term::atom(2))]));
        out.sort_by_key(|t| t.as_int().unwrap());
        assert_eq!(out, vec![Term::atom(1), Term::atom(2)]);
    }

    #[test]
    fn empty_conj_is_success() {
        let ctx = CancellationToken::new();
        let s0 = Substitution::new();
        let stream = conj(vec![]).call(&ctx, &s0);
        let (items, has_more) = stream.take(&ctx, 1).unwrap();
        assert_eq!(items.len(), 1);
        assert!(!has_more);
    }

    #[test]
    fn run_with_context_shares_the_caller_s_cancellation_token() {
        let ctx = CancellationToken::new();
        let out = run_with_context(&ctx, 1, |q| eq(q, Term::atom("hello")));
        assert_eq!(out, vec![Term::atom("hello")]);
        assert!(ctx.is_cancelled(), "run_with_context cancels its token once n answers are found");
    }

    #[test]
    fn empty_disj_is_failure() {
        let ctx = CancellationToken::new();
        let s0 = Substitution::new();
        let stream = disj(vec![]).call(&ctx, &s0);
        let (items, _) = stream.take(&ctx, 1).unwrap();
        assert!(items.is_empty());
    }
}

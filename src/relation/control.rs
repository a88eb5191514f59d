//! `Onceo`, `Conda`, `Condu`, `Conde`, `Project`, `Noto` (spec §4.3).
//!
//! These inspect a branch's first answer directly via `Stream::take`,
//! mirroring the teacher's committed-choice operators (`operator/conda.rs`,
//! `operator/condu.rs`) but against this crate's concurrent stream instead
//! of a single-threaded trampoline.
use crate::goal::{conj, disj, Goal};
use crate::stream::LazyStream;
use crate::subst::Substitution;
use crate::term::Term;

/// Ordinary (non-committing) miniKanren `conde`: a disjunction of
/// conjunctions. `conde(vec![vec![g1, g2], vec![g3]])` is
/// `disj(vec![conj(vec![g1, g2]), conj(vec![g3])])`, with every clause
/// interleaved the way `disj` interleaves its branches (unlike `conda`,
/// no clause commits — every matching clause's every answer is kept).
pub fn conde(clauses: Vec<Vec<Goal>>) -> Goal {
    disj(clauses.into_iter().map(conj).collect())
}

/// Keeps only the first answer of `g`.
pub fn onceo(g: Goal) -> Goal {
    Goal::new(move |ctx, s| {
        let stream = g.call(ctx, s);
        let (items, _) = stream.take(ctx, 1).unwrap_or_default();
        Box::new(LazyStream::new(move || items))
    })
}

/// Tries `(test, body)` clauses in order; commits to the first clause whose
/// test produces at least one answer (discarding the test's own further
/// answers), then runs that clause's body against the test's first result.
/// Unlike `condu`, all of the chosen body's answers are returned.
pub fn conda(clauses: Vec<(Goal, Goal)>) -> Goal {
    Goal::new(move |ctx, s| {
        for (test, body) in &clauses {
            let test_stream = test.call(ctx, s);
            let (items, _) = test_stream.take(ctx, 1).unwrap_or_default();
            if let Some(s1) = items.into_iter().next() {
                return body.call(ctx, &s1);
            }
        }
        Box::new(LazyStream::new(Vec::<Substitution>::new))
    })
}

/// Like `conda`, but also keeps only the chosen body's first answer.
pub fn condu(clauses: Vec<(Goal, Goal)>) -> Goal {
    Goal::new(move |ctx, s| {
        for (test, body) in &clauses {
            let test_stream = test.call(ctx, s);
            let (items, _) = test_stream.take(ctx, 1).unwrap_or_default();
            if let Some(s1) = items.into_iter().next() {
                let body_stream = body.call(ctx, &s1);
                let (bitems, _) = body_stream.take(ctx, 1).unwrap_or_default();
                return Box::new(LazyStream::new(move || bitems));
            }
        }
        Box::new(LazyStream::new(Vec::<Substitution>::new))
    })
}

/// Deep-walks `vars` under the current store and builds a goal from the
/// resulting (possibly still partial) terms.
pub fn project<F>(vars: Vec<Term>, f: F) -> Goal
where
    F: Fn(Vec<Term>) -> Goal + Send + Sync + 'static,
{
    Goal::new(move |ctx, s| {
        let walked: Vec<Term> = vars.iter().map(|v| s.deep_walk(v)).collect();
        f(walked).call(ctx, s)
    })
}

/// Negation as failure: succeeds (emitting the input store unchanged) iff
/// `g` produces no answer. For stratified negation over tabled subgoals,
/// see [`crate::slg::negation`] instead.
pub fn noto(g: Goal) -> Goal {
    Goal::new(move |ctx, s| {
        let stream = g.call(ctx, s);
        let (items, _) = stream.take(ctx, 1).unwrap_or_default();
        let out = if items.is_empty() { vec![s.clone()] } else { Vec::new() };
        Box::new(LazyStream::new(move || out))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::goal::{conj, eq, fresh, run};

    #[test]
    fn onceo_keeps_single_answer() {
        use crate::goal::disj;
        let out = run(10, |q| onceo(disj(vec![eq(q.clone(), Term::atom(1)), eq(q, Term::atom(2))])));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn conda_commits_to_first_matching_clause() {
        let x = fresh("x");
        let out = run(1, |q| {
            conda(vec![
                (eq(x.clone(), Term::atom(1)), eq(q.clone(), Term::atom("first"))),
                (eq(x.clone(), Term::atom(2)), eq(q, Term::atom("second"))),
            ])
        });
        assert_eq!(out, vec![Term::atom("first")]);
    }

    #[test]
    fn noto_succeeds_when_inner_fails() {
        let out = run(1, |q| conj(vec![eq(q, Term::atom(true)), noto(crate::goal::failure())]));
        assert_eq!(out, vec![Term::atom(true)]);
    }

    #[test]
    fn conde_keeps_every_matching_clause() {
        let mut out = run(10, |q| {
            conde(vec![
                vec![eq(q.clone(), Term::atom(1))],
                vec![eq(q.clone(), Term::atom(2))],
                vec![eq(q, Term::atom(3)), crate::goal::failure()],
            ])
        });
        out.sort_by_key(|t| t.as_int().unwrap());
        assert_eq!(out, vec![Term::atom(1), Term::atom(2)]);
    }

    #[test]
    fn conde_threads_store_within_each_clause() {
        let out = run(1, |q| {
            let x = fresh("x");
            conde(vec![vec![eq(x.clone(), Term::atom(5)), eq(q, x)]])
        });
        assert_eq!(out, vec![Term::atom(5)]);
    }
}

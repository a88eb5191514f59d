//! `Neq`, `Absento`, `Symbolo`, `Numbero` (spec §4.3).
//!
//! Spec §4.3 says these "post corresponding relational constraints into the
//! store rather than resolve immediately when a variable is involved; when
//! all operands are ground, they decide immediately." This module supplies
//! that ground-operand fast path directly over a plain `Substitution`; full
//! deferred enforcement against future bindings is the job of
//! `store::relational::{DisequalityConstraint, AbsenceConstraint,
//! TypeConstraint}` (spec §4.8) once a goal runs under a `UnifiedStore`.
//! When operands are not yet decidable here, these optimistically succeed,
//! matching the store's "Pending" classification rather than rejecting a
//! constraint that might still be satisfiable.
use crate::goal::{eq, Goal};
use crate::stream::LazyStream;
use crate::term::{Atom, Term};

/// `a` and `b` will never unify. Fails only when they are already
/// structurally identical; otherwise succeeds (deferring any future-binding
/// conflict to the relational store).
pub fn neq(a: Term, b: Term) -> Goal {
    Goal::new(move |_ctx, s| {
        let wa = s.deep_walk(&a);
        let wb = s.deep_walk(&b);
        let out = if wa == wb { Vec::new() } else { vec![s.clone()] };
        Box::new(LazyStream::new(move || out))
    })
}

/// `needle` does not occur anywhere within `haystack`.
pub fn absento(needle: Term, haystack: Term) -> Goal {
    Goal::new(move |_ctx, s| {
        let wn = s.deep_walk(&needle);
        let wh = s.deep_walk(&haystack);
        let out = if occurs_in(&wn, &wh) { Vec::new() } else { vec![s.clone()] };
        Box::new(LazyStream::new(move || out))
    })
}

fn occurs_in(needle: &Term, t: &Term) -> bool {
    if needle == t {
        return true;
    }
    match t {
        Term::Pair(car, cdr) => occurs_in(needle, car) || occurs_in(needle, cdr),
        _ => false,
    }
}

/// `t` is bound to a symbol (string atom).
pub fn symbolo(t: Term) -> Goal {
    decide_type(t, |a| matches!(a, Atom::Str(_)))
}

/// `t` is bound to a number (int or float atom).
pub fn numbero(t: Term) -> Goal {
    decide_type(t, |a| matches!(a, Atom::Int(_) | Atom::Float(_)))
}

fn decide_type<F>(t: Term, pred: F) -> Goal
where
    F: Fn(&Atom) -> bool + Send + Sync + 'static,
{
    Goal::new(move |_ctx, s| {
        let walked = s.deep_walk(&t);
        let out = match walked.as_atom() {
            Some(a) if !pred(a) => Vec::new(),
            // Ground and matching, or still a variable (deferred to
            // `store::relational::TypeConstraint`): succeed.
            _ => vec![s.clone()],
        };
        Box::new(LazyStream::new(move || out))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::goal::{conj, run};

    #[test]
    fn neq_rejects_identical_atoms() {
        let out: Vec<Term> = run(1, |q| conj(vec![eq(q, Term::atom(true)), neq(Term::atom(1), Term::atom(1))]));
        assert!(out.is_empty());
    }

    #[test]
    fn neq_accepts_different_atoms() {
        let out = run(1, |q| conj(vec![eq(q.clone(), Term::atom(true)), neq(Term::atom(1), Term::atom(2))]));
        assert_eq!(out, vec![Term::atom(true)]);
    }

    #[test]
    fn absento_detects_occurrence() {
        let haystack = Term::from_vec(vec![Term::atom(1), Term::atom(2)]);
        let out: Vec<Term> = run(1, |q| conj(vec![eq(q, Term::atom(true)), absento(Term::atom(2), haystack.clone())]));
        assert!(out.is_empty());
    }

    #[test]
    fn symbolo_accepts_string_atom() {
        let out = run(1, |q| conj(vec![eq(q.clone(), Term::atom(true)), symbolo(Term::atom("x"))]));
        assert_eq!(out, vec![Term::atom(true)]);
    }

    #[test]
    fn numbero_rejects_symbol() {
        let out: Vec<Term> = run(1, |q| conj(vec![eq(q, Term::atom(true)), numbero(Term::atom("x"))]));
        assert!(out.is_empty());
    }
}

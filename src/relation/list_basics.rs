//! `Car`, `Cdr`, `Cons`, `Nullo`, `Pairo`, `Membero` (spec §4.3).
//!
//! Grounded on the teacher's `relation/conso.rs`, `firsto.rs`, `resto.rs`,
//! `nullo.rs`, `pairo.rs` and `membero.rs`, translated from
//! `proto_vulcan_closure!` pattern matches into explicit `fresh`/`eq`.
use crate::goal::{conj, defer, disj, eq, fresh, Goal};
use crate::term::Term;

/// `out = (first . rest)`.
pub fn cons(first: Term, rest: Term, out: Term) -> Goal {
    eq(Term::cons(first, rest), out)
}

/// `first` is the head of `list`.
pub fn car(list: Term, first: Term) -> Goal {
    let d = fresh("_cdr");
    eq(list, Term::cons(first, d))
}

/// `rest` is `list` without its first element.
pub fn cdr(list: Term, rest: Term) -> Goal {
    let a = fresh("_car");
    eq(list, Term::cons(a, rest))
}

/// `t` is the empty list.
pub fn nullo(t: Term) -> Goal {
    eq(t, Term::nil())
}

/// `t` is a cons pair (of any two terms).
pub fn pairo(t: Term) -> Goal {
    let a = fresh("_pcar");
    let d = fresh("_pcdr");
    eq(t, Term::cons(a, d))
}

/// Succeeds once for each occurrence of `x` in list `l`.
pub fn membero(x: Term, l: Term) -> Goal {
    let head = fresh("_head");
    let tail = fresh("_tail");
    conj(vec![
        eq(l, Term::cons(head.clone(), tail.clone())),
        disj(vec![eq(head, x.clone()), defer(move || membero(x.clone(), tail.clone()))]),
    ])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::goal::run;

    #[test]
    fn cons_builds_pair() {
        let out = run(1, |q| cons(Term::atom(1), Term::atom(2), q));
        assert_eq!(out, vec![Term::cons(Term::atom(1), Term::atom(2))]);
    }

    #[test]
    fn car_extracts_head() {
        let out = run(1, |q| car(Term::from_vec(vec![Term::atom(1), Term::atom(2)]), q));
        assert_eq!(out, vec![Term::atom(1)]);
    }

    #[test]
    fn membero_yields_every_occurrence() {
        let mut out = run(10, |q| membero(q, Term::from_vec(vec![Term::atom(1), Term::atom(2), Term::atom(1)])));
        out.sort_by_key(|t| t.as_int().unwrap());
        assert_eq!(out, vec![Term::atom(1), Term::atom(1), Term::atom(2)]);
    }
}

//! `Appendo`, `Rembero`, `Reverso`, `Permuteo`, `Subseto` (spec §4.3).
//!
//! Grounded on the teacher's `relation/append.rs`, `rembero.rs`,
//! `permuteo.rs`; `reverso`/`subseto` follow the same recursive shape the
//! teacher uses for list relations, generalized to this crate's goals.
use super::typed::neq;
use crate::goal::{conj, defer, disj, eq, fresh, Goal};
use crate::term::Term;

/// `ls` is `s` appended onto `l`.
pub fn appendo(l: Term, s: Term, ls: Term) -> Goal {
    let l2 = l.clone();
    let s2 = s.clone();
    let ls2 = ls.clone();
    disj(vec![
        conj(vec![eq(l, Term::nil()), eq(s, ls)]),
        {
            let x = fresh("_x");
            let l1 = fresh("_l1");
            let l3 = fresh("_l3");
            conj(vec![
                eq(l2, Term::cons(x.clone(), l1.clone())),
                eq(ls2, Term::cons(x, l3.clone())),
                defer(move || appendo(l1.clone(), s2.clone(), l3.clone())),
            ])
        },
    ])
}

/// `out` is `ls` with the first occurrence of `x` removed.
pub fn rembero(x: Term, ls: Term, out: Term) -> Goal {
    let ls2 = ls.clone();
    let out2 = out.clone();
    let ls3 = ls.clone();
    let out3 = out.clone();
    disj(vec![
        conj(vec![eq(ls, Term::nil()), eq(out, Term::nil())]),
        {
            let a = fresh("_a");
            conj(vec![eq(ls2, Term::cons(a.clone(), out2)), eq(a, x.clone())])
        },
        {
            let y = fresh("_y");
            let ys = fresh("_ys");
            let zs = fresh("_zs");
            let x2 = x.clone();
            conj(vec![
                eq(ls3, Term::cons(y.clone(), ys.clone())),
                eq(out3, Term::cons(y.clone(), zs.clone())),
                neq(y, x2),
                defer(move || rembero(x.clone(), ys.clone(), zs.clone())),
            ])
        },
    ])
}

/// `r` is `l` reversed.
pub fn reverso(l: Term, r: Term) -> Goal {
    let l2 = l.clone();
    let r2 = r.clone();
    disj(vec![
        conj(vec![eq(l, Term::nil()), eq(r, Term::nil())]),
        {
            let x = fresh("_x");
            let xs = fresh("_xs");
            let rs = fresh("_rs");
            let rs2 = rs.clone();
            conj(vec![
                eq(l2, Term::cons(x.clone(), xs.clone())),
                defer(move || reverso(xs.clone(), rs.clone())),
                appendo(rs2, Term::cons(x, Term::nil()), r2),
            ])
        },
    ])
}

/// `yl` is a permutation of `xl`, built by removing one element at a time.
pub fn permuteo(xl: Term, yl: Term) -> Goal {
    let xl2 = xl.clone();
    let yl2 = yl.clone();
    disj(vec![
        conj(vec![eq(xl, Term::nil()), eq(yl, Term::nil())]),
        {
            let x = fresh("_x");
            let xs = fresh("_xs");
            let ys = fresh("_ys");
            let ys2 = ys.clone();
            let yl3 = yl2.clone();
            conj(vec![
                eq(xl2, Term::cons(x.clone(), xs.clone())),
                defer(move || permuteo(xs.clone(), ys.clone())),
                rembero(x, yl3, ys2),
            ])
        },
    ])
}

/// Every element of `sub` occurs in `sup`, in the same relative order.
pub fn subseto(sub: Term, sup: Term) -> Goal {
    let sub2 = sub.clone();
    let sup2 = sup.clone();
    let sub3 = sub.clone();
    let sup3 = sup.clone();
    disj(vec![
        eq(sub, Term::nil()),
        {
            let x = fresh("_x");
            let xs = fresh("_xs");
            let ys = fresh("_ys");
            conj(vec![
                eq(sub2, Term::cons(x.clone(), xs.clone())),
                eq(sup2, Term::cons(x, ys.clone())),
                defer(move || subseto(xs.clone(), ys.clone())),
            ])
        },
        {
            let y = fresh("_y");
            let ys = fresh("_ys");
            let ys2 = ys.clone();
            conj(vec![eq(sup3, Term::cons(y, ys)), defer(move || subseto(sub3.clone(), ys2.clone()))])
        },
    ])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::goal::run;

    #[test]
    fn appendo_concatenates() {
        let out = run(1, |q| {
            appendo(
                Term::from_vec(vec![Term::atom(1), Term::atom(2)]),
                Term::from_vec(vec![Term::atom(3)]),
                q,
            )
        });
        assert_eq!(out, vec![Term::from_vec(vec![Term::atom(1), Term::atom(2), Term::atom(3)])]);
    }

    #[test]
    fn rembero_removes_first_match() {
        let out = run(1, |q| {
            rembero(Term::atom(2), Term::from_vec(vec![Term::atom(1), Term::atom(2), Term::atom(2)]), q)
        });
        assert_eq!(out, vec![Term::from_vec(vec![Term::atom(1), Term::atom(2)])]);
    }

    #[test]
    fn reverso_reverses() {
        let out = run(1, |q| reverso(Term::from_vec(vec![Term::atom(1), Term::atom(2), Term::atom(3)]), q));
        assert_eq!(out, vec![Term::from_vec(vec![Term::atom(3), Term::atom(2), Term::atom(1)])]);
    }

    #[test]
    fn subseto_accepts_ordered_subset() {
        let out = run(
            1,
            |q| conj(vec![
                eq(q, Term::atom(true)),
                subseto(Term::from_vec(vec![Term::atom(1), Term::atom(3)]), Term::from_vec(vec![Term::atom(1), Term::atom(2), Term::atom(3)])),
            ]),
        );
        assert_eq!(out, vec![Term::atom(true)]);
    }
}

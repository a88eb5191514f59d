//! `Lengtho`, `LengthoInt`, `Flatteno`, `Distincto` (spec §4.3).
//!
//! These walk the store's current bindings directly (via `deep_walk`)
//! rather than running a fully relational Peano-numeral search; `lengtho`
//! additionally supports the reverse direction (generating a list of fresh
//! variables from a ground length). Documented as a pragmatic scope choice
//! in DESIGN.md — the teacher has no numeral-relation precedent to follow
//! here, so this is grounded on the structural-recursion style of
//! `other_examples/`'s SLD solvers instead of one specific teacher file.
use crate::goal::{eq, fresh, Goal};
use crate::stream::LazyStream;
use crate::term::{Atom, Term};

fn spine_len(t: &Term) -> Option<i64> {
    let mut count = 0i64;
    let mut cur = t;
    loop {
        match cur {
            Term::Pair(_, cdr) => {
                count += 1;
                cur = cdr.as_ref();
            }
            Term::Atom(Atom::Nil) => return Some(count),
            _ => return None,
        }
    }
}

/// Relates `list` to its length `n`. Works list-to-length when `list`'s
/// spine is fully formed, and length-to-list (generating fresh elements)
/// when `n` is a ground non-negative integer.
pub fn lengtho(list: Term, n: Term) -> Goal {
    Goal::new(move |ctx, s| {
        let wl = s.deep_walk(&list);
        if let Some(count) = spine_len(&wl) {
            return eq(n.clone(), Term::atom(count)).call(ctx, s);
        }
        let wn = s.deep_walk(&n);
        if let Some(count) = wn.as_int() {
            if count < 0 {
                return Box::new(LazyStream::new(Vec::new));
            }
            let items: Vec<Term> = (0..count).map(|i| fresh(&format!("_len{i}"))).collect();
            return eq(list.clone(), Term::from_vec(items)).call(ctx, s);
        }
        Box::new(LazyStream::new(Vec::new))
    })
}

/// List-to-length only; fails (rather than generating) when `list`'s spine
/// is not fully ground.
pub fn lengtho_int(list: Term, n: Term) -> Goal {
    Goal::new(move |ctx, s| match spine_len(&s.deep_walk(&list)) {
        Some(count) => eq(n.clone(), Term::atom(count)).call(ctx, s),
        None => Box::new(LazyStream::new(Vec::new)),
    })
}

fn flatten_into(t: &Term, out: &mut Vec<Term>) {
    match t {
        Term::Atom(Atom::Nil) => {}
        Term::Pair(car, cdr) => {
            match car.as_ref() {
                Term::Pair(_, _) | Term::Atom(Atom::Nil) => flatten_into(car, out),
                other => out.push(other.clone()),
            }
            flatten_into(cdr, out);
        }
        other => out.push(other.clone()),
    }
}

/// Flattens arbitrarily nested list structure into a single flat list.
pub fn flatteno(nested: Term, flat: Term) -> Goal {
    Goal::new(move |ctx, s| {
        let walked = s.deep_walk(&nested);
        let mut out = Vec::new();
        flatten_into(&walked, &mut out);
        eq(flat.clone(), Term::from_vec(out)).call(ctx, s)
    })
}

/// Succeeds iff every element of `list` is pairwise distinct.
pub fn distincto(list: Term) -> Goal {
    Goal::new(move |ctx, s| {
        let walked = s.deep_walk(&list);
        let items = walked.to_vec();
        let mut ok = true;
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                if items[i] == items[j] {
                    ok = false;
                }
            }
        }
        let out = if ok { vec![s.clone()] } else { Vec::new() };
        Box::new(LazyStream::new(move || out))
    })
}

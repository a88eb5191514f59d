//! Persistent substitution mapping variable ids to terms (spec §3, §4.1).
use crate::term::{Term, VarId};
use std::collections::HashMap;
use std::sync::Arc;

/// A persistent map `VarId -> Term`. Cloning is O(1) (an `Arc` bump); a
/// structural write clones the underlying map only on that write, matching
/// the teacher's `SMap` clone-on-write discipline (`state/substitution.rs`)
/// but generalized to `Arc` so substitutions can be shared across threads.
#[derive(Clone, Debug, Default)]
pub struct Substitution {
    map: Arc<HashMap<VarId, Term>>,
}

impl Substitution {
    pub fn new() -> Substitution {
        Substitution {
            map: Arc::new(HashMap::new()),
        }
    }

    pub fn size(&self) -> usize {
        self.map.len()
    }

    pub fn lookup(&self, v: VarId) -> Option<&Term> {
        self.map.get(&v)
    }

    /// Returns a new substitution extended with `v -> t`. `self` is left
    /// unchanged (spec §8 "Substitution persistence").
    pub fn bind(&self, v: VarId, t: Term) -> Substitution {
        let mut map = (*self.map).clone();
        map.insert(v, t);
        Substitution { map: Arc::new(map) }
    }

    /// Chase variable bindings until a non-variable or unbound variable is
    /// reached.
    pub fn walk<'a>(&'a self, t: &'a Term) -> &'a Term {
        let mut current = t;
        loop {
            match current {
                Term::Var(id, _) => match self.lookup(*id) {
                    Some(next) => current = next,
                    None => return current,
                },
                _ => return current,
            }
        }
    }

    /// Like `walk`, but additionally descends into pairs, producing a fully
    /// dereferenced term (teacher's `deep_walk`/`walk_star`).
    pub fn deep_walk(&self, t: &Term) -> Term {
        let walked = self.walk(t).clone();
        match walked {
            Term::Pair(car, cdr) => {
                Term::cons(self.deep_walk(car.as_ref()), self.deep_walk(cdr.as_ref()))
            }
            other => other,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VarId, &Term)> {
        self.map.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bind_does_not_mutate_original() {
        let s0 = Substitution::new();
        let v = Term::var("x");
        let vid = v.as_var().unwrap();
        let s1 = s0.bind(vid, Term::atom(1));
        assert_eq!(s0.size(), 0);
        assert_eq!(s1.size(), 1);
        assert_eq!(s1.lookup(vid), Some(&Term::atom(1)));
    }

    #[test]
    fn walk_chases_chains() {
        let s0 = Substitution::new();
        let x = Term::var("x");
        let y = Term::var("y");
        let xid = x.as_var().unwrap();
        let yid = y.as_var().unwrap();
        let s1 = s0.bind(xid, y.clone()).bind(yid, Term::atom(42));
        assert_eq!(s1.walk(&x), &Term::atom(42));
    }

    #[test]
    fn deep_walk_descends_pairs() {
        let s0 = Substitution::new();
        let x = Term::var("x");
        let xid = x.as_var().unwrap();
        let s1 = s0.bind(xid, Term::atom(7));
        let pair = Term::cons(x, Term::atom(8));
        assert_eq!(s1.deep_walk(&pair), Term::cons(Term::atom(7), Term::atom(8)));
    }
}

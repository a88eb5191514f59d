//! Canonical call patterns and their stable structural hash (spec §4.9,
//! spec §3 "SLG entities"), grounded on `chalk-engine`'s canonicalization of
//! a `Goal` before it becomes a `Table` key, and on
//! `Simmypeet-slg-prolog-solver`'s `table.rs` subgoal identity.
use crate::term::{Atom, Term, VarId};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

pub type PatternHash = u64;

/// A predicate id plus its (not yet canonicalized) argument term.
#[derive(Clone, Debug)]
pub struct CallPattern {
    pub pred_id: u64,
    pub args: Term,
}

impl CallPattern {
    pub fn new(pred_id: u64, args: Term) -> CallPattern {
        CallPattern { pred_id, args }
    }

    /// Stable 64-bit digest: variables are renamed to their first-occurrence
    /// order (`X0, X1, ...`) before hashing, so two calls with the same
    /// shape but unrelated `VarId`s share one `SubgoalEntry`.
    pub fn hash(&self) -> PatternHash {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.pred_id.hash(&mut hasher);
        let mut remap = HashMap::new();
        hash_canonical(&self.args, &mut remap, &mut hasher);
        hasher.finish()
    }
}

fn hash_canonical<H: Hasher>(t: &Term, remap: &mut HashMap<VarId, u32>, hasher: &mut H) {
    match t {
        Term::Var(id, _) => {
            let next = remap.len() as u32;
            let slot = *remap.entry(*id).or_insert(next);
            0u8.hash(hasher);
            slot.hash(hasher);
        }
        Term::Atom(a) => {
            1u8.hash(hasher);
            hash_atom(a, hasher);
        }
        Term::Pair(car, cdr) => {
            2u8.hash(hasher);
            hash_canonical(car, remap, hasher);
            hash_canonical(cdr, remap, hasher);
        }
    }
}

fn hash_atom<H: Hasher>(a: &Atom, hasher: &mut H) {
    match a {
        Atom::Int(v) => {
            0u8.hash(hasher);
            v.hash(hasher);
        }
        Atom::Float(v) => {
            1u8.hash(hasher);
            v.to_bits().hash(hasher);
        }
        Atom::Str(v) => {
            2u8.hash(hasher);
            v.hash(hasher);
        }
        Atom::Bool(v) => {
            3u8.hash(hasher);
            v.hash(hasher);
        }
        Atom::Nil => 4u8.hash(hasher),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn patterns_with_renamed_vars_share_a_hash() {
        let a = CallPattern::new(1, Term::from_vec(vec![Term::var("x"), Term::var("y")]));
        let b = CallPattern::new(1, Term::from_vec(vec![Term::var("p"), Term::var("q")]));
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn patterns_with_different_structure_differ() {
        let a = CallPattern::new(1, Term::from_vec(vec![Term::atom(1)]));
        let b = CallPattern::new(1, Term::from_vec(vec![Term::atom(2)]));
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn different_predicates_differ_even_with_same_args() {
        let a = CallPattern::new(1, Term::var("x"));
        let b = CallPattern::new(2, Term::var("x"));
        assert_ne!(a.hash(), b.hash());
    }
}

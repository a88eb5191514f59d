//! Relational constraints posted by `Neq`/`Absento`/type-testing goals and
//! resolved by the relational plugin (spec §4.8), grounded on the teacher's
//! `state/constraint::{Constraint, DisequalityConstraint}` but reworked
//! around a `resolve` closure instead of a direct `SMap` reference, matching
//! the `FdConstraint::propagate(get: &dyn Fn(...))` decoupling this crate
//! uses throughout.
use crate::term::{Atom, Term};
use std::sync::atomic::{AtomicU64, Ordering};

static CONSTRAINT_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_id() -> u64 {
    CONSTRAINT_COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ConstraintStatus {
    Satisfied,
    Violated,
    Pending,
}

/// A constraint posted into a `UnifiedStore`, checked against the store's
/// current bindings on every propagation pass.
pub trait RelationalConstraint: Send + Sync + std::fmt::Debug {
    fn id(&self) -> u64;

    /// Constraints local to one branch of search are dropped on backtrack
    /// rather than carried structurally; all constraints here are local.
    fn is_local(&self) -> bool {
        true
    }

    fn variables(&self) -> Vec<Term>;

    fn check(&self, resolve: &dyn Fn(&Term) -> Term) -> ConstraintStatus;
}

#[derive(Clone, Debug)]
pub struct DisequalityConstraint {
    id: u64,
    a: Term,
    b: Term,
}

impl DisequalityConstraint {
    pub fn new(a: Term, b: Term) -> DisequalityConstraint {
        DisequalityConstraint { id: next_id(), a, b }
    }
}

impl RelationalConstraint for DisequalityConstraint {
    fn id(&self) -> u64 {
        self.id
    }

    fn variables(&self) -> Vec<Term> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn check(&self, resolve: &dyn Fn(&Term) -> Term) -> ConstraintStatus {
        let a = resolve(&self.a);
        let b = resolve(&self.b);
        if a == b {
            ConstraintStatus::Violated
        } else if is_ground(&a) && is_ground(&b) {
            ConstraintStatus::Satisfied
        } else {
            ConstraintStatus::Pending
        }
    }
}

#[derive(Clone, Debug)]
pub struct AbsenceConstraint {
    id: u64,
    needle: Term,
    haystack: Term,
}

impl AbsenceConstraint {
    pub fn new(needle: Term, haystack: Term) -> AbsenceConstraint {
        AbsenceConstraint { id: next_id(), needle, haystack }
    }
}

impl RelationalConstraint for AbsenceConstraint {
    fn id(&self) -> u64 {
        self.id
    }

    fn variables(&self) -> Vec<Term> {
        vec![self.needle.clone(), self.haystack.clone()]
    }

    fn check(&self, resolve: &dyn Fn(&Term) -> Term) -> ConstraintStatus {
        let needle = resolve(&self.needle);
        let haystack = resolve(&self.haystack);
        if occurs_in(&needle, &haystack) {
            ConstraintStatus::Violated
        } else if is_ground(&haystack) {
            ConstraintStatus::Satisfied
        } else {
            ConstraintStatus::Pending
        }
    }
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

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TypeKind {
    SymbolType,
    NumberType,
    BoolType,
}

#[derive(Clone, Debug)]
pub struct TypeConstraint {
    id: u64,
    term: Term,
    kind: TypeKind,
}

impl TypeConstraint {
    pub fn new(term: Term, kind: TypeKind) -> TypeConstraint {
        TypeConstraint { id: next_id(), term, kind }
    }
}

impl RelationalConstraint for TypeConstraint {
    fn id(&self) -> u64 {
        self.id
    }

    fn variables(&self) -> Vec<Term> {
        vec![self.term.clone()]
    }

    fn check(&self, resolve: &dyn Fn(&Term) -> Term) -> ConstraintStatus {
        match resolve(&self.term).as_atom() {
            Some(a) => {
                let ok = match self.kind {
                    TypeKind::SymbolType => matches!(a, Atom::Str(_)),
                    TypeKind::NumberType => matches!(a, Atom::Int(_) | Atom::Float(_)),
                    TypeKind::BoolType => matches!(a, Atom::Bool(_)),
                };
                if ok {
                    ConstraintStatus::Satisfied
                } else {
                    ConstraintStatus::Violated
                }
            }
            None => ConstraintStatus::Pending,
        }
    }
}

fn is_ground(t: &Term) -> bool {
    match t {
        Term::Var(_, _) => false,
        Term::Atom(_) => true,
        Term::Pair(car, cdr) => is_ground(car) && is_ground(cdr),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn disequality_violated_when_equal() {
        let c = DisequalityConstraint::new(Term::atom(1), Term::atom(1));
        assert_eq!(c.check(&|t| t.clone()), ConstraintStatus::Violated);
    }

    #[test]
    fn disequality_satisfied_when_ground_and_different() {
        let c = DisequalityConstraint::new(Term::atom(1), Term::atom(2));
        assert_eq!(c.check(&|t| t.clone()), ConstraintStatus::Satisfied);
    }

    #[test]
    fn disequality_pending_with_unbound_var() {
        let x = Term::var("x");
        let c = DisequalityConstraint::new(x, Term::atom(2));
        assert_eq!(c.check(&|t| t.clone()), ConstraintStatus::Pending);
    }

    #[test]
    fn absence_violated_on_occurrence() {
        let haystack = Term::from_vec(vec![Term::atom(1), Term::atom(2)]);
        let c = AbsenceConstraint::new(Term::atom(2), haystack);
        assert_eq!(c.check(&|t| t.clone()), ConstraintStatus::Violated);
    }

    #[test]
    fn type_constraint_pending_on_var() {
        let c = TypeConstraint::new(Term::var("x"), TypeKind::NumberType);
        assert_eq!(c.check(&|t| t.clone()), ConstraintStatus::Pending);
    }
}

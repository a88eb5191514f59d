//! Logic terms: variables, atoms, and cons pairs (spec §3 "Term").
//!
//! Terms are acyclic at construction and immutable once built; cloning an
//! `Arc`-backed `Term` is cheap and sharing is safe across threads, unlike
//! the teacher's `Rc`-backed `LTerm` which is confined to one thread.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static VAR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Globally unique logic variable identifier (spec §3 "Var").
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VarId(pub u64);

impl VarId {
    pub fn fresh() -> VarId {
        VarId(VAR_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.0)
    }
}

/// Immutable, typed ground value.
#[derive(Clone, Debug)]
pub enum Atom {
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Bool(bool),
    Nil,
}

impl Atom {
    pub fn type_name(&self) -> &'static str {
        match self {
            Atom::Int(_) => "number",
            Atom::Float(_) => "number",
            Atom::Str(_) => "symbol",
            Atom::Bool(_) => "bool",
            Atom::Nil => "nil",
        }
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Atom) -> bool {
        match (self, other) {
            (Atom::Int(a), Atom::Int(b)) => a == b,
            (Atom::Float(a), Atom::Float(b)) => a.to_bits() == b.to_bits(),
            (Atom::Str(a), Atom::Str(b)) => a == b,
            (Atom::Bool(a), Atom::Bool(b)) => a == b,
            (Atom::Nil, Atom::Nil) => true,
            _ => false,
        }
    }
}
impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Atom::Int(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            Atom::Float(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
            Atom::Str(v) => {
                2u8.hash(state);
                v.hash(state);
            }
            Atom::Bool(v) => {
                3u8.hash(state);
                v.hash(state);
            }
            Atom::Nil => 4u8.hash(state),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Int(v) => write!(f, "{}", v),
            Atom::Float(v) => write!(f, "{}", v),
            Atom::Str(v) => write!(f, "{}", v),
            Atom::Bool(v) => write!(f, "{}", v),
            Atom::Nil => write!(f, "()"),
        }
    }
}

impl From<i64> for Atom {
    fn from(v: i64) -> Atom {
        Atom::Int(v)
    }
}
impl From<f64> for Atom {
    fn from(v: f64) -> Atom {
        Atom::Float(v)
    }
}
impl From<bool> for Atom {
    fn from(v: bool) -> Atom {
        Atom::Bool(v)
    }
}
impl From<&str> for Atom {
    fn from(v: &str) -> Atom {
        Atom::Str(Arc::from(v))
    }
}
impl From<String> for Atom {
    fn from(v: String) -> Atom {
        Atom::Str(Arc::from(v.as_str()))
    }
}

/// A logic term: a variable, a ground atom, or a cons pair.
///
/// Lists are right-nested pairs ending in `Term::Atom(Atom::Nil)`, as in the
/// teacher's `LTerm::Cons`/`LTerm::Empty`.
#[derive(Clone, Debug)]
pub enum Term {
    Var(VarId, Arc<str>),
    Atom(Atom),
    Pair(Arc<Term>, Arc<Term>),
}

impl Term {
    pub fn var(name: &str) -> Term {
        Term::Var(VarId::fresh(), Arc::from(name))
    }

    pub fn atom<A: Into<Atom>>(value: A) -> Term {
        Term::Atom(value.into())
    }

    pub fn nil() -> Term {
        Term::Atom(Atom::Nil)
    }

    pub fn cons(car: Term, cdr: Term) -> Term {
        Term::Pair(Arc::new(car), Arc::new(cdr))
    }

    pub fn from_vec(items: Vec<Term>) -> Term {
        let mut list = Term::nil();
        for item in items.into_iter().rev() {
            list = Term::cons(item, list);
        }
        list
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_, _))
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Term::Atom(_))
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Term::Pair(_, _))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Atom(Atom::Nil))
    }

    /// A term is a (possibly improper) list head if it is nil or a pair.
    pub fn is_list(&self) -> bool {
        self.is_nil() || self.is_pair()
    }

    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Term::Var(id, _) => Some(*id),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Term::Atom(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Atom(Atom::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn car(&self) -> Option<&Term> {
        match self {
            Term::Pair(a, _) => Some(a),
            _ => None,
        }
    }

    pub fn cdr(&self) -> Option<&Term> {
        match self {
            Term::Pair(_, d) => Some(d),
            _ => None,
        }
    }

    /// Iterate the proper-list prefix of this term; stops at the first
    /// non-pair tail (an improper tail is simply not yielded).
    pub fn iter(&self) -> TermIter<'_> {
        TermIter { next: Some(self) }
    }

    pub fn to_vec(&self) -> Vec<Term> {
        self.iter().cloned().collect()
    }
}

pub struct TermIter<'a> {
    next: Option<&'a Term>,
}

impl<'a> Iterator for TermIter<'a> {
    type Item = &'a Term;

    fn next(&mut self) -> Option<&'a Term> {
        match self.next.take() {
            Some(Term::Pair(car, cdr)) => {
                self.next = Some(cdr.as_ref());
                Some(car.as_ref())
            }
            _ => None,
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Var(a, _), Term::Var(b, _)) => a == b,
            (Term::Atom(a), Term::Atom(b)) => a == b,
            (Term::Pair(a1, d1), Term::Pair(a2, d2)) => a1 == a2 && d1 == d2,
            _ => false,
        }
    }
}
impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Term::Var(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Term::Atom(a) => {
                1u8.hash(state);
                a.hash(state);
            }
            Term::Pair(car, cdr) => {
                2u8.hash(state);
                car.hash(state);
                cdr.hash(state);
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(id, name) => write!(f, "{}{}", name, id),
            Term::Atom(a) => write!(f, "{}", a),
            Term::Pair(_, _) => {
                write!(f, "(")?;
                let mut cur = self;
                let mut first = true;
                loop {
                    match cur {
                        Term::Pair(car, cdr) => {
                            if !first {
                                write!(f, " ")?;
                            }
                            write!(f, "{}", car)?;
                            first = false;
                            cur = cdr.as_ref();
                        }
                        Term::Atom(Atom::Nil) => break,
                        other => {
                            write!(f, " . {}", other)?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
        }
    }
}

impl From<i64> for Term {
    fn from(v: i64) -> Term {
        Term::atom(v)
    }
}
impl From<bool> for Term {
    fn from(v: bool) -> Term {
        Term::atom(v)
    }
}
impl From<&str> for Term {
    fn from(v: &str) -> Term {
        Term::atom(v)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn var_identity_by_id() {
        let a = Term::var("x");
        let b = Term::var("x");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn list_round_trip() {
        let list = Term::from_vec(vec![Term::atom(1), Term::atom(2), Term::atom(3)]);
        let items: Vec<i64> = list.iter().map(|t| t.as_int().unwrap()).collect();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn display_list() {
        let list = Term::from_vec(vec![Term::atom(1), Term::atom(2)]);
        assert_eq!(format!("{}", list), "(1 2)");
    }
}

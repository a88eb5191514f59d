//! FD propagators (spec §4.5).
//!
//! Each propagator is pure: it reads the current domain of its variables
//! through a `get` callback and returns the narrowings it can prove, never
//! mutating anything itself. The solver's worklist (`fd::solver::propagate`)
//! applies the returned changes and decides which other constraints to
//! re-run, so a propagator only needs to decide "does the current domain
//! assignment admit a tighter one".
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;
use std::fmt;

pub mod absolute;
pub mod all_different;
pub mod arithmetic;
pub mod bool_sum;
pub mod cumulative;
pub mod diffn;
pub mod element_values;
pub mod equality_reified;
pub mod inequality;
pub mod linear_sum;
pub mod min_max_of_array;
pub mod table;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ConstraintKind {
    AllDifferent,
    Arithmetic,
    LinearSum,
    BoolSum,
    Inequality,
    Absolute,
    ElementValues,
    Table,
    MinOfArray,
    MaxOfArray,
    Cumulative,
    Diffn,
    EqualityReified,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum InequalityKind {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

/// A single domain narrowing the solver should apply.
pub type DomainChange = (VarRef, Domain);

pub trait FdConstraint: Send + Sync + fmt::Debug + std::any::Any {
    fn variables(&self) -> Vec<VarRef>;
    fn kind(&self) -> ConstraintKind;

    /// Lets the optimizer's structural-bound computation (spec §4.7)
    /// recognize a constraint's concrete shape (`LinearSum`, `BoolSum`,
    /// ...) without the `Model` needing to know every propagator type.
    fn as_any(&self) -> &dyn std::any::Any;

    /// True for constraints whose variables should be registered as mutual
    /// peers for degree-based heuristics (spec §4.4): AllDifferent and
    /// similarly "everyone depends on everyone" constraints.
    fn implies_pairwise(&self) -> bool {
        false
    }

    /// `get(v)` returns `v`'s current domain. Returns the narrowings this
    /// constraint can prove given that snapshot, or `Err(Inconsistent)` if
    /// the constraint cannot be satisfied.
    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>>;

    fn clone_box(&self) -> Box<dyn FdConstraint>;
}

impl Clone for Box<dyn FdConstraint> {
    fn clone(&self) -> Box<dyn FdConstraint> {
        self.clone_box()
    }
}

pub(crate) fn inconsistent(kind: ConstraintKind, detail: &str) -> crate::error::Error {
    crate::error::Error::inconsistent(format!("{:?}: {}", kind, detail))
}

#![doc = include_str!("../README.md")]

pub mod error;
pub mod term;
pub mod subst;
pub mod unify;
pub mod stream;
pub mod goal;
pub mod relation;
pub mod fd;
pub mod store;
pub mod slg;
pub mod orchestration;
mod telemetry;

pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::fd::constraint::FdConstraint;
    pub use crate::fd::domain::Domain;
    pub use crate::fd::model::Model;
    pub use crate::fd::model::{ValueHeuristic, VariableHeuristic};
    pub use crate::fd::solver::{Solver, SolverConfig};
    pub use crate::fd::variable::{FdVar, VarRef};
    pub use crate::goal::{conj, disj, fresh, run, run_star, run_with_context, Goal};
    pub use crate::relation::conde;
    pub use crate::store::{HybridSolver, Store, UnifiedStore};
    pub use crate::stream::Stream;
    pub use crate::subst::Substitution;
    pub use crate::term::{Atom, Term, VarId};
    pub use crate::unify::unify;
}

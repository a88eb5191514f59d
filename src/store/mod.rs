//! Hybrid store and plugin-based propagation (spec §4.8).
//!
//! The teacher routes every goal through one `State<U, E>` that bundles a
//! substitution with a `ConstraintStore` (`state/mod.rs`,
//! `state/constraint/store.rs`). This module keeps that "one store, many
//! concerns" shape but splits the concerns into named layers —
//! substitution, FD solver state, and a relational constraint set — so a
//! `HybridSolver` can drive each layer to a fixed point independently via
//! its own plugin, per spec §4.8.
pub mod plugin;
pub mod relational;

use crate::error::{Error, Result};
use crate::fd::solver::{Solver, SolverState};
use crate::fd::variable::VarRef;
use crate::subst::Substitution;
use crate::term::{Term, VarId};
use relational::RelationalConstraint;
use std::sync::Arc;

pub use plugin::{FdPlugin, Plugin, RelationalPlugin};

/// Minimal contract shared by every store kind: access to the current
/// substitution so goals (§4.1–§4.3) can unify and walk without depending
/// on FD or relational layers.
pub trait Store: Clone + Send + Sync {
    fn substitution(&self) -> &Substitution;
}

/// A store with no FD or relational layers, used by plain goal evaluation
/// outside of `HybridSolver` orchestration.
#[derive(Clone, Debug, Default)]
pub struct LocalStore {
    subst: Substitution,
}

impl LocalStore {
    pub fn new() -> LocalStore {
        LocalStore { subst: Substitution::new() }
    }

    pub fn unify(&self, a: &Term, b: &Term) -> Option<LocalStore> {
        crate::unify::unify(a, b, &self.subst).map(|subst| LocalStore { subst })
    }
}

impl Store for LocalStore {
    fn substitution(&self) -> &Substitution {
        &self.subst
    }
}

/// A persistent layered store: substitution, optional FD solver state, and
/// a set of posted relational constraints (spec §4.8 "UnifiedStore").
#[derive(Clone)]
pub struct UnifiedStore {
    subst: Substitution,
    fd_solver: Option<Arc<Solver>>,
    fd_state: Option<SolverState>,
    relational: Arc<Vec<Arc<dyn RelationalConstraint>>>,
    /// Explicit links between an FD variable and the logic-term variable
    /// standing in for it, established by [`UnifiedStore::link_fd_var`]
    /// rather than inferred from matching names (spec §4.8 item 2 needs a
    /// stable identity, and two `Term::var` calls with the same name are
    /// still distinct `VarId`s).
    fd_links: Arc<Vec<(VarRef, Term)>>,
}

impl UnifiedStore {
    pub fn new() -> UnifiedStore {
        UnifiedStore {
            subst: Substitution::new(),
            fd_solver: None,
            fd_state: None,
            relational: Arc::new(Vec::new()),
            fd_links: Arc::new(Vec::new()),
        }
    }

    /// Attaches an FD model, starting it from its initial domains.
    pub fn with_fd(solver: Solver) -> UnifiedStore {
        let solver = Arc::new(solver);
        let state = solver.initial_state();
        UnifiedStore {
            subst: Substitution::new(),
            fd_solver: Some(solver),
            fd_state: Some(state),
            relational: Arc::new(Vec::new()),
            fd_links: Arc::new(Vec::new()),
        }
    }

    /// Records that `term` (expected to be a `Term::Var`) stands in for the
    /// FD variable `fd`, so the relational plugin can bind it once `fd`'s
    /// domain narrows to a singleton.
    pub fn link_fd_var(&self, fd: VarRef, term: Term) -> UnifiedStore {
        let mut links = (*self.fd_links).clone();
        links.push((fd, term));
        UnifiedStore { fd_links: Arc::new(links), ..self.clone() }
    }

    pub fn fd_links(&self) -> &[(VarRef, Term)] {
        &self.fd_links
    }

    pub fn unify(&self, a: &Term, b: &Term) -> Option<UnifiedStore> {
        crate::unify::unify(a, b, &self.subst).map(|subst| UnifiedStore { subst, ..self.clone() })
    }

    pub fn bind(&self, v: VarId, t: Term) -> UnifiedStore {
        UnifiedStore { subst: self.subst.bind(v, t), ..self.clone() }
    }

    pub fn fd_state(&self) -> Option<&SolverState> {
        self.fd_state.as_ref()
    }

    pub fn fd_solver(&self) -> Option<&Arc<Solver>> {
        self.fd_solver.as_ref()
    }

    pub fn with_fd_state(&self, state: SolverState) -> UnifiedStore {
        UnifiedStore { fd_state: Some(state), ..self.clone() }
    }

    pub fn relational_constraints(&self) -> &[Arc<dyn RelationalConstraint>] {
        &self.relational
    }

    /// Posts a new relational constraint, keeping the store persistent
    /// (the old store's constraint set is unaffected).
    pub fn post_relational(&self, c: Arc<dyn RelationalConstraint>) -> UnifiedStore {
        let mut next = (*self.relational).clone();
        next.push(c);
        UnifiedStore { relational: Arc::new(next), ..self.clone() }
    }

    /// Drops satisfied constraints, keeping only ones still `Pending`.
    pub fn retain_relational(&self, keep: Vec<Arc<dyn RelationalConstraint>>) -> UnifiedStore {
        UnifiedStore { relational: Arc::new(keep), ..self.clone() }
    }

    pub fn resolve(&self, t: &Term) -> Term {
        self.subst.deep_walk(t)
    }

    /// Cheap fixed-point check used by `HybridSolver::propagate`: true when
    /// `self` and `other` carry the same substitution size, relational set
    /// size, and (if present) identical FD domains for every variable.
    fn same_shape(&self, other: &UnifiedStore) -> bool {
        if self.subst.size() != other.subst.size() || self.relational.len() != other.relational.len() {
            return false;
        }
        match (&self.fd_state, &other.fd_state) {
            (Some(a), Some(b)) => a
                .model()
                .variables()
                .iter()
                .all(|v| a.get_domain(v.id) == b.get_domain(v.id)),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Default for UnifiedStore {
    fn default() -> UnifiedStore {
        UnifiedStore::new()
    }
}

impl Store for UnifiedStore {
    fn substitution(&self) -> &Substitution {
        &self.subst
    }
}

/// Owns an ordered list of plugins, each handling one concern of a
/// `UnifiedStore` (spec §4.8 "HybridSolver").
pub struct HybridSolver {
    plugins: Vec<Box<dyn Plugin>>,
    enabled: bool,
    max_iterations: usize,
}

impl HybridSolver {
    pub fn new() -> HybridSolver {
        HybridSolver {
            plugins: vec![Box::new(FdPlugin), Box::new(RelationalPlugin)],
            enabled: true,
            max_iterations: 1000,
        }
    }

    pub fn disabled() -> HybridSolver {
        HybridSolver { enabled: false, ..HybridSolver::new() }
    }

    pub fn propagate(&self, store: &UnifiedStore) -> Result<UnifiedStore> {
        if !self.enabled {
            return Ok(store.clone());
        }
        let mut current = store.clone();
        for _ in 0..self.max_iterations {
            let mut changed = false;
            for plugin in &self.plugins {
                if !plugin.can_handle(&current) {
                    continue;
                }
                let next = plugin.propagate(&current)?;
                if !next.same_shape(&current) {
                    changed = true;
                }
                current = next;
            }
            if !changed {
                return Ok(current);
            }
        }
        Err(Error::validation("MaxPropagationIterations exceeded"))
    }
}

impl Default for HybridSolver {
    fn default() -> HybridSolver {
        HybridSolver::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn local_store_unifies() {
        let s0 = LocalStore::new();
        let x = Term::var("x");
        let s1 = s0.unify(&x, &Term::atom(1)).unwrap();
        assert_eq!(s1.substitution().walk(&x), &Term::atom(1));
    }

    #[test]
    fn unified_store_converges_with_no_plugins_pending() {
        let hybrid = HybridSolver::new();
        let store = UnifiedStore::new();
        let out = hybrid.propagate(&store).unwrap();
        assert_eq!(out.relational_constraints().len(), 0);
    }

    #[test]
    fn disabled_hybrid_solver_is_a_no_op() {
        let hybrid = HybridSolver::disabled();
        let store = UnifiedStore::new().post_relational(Arc::new(relational::DisequalityConstraint::new(
            Term::var("x"),
            Term::atom(1),
        )));
        let out = hybrid.propagate(&store).unwrap();
        assert_eq!(out.relational_constraints().len(), 1);
    }
}

//! Constraint solver orchestration (spec §4.11): dispatches a posted
//! constraint to the highest-priority registered solver able to handle it,
//! tracking per-solver attempt/success/duration metrics. Grounded on
//! `fd::solver::Solver::propagate`'s inner loop (the per-constraint body
//! becomes `FdConstraintSolver::solve` here) since the teacher has no
//! multi-backend dispatch layer at all.
use crate::error::{CancellationToken, Error, Result};
use crate::fd::constraint::ConstraintKind;
use crate::fd::domain::Domain;
use crate::fd::solver::{Solver, SolverState};
use crate::fd::variable::VarRef;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A pluggable constraint-solving backend. `name` must be stable: it is
/// the registry key and the key metrics are reported under.
pub trait ConstraintSolver: Send + Sync {
    fn name(&self) -> &str;

    /// Solver priority: higher runs first when more than one registered
    /// solver can handle a given constraint kind.
    fn priority(&self) -> i32;

    fn can_handle(&self, kind: ConstraintKind) -> bool;

    /// Propagates everything this solver knows about against `state`,
    /// returning the narrowed state.
    fn solve(&self, state: &SolverState, ctx: &CancellationToken) -> Result<SolverState>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SolverMetrics {
    pub attempts: u64,
    pub successes: u64,
    pub total_duration: Duration,
}

struct Registered {
    solver: std::sync::Arc<dyn ConstraintSolver>,
    metrics: SolverMetrics,
}

/// Registry plus dispatcher for [`ConstraintSolver`] backends (spec §4.11
/// `ConstraintManager`).
#[derive(Default)]
pub struct ConstraintManager {
    solvers: Mutex<HashMap<String, Registered>>,
    kinds: Mutex<HashMap<ConstraintKind, Vec<String>>>,
}

impl ConstraintManager {
    pub fn new() -> ConstraintManager {
        ConstraintManager::default()
    }

    /// Registers `solver` and associates it with every kind it declares
    /// handling, keeping each kind's solver list sorted by descending
    /// priority so `solve_constraint` can take the first match.
    pub fn register(&self, solver: std::sync::Arc<dyn ConstraintSolver>) {
        let name = solver.name().to_string();
        let priority = solver.priority();
        self.solvers.lock().insert(
            name.clone(),
            Registered { solver: solver.clone(), metrics: SolverMetrics::default() },
        );
        let mut kinds = self.kinds.lock();
        for kind in all_kinds() {
            if solver.can_handle(kind) {
                let list = kinds.entry(kind).or_insert_with(Vec::new);
                if !list.contains(&name) {
                    list.push(name.clone());
                }
                let solvers = self.solvers.lock();
                list.sort_by_key(|n| std::cmp::Reverse(solvers.get(n).map(|r| r.solver.priority()).unwrap_or(i32::MIN)));
            }
        }
        let _ = priority;
    }

    /// Dispatches to the highest-priority registered solver that can
    /// handle `kind`, recording the attempt in that solver's metrics.
    pub fn solve_constraint(
        &self,
        ctx: &CancellationToken,
        kind: ConstraintKind,
        state: &SolverState,
    ) -> Result<SolverState> {
        let candidate = {
            let kinds = self.kinds.lock();
            kinds.get(&kind).and_then(|names| names.first().cloned())
        };
        let Some(name) = candidate else {
            return Err(Error::validation(format!("no solver registered for {:?}", kind)));
        };
        let solver = {
            let solvers = self.solvers.lock();
            solvers.get(&name).map(|r| r.solver.clone())
        }
        .expect("solver name present in kinds implies present in solvers");

        let start = Instant::now();
        let result = solver.solve(state, ctx);
        let elapsed = start.elapsed();

        let mut solvers = self.solvers.lock();
        if let Some(r) = solvers.get_mut(&name) {
            r.metrics.attempts += 1;
            r.metrics.total_duration += elapsed;
            if result.is_ok() {
                r.metrics.successes += 1;
            }
        }
        result
    }

    pub fn metrics(&self, name: &str) -> Option<SolverMetrics> {
        self.solvers.lock().get(name).map(|r| r.metrics)
    }
}

fn all_kinds() -> [ConstraintKind; 13] {
    [
        ConstraintKind::AllDifferent,
        ConstraintKind::Arithmetic,
        ConstraintKind::LinearSum,
        ConstraintKind::BoolSum,
        ConstraintKind::Inequality,
        ConstraintKind::Absolute,
        ConstraintKind::ElementValues,
        ConstraintKind::Table,
        ConstraintKind::MinOfArray,
        ConstraintKind::MaxOfArray,
        ConstraintKind::Cumulative,
        ConstraintKind::Diffn,
        ConstraintKind::EqualityReified,
    ]
}

/// The built-in backend: a thin wrapper over [`Solver::propagate`] that
/// handles every constraint kind the FD model knows about.
pub struct FdConstraintSolver {
    solver: std::sync::Arc<Solver>,
}

impl FdConstraintSolver {
    pub fn new(solver: std::sync::Arc<Solver>) -> FdConstraintSolver {
        FdConstraintSolver { solver }
    }
}

impl ConstraintSolver for FdConstraintSolver {
    fn name(&self) -> &str {
        "fd"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn can_handle(&self, _kind: ConstraintKind) -> bool {
        true
    }

    fn solve(&self, state: &SolverState, ctx: &CancellationToken) -> Result<SolverState> {
        self.solver.propagate(state, ctx)
    }
}

#[allow(dead_code)]
fn domain_for(state: &SolverState, v: VarRef) -> Domain {
    state.get_domain(v)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::model::Model;
    use crate::fd::solver::SolverConfig;
    use crate::fd::variable::FdVar;
    use std::sync::Arc;

    fn model_with_one_var() -> Model {
        let mut m = Model::new();
        m.add_variable(FdVar::new(VarRef(0), "x", Domain::full(2)));
        m
    }

    #[test]
    fn dispatches_to_registered_solver() {
        let manager = ConstraintManager::new();
        let solver = Arc::new(Solver::new(model_with_one_var(), SolverConfig::default()));
        manager.register(Arc::new(FdConstraintSolver::new(solver.clone())));
        let ctx = CancellationToken::new();
        let out = manager.solve_constraint(&ctx, ConstraintKind::AllDifferent, &solver.initial_state());
        assert!(out.is_ok());
        assert_eq!(manager.metrics("fd").unwrap().attempts, 1);
    }

    #[test]
    fn higher_priority_solver_wins() {
        struct Noop(i32);
        impl ConstraintSolver for Noop {
            fn name(&self) -> &str {
                "noop"
            }
            fn priority(&self) -> i32 {
                self.0
            }
            fn can_handle(&self, _kind: ConstraintKind) -> bool {
                true
            }
            fn solve(&self, state: &SolverState, _ctx: &CancellationToken) -> Result<SolverState> {
                Ok(state.clone())
            }
        }
        let manager = ConstraintManager::new();
        let solver = Arc::new(Solver::new(model_with_one_var(), SolverConfig::default()));
        manager.register(Arc::new(FdConstraintSolver::new(solver.clone())));
        manager.register(Arc::new(Noop(100)));
        let ctx = CancellationToken::new();
        let _ = manager.solve_constraint(&ctx, ConstraintKind::Inequality, &solver.initial_state());
        assert_eq!(manager.metrics("noop").unwrap().attempts, 1);
        assert_eq!(manager.metrics("fd").unwrap().attempts, 0);
    }

    #[test]
    fn unregistered_kind_errors() {
        struct OnlyAllDifferent;
        impl ConstraintSolver for OnlyAllDifferent {
            fn name(&self) -> &str {
                "only-ad"
            }
            fn priority(&self) -> i32 {
                0
            }
            fn can_handle(&self, kind: ConstraintKind) -> bool {
                kind == ConstraintKind::AllDifferent
            }
            fn solve(&self, state: &SolverState, _ctx: &CancellationToken) -> Result<SolverState> {
                Ok(state.clone())
            }
        }
        let manager = ConstraintManager::new();
        manager.register(Arc::new(OnlyAllDifferent));
        let solver = Solver::new(model_with_one_var(), SolverConfig::default());
        let ctx = CancellationToken::new();
        let out = manager.solve_constraint(&ctx, ConstraintKind::Table, &solver.initial_state());
        assert!(out.is_err());
    }
}

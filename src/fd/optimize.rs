//! Branch-and-bound optimization over an FD model (spec §4.7).
use crate::error::{CancellationToken, Error, Result};
use crate::fd::constraint::bool_sum::BoolSum;
use crate::fd::constraint::inequality::Inequality;
use crate::fd::constraint::linear_sum::LinearSum;
use crate::fd::constraint::min_max_of_array::{MaxOfArray, MinOfArray};
use crate::fd::constraint::FdConstraint;
use crate::fd::domain::Domain;
use crate::fd::solver::{OptContext, Solver, SolverConfig, SolverState};
use crate::fd::variable::VarRef;
use std::time::Instant;

#[derive(Clone, Debug, Default)]
pub struct OptimizeOptions {
    pub node_limit: Option<u64>,
    pub time_limit: Option<std::time::Duration>,
    pub target_objective: Option<i64>,
    pub parallel_workers: usize,
}

pub struct OptimizeOutcome {
    pub assignment: Option<Vec<i64>>,
    pub objective: Option<i64>,
    /// Set when the search stopped early (node/time limit or
    /// cancellation) rather than proving optimality.
    pub stopped_early: Option<Error>,
}

/// `bound(state)`: prefer a structural bound for the objective's shape
/// over the trivial `obj.min`/`obj.max` fallback (spec §4.7 item 1).
fn structural_bound(solver: &Solver, state: &SolverState, objective: VarRef, minimize: bool) -> i64 {
    for constraint in solver.model().constraints() {
        if let Some(ls) = as_any_linear_sum(constraint.as_ref()) {
            if ls.total() == objective {
                let mut acc = 0i64;
                for &(v, coeff) in ls.terms() {
                    let d = state.get_domain(v);
                    let (lo, hi) = (d.min().unwrap(), d.max().unwrap());
                    let use_min = (coeff >= 0) == minimize;
                    acc += coeff * if use_min { lo } else { hi };
                }
                return acc;
            }
        }
        if let Some(bs) = as_any_bool_sum(constraint.as_ref()) {
            if bs.total() == objective {
                let (must_true, can_true) = bs.counts(&|v| state.get_domain(v));
                return if minimize { must_true + 1 } else { can_true + 1 };
            }
        }
        if let Some((vars, r)) = as_min_of_array(constraint.as_ref()) {
            if r == objective && minimize {
                return vars.iter().map(|&v| state.get_domain(v).min().unwrap()).min().unwrap();
            }
        }
        if let Some((vars, r)) = as_max_of_array(constraint.as_ref()) {
            if r == objective && !minimize {
                return vars.iter().map(|&v| state.get_domain(v).max().unwrap()).max().unwrap();
            }
        }
    }

    // Makespan pattern: every `obj >= e_i` inequality bounds obj from
    // below by the max of the ends' current maxima.
    if minimize {
        let ends: Vec<VarRef> = solver
            .model()
            .constraints()
            .iter()
            .filter_map(|c| as_makespan_edge(c.as_ref(), objective))
            .collect();
        if !ends.is_empty() {
            return ends.iter().map(|&e| state.get_domain(e).max().unwrap()).max().unwrap();
        }
    }

    let d = state.get_domain(objective);
    if minimize {
        d.min().unwrap()
    } else {
        d.max().unwrap()
    }
}

fn as_any_linear_sum(c: &dyn FdConstraint) -> Option<&LinearSum> {
    c.as_any().downcast_ref::<LinearSum>()
}

fn as_any_bool_sum(c: &dyn FdConstraint) -> Option<&BoolSum> {
    c.as_any().downcast_ref::<BoolSum>()
}

fn as_min_of_array(c: &dyn FdConstraint) -> Option<(Vec<VarRef>, VarRef)> {
    c.as_any().downcast_ref::<MinOfArray>().map(|m| (m.xs().to_vec(), m.r()))
}

fn as_max_of_array(c: &dyn FdConstraint) -> Option<(Vec<VarRef>, VarRef)> {
    c.as_any().downcast_ref::<MaxOfArray>().map(|m| (m.xs().to_vec(), m.r()))
}

fn as_makespan_edge(c: &dyn FdConstraint, objective: VarRef) -> Option<VarRef> {
    c.as_any().downcast_ref::<Inequality>().and_then(|ineq| ineq.makespan_end_if(objective))
}

/// `SolveOptimal(ctx, objVar, minimize, opts)` (spec §4.7): DFS with an
/// incumbent cutoff tightened into the objective's domain after every
/// improvement, backed by the same `Solver::propagate`/`select_variable`
/// machinery as plain `solve`.
pub fn solve_optimal(
    solver: &Solver,
    ctx: &CancellationToken,
    objective: VarRef,
    minimize: bool,
    opts: OptimizeOptions,
) -> Result<OptimizeOutcome> {
    let started = Instant::now();
    let mut incumbent: Option<(Vec<i64>, i64)> = None;
    let mut stack = vec![solver.initial_state()];
    let mut nodes = 0u64;

    while let Some(mut state) = stack.pop() {
        if ctx.is_cancelled() {
            return Ok(OptimizeOutcome {
                assignment: incumbent.as_ref().map(|(a, _)| a.clone()),
                objective: incumbent.as_ref().map(|(_, o)| *o),
                stopped_early: Some(Error::cancelled("optimization cancelled")),
            });
        }
        if let Some(limit) = opts.node_limit {
            if nodes >= limit {
                return Ok(OptimizeOutcome {
                    assignment: incumbent.as_ref().map(|(a, _)| a.clone()),
                    objective: incumbent.as_ref().map(|(_, o)| *o),
                    stopped_early: Some(Error::SearchLimitReached),
                });
            }
        }
        if let Some(limit) = opts.time_limit {
            if started.elapsed() >= limit {
                return Ok(OptimizeOutcome {
                    assignment: incumbent.as_ref().map(|(a, _)| a.clone()),
                    objective: incumbent.as_ref().map(|(_, o)| *o),
                    stopped_early: Some(Error::SearchLimitReached),
                });
            }
        }
        nodes += 1;

        if let Some((_, incumbent_obj)) = incumbent {
            let d = state.get_domain(objective);
            let cut = if minimize {
                d.remove_at_or_above(incumbent_obj)
            } else {
                d.remove_at_or_below(incumbent_obj)
            };
            if cut.is_empty() {
                continue;
            }
            state = state.set_domain(objective, cut);
        }

        let state = match solver.propagate(&state, ctx) {
            Ok(s) => s,
            Err(e) if e.is_branch_local() => continue,
            Err(e) => return Err(e),
        };

        let bound = structural_bound(solver, &state, objective, minimize);
        if let Some((_, incumbent_obj)) = incumbent {
            let improves = if minimize { bound < incumbent_obj } else { bound > incumbent_obj };
            if !improves {
                continue;
            }
        }

        if state.is_fully_assigned() {
            let assignment = state.assignment();
            let obj_value = state.get_domain(objective).singleton_value().unwrap();
            let better = match incumbent {
                None => true,
                Some((_, prev)) => {
                    if minimize {
                        obj_value < prev
                    } else {
                        obj_value > prev
                    }
                }
            };
            if better {
                incumbent = Some((assignment, obj_value));
                if let Some(target) = opts.target_objective {
                    let reached = if minimize { obj_value <= target } else { obj_value >= target };
                    if reached {
                        break;
                    }
                }
            }
            continue;
        }

        let var = match solver.select_variable(&state) {
            Some(v) => v,
            None => continue,
        };
        let domain = state.get_domain(var);
        for value in solver.order_values(&domain).into_iter().rev() {
            stack.push(state.set_domain(var, Domain::singleton(domain.width(), value)));
        }
    }

    Ok(OptimizeOutcome {
        assignment: incumbent.as_ref().map(|(a, _)| a.clone()),
        objective: incumbent.as_ref().map(|(_, o)| *o),
        stopped_early: None,
    })
}

pub fn opt_context(objective: VarRef, minimize: bool) -> OptContext {
    OptContext { objective, minimize }
}

pub fn default_config() -> SolverConfig {
    SolverConfig::default()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::model::Model;
    use crate::fd::variable::FdVar;

    #[test]
    fn minimizes_linear_sum_objective() {
        let mut m = Model::new();
        let x = m.add_variable(FdVar::new(VarRef(0), "x", Domain::full(5)));
        let y = m.add_variable(FdVar::new(VarRef(1), "y", Domain::full(5)));
        let total = m.add_variable(FdVar::new(VarRef(2), "total", Domain::full(10)));
        m.add_constraint(Box::new(LinearSum::new(vec![(x, 1), (y, 1)], total)));
        let solver = Solver::new(m, SolverConfig::default()).with_opt_context(opt_context(total, true));
        let ctx = CancellationToken::new();
        let outcome = solve_optimal(&solver, &ctx, total, true, OptimizeOptions::default()).unwrap();
        assert_eq!(outcome.objective, Some(2));
    }
}

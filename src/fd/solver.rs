//! FD solver: propagation, search, and variable/value heuristics (spec §4.6).
use crate::error::{CancellationToken, Error, Result};
use crate::fd::domain::Domain;
use crate::fd::model::{Model, ModelConfig, ValueHeuristic, VariableHeuristic};
use crate::fd::variable::VarRef;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A persistent overlay over the model's initial domains (spec §3
/// "SolverState"). Each `set_domain` allocates one new node holding only
/// the vars that changed at that node; `get_domain` walks the parent
/// chain until it finds an overlay entry, falling back to the model's
/// initial domain. Rust's `Arc` reference counting does the reclamation
/// work the spec's "pool" does explicitly in a GC-less host language, so
/// no separate pool type is implemented here (see DESIGN.md).
#[derive(Clone)]
pub struct SolverState {
    model: Arc<Model>,
    node: Arc<StateNode>,
}

struct StateNode {
    parent: Option<Arc<StateNode>>,
    overlay: HashMap<VarRef, Domain>,
}

impl SolverState {
    pub fn initial(model: Arc<Model>) -> SolverState {
        SolverState {
            model,
            node: Arc::new(StateNode {
                parent: None,
                overlay: HashMap::new(),
            }),
        }
    }

    pub fn get_domain(&self, v: VarRef) -> Domain {
        let mut cur = &self.node;
        loop {
            if let Some(d) = cur.overlay.get(&v) {
                return d.clone();
            }
            match &cur.parent {
                Some(p) => cur = p,
                None => return self.model.variable(v).initial_domain.clone(),
            }
        }
    }

    pub fn set_domain(&self, v: VarRef, d: Domain) -> SolverState {
        let mut overlay = HashMap::with_capacity(1);
        overlay.insert(v, d);
        SolverState {
            model: self.model.clone(),
            node: Arc::new(StateNode {
                parent: Some(self.node.clone()),
                overlay,
            }),
        }
    }

    pub fn is_fully_assigned(&self) -> bool {
        self.model.variables().iter().all(|var| self.get_domain(var.id).is_singleton())
    }

    pub fn assignment(&self) -> Vec<i64> {
        self.model
            .variables()
            .iter()
            .map(|var| self.get_domain(var.id).singleton_value().expect("fully assigned"))
            .collect()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }
}

#[derive(Clone, Debug)]
pub struct SolverConfig {
    pub node_limit: Option<u64>,
    pub time_limit: Option<std::time::Duration>,
    pub parallel_workers: usize,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            node_limit: None,
            time_limit: None,
            parallel_workers: 1,
        }
    }
}

/// Context consulted by the `Impact` variable heuristic and the
/// "objective-improving" value heuristic (spec §4.7).
#[derive(Clone, Copy, Debug)]
pub struct OptContext {
    pub objective: VarRef,
    pub minimize: bool,
}

pub struct Solver {
    model: Arc<Model>,
    heuristics: ModelConfig,
    config: SolverConfig,
    opt_context: Option<OptContext>,
}

impl Solver {
    pub fn new(model: Model, config: SolverConfig) -> Solver {
        Solver {
            model: Arc::new(model),
            heuristics: ModelConfig::default(),
            config,
            opt_context: None,
        }
    }

    pub fn with_heuristics(mut self, heuristics: ModelConfig) -> Solver {
        self.heuristics = heuristics;
        self
    }

    pub fn with_opt_context(mut self, ctx: OptContext) -> Solver {
        self.opt_context = Some(ctx);
        self
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn initial_state(&self) -> SolverState {
        SolverState::initial(self.model.clone())
    }

    /// Queue-based fixed point: re-run a constraint, and if it narrowed
    /// any variable's domain, re-enqueue every constraint touching that
    /// variable. Terminates when the queue is empty (spec §4.6).
    pub fn propagate(&self, state: &SolverState, ctx: &CancellationToken) -> Result<SolverState> {
        let mut state = state.clone();
        let n = self.model.constraints().len();
        let _span = crate::telemetry::propagation_span(n).entered();
        let mut queue: VecDeque<usize> = (0..n).collect();
        let mut queued: Vec<bool> = vec![true; n];
        let mut iterations = 0u64;

        while let Some(idx) = queue.pop_front() {
            iterations += 1;
            ctx.check()?;
            queued[idx] = false;
            let constraint = &self.model.constraints()[idx];
            let snapshot = state.clone();
            let get = |v: VarRef| snapshot.get_domain(v);
            let changes = constraint.propagate(&get)?;
            if changes.is_empty() {
                continue;
            }
            let mut touched = HashSet::new();
            for (v, d) in changes {
                state = state.set_domain(v, d);
                touched.insert(v);
            }
            for v in touched {
                for ci in self.model.constraints_touching(v) {
                    if !queued[ci] {
                        queued[ci] = true;
                        queue.push_back(ci);
                    }
                }
            }
        }
        crate::telemetry::propagation_converged(iterations);
        Ok(state)
    }

    fn unassigned(&self, state: &SolverState) -> Vec<VarRef> {
        self.model
            .variables()
            .iter()
            .map(|v| v.id)
            .filter(|&v| !state.get_domain(v).is_singleton())
            .collect()
    }

    /// Picks the next variable to branch on (spec §4.6 `selectVariable`).
    pub fn select_variable(&self, state: &SolverState) -> Option<VarRef> {
        let candidates = self.unassigned(state);
        if candidates.is_empty() {
            return None;
        }
        let score = |v: &VarRef| -> f64 {
            let d = state.get_domain(*v);
            let degree = self.model.variable(*v).degree().max(1) as f64;
            match self.heuristics.variable_heuristic {
                VariableHeuristic::Dom => d.count() as f64,
                VariableHeuristic::DomDeg => d.count() as f64 / degree,
                VariableHeuristic::Deg => -(degree as f64),
                VariableHeuristic::Lex => v.0 as f64,
                VariableHeuristic::Impact => match self.opt_context {
                    Some(ctx) => {
                        let near_objective = self
                            .model
                            .constraints_touching(ctx.objective)
                            .into_iter()
                            .any(|ci| self.model.constraints()[ci].variables().contains(v));
                        if near_objective {
                            0.0
                        } else {
                            1.0
                        }
                    }
                    None => d.count() as f64,
                },
            }
        };
        candidates
            .into_iter()
            .min_by(|a, b| score(a).partial_cmp(&score(b)).unwrap())
    }

    /// Orders candidate values for a branch (spec §4.6 `orderValues`).
    pub fn order_values(&self, d: &Domain) -> Vec<i64> {
        let mut values: Vec<i64> = d.iterate().collect();
        match self.heuristics.value_heuristic {
            ValueHeuristic::Ascending => {}
            ValueHeuristic::Descending => values.reverse(),
            ValueHeuristic::Random => shuffle(&mut values, self.heuristics.random_seed),
            ValueHeuristic::ObjectiveImproving => {
                if let Some(ctx) = self.opt_context {
                    if !ctx.minimize {
                        values.reverse();
                    }
                }
            }
        }
        values
    }

    /// DFS with propagation at each node (spec §4.6 `solve`). Returns at
    /// most `limit` solutions (`0` means "all").
    pub fn solve(&self, ctx: &CancellationToken, limit: usize) -> Result<Vec<Vec<i64>>> {
        let mut solutions = Vec::new();
        let mut stack = vec![self.initial_state()];
        let mut nodes = 0u64;

        while let Some(state) = stack.pop() {
            ctx.check()?;
            if let Some(node_limit) = self.config.node_limit {
                if nodes >= node_limit {
                    return Err(Error::SearchLimitReached);
                }
            }
            nodes += 1;

            let state = match self.propagate(&state, ctx) {
                Ok(s) => s,
                Err(e) if e.is_branch_local() => continue,
                Err(e) => return Err(e),
            };

            if state.is_fully_assigned() {
                solutions.push(state.assignment());
                if limit != 0 && solutions.len() >= limit {
                    break;
                }
                continue;
            }

            let var = match self.select_variable(&state) {
                Some(v) => v,
                None => continue,
            };
            let domain = state.get_domain(var);
            for value in self.order_values(&domain).into_iter().rev() {
                stack.push(state.set_domain(var, Domain::singleton(domain.width(), value)));
            }
        }
        Ok(solutions)
    }

    /// Shared work-queue parallel search (spec §4.6 `solveParallel`):
    /// workers pop a frame, try the next value, propagate, and either
    /// record a solution or push a child frame. A pending-frame counter
    /// and an active-worker counter jointly detect exhaustion without
    /// ever closing the queue under a race.
    pub fn solve_parallel(&self, ctx: &CancellationToken, workers: usize, limit: usize) -> Result<Vec<Vec<i64>>> {
        let (tx, rx) = crossbeam_channel::unbounded::<SolverState>();
        let pending = Arc::new(AtomicUsize::new(1));
        let active_workers = Arc::new(AtomicUsize::new(0));
        let solutions = Arc::new(Mutex::new(Vec::new()));
        let found = Arc::new(AtomicI64::new(0));
        let error_slot: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));
        tx.send(self.initial_state()).ok();

        let limit = limit as i64;

        std::thread::scope(|scope| {
            for _ in 0..workers.max(1) {
                let rx = rx.clone();
                let tx = tx.clone();
                let pending = pending.clone();
                let active_workers = active_workers.clone();
                let solutions = solutions.clone();
                let found = found.clone();
                let error_slot = error_slot.clone();
                let ctx = ctx.clone();
                let solver = self;
                scope.spawn(move || {
                    loop {
                        if ctx.is_cancelled() || (limit != 0 && found.load(Ordering::SeqCst) >= limit) {
                            pending.fetch_sub(1, Ordering::SeqCst);
                            break;
                        }
                        let state = match rx.recv_timeout(std::time::Duration::from_millis(20)) {
                            Ok(s) => s,
                            Err(_) => {
                                if pending.load(Ordering::SeqCst) == 0 && active_workers.load(Ordering::SeqCst) == 0 {
                                    break;
                                }
                                continue;
                            }
                        };
                        active_workers.fetch_add(1, Ordering::SeqCst);

                        let propagated = solver.propagate(&state, &ctx);
                        let next = match propagated {
                            Ok(s) => s,
                            Err(e) if e.is_branch_local() => {
                                pending.fetch_sub(1, Ordering::SeqCst);
                                active_workers.fetch_sub(1, Ordering::SeqCst);
                                continue;
                            }
                            Err(e) => {
                                *error_slot.lock().unwrap() = Some(e);
                                pending.fetch_sub(1, Ordering::SeqCst);
                                active_workers.fetch_sub(1, Ordering::SeqCst);
                                break;
                            }
                        };

                        if next.is_fully_assigned() {
                            solutions.lock().unwrap().push(next.assignment());
                            found.fetch_add(1, Ordering::SeqCst);
                            pending.fetch_sub(1, Ordering::SeqCst);
                            active_workers.fetch_sub(1, Ordering::SeqCst);
                            continue;
                        }

                        match solver.select_variable(&next) {
                            None => {
                                pending.fetch_sub(1, Ordering::SeqCst);
                            }
                            Some(var) => {
                                let domain = next.get_domain(var);
                                let values = solver.order_values(&domain);
                                pending.fetch_add(values.len(), Ordering::SeqCst);
                                pending.fetch_sub(1, Ordering::SeqCst);
                                for value in values {
                                    let child = next.set_domain(var, Domain::singleton(domain.width(), value));
                                    let _ = tx.send(child);
                                }
                            }
                        }
                        active_workers.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        if let Some(e) = error_slot.lock().unwrap().take() {
            return Err(e);
        }
        let mut out = Arc::try_unwrap(solutions).unwrap().into_inner().unwrap();
        if limit != 0 {
            out.truncate(limit as usize);
        }
        Ok(out)
    }
}

fn shuffle(values: &mut [i64], seed: u64) {
    // A small xorshift so value ordering is deterministic for a given
    // seed without pulling a full PRNG for this one call site.
    let mut state = seed.wrapping_add(0x9E3779B97F4A7C15);
    for i in (1..values.len()).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let j = (state % (i as u64 + 1)) as usize;
        values.swap(i, j);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::constraint::all_different::AllDifferent;
    use crate::fd::domain::Domain;
    use crate::fd::variable::FdVar;

    fn small_model() -> Model {
        let mut m = Model::new();
        let a = m.add_variable(FdVar::new(VarRef(0), "a", Domain::full(2)));
        let b = m.add_variable(FdVar::new(VarRef(1), "b", Domain::full(2)));
        m.add_constraint(Box::new(AllDifferent::new(vec![a, b])));
        m
    }

    #[test]
    fn solve_finds_all_different_assignments() {
        let solver = Solver::new(small_model(), SolverConfig::default());
        let ctx = CancellationToken::new();
        let solutions = solver.solve(&ctx, 0).unwrap();
        assert_eq!(solutions.len(), 2);
        for s in &solutions {
            assert_ne!(s[0], s[1]);
        }
    }

    #[test]
    fn solve_respects_limit() {
        let solver = Solver::new(small_model(), SolverConfig::default());
        let ctx = CancellationToken::new();
        let solutions = solver.solve(&ctx, 1).unwrap();
        assert_eq!(solutions.len(), 1);
    }

    #[test]
    fn solve_parallel_matches_serial_count() {
        let solver = Solver::new(small_model(), SolverConfig::default());
        let ctx = CancellationToken::new();
        let solutions = solver.solve_parallel(&ctx, 2, 0).unwrap();
        assert_eq!(solutions.len(), 2);
    }
}

//! FD model: variables, constraints, and solving config (spec §3 "Model").
use crate::fd::constraint::FdConstraint;
use crate::fd::variable::{FdVar, VarRef};
use std::collections::HashMap;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum VariableHeuristic {
    Dom,
    DomDeg,
    Deg,
    Lex,
    Impact,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ValueHeuristic {
    Ascending,
    Descending,
    Random,
    ObjectiveImproving,
}

#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub variable_heuristic: VariableHeuristic,
    pub value_heuristic: ValueHeuristic,
    pub random_seed: u64,
}

impl Default for ModelConfig {
    fn default() -> ModelConfig {
        ModelConfig {
            variable_heuristic: VariableHeuristic::Dom,
            value_heuristic: ValueHeuristic::Ascending,
            random_seed: 0,
        }
    }
}

/// Declares the variables and constraints a `Solver` propagates and
/// searches over. Mirrors the teacher's `Dstore`/constraint registration
/// pattern, collapsed into one owning struct per spec §3.
#[derive(Default)]
pub struct Model {
    variables: Vec<FdVar>,
    by_id: HashMap<VarRef, usize>,
    constraints: Vec<Box<dyn FdConstraint>>,
}

impl Model {
    pub fn new() -> Model {
        Model::default()
    }

    pub fn add_variable(&mut self, var: FdVar) -> VarRef {
        let id = var.id;
        self.by_id.insert(id, self.variables.len());
        self.variables.push(var);
        id
    }

    pub fn variable(&self, id: VarRef) -> &FdVar {
        &self.variables[self.by_id[&id]]
    }

    pub fn variables(&self) -> &[FdVar] {
        &self.variables
    }

    /// Registers a constraint and, for constraints that imply pairwise
    /// relations between all of their variables (AllDifferent and its
    /// kin), updates every involved variable's peer set (spec §4.4).
    pub fn add_constraint(&mut self, constraint: Box<dyn FdConstraint>) {
        if constraint.implies_pairwise() {
            let vars = constraint.variables();
            for &a in &vars {
                for &b in &vars {
                    if a != b {
                        let idx = self.by_id[&a];
                        self.variables[idx].add_peer(b);
                    }
                }
            }
        }
        self.constraints.push(constraint);
    }

    pub fn constraints(&self) -> &[Box<dyn FdConstraint>] {
        &self.constraints
    }

    pub fn constraints_touching(&self, v: VarRef) -> Vec<usize> {
        self.constraints
            .iter()
            .enumerate()
            .filter(|(_, c)| c.variables().contains(&v))
            .map(|(i, _)| i)
            .collect()
    }
}

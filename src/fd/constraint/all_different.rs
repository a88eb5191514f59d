use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

/// `∀ i≠j: xi ≠ xj` (spec §4.5).
#[derive(Clone, Debug)]
pub struct AllDifferent {
    vars: Vec<VarRef>,
}

impl AllDifferent {
    pub fn new(vars: Vec<VarRef>) -> AllDifferent {
        AllDifferent { vars }
    }
}

impl FdConstraint for AllDifferent {
    fn variables(&self) -> Vec<VarRef> {
        self.vars.clone()
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::AllDifferent
    }

    fn implies_pairwise(&self) -> bool {
        true
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let domains: Vec<Domain> = self.vars.iter().map(|&v| get(v)).collect();

        // Hall-set detection in its simplest form: the union of every
        // domain must be able to cover all n variables.
        let mut union = domains[0].clone();
        for d in &domains[1..] {
            union = union.union(d);
        }
        if union.count() < self.vars.len() as u32 {
            return Err(inconsistent(
                self.kind(),
                "fewer admissible values than variables (Hall violation)",
            ));
        }

        let singletons: Vec<i64> = domains.iter().filter_map(|d| d.singleton_value()).collect();
        let mut changes = Vec::new();
        for (i, &v) in self.vars.iter().enumerate() {
            let d = &domains[i];
            if d.is_singleton() {
                continue;
            }
            let mut next = d.clone();
            for (j, &sv) in singletons.iter().enumerate() {
                if domains[j].is_singleton() && self.vars[j] != v {
                    next = next.remove(sv);
                }
            }
            if next.is_empty() {
                return Err(inconsistent(self.kind(), "domain exhausted by peer singletons"));
            }
            if !next.equal(d) {
                changes.push((v, next));
            }
        }
        Ok(changes)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn clone_box(&self) -> Box<dyn FdConstraint> {
        Box::new(self.clone())
    }
}

use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

/// `r = values[idx]` with 1-based indices (spec §4.5).
#[derive(Clone, Debug)]
pub struct ElementValues {
    idx: VarRef,
    values: Vec<i64>,
    r: VarRef,
}

impl ElementValues {
    pub fn new(idx: VarRef, values: Vec<i64>, r: VarRef) -> ElementValues {
        ElementValues { idx, values, r }
    }
}

impl FdConstraint for ElementValues {
    fn variables(&self) -> Vec<VarRef> {
        vec![self.idx, self.r]
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::ElementValues
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let didx = get(self.idx);
        let dr = get(self.r);
        let n = self.values.len() as i64;

        let clamped_idx = didx.remove_below(1).remove_above(n);
        if clamped_idx.is_empty() {
            return Err(inconsistent(self.kind(), "idx out of range"));
        }

        let support: Vec<i64> = clamped_idx.iterate().map(|i| self.values[(i - 1) as usize]).collect();
        let new_r = dr.intersect(&Domain::from_values(dr.width(), support));
        if new_r.is_empty() {
            return Err(inconsistent(self.kind(), "r unreachable from admissible indices"));
        }

        let new_idx = Domain::from_values(
            didx.width(),
            clamped_idx
                .iterate()
                .filter(|&i| new_r.has(self.values[(i - 1) as usize])),
        );
        if new_idx.is_empty() {
            return Err(inconsistent(self.kind(), "no index maps into r's domain"));
        }

        let mut changes = Vec::new();
        if !new_idx.equal(&didx) {
            changes.push((self.idx, new_idx));
        }
        if !new_r.equal(&dr) {
            changes.push((self.r, new_r));
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

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn narrows_r_to_reachable_values() {
        let c = ElementValues::new(VarRef(0), vec![10, 20, 30], VarRef(1));
        let didx = Domain::from_values(3, vec![1, 2]);
        let dr = Domain::full(40);
        let get = |v: VarRef| if v == VarRef(0) { didx.clone() } else { dr.clone() };
        let changes = c.propagate(&get).unwrap();
        let r_change = changes.iter().find(|(v, _)| *v == VarRef(1)).unwrap();
        assert_eq!(r_change.1.iterate().collect::<Vec<_>>(), vec![10, 20]);
    }
}

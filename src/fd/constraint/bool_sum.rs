use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

/// Count of `bᵢ = true` equals `total` (spec §4.5). Booleans are encoded
/// on a 2-value domain `{1=false, 2=true}`; `total`'s domain uses the
/// `count + 1` encoding so that a count of 0 still lands on a valid
/// (width >= 1) 1-based domain position.
#[derive(Clone, Debug)]
pub struct BoolSum {
    bools: Vec<VarRef>,
    total: VarRef,
}

const FALSE: i64 = 1;
const TRUE: i64 = 2;

impl BoolSum {
    pub fn new(bools: Vec<VarRef>, total: VarRef) -> BoolSum {
        BoolSum { bools, total }
    }

    pub fn total(&self) -> VarRef {
        self.total
    }

    /// `(must_be_true, can_be_true)` counts among `bools`, as consulted by
    /// the optimizer's structural bound (spec §4.7).
    pub fn counts(&self, get: &dyn Fn(VarRef) -> Domain) -> (i64, i64) {
        let must_true = self.bools.iter().filter(|&&v| get(v).singleton_value() == Some(TRUE)).count() as i64;
        let can_true = self.bools.iter().filter(|&&v| get(v).has(TRUE)).count() as i64;
        (must_true, can_true)
    }
}

impl FdConstraint for BoolSum {
    fn variables(&self) -> Vec<VarRef> {
        let mut vs = self.bools.clone();
        vs.push(self.total);
        vs
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::BoolSum
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let domains: Vec<Domain> = self.bools.iter().map(|&v| get(v)).collect();
        let must_true = domains.iter().filter(|d| d.singleton_value() == Some(TRUE)).count() as i64;
        let can_true = domains.iter().filter(|d| d.has(TRUE)).count() as i64;

        let dt = get(self.total);
        let new_total = dt.remove_below(must_true + 1).remove_above(can_true + 1);
        if new_total.is_empty() {
            return Err(inconsistent(self.kind(), "total unreachable from bool counts"));
        }
        let mut changes = Vec::new();
        if !new_total.equal(&dt) {
            changes.push((self.total, new_total.clone()));
        }

        let (t_min, t_max) = (new_total.min().unwrap() - 1, new_total.max().unwrap() - 1);
        // If every must-be-true var is already accounted for and the max
        // count equals must_true, every undecided boolean is forced false.
        if t_max == must_true {
            for (i, &v) in self.bools.iter().enumerate() {
                let d = &domains[i];
                if !d.is_singleton() {
                    let forced = Domain::singleton(d.width(), FALSE);
                    changes.push((v, forced));
                }
            }
        }
        // If the min count requires every can-be-true var to be true.
        if t_min == can_true {
            for (i, &v) in self.bools.iter().enumerate() {
                let d = &domains[i];
                if !d.is_singleton() && d.has(TRUE) {
                    let forced = Domain::singleton(d.width(), TRUE);
                    changes.push((v, forced));
                }
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

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn forces_remaining_false_when_count_saturated() {
        let c = BoolSum::new(vec![VarRef(0), VarRef(1), VarRef(2)], VarRef(3));
        let singleton_true = Domain::singleton(2, TRUE);
        let undecided = Domain::full(2);
        let total = Domain::singleton(4, 2); // count=1
        let get = |v: VarRef| match v.0 {
            0 => singleton_true.clone(),
            3 => total.clone(),
            _ => undecided.clone(),
        };
        let changes = c.propagate(&get).unwrap();
        assert!(changes
            .iter()
            .any(|(v, d)| *v == VarRef(1) && d.singleton_value() == Some(FALSE)));
    }
}

use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

/// `r = min(xs)` (spec §4.5).
#[derive(Clone, Debug)]
pub struct MinOfArray {
    xs: Vec<VarRef>,
    r: VarRef,
}

impl MinOfArray {
    pub fn new(xs: Vec<VarRef>, r: VarRef) -> MinOfArray {
        MinOfArray { xs, r }
    }

    pub fn xs(&self) -> &[VarRef] {
        &self.xs
    }

    pub fn r(&self) -> VarRef {
        self.r
    }
}

impl FdConstraint for MinOfArray {
    fn variables(&self) -> Vec<VarRef> {
        let mut vs = self.xs.clone();
        vs.push(self.r);
        vs
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::MinOfArray
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let domains: Vec<Domain> = self.xs.iter().map(|&v| get(v)).collect();
        let r_min = domains.iter().map(|d| d.min().unwrap()).min().unwrap();
        let r_max = domains.iter().map(|d| d.max().unwrap()).min().unwrap();

        let dr = get(self.r);
        let new_r = dr.remove_below(r_min).remove_above(r_max);
        if new_r.is_empty() {
            return Err(inconsistent(self.kind(), "r out of reachable min bounds"));
        }
        let mut changes = Vec::new();
        if !new_r.equal(&dr) {
            changes.push((self.r, new_r.clone()));
        }

        let r_lo = new_r.min().unwrap();
        for (i, &x) in self.xs.iter().enumerate() {
            let d = &domains[i];
            let new_d = d.remove_below(r_lo);
            if new_d.is_empty() {
                return Err(inconsistent(self.kind(), "xi below r's lower bound"));
            }
            if !new_d.equal(d) {
                changes.push((x, new_d));
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

/// `r = max(xs)`, symmetric to `MinOfArray`.
#[derive(Clone, Debug)]
pub struct MaxOfArray {
    xs: Vec<VarRef>,
    r: VarRef,
}

impl MaxOfArray {
    pub fn new(xs: Vec<VarRef>, r: VarRef) -> MaxOfArray {
        MaxOfArray { xs, r }
    }

    pub fn xs(&self) -> &[VarRef] {
        &self.xs
    }

    pub fn r(&self) -> VarRef {
        self.r
    }
}

impl FdConstraint for MaxOfArray {
    fn variables(&self) -> Vec<VarRef> {
        let mut vs = self.xs.clone();
        vs.push(self.r);
        vs
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::MaxOfArray
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let domains: Vec<Domain> = self.xs.iter().map(|&v| get(v)).collect();
        let r_min = domains.iter().map(|d| d.min().unwrap()).max().unwrap();
        let r_max = domains.iter().map(|d| d.max().unwrap()).max().unwrap();

        let dr = get(self.r);
        let new_r = dr.remove_below(r_min).remove_above(r_max);
        if new_r.is_empty() {
            return Err(inconsistent(self.kind(), "r out of reachable max bounds"));
        }
        let mut changes = Vec::new();
        if !new_r.equal(&dr) {
            changes.push((self.r, new_r.clone()));
        }

        let r_hi = new_r.max().unwrap();
        for (i, &x) in self.xs.iter().enumerate() {
            let d = &domains[i];
            let new_d = d.remove_above(r_hi);
            if new_d.is_empty() {
                return Err(inconsistent(self.kind(), "xi above r's upper bound"));
            }
            if !new_d.equal(d) {
                changes.push((x, new_d));
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
    fn min_of_array_bounds_result() {
        let c = MinOfArray::new(vec![VarRef(0), VarRef(1)], VarRef(2));
        let a = Domain::from_values(10, vec![3, 4]);
        let b = Domain::from_values(10, vec![5, 6]);
        let r = Domain::full(10);
        let get = |v: VarRef| match v.0 {
            0 => a.clone(),
            1 => b.clone(),
            _ => r.clone(),
        };
        let changes = c.propagate(&get).unwrap();
        let r_change = changes.iter().find(|(v, _)| *v == VarRef(2)).unwrap();
        assert_eq!(r_change.1.min(), Some(3));
        assert_eq!(r_change.1.max(), Some(5));
    }
}

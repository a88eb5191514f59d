use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

/// Non-overlapping rectangles (spec §4.5): for every pair of tasks, one of
/// four separations must hold (i left of j, j left of i, i below j, j
/// below i). When three of the four are already infeasible given current
/// bounds, the fourth is forced and the corresponding domain is narrowed.
#[derive(Clone, Debug)]
pub struct Diffn {
    xs: Vec<VarRef>,
    ys: Vec<VarRef>,
    dxs: Vec<i64>,
    dys: Vec<i64>,
}

impl Diffn {
    pub fn new(xs: Vec<VarRef>, ys: Vec<VarRef>, dxs: Vec<i64>, dys: Vec<i64>) -> Result<Diffn> {
        let n = xs.len();
        if ys.len() != n || dxs.len() != n || dys.len() != n {
            return Err(crate::error::Error::validation("diffn array length mismatch"));
        }
        Ok(Diffn { xs, ys, dxs, dys })
    }
}

enum Separation {
    ILeftOfJ,
    JLeftOfI,
    IBelowJ,
    JBelowI,
}

impl FdConstraint for Diffn {
    fn variables(&self) -> Vec<VarRef> {
        let mut vs = self.xs.clone();
        vs.extend(self.ys.iter().cloned());
        vs
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Diffn
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let dxs: Vec<Domain> = self.xs.iter().map(|&v| get(v)).collect();
        let dys: Vec<Domain> = self.ys.iter().map(|&v| get(v)).collect();
        let mut new_dxs = dxs.clone();
        let mut new_dys = dys.clone();

        let n = self.xs.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let feasible = |sep: &Separation| -> bool {
                    match sep {
                        Separation::ILeftOfJ => new_dxs[i].min().unwrap() + self.dxs[i] <= new_dxs[j].max().unwrap(),
                        Separation::JLeftOfI => new_dxs[j].min().unwrap() + self.dxs[j] <= new_dxs[i].max().unwrap(),
                        Separation::IBelowJ => new_dys[i].min().unwrap() + self.dys[i] <= new_dys[j].max().unwrap(),
                        Separation::JBelowI => new_dys[j].min().unwrap() + self.dys[j] <= new_dys[i].max().unwrap(),
                    }
                };
                let seps = [
                    Separation::ILeftOfJ,
                    Separation::JLeftOfI,
                    Separation::IBelowJ,
                    Separation::JBelowI,
                ];
                let feasibility: Vec<bool> = seps.iter().map(feasible).collect();
                let feasible_count = feasibility.iter().filter(|&&f| f).count();
                if feasible_count == 0 {
                    return Err(inconsistent(self.kind(), "no separation possible for an overlapping pair"));
                }
                if feasible_count == 1 {
                    let only = feasibility.iter().position(|&f| f).unwrap();
                    match seps[only] {
                        Separation::ILeftOfJ => {
                            new_dxs[j] = new_dxs[j].remove_below(new_dxs[i].min().unwrap() + self.dxs[i]);
                        }
                        Separation::JLeftOfI => {
                            new_dxs[i] = new_dxs[i].remove_below(new_dxs[j].min().unwrap() + self.dxs[j]);
                        }
                        Separation::IBelowJ => {
                            new_dys[j] = new_dys[j].remove_below(new_dys[i].min().unwrap() + self.dys[i]);
                        }
                        Separation::JBelowI => {
                            new_dys[i] = new_dys[i].remove_below(new_dys[j].min().unwrap() + self.dys[j]);
                        }
                    }
                    if new_dxs[i].is_empty() || new_dxs[j].is_empty() || new_dys[i].is_empty() || new_dys[j].is_empty() {
                        return Err(inconsistent(self.kind(), "forced separation empties a domain"));
                    }
                }
            }
        }

        let mut changes = Vec::new();
        for i in 0..n {
            if !new_dxs[i].equal(&dxs[i]) {
                changes.push((self.xs[i], new_dxs[i].clone()));
            }
            if !new_dys[i].equal(&dys[i]) {
                changes.push((self.ys[i], new_dys[i].clone()));
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
    fn forces_only_remaining_separation() {
        // i is pinned at (0,0) size 2x2; j's x is pinned overlapping i's x
        // range, and j's y domain still allows either above or below i,
        // but only "below i" keeps the pair separated once y is narrowed
        // by a prior pass. Here we just check a simple left/right forcing.
        let c = Diffn::new(
            vec![VarRef(0), VarRef(1)],
            vec![VarRef(2), VarRef(3)],
            vec![2, 2],
            vec![2, 2],
        )
        .unwrap();
        let xi = Domain::singleton(10, 1);
        let xj = Domain::from_values(10, vec![1, 2]); // overlaps i's x range [1,3)
        let yi = Domain::singleton(10, 1);
        let yj = Domain::singleton(10, 5); // already separated vertically
        let get = |v: VarRef| match v.0 {
            0 => xi.clone(),
            1 => xj.clone(),
            2 => yi.clone(),
            _ => yj.clone(),
        };
        // y is already separated (i below j not possible since yj > yi + dys,
        // but i's y range [1,3) vs j's y=5 is non-overlapping), so this
        // should simply succeed without forcing x.
        assert!(c.propagate(&get).is_ok());
    }
}

use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

/// Resource scheduling: tasks with fixed `durs`/`dems` and variable
/// `starts` must never push cumulative demand over `cap` at any instant
/// (spec §4.5). Implemented as time-table propagation over the tasks'
/// mandatory parts — a restricted but sound and idempotent form of the
/// edge-finding/energetic reasoning the filtering rule names; see
/// DESIGN.md for the simplification.
#[derive(Clone, Debug)]
pub struct Cumulative {
    starts: Vec<VarRef>,
    durs: Vec<i64>,
    dems: Vec<i64>,
    cap: i64,
}

impl Cumulative {
    pub fn new(starts: Vec<VarRef>, durs: Vec<i64>, dems: Vec<i64>, cap: i64) -> Result<Cumulative> {
        if starts.len() != durs.len() || starts.len() != dems.len() {
            return Err(crate::error::Error::validation("cumulative array length mismatch"));
        }
        Ok(Cumulative { starts, durs, dems, cap })
    }

    /// Mandatory part `[max(start), min(start)+dur)`, or `None` if the
    /// task isn't pinned down enough to guarantee an overlap.
    fn mandatory_part(&self, i: usize, domains: &[Domain]) -> Option<(i64, i64)> {
        let d = &domains[i];
        let lo = d.max()?;
        let hi = d.min()? + self.durs[i];
        if lo < hi {
            Some((lo, hi))
        } else {
            None
        }
    }

    fn horizon(&self, domains: &[Domain]) -> (i64, i64) {
        let lo = domains.iter().map(|d| d.min().unwrap()).min().unwrap();
        let hi = domains
            .iter()
            .zip(self.durs.iter())
            .map(|(d, dur)| d.max().unwrap() + dur)
            .max()
            .unwrap();
        (lo, hi)
    }
}

impl FdConstraint for Cumulative {
    fn variables(&self) -> Vec<VarRef> {
        self.starts.clone()
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Cumulative
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let domains: Vec<Domain> = self.starts.iter().map(|&v| get(v)).collect();
        let (lo, hi) = self.horizon(&domains);
        let span = (hi - lo).max(0) as usize;
        let mut profile = vec![0i64; span + 1];
        for i in 0..self.starts.len() {
            if let Some((mlo, mhi)) = self.mandatory_part(i, &domains) {
                for t in mlo..mhi {
                    profile[(t - lo) as usize] += self.dems[i];
                }
            }
        }
        if profile.iter().any(|&d| d > self.cap) {
            return Err(inconsistent(self.kind(), "mandatory demand exceeds capacity"));
        }

        let mut changes = Vec::new();
        for i in 0..self.starts.len() {
            let d = &domains[i];
            let mut profile_excl = profile.clone();
            if let Some((mlo, mhi)) = self.mandatory_part(i, &domains) {
                for t in mlo..mhi {
                    profile_excl[(t - lo) as usize] -= self.dems[i];
                }
            }
            let feasible_starts: Vec<i64> = d
                .iterate()
                .filter(|&s| {
                    (s..s + self.durs[i]).all(|t| {
                        let idx = (t - lo) as usize;
                        idx >= profile_excl.len() || profile_excl[idx] + self.dems[i] <= self.cap
                    })
                })
                .collect();
            let new_d = Domain::from_values(d.width(), feasible_starts);
            if new_d.is_empty() {
                return Err(inconsistent(self.kind(), "task has no feasible start"));
            }
            if !new_d.equal(d) {
                changes.push((self.starts[i], new_d));
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
    fn overloaded_mandatory_parts_are_inconsistent() {
        let c = Cumulative::new(vec![VarRef(0), VarRef(1)], vec![3, 3], vec![2, 2], 3).unwrap();
        let singleton_at_1 = Domain::singleton(10, 1);
        let get = |_: VarRef| singleton_at_1.clone();
        assert!(c.propagate(&get).is_err());
    }

    #[test]
    fn excludes_starts_that_would_overload() {
        let c = Cumulative::new(vec![VarRef(0), VarRef(1)], vec![2, 2], vec![2, 2], 3).unwrap();
        let fixed = Domain::singleton(10, 1);
        let flexible = Domain::full(10);
        let get = |v: VarRef| if v == VarRef(0) { fixed.clone() } else { flexible.clone() };
        let changes = c.propagate(&get).unwrap();
        let change = changes.iter().find(|(v, _)| *v == VarRef(1)).unwrap();
        assert!(!change.1.has(1));
    }
}

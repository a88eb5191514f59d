use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

/// `Σ aᵢxᵢ = total` (spec §4.5), bound-consistent.
#[derive(Clone, Debug)]
pub struct LinearSum {
    terms: Vec<(VarRef, i64)>,
    total: VarRef,
}

impl LinearSum {
    pub fn new(terms: Vec<(VarRef, i64)>, total: VarRef) -> LinearSum {
        LinearSum { terms, total }
    }

    pub fn terms(&self) -> &[(VarRef, i64)] {
        &self.terms
    }

    pub fn total(&self) -> VarRef {
        self.total
    }

    fn term_bounds(coeff: i64, d: &Domain) -> (i64, i64) {
        let (min, max) = (d.min().unwrap(), d.max().unwrap());
        if coeff >= 0 {
            (coeff * min, coeff * max)
        } else {
            (coeff * max, coeff * min)
        }
    }
}

impl FdConstraint for LinearSum {
    fn variables(&self) -> Vec<VarRef> {
        let mut vs: Vec<VarRef> = self.terms.iter().map(|(v, _)| *v).collect();
        vs.push(self.total);
        vs
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::LinearSum
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let domains: Vec<Domain> = self.terms.iter().map(|(v, _)| get(*v)).collect();
        let bounds: Vec<(i64, i64)> = self
            .terms
            .iter()
            .zip(domains.iter())
            .map(|((_, c), d)| Self::term_bounds(*c, d))
            .collect();

        let sum_min: i64 = bounds.iter().map(|(lo, _)| lo).sum();
        let sum_max: i64 = bounds.iter().map(|(_, hi)| hi).sum();

        let dt = get(self.total);
        let new_total = dt.remove_below(sum_min).remove_above(sum_max);
        if new_total.is_empty() {
            return Err(inconsistent(self.kind(), "total out of reachable bounds"));
        }
        let (t_min, t_max) = (new_total.min().unwrap(), new_total.max().unwrap());

        let mut changes = Vec::new();
        if !new_total.equal(&dt) {
            changes.push((self.total, new_total));
        }

        for (i, (var, coeff)) in self.terms.iter().enumerate() {
            let residual_min: i64 = sum_min - bounds[i].0;
            let residual_max: i64 = sum_max - bounds[i].1;
            // term must satisfy: residual_min + term <= t_max and residual_max + term >= t_min
            let term_hi = t_max - residual_min;
            let term_lo = t_min - residual_max;
            let d = &domains[i];
            let new_d = if *coeff > 0 {
                let lo = ceil_div(term_lo, *coeff);
                let hi = floor_div(term_hi, *coeff);
                d.remove_below(lo).remove_above(hi)
            } else if *coeff < 0 {
                let lo = ceil_div(term_hi, *coeff);
                let hi = floor_div(term_lo, *coeff);
                d.remove_below(lo).remove_above(hi)
            } else {
                d.clone()
            };
            if new_d.is_empty() {
                return Err(inconsistent(self.kind(), "term has no feasible value"));
            }
            if !new_d.equal(d) {
                changes.push((*var, new_d));
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

fn floor_div(a: i64, b: i64) -> i64 {
    let d = a.div_euclid(b);
    d
}

fn ceil_div(a: i64, b: i64) -> i64 {
    -floor_div(-a, b)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tightens_total_and_terms() {
        let c = LinearSum::new(vec![(VarRef(0), 1), (VarRef(1), 1)], VarRef(2));
        let dx = Domain::from_values(10, vec![1, 2]);
        let dy = Domain::from_values(10, vec![1, 2]);
        let dt = Domain::full(10);
        let get = |v: VarRef| match v.0 {
            0 => dx.clone(),
            1 => dy.clone(),
            _ => dt.clone(),
        };
        let changes = c.propagate(&get).unwrap();
        let total_change = changes.iter().find(|(v, _)| *v == VarRef(2)).unwrap();
        assert_eq!(total_change.1.min(), Some(2));
        assert_eq!(total_change.1.max(), Some(4));
    }
}

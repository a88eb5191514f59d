use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint, InequalityKind};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

/// `x ⋈ y`, `⋈ ∈ {<,≤,>,≥,=,≠}` (spec §4.5).
#[derive(Clone, Debug)]
pub struct Inequality {
    x: VarRef,
    y: VarRef,
    kind: InequalityKind,
}

impl Inequality {
    pub fn new(x: VarRef, y: VarRef, kind: InequalityKind) -> Inequality {
        Inequality { x, y, kind }
    }

    /// If this is an `x >= y` edge with `x == objective`, returns the
    /// "end" variable `y` the makespan bound (spec §4.7) should max over.
    pub fn makespan_end_if(&self, objective: VarRef) -> Option<VarRef> {
        if self.kind == InequalityKind::Ge && self.x == objective {
            Some(self.y)
        } else {
            None
        }
    }
}

impl FdConstraint for Inequality {
    fn variables(&self) -> Vec<VarRef> {
        vec![self.x, self.y]
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Inequality
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let dx = get(self.x);
        let dy = get(self.y);
        let (new_x, new_y) = match self.kind {
            InequalityKind::Lt => (dx.remove_at_or_above(dy.max().unwrap()), dy.remove_at_or_below(dx.min().unwrap())),
            InequalityKind::Le => (dx.remove_above(dy.max().unwrap()), dy.remove_below(dx.min().unwrap())),
            InequalityKind::Gt => (dx.remove_at_or_below(dy.min().unwrap()), dy.remove_at_or_above(dx.max().unwrap())),
            InequalityKind::Ge => (dx.remove_below(dy.min().unwrap()), dy.remove_above(dx.max().unwrap())),
            InequalityKind::Eq => {
                let i = dx.intersect(&dy);
                (i.clone(), i)
            }
            InequalityKind::Ne => {
                let mut nx = dx.clone();
                let mut ny = dy.clone();
                if let Some(v) = dy.singleton_value() {
                    nx = nx.remove(v);
                }
                if let Some(v) = dx.singleton_value() {
                    ny = ny.remove(v);
                }
                (nx, ny)
            }
        };
        if new_x.is_empty() || new_y.is_empty() {
            return Err(inconsistent(self.kind_constraint(), "no value satisfies the relation"));
        }
        let mut changes = Vec::new();
        if !new_x.equal(&dx) {
            changes.push((self.x, new_x));
        }
        if !new_y.equal(&dy) {
            changes.push((self.y, new_y));
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

impl Inequality {
    fn kind_constraint(&self) -> ConstraintKind {
        ConstraintKind::Inequality
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn less_than_prunes_both_sides() {
        let c = Inequality::new(VarRef(0), VarRef(1), InequalityKind::Lt);
        let dx = Domain::full(10);
        let dy = Domain::from_values(10, vec![3]);
        let get = |v: VarRef| if v == VarRef(0) { dx.clone() } else { dy.clone() };
        let changes = c.propagate(&get).unwrap();
        let x_change = changes.iter().find(|(v, _)| *v == VarRef(0)).unwrap();
        assert_eq!(x_change.1.max(), Some(2));
    }

    #[test]
    fn not_equal_removes_singleton_peer() {
        let c = Inequality::new(VarRef(0), VarRef(1), InequalityKind::Ne);
        let dx = Domain::singleton(5, 2);
        let dy = Domain::full(5);
        let get = |v: VarRef| if v == VarRef(0) { dx.clone() } else { dy.clone() };
        let changes = c.propagate(&get).unwrap();
        let y_change = changes.iter().find(|(v, _)| *v == VarRef(1)).unwrap();
        assert!(!y_change.1.has(2));
    }
}

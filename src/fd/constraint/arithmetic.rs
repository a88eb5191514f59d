use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

/// `x + k = y` (spec §4.5).
#[derive(Clone, Debug)]
pub struct Arithmetic {
    x: VarRef,
    y: VarRef,
    k: i64,
}

impl Arithmetic {
    pub fn new(x: VarRef, y: VarRef, k: i64) -> Arithmetic {
        Arithmetic { x, y, k }
    }
}

impl FdConstraint for Arithmetic {
    fn variables(&self) -> Vec<VarRef> {
        vec![self.x, self.y]
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Arithmetic
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let dx = get(self.x);
        let dy = get(self.y);
        let width = dy.width();

        let image_of_x = Domain::from_values(width, dx.iterate().map(|v| v + self.k));
        let new_y = dy.intersect(&image_of_x);
        if new_y.is_empty() {
            return Err(inconsistent(self.kind(), "y has no support from x + k"));
        }

        let width_x = dx.width();
        let image_of_y = Domain::from_values(width_x, new_y.iterate().map(|v| v - self.k));
        let new_x = dx.intersect(&image_of_y);
        if new_x.is_empty() {
            return Err(inconsistent(self.kind(), "x has no support from y - k"));
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

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn narrows_both_sides() {
        let c = Arithmetic::new(VarRef(0), VarRef(1), 2);
        let dx = Domain::from_values(10, vec![1, 2, 3]);
        let dy = Domain::full(10);
        let get = |v: VarRef| if v == VarRef(0) { dx.clone() } else { dy.clone() };
        let changes = c.propagate(&get).unwrap();
        let y_change = changes.iter().find(|(v, _)| *v == VarRef(1)).unwrap();
        assert_eq!(y_change.1.iterate().collect::<Vec<_>>(), vec![3, 4, 5]);
    }
}

use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

const FALSE: i64 = 1;
const TRUE: i64 = 2;

/// `b ↔ (x = y)`, `b ∈ {1=false, 2=true}` (spec §4.5).
#[derive(Clone, Debug)]
pub struct EqualityReified {
    x: VarRef,
    y: VarRef,
    b: VarRef,
}

impl EqualityReified {
    pub fn new(x: VarRef, y: VarRef, b: VarRef) -> EqualityReified {
        EqualityReified { x, y, b }
    }
}

impl FdConstraint for EqualityReified {
    fn variables(&self) -> Vec<VarRef> {
        vec![self.x, self.y, self.b]
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::EqualityReified
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let dx = get(self.x);
        let dy = get(self.y);
        let db = get(self.b);
        let mut changes = Vec::new();

        match db.singleton_value() {
            Some(TRUE) => {
                let i = dx.intersect(&dy);
                if i.is_empty() {
                    return Err(inconsistent(self.kind(), "b=true but x, y share no value"));
                }
                if !i.equal(&dx) {
                    changes.push((self.x, i.clone()));
                }
                if !i.equal(&dy) {
                    changes.push((self.y, i));
                }
            }
            Some(FALSE) => {
                if let (Some(vx), Some(vy)) = (dx.singleton_value(), dy.singleton_value()) {
                    if vx == vy {
                        return Err(inconsistent(self.kind(), "b=false but x, y are forced equal"));
                    }
                }
            }
            _ => {
                if dx.is_disjoint(&dy) {
                    changes.push((self.b, Domain::singleton(db.width(), FALSE)));
                } else if let (Some(vx), Some(vy)) = (dx.singleton_value(), dy.singleton_value()) {
                    if vx == vy {
                        changes.push((self.b, Domain::singleton(db.width(), TRUE)));
                    }
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
    fn disjoint_domains_force_b_false() {
        let c = EqualityReified::new(VarRef(0), VarRef(1), VarRef(2));
        let dx = Domain::from_values(10, vec![1, 2]);
        let dy = Domain::from_values(10, vec![3, 4]);
        let db = Domain::full(2);
        let get = |v: VarRef| match v.0 {
            0 => dx.clone(),
            1 => dy.clone(),
            _ => db.clone(),
        };
        let changes = c.propagate(&get).unwrap();
        assert_eq!(changes, vec![(VarRef(2), Domain::singleton(2, FALSE))]);
    }

    #[test]
    fn true_b_intersects_x_and_y() {
        let c = EqualityReified::new(VarRef(0), VarRef(1), VarRef(2));
        let dx = Domain::from_values(10, vec![1, 2, 3]);
        let dy = Domain::from_values(10, vec![2, 3, 4]);
        let db = Domain::singleton(2, TRUE);
        let get = |v: VarRef| match v.0 {
            0 => dx.clone(),
            1 => dy.clone(),
            _ => db.clone(),
        };
        let changes = c.propagate(&get).unwrap();
        assert_eq!(changes.len(), 2);
    }
}

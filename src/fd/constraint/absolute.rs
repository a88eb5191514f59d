use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

/// `r = |x − offset|` with `offset > 0` required (spec §4.5).
#[derive(Clone, Debug)]
pub struct Absolute {
    x: VarRef,
    offset: i64,
    r: VarRef,
}

impl Absolute {
    pub fn new(x: VarRef, offset: i64, r: VarRef) -> crate::error::Result<Absolute> {
        if offset <= 0 {
            return Err(crate::error::Error::validation("Absolute requires offset > 0"));
        }
        Ok(Absolute { x, offset, r })
    }
}

impl FdConstraint for Absolute {
    fn variables(&self) -> Vec<VarRef> {
        vec![self.x, self.r]
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Absolute
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let dx = get(self.x);
        let dr = get(self.r);

        let image = Domain::from_values(dr.width(), dx.iterate().map(|v| (v - self.offset).abs()));
        let new_r = dr.intersect(&image);
        if new_r.is_empty() {
            return Err(inconsistent(self.kind(), "r has no support from |x - offset|"));
        }

        let preimages = new_r.iterate().flat_map(|rv| vec![self.offset + rv, self.offset - rv]);
        let image_back = Domain::from_values(dx.width(), preimages);
        let new_x = dx.intersect(&image_back);
        if new_x.is_empty() {
            return Err(inconsistent(self.kind(), "x has no preimage for r"));
        }

        let mut changes = Vec::new();
        if !new_x.equal(&dx) {
            changes.push((self.x, new_x));
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
    fn rejects_nonpositive_offset() {
        assert!(Absolute::new(VarRef(0), 0, VarRef(1)).is_err());
    }

    #[test]
    fn narrows_r_from_x() {
        let c = Absolute::new(VarRef(0), 5, VarRef(1)).unwrap();
        let dx = Domain::from_values(10, vec![3, 4]);
        let dr = Domain::full(10);
        let get = |v: VarRef| if v == VarRef(0) { dx.clone() } else { dr.clone() };
        let changes = c.propagate(&get).unwrap();
        let r_change = changes.iter().find(|(v, _)| *v == VarRef(1)).unwrap();
        assert_eq!(r_change.1.iterate().collect::<Vec<_>>(), vec![1, 2]);
    }
}

use super::{inconsistent, ConstraintKind, DomainChange, FdConstraint};
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::variable::VarRef;

/// `(x1,…,xn) ∈ rows` (spec §4.5), generalized arc consistency by support.
#[derive(Clone, Debug)]
pub struct Table {
    vars: Vec<VarRef>,
    rows: Vec<Vec<i64>>,
}

impl Table {
    pub fn new(vars: Vec<VarRef>, rows: Vec<Vec<i64>>) -> Result<Table> {
        if rows.iter().any(|r| r.len() != vars.len()) {
            return Err(crate::error::Error::validation("table row arity mismatch"));
        }
        Ok(Table { vars, rows })
    }
}

impl FdConstraint for Table {
    fn variables(&self) -> Vec<VarRef> {
        self.vars.clone()
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Table
    }

    fn propagate(&self, get: &dyn Fn(VarRef) -> Domain) -> Result<Vec<DomainChange>> {
        let domains: Vec<Domain> = self.vars.iter().map(|&v| get(v)).collect();

        let live_rows: Vec<&Vec<i64>> = self
            .rows
            .iter()
            .filter(|row| row.iter().zip(domains.iter()).all(|(&val, d)| d.has(val)))
            .collect();
        if live_rows.is_empty() {
            return Err(inconsistent(self.kind(), "no row is consistent with current domains"));
        }

        let mut changes = Vec::new();
        for (i, &v) in self.vars.iter().enumerate() {
            let support: Vec<i64> = live_rows.iter().map(|row| row[i]).collect();
            let new_d = domains[i].intersect(&Domain::from_values(domains[i].width(), support));
            if new_d.is_empty() {
                return Err(inconsistent(self.kind(), "column has no support among live rows"));
            }
            if !new_d.equal(&domains[i]) {
                changes.push((v, new_d));
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
    fn prunes_columns_to_live_row_support() {
        let rows = vec![vec![1, 2], vec![2, 3], vec![3, 1]];
        let c = Table::new(vec![VarRef(0), VarRef(1)], rows).unwrap();
        let dx = Domain::from_values(5, vec![1, 2]);
        let dy = Domain::full(5);
        let get = |v: VarRef| if v == VarRef(0) { dx.clone() } else { dy.clone() };
        let changes = c.propagate(&get).unwrap();
        let y_change = changes.iter().find(|(v, _)| *v == VarRef(1)).unwrap();
        assert_eq!(y_change.1.iterate().collect::<Vec<_>>(), vec![2, 3]);
    }
}

//! FD variable identity and peer tracking (spec §3 "FD Variable").
use std::sync::Arc;

/// Identifies an FD variable within a `Model`. Distinct from `term::VarId`:
/// an FD variable is always backed by an initial `Domain`, while a relational
/// `VarId` may never acquire one.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VarRef(pub u32);

/// A declared FD variable: its name, initial domain, and the peers
/// registered against it by pairwise constraints (AllDifferent and
/// friends), which `selectVariable`'s `Deg`/`DomDeg` heuristics consult.
#[derive(Clone, Debug)]
pub struct FdVar {
    pub id: VarRef,
    pub name: Arc<str>,
    pub initial_domain: crate::fd::domain::Domain,
    peers: Vec<VarRef>,
}

impl FdVar {
    pub fn new(id: VarRef, name: &str, initial_domain: crate::fd::domain::Domain) -> FdVar {
        FdVar {
            id,
            name: Arc::from(name),
            initial_domain,
            peers: Vec::new(),
        }
    }

    pub fn add_peer(&mut self, other: VarRef) {
        if other != self.id && !self.peers.contains(&other) {
            self.peers.push(other);
        }
    }

    pub fn degree(&self) -> usize {
        self.peers.len()
    }

    pub fn peers(&self) -> &[VarRef] {
        &self.peers
    }
}

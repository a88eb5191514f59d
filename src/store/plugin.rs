//! `Plugin` trait plus the two built-in plugins `HybridSolver` drives to a
//! fixed point (spec §4.8). Grounded on the teacher's
//! `state/constraint/store.rs`, whose `ConstraintStore::normalize` loop
//! reruns every posted constraint against the current substitution until
//! nothing changes; here each concern (FD domains, relational constraints)
//! gets its own plugin instead of one monolithic normalize pass, and the
//! relational plugin additionally promotes a singleton FD domain into a
//! logic-variable binding (spec §4.8 item 2).
use super::relational::ConstraintStatus;
use super::UnifiedStore;
use crate::error::{CancellationToken, Result};
use crate::term::{Atom, Term};

/// One concern of a `UnifiedStore`'s propagation fixed point.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this plugin has anything to check in `store` right now.
    fn can_handle(&self, store: &UnifiedStore) -> bool;

    /// Returns a (possibly unchanged) store with this plugin's concern
    /// propagated one step further.
    fn propagate(&self, store: &UnifiedStore) -> Result<UnifiedStore>;
}

/// Drives `fd::solver::Solver::propagate` over the store's FD state.
pub struct FdPlugin;

impl Plugin for FdPlugin {
    fn name(&self) -> &str {
        "fd"
    }

    fn can_handle(&self, store: &UnifiedStore) -> bool {
        store.fd_solver().is_some() && store.fd_state().is_some()
    }

    fn propagate(&self, store: &UnifiedStore) -> Result<UnifiedStore> {
        let (Some(solver), Some(state)) = (store.fd_solver(), store.fd_state()) else {
            return Ok(store.clone());
        };
        let ctx = CancellationToken::new();
        let next = solver.propagate(state, &ctx)?;
        Ok(store.with_fd_state(next))
    }
}

/// Checks every posted relational constraint against the store's current
/// bindings (spec §4.8 item 1), drops ones that are `Satisfied`, fails the
/// whole propagation with a validation error on the first `Violated` one
/// found, and additionally promotes any FD variable whose domain has
/// narrowed to a singleton into an equivalent logic-variable binding (spec
/// §4.8 item 2) so relational constraints over that variable can resolve.
pub struct RelationalPlugin;

impl Plugin for RelationalPlugin {
    fn name(&self) -> &str {
        "relational"
    }

    fn can_handle(&self, store: &UnifiedStore) -> bool {
        !store.relational_constraints().is_empty() || store.fd_state().is_some()
    }

    fn propagate(&self, store: &UnifiedStore) -> Result<UnifiedStore> {
        check_fd_links_consistent(store)?;
        let mut next = promote_singletons(store)?;

        let resolve = |t: &Term| next.resolve(t);
        let mut kept = Vec::new();
        for c in next.relational_constraints() {
            match c.check(&resolve) {
                ConstraintStatus::Violated => {
                    return Err(crate::error::Error::validation(format!(
                        "relational constraint {} violated",
                        c.id()
                    )));
                }
                ConstraintStatus::Satisfied => {}
                ConstraintStatus::Pending => kept.push(c.clone()),
            }
        }
        next = next.retain_relational(kept);
        Ok(next)
    }
}

/// For every explicitly linked FD variable pinned to a single value, binds
/// its logic-term stand-in (spec §4.8 item 2's "singleton promotion") to
/// that integer atom if it is not already bound; if a relational binding
/// already exists there, it must agree with the singleton (spec §4.8 item
/// 2 "else fail").
fn promote_singletons(store: &UnifiedStore) -> Result<UnifiedStore> {
    let Some(state) = store.fd_state() else {
        return Ok(store.clone());
    };
    let mut next = store.clone();
    for (fd, term) in store.fd_links() {
        let Some(value) = state.get_domain(*fd).singleton_value() else {
            continue;
        };
        match next.resolve(term) {
            Term::Var(id, _) => {
                next = next.bind(id, Term::Atom(Atom::Int(value)));
            }
            Term::Atom(Atom::Int(existing)) if existing == value => {}
            other => {
                return Err(crate::error::Error::validation(format!(
                    "fd variable {:?} is singleton {} but its relational binding is already {:?}",
                    fd, value, other
                )));
            }
        }
    }
    Ok(next)
}

/// Spec §4.8 item 3: fails if a relational binding already exists for an
/// FD-linked variable but is not an integer atom, or is an integer outside
/// the variable's current domain.
fn check_fd_links_consistent(store: &UnifiedStore) -> Result<()> {
    let Some(state) = store.fd_state() else {
        return Ok(());
    };
    for (fd, term) in store.fd_links() {
        match store.resolve(term) {
            Term::Var(_, _) => continue,
            Term::Atom(Atom::Int(v)) => {
                if !state.get_domain(*fd).has(v) {
                    return Err(crate::error::Error::validation(format!(
                        "relational binding {} for fd variable {:?} is outside its domain",
                        v, fd
                    )));
                }
            }
            other => {
                return Err(crate::error::Error::validation(format!(
                    "relational binding for fd variable {:?} must be an integer atom, got {:?}",
                    fd, other
                )));
            }
        }
    }
    Ok(())
}

//! Property tests for the algebraic laws spec §8 calls out: domain
//! intersect/union commute and associate, remove is idempotent, and
//! unification is symmetric up to walked equality.
use proptest::prelude::*;
use wellfound::fd::domain::Domain;
use wellfound::subst::Substitution;
use wellfound::term::Term;
use wellfound::unify::unify;

const WIDTH: u32 = 16;

fn domain_from_mask(mask: u16) -> Domain {
    let values: Vec<i64> = (0..WIDTH)
        .filter(|b| mask & (1 << b) != 0)
        .map(|b| b as i64 + 1)
        .collect();
    Domain::from_values(WIDTH, values)
}

proptest! {
    #[test]
    fn intersect_commutes(a in any::<u16>(), b in any::<u16>()) {
        let da = domain_from_mask(a);
        let db = domain_from_mask(b);
        prop_assert!(da.intersect(&db).equal(&db.intersect(&da)));
    }

    #[test]
    fn union_commutes(a in any::<u16>(), b in any::<u16>()) {
        let da = domain_from_mask(a);
        let db = domain_from_mask(b);
        prop_assert!(da.union(&db).equal(&db.union(&da)));
    }

    #[test]
    fn intersect_associates(a in any::<u16>(), b in any::<u16>(), c in any::<u16>()) {
        let da = domain_from_mask(a);
        let db = domain_from_mask(b);
        let dc = domain_from_mask(c);
        let left = da.intersect(&db).intersect(&dc);
        let right = da.intersect(&db.intersect(&dc));
        prop_assert!(left.equal(&right));
    }

    #[test]
    fn remove_is_idempotent(mask in any::<u16>(), v in 1i64..=16) {
        let d = domain_from_mask(mask);
        let once = d.remove(v);
        let twice = once.remove(v);
        prop_assert!(once.equal(&twice));
        prop_assert!(!once.has(v));
    }

    #[test]
    fn intersect_with_self_is_identity(mask in any::<u16>()) {
        let d = domain_from_mask(mask);
        prop_assert!(d.intersect(&d).equal(&d));
    }

    #[test]
    fn unifying_atom_with_itself_always_succeeds(v in any::<i64>()) {
        let s = Substitution::new();
        prop_assert!(unify(&Term::atom(v), &Term::atom(v), &s).is_some());
    }

    #[test]
    fn unification_is_symmetric(x in any::<i64>(), y in any::<i64>()) {
        let s = Substitution::new();
        let a = Term::atom(x);
        let b = Term::atom(y);
        prop_assert_eq!(unify(&a, &b, &s).is_some(), unify(&b, &a, &s).is_some());
    }
}

//! Property tests for the closure engine: every policy reaches the same
//! relation, facts are never retracted, and the result is a fixpoint

use proptest::prelude::*;
use raya_verifier_types::{ClosureMode, TypeArg, TypeHandle, TypeSystem, Variance};
use std::collections::HashSet;

const PROPTEST_CASES: u32 = 64;

#[derive(Clone, Debug)]
enum Op {
    Relate(usize, usize),
    Apply { ctor: usize, args: Vec<(Variance, usize)> },
}

fn arb_variance() -> impl Strategy<Value = Variance> {
    prop::sample::select(vec![Variance::Invariant, Variance::Covariant, Variance::Contravariant])
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<usize>(), any::<usize>()).prop_map(|(lhs, rhs)| Op::Relate(lhs, rhs)),
        2 => (0usize..2, prop::collection::vec((arb_variance(), any::<usize>()), 1..=2))
            .prop_map(|(ctor, args)| Op::Apply { ctor, args }),
    ]
}

fn facts(types: &TypeSystem) -> HashSet<(usize, usize)> {
    types
        .handles()
        .flat_map(|sub| {
            types
                .supertypes(sub)
                .map(move |sup| (sub.id().index(), sup.id().index()))
        })
        .collect()
}

/// Replay `ops` on a fresh engine with `base` nullary types, calling
/// `observe` after every op, then finish the closure.
fn replay<F>(mode: ClosureMode, base: usize, ops: &[Op], mut observe: F) -> TypeSystem
where
    F: FnMut(&TypeSystem),
{
    let mut types = TypeSystem::new(mode);
    let mut handles: Vec<TypeHandle> = (0..base).map(|i| types.nullary(&format!("T{}", i))).collect();
    let ctors = [types.parametric("F"), types.parametric("G")];

    for op in ops {
        match op {
            Op::Relate(lhs, rhs) => {
                let lhs = handles[lhs % handles.len()];
                let rhs = handles[rhs % handles.len()];
                types.relate(lhs, rhs);
            }
            Op::Apply { ctor, args } => {
                let args: Vec<TypeArg> = args
                    .iter()
                    .map(|&(variance, i)| handles[i % handles.len()].with_variance(variance))
                    .collect();
                let ty = ctors[*ctor].apply(&mut types, &args);
                if !handles.contains(&ty) {
                    handles.push(ty);
                }
            }
        }
        observe(&types);
    }

    match mode {
        ClosureMode::Eager => {}
        ClosureMode::Deferred => {
            types.close_accumulated();
        }
        ClosureMode::Manual => {
            types.close_all();
        }
    }
    types
}

/// Whether the structural rule alone derives `lhs <= rhs`.
fn structurally_related(types: &TypeSystem, lhs: TypeHandle, rhs: TypeHandle) -> bool {
    if types.sort_of(lhs) != types.sort_of(rhs) || types.arity(lhs) != types.arity(rhs) || types.arity(lhs) == 0 {
        return false;
    }
    types.params_of(lhs).zip(types.params_of(rhs)).all(|(l, r)| {
        l.variance == r.variance
            && match l.variance {
                Variance::Invariant => types.is_iso(l.ty, r.ty),
                Variance::Covariant => types.is_subtype(l.ty, r.ty),
                Variance::Contravariant => types.is_subtype(r.ty, l.ty),
            }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    #[test]
    fn policies_agree(base in 2usize..6, ops in prop::collection::vec(arb_op(), 0..24)) {
        let eager = facts(&replay(ClosureMode::Eager, base, &ops, |_| {}));
        let deferred = facts(&replay(ClosureMode::Deferred, base, &ops, |_| {}));
        let manual = facts(&replay(ClosureMode::Manual, base, &ops, |_| {}));
        prop_assert_eq!(&deferred, &eager);
        prop_assert_eq!(&manual, &eager);
    }

    #[test]
    fn facts_never_retract(base in 2usize..6, ops in prop::collection::vec(arb_op(), 0..24)) {
        let mut previous: HashSet<(usize, usize)> = HashSet::new();
        replay(ClosureMode::Eager, base, &ops, |types| {
            let current = facts(types);
            assert!(previous.is_subset(&current), "relation lost facts");
            previous = current;
        });
    }

    #[test]
    fn closed_relation_is_a_fixpoint(base in 2usize..6, ops in prop::collection::vec(arb_op(), 0..24)) {
        for mode in [ClosureMode::Eager, ClosureMode::Deferred, ClosureMode::Manual] {
            let types = replay(mode, base, &ops, |_| {});
            let all: Vec<TypeHandle> = types.handles().collect();
            for &lhs in &all {
                for &rhs in &all {
                    if structurally_related(&types, lhs, rhs) {
                        prop_assert!(types.is_subtype(lhs, rhs), "{:?}: missing structural edge", mode);
                    }
                    if types.is_subtype(lhs, rhs) {
                        for sup in types.supertypes(rhs) {
                            prop_assert!(types.is_subtype(lhs, sup), "{:?}: not transitive", mode);
                        }
                    }
                }
            }
        }
    }
}

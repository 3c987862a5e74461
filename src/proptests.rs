use crate::{FnKeyHasher, Hamt, KeyHasher, PersistentHamt};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    Remove(u16),
    Get(u16),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        50 => (any::<u16>(), any::<u32>()).prop_map(|(key, value)| Op::Insert(key, value)),
        30 => any::<u16>().prop_map(Op::Remove),
        20 => any::<u16>().prop_map(Op::Get),
    ];

    prop::collection::vec(op, 0..=1000)
}

/// Leaves the low 50 bits of every hash zero, pushing keys ten levels down,
/// and maps keys congruent modulo 1024 to the same hash.
fn weak_hash(key: &u16) -> u64 {
    u64::from(*key % 1024) << 50
}

fn check_mutable<H: KeyHasher<u16>>(
    mut map: Hamt<u16, u32, H>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut reference = HashMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                prop_assert_eq!(map.insert(key, value), reference.insert(key, value));
            }
            Op::Remove(key) => {
                prop_assert_eq!(map.remove(&key), reference.remove(&key));
            }
            Op::Get(key) => {
                prop_assert_eq!(map.get(&key), reference.get(&key));
            }
        }

        prop_assert_eq!(map.len(), reference.len());
    }

    map.validate();

    let mut entries = map
        .iter()
        .map(|(key, value)| (*key, *value))
        .collect::<Vec<_>>();
    let mut expected = reference.into_iter().collect::<Vec<_>>();

    entries.sort_unstable();
    expected.sort_unstable();

    prop_assert_eq!(entries, expected);

    Ok(())
}

fn check_persistent<H: Clone + KeyHasher<u16>>(
    mut map: PersistentHamt<u16, u32, H>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut reference = HashMap::new();
    let mut snapshots = vec![];

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                let (other, added) = map.insert_with_status(key, value);

                snapshots.push((map, reference.clone()));
                prop_assert_eq!(added, reference.insert(key, value).is_none());
                map = other;
            }
            Op::Remove(key) => {
                map = map.remove(&key);
                reference.remove(&key);
            }
            Op::Get(key) => {
                prop_assert_eq!(map.get(&key), reference.get(&key));
            }
        }

        prop_assert_eq!(map.len(), reference.len());
    }

    map.validate();

    for (snapshot, reference) in snapshots.iter().rev().take(16) {
        snapshot.validate();
        prop_assert_eq!(snapshot.len(), reference.len());

        for (key, value) in reference {
            prop_assert_eq!(snapshot.get(key), Some(value));
        }
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn mutable_equivalence(ops in ops_strategy()) {
        check_mutable(Hamt::new(), ops)?;
    }

    #[test]
    fn mutable_equivalence_weak_hash(ops in ops_strategy()) {
        check_mutable(Hamt::with_hasher(FnKeyHasher::new(weak_hash)), ops)?;
    }

    #[test]
    fn persistent_equivalence(ops in ops_strategy()) {
        check_persistent(PersistentHamt::new(), ops)?;
    }

    #[test]
    fn persistent_equivalence_weak_hash(ops in ops_strategy()) {
        check_persistent(PersistentHamt::with_hasher(FnKeyHasher::new(weak_hash)), ops)?;
    }

    #[test]
    fn mutable_and_persistent_agree(ops in ops_strategy()) {
        let mut mutable = Hamt::new();
        let mut persistent = PersistentHamt::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    mutable.insert(key, value);
                    persistent = persistent.insert(key, value);
                }
                Op::Remove(key) => {
                    mutable.remove(&key);
                    persistent = persistent.remove(&key);
                }
                Op::Get(_) => {}
            }
        }

        prop_assert_eq!(PersistentHamt::from(mutable), persistent);
    }
}

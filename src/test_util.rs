// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Property-testing helpers.
//!
//! With the `arbitrary` feature, [`Value`] implements [`quickcheck::Arbitrary`].
use crate::value::{Map, Value};
use quickcheck::{Arbitrary, Gen};

// Few distinct keys, so that generated operations keep hitting the same entries.
const KEYS: &[&str] = &["a", "b", "team", "subs", "goaly"];

fn arbitrary_key(g: &mut Gen) -> String {
    (*g.choose(KEYS).unwrap()).to_owned()
}

impl Arbitrary for Value {
    fn arbitrary(g: &mut Gen) -> Self {
        let kinds: &[&str] = if g.size() < 4 {
            &["null", "bool", "int", "float", "string"]
        } else {
            &["null", "bool", "int", "float", "string", "map", "array"]
        };
        match *g.choose(kinds).unwrap() {
            "null" => Value::Null,
            "bool" => Value::Bool(bool::arbitrary(g)),
            "int" => Value::from(i64::arbitrary(g)),
            // non-finite floats become null
            "float" => Value::from(f64::arbitrary(g)),
            "string" => Value::from(arbitrary_key(g)),
            "map" => {
                // penalize nesting
                let mut g = Gen::new(g.size() / 2);
                let len = usize::arbitrary(&mut g) % 4;
                Value::Map(
                    (0..len)
                        .map(|_| (arbitrary_key(&mut g), Value::arbitrary(&mut g)))
                        .collect::<Map>(),
                )
            }
            "array" => {
                // penalize nesting
                let mut g = Gen::new(g.size() / 2);
                let len = usize::arbitrary(&mut g) % 4;
                Value::Array((0..len).map(|_| Value::arbitrary(&mut g)).collect())
            }
            _ => unreachable!(),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            Value::Null => quickcheck::empty_shrinker(),
            Value::Map(m) => Box::new(m.values().cloned().collect::<Vec<_>>().into_iter()),
            Value::Array(a) => Box::new(a.iter().cloned().collect::<Vec<_>>().into_iter()),
            _ => quickcheck::single_shrinker(Value::Null),
        }
    }
}

#[cfg(test)]
pub(crate) use ops::{Op, apply_ops, read_file};

#[cfg(test)]
mod ops {
    use super::arbitrary_key;
    use crate::{Result, Store, Value};
    use quickcheck::{Arbitrary, Gen};
    use std::path::Path;

    /// A single mutation of a store, as issued by a user of the mapping API.
    ///
    /// Applying an op either fails before touching the tree, or mutates it and notifies the
    /// store exactly once.
    #[derive(Debug, Clone)]
    pub(crate) enum Op {
        Insert(String, Value),
        Remove(String),
        Clear,
        GetOr(String, Value),
        GetOrInsert(String, Value),
        NestedInsert(String, String, Value),
        Push(String, Value),
    }

    impl Op {
        pub(crate) fn apply(&self, store: &mut Store) -> Result<()> {
            match self.clone() {
                Op::Insert(key, value) => store.insert(key, value).map(drop),
                Op::Remove(key) => store.remove(&key).map(drop),
                Op::Clear => store.clear(),
                Op::GetOr(key, default) => store.get_or(&key, default).map(drop),
                Op::GetOrInsert(key, default) => store.get_or_insert(key, default).map(drop),
                Op::NestedInsert(key, sub, value) => {
                    store.map_mut(&key)?.insert(sub, value).map(drop)
                }
                Op::Push(key, value) => store.array_mut(&key)?.push(value),
            }
        }
    }

    impl Arbitrary for Op {
        fn arbitrary(g: &mut Gen) -> Self {
            // clearing wipes everything, so it gets a single slot
            match *g.choose(&[0, 0, 1, 2, 3, 4, 5, 5, 6, 6]).unwrap() {
                0 => Op::Insert(arbitrary_key(g), Value::arbitrary(g)),
                1 => Op::Remove(arbitrary_key(g)),
                2 => Op::Clear,
                3 => Op::GetOr(arbitrary_key(g), Value::arbitrary(g)),
                4 => Op::GetOrInsert(arbitrary_key(g), Value::arbitrary(g)),
                5 => Op::NestedInsert(arbitrary_key(g), arbitrary_key(g), Value::arbitrary(g)),
                _ => Op::Push(arbitrary_key(g), Value::arbitrary(g)),
            }
        }
    }

    /// Applies every op in turn, returning whether any of them succeeded.
    pub(crate) fn apply_ops(store: &mut Store, ops: Vec<Op>) -> bool {
        let mut changed = false;
        for op in ops {
            changed |= op.apply(store).is_ok();
        }
        changed
    }

    pub(crate) fn read_file(path: &Path) -> serde_json::Value {
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }
}

// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Notifying handles onto the containers of a store.
//!
//! A handle borrows the [`Store`](crate::Store) that owns the tree and remembers the path from the
//! root to the container it stands for. Reads go straight to the plain container through
//! [`Deref`](std::ops::Deref). Every mutating method adapts its operands, applies the change
//! and then hands control to [`Store::notify_changed`](crate::Store::notify_changed), which
//! decides whether to flush right away or leave the store dirty.
//!
//! The borrow is the only link from a container back to its root: the tree owns its containers
//! strictly downwards, and a handle cannot outlive the `&mut` borrow it was created from.
//!
//! # Example
//!
//! ```
//! # use selfstore::Store;
//! # use serde_json::json;
//! # let dir = tempfile::tempdir().unwrap();
//! let mut store = Store::open(dir.path().join("club.json")).unwrap();
//! store.insert("team", json!({ "subs": [] })).unwrap();
//!
//! let mut team = store.map_mut("team").unwrap();
//! team.insert("goaly", "neuer").unwrap();
//! team.array_mut("subs").unwrap().push("mueller").unwrap();
//!
//! let reopened = Store::open(dir.path().join("club.json")).unwrap();
//! assert_eq!(reopened["team"]["subs"][0], "mueller");
//! ```
use crate::value::{Map, Value};
use smallvec::SmallVec;

mod array;
mod map;

pub use array::ArrayMut;
pub use map::MapMut;

/// One step from a container to one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Key(String),
    Index(usize),
}

/// Location of a container relative to the root of the tree.
///
/// Most trees are shallow, so the path lives inline.
pub(crate) type TreePath = SmallVec<[Segment; 4]>;

pub(crate) fn value_at<'a>(root: &'a Map, path: &[Segment]) -> Option<&'a Value> {
    let (Segment::Key(first), rest) = path.split_first()? else {
        return None;
    };
    let mut value = root.get(first)?;
    for segment in rest {
        value = match segment {
            Segment::Key(k) => value.as_map()?.get(k)?,
            Segment::Index(i) => value.as_array()?.get(*i)?,
        };
    }
    Some(value)
}

pub(crate) fn value_at_mut<'a>(root: &'a mut Map, path: &[Segment]) -> Option<&'a mut Value> {
    let (Segment::Key(first), rest) = path.split_first()? else {
        return None;
    };
    let mut value = root.get_mut(first)?;
    for segment in rest {
        value = match segment {
            Segment::Key(k) => value.as_map_mut()?.get_mut(k)?,
            Segment::Index(i) => value.as_array_mut()?.get_mut(*i)?,
        };
    }
    Some(value)
}

/// The kind of child container a handle is requested for.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Kind {
    Map,
    Array,
}

impl Kind {
    /// Checks that `found` is a container of this kind.
    pub(crate) fn check(self, found: &Value) -> crate::Result<()> {
        let expected = match self {
            Kind::Map => "map",
            Kind::Array => "array",
        };
        let matches = match self {
            Kind::Map => found.as_map().is_some(),
            Kind::Array => found.as_array().is_some(),
        };
        if matches {
            Ok(())
        } else {
            Err(crate::Error::WrongType {
                expected,
                found: found.type_name(),
            })
        }
    }
}

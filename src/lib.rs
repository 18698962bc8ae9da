// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # selfstore: a mapping that persists itself
//!
//! This crate provides [`Store`], a string-keyed mapping of JSON-like values that is backed by a
//! file and writes itself to that file whenever it, or anything nested inside it, changes.
//!
//! ```
//! # use selfstore::Store;
//! # use serde_json::json;
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("club.json");
//! let mut store = Store::open(&path)?;
//! store.insert("team", json!({ "goaly": "neuer", "subs": [] }))?;
//! store.map_mut("team")?.array_mut("subs")?.push("mueller")?;
//!
//! // every mutation above is already on disk
//! let reopened = Store::open(&path)?;
//! assert_eq!(reopened["team"]["subs"][0], "mueller");
//! # Ok::<_, selfstore::Error>(())
//! ```
//!
//! ## The tree
//!
//! A store is the root of a tree of [`Value`]s: scalars, [`Array`]s and [`Map`]s. Anything
//! stored in the tree is first *adapted*: plain `serde_json` containers (and anything else that
//! converts into a [`Value`]) are recursively turned into tree containers, see [`adapt`].
//!
//! The plain containers only offer read access. Mutation goes through the store or through the
//! notifying handles [`MapMut`] and [`ArrayMut`], which borrow the store and know the path from
//! the root to the container they stand for. Each successful mutation reports back to the store
//! exactly once.
//!
//! ## Persistence
//!
//! When notified, the store either flushes the whole tree to its file, or, inside a
//! [transaction](Store::transaction), only remembers that it is dirty. A transaction flushes at
//! most once when it ends, however many mutations it contained. The file is replaced atomically,
//! so readers never observe a partial write.
//!
//! The on-disk format is JSON by default; other formats can be plugged in through the [`Codec`]
//! trait. Behavior such as pretty printing or flushing on drop is configured with
//! [`StoreOptions`].
//!
//! ## Limitations
//!
//! Only one live `Store` should own a given file. Nothing prevents two instances from writing
//! the same path; the last flush wins. Use [`Store::reload`] to pick up writes made elsewhere.
//!
//! ## Features
//!
//! - `arbitrary`: implements `quickcheck::Arbitrary` for [`Value`].

#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

mod adapt;
pub use adapt::adapt;
pub mod codec;
pub use codec::{Codec, JsonCodec};
pub mod containers;
pub use containers::{ArrayMut, MapMut};
mod error;
pub use error::{CodecError, Error, Result};
mod options;
pub use options::StoreOptions;
mod persist;
mod store;
pub use store::Store;
pub mod transaction;
pub use transaction::Transaction;
pub mod value;
pub use value::{Array, Map, Value};

#[cfg(any(test, feature = "arbitrary"))]
mod test_util;

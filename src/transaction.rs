// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Scoped transactions.
//!
//! Inside a transaction, mutations of the store only mark it dirty. When the transaction ends,
//! the store flushes once if anything changed, no matter how many mutations happened:
//!
//! ```
//! # use selfstore::Store;
//! # use serde_json::json;
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("subs.json");
//! let mut store = Store::open(&path).unwrap();
//! store.insert("subs", json!([])).unwrap();
//! let saves = store.saves();
//!
//! let mut tx = store.transaction();
//! let mut subs = tx.array_mut("subs").unwrap();
//! subs.push("mueller").unwrap();
//! subs.push("robben").unwrap();
//! subs.push("ribery").unwrap();
//! subs.pop_at(1).unwrap();
//! tx.commit().unwrap();
//!
//! assert_eq!(store.saves(), saves + 1);
//! assert_eq!(Store::open(&path).unwrap()["subs"], json!(["mueller", "ribery"]));
//! ```
//!
//! Unlike a database transaction there is no rollback: mutations apply to the in-memory tree
//! immediately and only their persistence is deferred.
use crate::{
    Result, Store,
    codec::{Codec, JsonCodec},
};
use std::ops::{Deref, DerefMut};

/// Guard for a transaction on a [`Store`], created by [`Store::transaction`].
///
/// Dereferences to the store, so the whole mapping API is available through it. The transaction
/// ends on [`commit`](Transaction::commit) or, failing that, when the guard is dropped, including
/// during unwinding. Only `commit` can report a failed flush; `Drop` logs it.
///
/// Opening a transaction while one is already open joins it: the inner guard does not end
/// the transaction, and the outer one flushes everything when it ends.
#[must_use = "dropping the guard immediately ends the transaction"]
pub struct Transaction<'s, C: Codec = JsonCodec> {
    store: &'s mut Store<C>,
    joined: bool,
    ended: bool,
}

impl<'s, C: Codec> Transaction<'s, C> {
    pub(crate) fn new(store: &'s mut Store<C>) -> Self {
        let joined = store.in_transaction();
        if !joined {
            store.begin_transaction();
        }
        Self {
            store,
            joined,
            ended: false,
        }
    }

    /// Whether this guard joined a transaction that was already open.
    pub fn is_joined(&self) -> bool {
        self.joined
    }

    /// Ends the transaction, flushing if anything changed.
    ///
    /// For a joined guard this does nothing; the enclosing transaction flushes.
    pub fn commit(mut self) -> Result<()> {
        self.ended = true;
        if self.joined {
            return Ok(());
        }
        self.store.end_transaction()
    }
}

impl<C: Codec> Deref for Transaction<'_, C> {
    type Target = Store<C>;

    fn deref(&self) -> &Store<C> {
        self.store
    }
}

impl<C: Codec> DerefMut for Transaction<'_, C> {
    fn deref_mut(&mut self) -> &mut Store<C> {
        self.store
    }
}

impl<C: Codec> Drop for Transaction<'_, C> {
    fn drop(&mut self) {
        if self.ended || self.joined {
            return;
        }
        if let Err(error) = self.store.end_transaction() {
            tracing::warn!(
                path = %self.store.path().display(),
                %error,
                "failed to flush at the end of a transaction"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, Store, StoreOptions};
    use serde_json::json;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use tempfile::TempDir;

    #[test]
    fn dropping_the_guard_ends_the_transaction() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path().join("drop.json")).unwrap();
        {
            let mut tx = store.transaction();
            tx.insert("a", 1).unwrap();
            tx.insert("b", 2).unwrap();
            assert!(tx.in_transaction());
            assert_eq!(tx.saves(), 0);
        }
        assert!(!store.in_transaction());
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn nested_guards_join_the_outer_transaction() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open(dir.path().join("nested.json")).unwrap();

        let mut outer = store.transaction();
        outer.insert("a", 1).unwrap();
        {
            let mut inner = outer.transaction();
            assert!(inner.is_joined());
            inner.insert("b", 2).unwrap();
            inner.commit().unwrap();
        }
        assert!(outer.in_transaction());
        assert_eq!(outer.saves(), 0);
        outer.commit().unwrap();
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn transact_flushes_even_when_the_body_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fail.json");
        let mut store = Store::open(&path).unwrap();

        let err = store
            .transact(|store| {
                store.insert("team", json!({ "goaly": "neuer" }))?;
                store.remove("coach")?;
                Ok::<_, Error>(())
            })
            .unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { .. }));
        assert!(!store.in_transaction());
        assert_eq!(store.saves(), 1);

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened["team"]["goaly"], "neuer");
    }

    #[test]
    #[allow(unreachable_code)]
    fn transact_flushes_when_the_body_panics() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("panic.json");
        let mut store = Store::open(&path).unwrap();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            store
                .transact(|store| {
                    store.insert("team", "bayern")?;
                    panic!("boom");
                    Ok::<_, Error>(())
                })
                .unwrap();
        }));
        assert!(outcome.is_err());
        assert!(!store.in_transaction());
        assert_eq!(Store::open(&path).unwrap()["team"], "bayern");
    }

    #[test]
    fn commit_reports_flush_failures() {
        let dir = TempDir::new().unwrap();
        let options = StoreOptions {
            create_dirs: false,
            flush_on_drop: false,
            ..StoreOptions::default()
        };
        let path = dir.path().join("gone").join("a.json");
        let mut store = Store::with_options(path, options).unwrap();

        let mut tx = store.transaction();
        tx.insert("a", 1).unwrap();
        let err = tx.commit().unwrap_err();
        assert!(matches!(err, Error::WriteFailure { .. }));
        assert!(store.is_dirty());
        assert!(!store.in_transaction());
    }
}

// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use crate::{
    Error, Result,
    codec::{Codec, JsonCodec},
    containers::{self, ArrayMut, Kind, MapMut, Segment, TreePath},
    options::StoreOptions,
    persist,
    transaction::Transaction,
    value::{Array, Map, Value},
};
use smallvec::smallvec;
use std::{
    fmt,
    ops::Deref,
    path::{Path, PathBuf},
};

/// A mapping that writes itself to a file whenever it, or anything nested in it, changes.
///
/// The store is the root of a tree of [`Value`]s. Reads go through `Deref<Target = Map>`;
/// writes go through the store's own mapping methods or through [`MapMut`]/[`ArrayMut`] handles
/// for nested containers. After every mutation the store decides, in
/// [`notify_changed`](Store::notify_changed), whether to flush right away or to defer:
///
/// - while loading, nothing is flushed or marked dirty;
/// - inside a [transaction](Store::transaction), the store is only marked dirty;
/// - otherwise the full tree is encoded and atomically written to [`path`](Store::path).
///
/// A freshly opened store is always dirty, so the first flush opportunity (the first mutation,
/// or the end of the first transaction) writes the file.
///
/// # Example
///
/// ```
/// # use selfstore::Store;
/// # use serde_json::json;
/// # let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("team.json");
/// let mut store = Store::open(&path).unwrap();
/// store.insert("team", json!({})).unwrap();
/// store.map_mut("team").unwrap().insert("goaly", "neuer").unwrap();
///
/// assert_eq!(Store::open(&path).unwrap()["team"]["goaly"], "neuer");
/// ```
pub struct Store<C: Codec = JsonCodec> {
    root: Map,
    path: PathBuf,
    codec: C,
    options: StoreOptions,
    dirty: bool,
    // a notification arrived since the last flush; a freshly loaded store is dirty but not pending
    pending: bool,
    saves: u64,
    in_transaction: bool,
    suspended: bool,
}

impl Store<JsonCodec> {
    /// Opens the store backed by the JSON file at `path`, using default options.
    ///
    /// A missing file is an empty store; the file is created by the first flush.
    ///
    /// # Errors
    ///
    /// [`Error::StoreCorrupt`] if the file exists but does not hold a JSON object, and
    /// [`Error::ReadFailure`] if it cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(path, StoreOptions::default())
    }

    /// Opens the store at `path` and then sets each `(key, value)` of `content`, overwriting
    /// keys loaded from the file.
    ///
    /// Applying the initial content counts as a single change.
    pub fn open_with_content<I, K, V>(path: impl Into<PathBuf>, content: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut store = Self::open(path)?;
        store.apply_content(content)?;
        Ok(store)
    }

    /// Opens the store at `path` with the JSON codec and behavior described by `options`.
    pub fn with_options(path: impl Into<PathBuf>, options: StoreOptions) -> Result<Self> {
        let codec = options.json_codec();
        Self::open_with_codec(path, codec, options)
    }
}

impl<C: Codec> Store<C> {
    /// Opens the store at `path`, encoding and decoding the file with `codec`.
    pub fn open_with_codec(
        path: impl Into<PathBuf>,
        codec: C,
        options: StoreOptions,
    ) -> Result<Self> {
        let mut store = Self {
            root: Map::new(),
            path: path.into(),
            codec,
            options,
            dirty: false,
            pending: false,
            saves: 0,
            in_transaction: false,
            suspended: true,
        };
        store.load()?;
        Ok(store)
    }

    fn apply_content<I, K, V>(&mut self, content: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut changed = false;
        for (key, value) in content {
            self.root.insert(key.into(), value.into());
            changed = true;
        }
        if changed {
            self.notify_changed()?;
        }
        Ok(())
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options the store was opened with.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Codec used to encode and decode the backing file.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Number of completed flushes since the store was opened.
    ///
    /// Increases by exactly one per flush, never per mutation: a transaction that changes many
    /// values flushes (and counts) once.
    pub fn saves(&self) -> u64 {
        self.saves
    }

    /// Whether the in-memory tree may differ from the backing file.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// The persistence decision, invoked after every mutation of the tree.
    ///
    /// While loading this does nothing. Inside a transaction it marks the store dirty. Otherwise
    /// it flushes the whole tree immediately.
    ///
    /// # Errors
    ///
    /// [`Error::WriteFailure`] or [`Error::Encode`] if the flush fails. The mutation that led
    /// here stays applied in memory and the store stays dirty.
    pub fn notify_changed(&mut self) -> Result<()> {
        if self.suspended {
            return Ok(());
        }
        self.pending = true;
        if self.in_transaction {
            self.dirty = true;
            return Ok(());
        }
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.dirty = true;
        let bytes = self
            .codec
            .encode(&self.root)
            .map_err(|source| Error::Encode { source })?;
        persist::atomic_write(&self.path, &bytes, self.options.create_dirs).map_err(|source| {
            Error::WriteFailure {
                path: self.path.clone(),
                source,
            }
        })?;
        self.saves += 1;
        self.dirty = false;
        self.pending = false;
        tracing::debug!(
            path = %self.path.display(),
            bytes = bytes.len(),
            saves = self.saves,
            "flushed store"
        );
        Ok(())
    }

    /// Starts deferring flushes until [`end_transaction`](Store::end_transaction).
    ///
    /// Prefer [`transaction`](Store::transaction) or [`transact`](Store::transact), which end
    /// the transaction on every exit path.
    pub fn begin_transaction(&mut self) {
        tracing::debug!(path = %self.path.display(), "begin transaction");
        self.in_transaction = true;
    }

    /// Ends the current transaction and flushes if anything changed since the last flush.
    ///
    /// However many mutations happened inside the transaction, this flushes at most once.
    pub fn end_transaction(&mut self) -> Result<()> {
        self.in_transaction = false;
        self.suspended = false;
        tracing::debug!(path = %self.path.display(), dirty = self.dirty, "end transaction");
        if self.dirty { self.flush() } else { Ok(()) }
    }

    /// Opens a transaction that ends when the returned guard is committed or dropped.
    ///
    /// See [`Transaction`] for how nested scopes behave.
    pub fn transaction(&mut self) -> Transaction<'_, C> {
        Transaction::new(self)
    }

    /// Runs `f` inside a transaction.
    ///
    /// The transaction ends and the deferred flush happens whether `f` succeeds, fails or
    /// panics. If both `f` and the flush fail, the error of `f` is returned.
    ///
    /// ```
    /// # use selfstore::{Store, Error};
    /// # use serde_json::json;
    /// # let dir = tempfile::tempdir().unwrap();
    /// let mut store = Store::open(dir.path().join("subs.json"))?;
    /// let saves = store.saves();
    /// store.transact(|store| {
    ///     store.insert("subs", json!([]))?;
    ///     let mut subs = store.array_mut("subs")?;
    ///     subs.push("mueller")?;
    ///     subs.push("robben")?;
    ///     Ok::<_, Error>(())
    /// })?;
    /// assert_eq!(store.saves(), saves + 1);
    /// # Ok::<_, Error>(())
    /// ```
    pub fn transact<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<Error>,
    {
        let mut tx = self.transaction();
        let result = f(&mut *tx);
        let flushed = tx.commit();
        let value = result?;
        flushed?;
        Ok(value)
    }

    /// Re-reads the backing file and overwrites, key by key, the in-memory tree with its content.
    ///
    /// Use this when another instance may have written the file. Keys only present in memory
    /// are kept. The dirty and suspended flags are the same afterwards as they were before.
    pub fn reload(&mut self) -> Result<()> {
        let (dirty, suspended) = (self.dirty, self.suspended);
        let result = self.load();
        self.dirty = dirty;
        self.suspended = suspended;
        result
    }

    fn load(&mut self) -> Result<()> {
        self.suspended = true;
        let result = self.read_backing().and_then(|loaded| {
            let mut root = self.root_mut();
            for (key, value) in loaded {
                root.insert(key, value)?;
            }
            Ok(())
        });
        self.suspended = false;
        result?;
        if !self.in_transaction {
            self.dirty = true;
        }
        Ok(())
    }

    fn read_backing(&self) -> Result<Map> {
        let bytes = persist::read_if_exists(&self.path).map_err(|source| Error::ReadFailure {
            path: self.path.clone(),
            source,
        })?;
        let Some(bytes) = bytes else {
            tracing::debug!(path = %self.path.display(), "no backing file, starting empty");
            return Ok(Map::new());
        };
        let loaded = self
            .codec
            .decode(&bytes)
            .map_err(|source| Error::StoreCorrupt {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.path.display(), keys = loaded.len(), "loaded store");
        Ok(loaded)
    }

    /// Flushes if dirty and disposes of the store, reporting any write error.
    ///
    /// Dropping the store flushes on a best-effort basis when [`StoreOptions::flush_on_drop`] is
    /// set and it was mutated since the last flush, but can only log failures.
    pub fn close(mut self) -> Result<()> {
        self.options.flush_on_drop = false;
        if self.dirty { self.flush() } else { Ok(()) }
    }

    /// A notifying handle onto the root mapping itself.
    pub fn root_mut(&mut self) -> MapMut<'_, C> {
        MapMut::new(self, TreePath::new())
    }

    /// Sets `key` to `value` at the top level. See [`MapMut::insert`].
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        self.root_mut().insert(key, value)
    }

    /// Removes a top-level key. See [`MapMut::remove`].
    pub fn remove(&mut self, key: &str) -> Result<Value> {
        self.root_mut().remove(key)
    }

    /// Top-level default-get. Notifies the store even though nothing is inserted; see
    /// [`MapMut::get_or`].
    pub fn get_or(&mut self, key: &str, default: impl Into<Value>) -> Result<Value> {
        self.root_mut().get_or(key, default)
    }

    /// Top-level set-if-absent. See [`MapMut::get_or_insert`].
    pub fn get_or_insert(
        &mut self,
        key: impl Into<String>,
        default: impl Into<Value>,
    ) -> Result<&Value> {
        let key = key.into();
        self.root_mut().get_or_insert(key.clone(), default)?;
        Ok(self.root.get(&key).expect("key was inserted above"))
    }

    /// Removes every top-level key.
    pub fn clear(&mut self) -> Result<()> {
        self.root_mut().clear()
    }

    /// A handle onto the map stored at the top-level `key`.
    pub fn map_mut(&mut self, key: &str) -> Result<MapMut<'_, C>> {
        self.check_child(key, Kind::Map)?;
        Ok(MapMut::new(self, smallvec![Segment::Key(key.to_owned())]))
    }

    /// A handle onto the array stored at the top-level `key`.
    pub fn array_mut(&mut self, key: &str) -> Result<ArrayMut<'_, C>> {
        self.check_child(key, Kind::Array)?;
        Ok(ArrayMut::new(self, smallvec![Segment::Key(key.to_owned())]))
    }

    fn check_child(&self, key: &str, kind: Kind) -> Result<()> {
        let found = self.root.get(key).ok_or_else(|| Error::key_not_found(key))?;
        kind.check(found)
    }

    pub(crate) fn map_at(&self, path: &[Segment]) -> Option<&Map> {
        if path.is_empty() {
            return Some(&self.root);
        }
        containers::value_at(&self.root, path)?.as_map()
    }

    pub(crate) fn map_at_mut(&mut self, path: &[Segment]) -> Option<&mut Map> {
        if path.is_empty() {
            return Some(&mut self.root);
        }
        containers::value_at_mut(&mut self.root, path)?.as_map_mut()
    }

    pub(crate) fn array_at(&self, path: &[Segment]) -> Option<&Array> {
        containers::value_at(&self.root, path)?.as_array()
    }

    pub(crate) fn array_at_mut(&mut self, path: &[Segment]) -> Option<&mut Array> {
        containers::value_at_mut(&mut self.root, path)?.as_array_mut()
    }
}

impl<C: Codec> Deref for Store<C> {
    type Target = Map;

    fn deref(&self) -> &Map {
        &self.root
    }
}

impl<C: Codec> Drop for Store<C> {
    fn drop(&mut self) {
        // a store that was only read never writes on drop
        if !(self.pending && self.options.flush_on_drop) || self.suspended {
            return;
        }
        if let Err(error) = self.flush() {
            tracing::warn!(
                path = %self.path.display(),
                %error,
                "failed to flush store on drop"
            );
        }
    }
}

impl<C: Codec> fmt::Debug for Store<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("dirty", &self.dirty)
            .field("saves", &self.saves)
            .field("in_transaction", &self.in_transaction)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl<C: Codec> PartialEq<serde_json::Value> for Store<C> {
    fn eq(&self, other: &serde_json::Value) -> bool {
        self.root == *other
    }
}

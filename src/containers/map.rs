// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{ArrayMut, Kind, Segment, TreePath};
use crate::{
    Error, Result, Store,
    codec::{Codec, JsonCodec},
    value::{Map, Value},
};
use std::{fmt, ops::Deref};

/// A notifying handle onto a mapping inside a [`Store`] (or onto the store's root mapping).
///
/// Obtained from [`Store::map_mut`], [`Store::root_mut`], [`MapMut::map_mut`] or
/// [`ArrayMut::map_mut`]. Reads are available through `Deref<Target = Map>`; every mutation
/// notifies the store, which then flushes or marks itself dirty.
pub struct MapMut<'s, C: Codec = JsonCodec> {
    store: &'s mut Store<C>,
    path: TreePath,
}

impl<'s, C: Codec> MapMut<'s, C> {
    pub(crate) fn new(store: &'s mut Store<C>, path: TreePath) -> Self {
        Self { store, path }
    }

    fn target(&mut self) -> &mut Map {
        self.store
            .map_at_mut(&self.path)
            .expect("a map handle always points at a map")
    }

    fn child_path(&self, key: &str) -> TreePath {
        let mut path = self.path.clone();
        path.push(Segment::Key(key.to_owned()));
        path
    }

    fn check_child(&self, key: &str, kind: Kind) -> Result<()> {
        let found = self.get(key).ok_or_else(|| Error::key_not_found(key))?;
        kind.check(found)
    }

    /// Sets `key` to `value`, returning the value previously stored there.
    ///
    /// Plain containers in `value` are adapted into tree containers before being stored.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        let previous = self.target().insert(key.into(), value.into());
        self.store.notify_changed()?;
        Ok(previous)
    }

    /// Removes `key`, returning its value.
    ///
    /// Fails with [`Error::KeyNotFound`] without notifying the store if the key is absent.
    pub fn remove(&mut self, key: &str) -> Result<Value> {
        let removed = self
            .target()
            .remove(key)
            .ok_or_else(|| Error::key_not_found(key))?;
        self.store.notify_changed()?;
        Ok(removed)
    }

    /// Returns the value at `key`, or the adapted `default` if the key is absent.
    ///
    /// The default is **not** inserted. This nevertheless counts as a change: the store is
    /// notified, so outside a transaction this flushes and inside one it marks the store dirty.
    pub fn get_or(&mut self, key: &str, default: impl Into<Value>) -> Result<Value> {
        let default = default.into();
        let value = self.target().get(key).cloned().unwrap_or(default);
        self.store.notify_changed()?;
        Ok(value)
    }

    /// Inserts the adapted `default` at `key` unless the key is present, then returns the value
    /// stored at `key`.
    pub fn get_or_insert(
        &mut self,
        key: impl Into<String>,
        default: impl Into<Value>,
    ) -> Result<&Value> {
        let key = key.into();
        let map = self.target();
        if !map.contains_key(&key) {
            map.insert(key.clone(), default.into());
        }
        self.store.notify_changed()?;
        Ok(self.get(&key).expect("key was inserted above"))
    }

    /// Removes every entry.
    pub fn clear(&mut self) -> Result<()> {
        self.target().clear();
        self.store.notify_changed()
    }

    /// Returns a handle onto the map stored at `key`.
    pub fn map_mut(&mut self, key: &str) -> Result<MapMut<'_, C>> {
        self.check_child(key, Kind::Map)?;
        let path = self.child_path(key);
        Ok(MapMut::new(self.store, path))
    }

    /// Returns a handle onto the array stored at `key`.
    pub fn array_mut(&mut self, key: &str) -> Result<ArrayMut<'_, C>> {
        self.check_child(key, Kind::Array)?;
        let path = self.child_path(key);
        Ok(ArrayMut::new(self.store, path))
    }
}

impl<C: Codec> Deref for MapMut<'_, C> {
    type Target = Map;

    fn deref(&self) -> &Map {
        self.store
            .map_at(&self.path)
            .expect("a map handle always points at a map")
    }
}

impl<C: Codec> fmt::Debug for MapMut<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapMut")
            .field("path", &self.path)
            .field("map", &**self)
            .finish()
    }
}

impl<C: Codec> PartialEq<serde_json::Value> for MapMut<'_, C> {
    fn eq(&self, other: &serde_json::Value) -> bool {
        **self == *other
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, Store};
    use serde_json::json;
    use tempfile::TempDir;

    fn flushed_store(dir: &TempDir) -> Store {
        let mut store = Store::open(dir.path().join("map.json")).unwrap();
        store
            .insert("team", json!({ "goaly": "neuer", "forward": "modeste" }))
            .unwrap();
        store
    }

    #[test]
    fn nested_insert_flushes_the_root() {
        let dir = TempDir::new().unwrap();
        let mut store = flushed_store(&dir);
        let saves = store.saves();

        let previous = store.map_mut("team").unwrap().insert("goaly", "horn").unwrap();
        assert_eq!(previous.unwrap(), "neuer");
        assert_eq!(store.saves(), saves + 1);
        assert!(!store.is_dirty());

        let on_disk: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk["team"]["goaly"], "horn");
    }

    #[test]
    fn removing_a_missing_key_does_not_notify() {
        let dir = TempDir::new().unwrap();
        let mut store = flushed_store(&dir);
        let saves = store.saves();

        let err = store.map_mut("team").unwrap().remove("leftback").unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { key } if key == "leftback"));
        assert_eq!(store.saves(), saves);

        let removed = store.map_mut("team").unwrap().remove("forward").unwrap();
        assert_eq!(removed, "modeste");
        assert_eq!(store.saves(), saves + 1);
        assert_eq!(store["team"], json!({ "goaly": "neuer" }));
    }

    #[test]
    fn get_or_does_not_insert_but_still_flushes() {
        let dir = TempDir::new().unwrap();
        let mut store = flushed_store(&dir);
        let saves = store.saves();

        let mut team = store.map_mut("team").unwrap();
        assert_eq!(team.get_or("leftback", "hector").unwrap(), "hector");
        assert_eq!(team.get_or("goaly", "hector").unwrap(), "neuer");
        assert!(!team.contains_key("leftback"));
        assert_eq!(store.saves(), saves + 2);
    }

    #[test]
    fn get_or_adapts_container_defaults() {
        let dir = TempDir::new().unwrap();
        let mut store = flushed_store(&dir);
        let value = store.get_or("bench", json!(["kimmich"])).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert!(!store.contains_key("bench"));
    }

    #[test]
    fn get_or_insert_only_inserts_when_absent() {
        let dir = TempDir::new().unwrap();
        let mut store = flushed_store(&dir);
        let mut team = store.map_mut("team").unwrap();

        assert_eq!(*team.get_or_insert("goaly", "horn").unwrap(), "neuer");
        assert_eq!(*team.get_or_insert("leftback", "hector").unwrap(), "hector");
        assert_eq!(team["leftback"], "hector");
    }

    #[test]
    fn clear_empties_the_nested_map() {
        let dir = TempDir::new().unwrap();
        let mut store = flushed_store(&dir);
        store.map_mut("team").unwrap().clear().unwrap();
        assert_eq!(store["team"], json!({}));

        let reopened = Store::open(store.path()).unwrap();
        assert_eq!(reopened["team"], json!({}));
    }

    #[test]
    fn navigating_to_the_wrong_kind_fails() {
        let dir = TempDir::new().unwrap();
        let mut store = flushed_store(&dir);
        let mut team = store.map_mut("team").unwrap();

        assert!(matches!(
            team.map_mut("goaly").unwrap_err(),
            Error::WrongType { expected: "map", found: "string" }
        ));
        assert!(matches!(
            team.array_mut("subs").unwrap_err(),
            Error::KeyNotFound { .. }
        ));
    }

    #[test]
    fn reads_are_forwarded() {
        let dir = TempDir::new().unwrap();
        let mut store = flushed_store(&dir);
        let team = store.map_mut("team").unwrap();

        assert_eq!(team.len(), 2);
        assert!(team.contains_key("goaly"));
        assert_eq!(team.keys().collect::<Vec<_>>(), ["goaly", "forward"]);
        assert_eq!(team, json!({ "goaly": "neuer", "forward": "modeste" }));
    }
}

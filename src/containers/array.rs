// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{Kind, MapMut, Segment, TreePath};
use crate::{
    Error, Result, Store,
    codec::{Codec, JsonCodec},
    value::{Array, Value},
};
use std::{fmt, ops::Deref};

/// A notifying handle onto an array inside a [`Store`].
///
/// Obtained from [`Store::array_mut`], [`MapMut::array_mut`] or [`ArrayMut::array_mut`]. Reads
/// are available through `Deref<Target = Array>`; every successful mutation notifies the store.
/// Mutations that fail on an invalid operand leave the array untouched and do not notify.
pub struct ArrayMut<'s, C: Codec = JsonCodec> {
    store: &'s mut Store<C>,
    path: TreePath,
}

impl<'s, C: Codec> ArrayMut<'s, C> {
    pub(crate) fn new(store: &'s mut Store<C>, path: TreePath) -> Self {
        Self { store, path }
    }

    fn target(&mut self) -> &mut Array {
        self.store
            .array_at_mut(&self.path)
            .expect("an array handle always points at an array")
    }

    fn child_path(&self, index: usize) -> TreePath {
        let mut path = self.path.clone();
        path.push(Segment::Index(index));
        path
    }

    fn out_of_range(&self, index: usize) -> Error {
        Error::IndexOutOfRange {
            index,
            len: self.len(),
        }
    }

    fn check_child(&self, index: usize, kind: Kind) -> Result<()> {
        let found = self.get(index).ok_or_else(|| self.out_of_range(index))?;
        kind.check(found)
    }

    /// Appends `value`.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        self.target().push(value.into());
        self.store.notify_changed()
    }

    /// Appends every item of `values`, notifying the store once.
    pub fn extend<I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.target().extend(values.into_iter().map(Into::into));
        self.store.notify_changed()
    }

    /// Inserts `value` at `index`, shifting later elements.
    ///
    /// If `index` is greater than the array length, the value is appended.
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.target().insert(index, value.into());
        self.store.notify_changed()
    }

    /// Removes the first element equal to `value`.
    pub fn remove(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let index = self.position(&value).ok_or(Error::ValueNotFound)?;
        self.target().remove(index);
        self.store.notify_changed()
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Result<Value> {
        match self.len() {
            0 => Err(self.out_of_range(0)),
            len => self.pop_at(len - 1),
        }
    }

    /// Removes and returns the element at `index`.
    pub fn pop_at(&mut self, index: usize) -> Result<Value> {
        let removed = self
            .target()
            .remove(index)
            .ok_or_else(|| self.out_of_range(index))?;
        self.store.notify_changed()?;
        Ok(removed)
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<Value> {
        let value = value.into();
        let len = self.len();
        let Some(slot) = self.target().get_mut(index) else {
            return Err(Error::IndexOutOfRange { index, len });
        };
        let previous = std::mem::replace(slot, value);
        self.store.notify_changed()?;
        Ok(previous)
    }

    /// Removes every element.
    pub fn clear(&mut self) -> Result<()> {
        self.target().clear();
        self.store.notify_changed()
    }

    /// Returns a handle onto the map stored at `index`.
    pub fn map_mut(&mut self, index: usize) -> Result<MapMut<'_, C>> {
        self.check_child(index, Kind::Map)?;
        let path = self.child_path(index);
        Ok(MapMut::new(self.store, path))
    }

    /// Returns a handle onto the array stored at `index`.
    pub fn array_mut(&mut self, index: usize) -> Result<ArrayMut<'_, C>> {
        self.check_child(index, Kind::Array)?;
        let path = self.child_path(index);
        Ok(ArrayMut::new(self.store, path))
    }
}

impl<C: Codec> Deref for ArrayMut<'_, C> {
    type Target = Array;

    fn deref(&self) -> &Array {
        self.store
            .array_at(&self.path)
            .expect("an array handle always points at an array")
    }
}

impl<C: Codec> fmt::Debug for ArrayMut<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayMut")
            .field("path", &self.path)
            .field("array", &**self)
            .finish()
    }
}

impl<C: Codec> PartialEq<serde_json::Value> for ArrayMut<'_, C> {
    fn eq(&self, other: &serde_json::Value) -> bool {
        **self == *other
    }
}

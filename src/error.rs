// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Errors produced by the store and its notifying containers.
use std::{io, path::PathBuf};

/// Boxed error produced by a [`Codec`](crate::codec::Codec).
pub type CodecError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can go wrong when loading, mutating or flushing a [`Store`](crate::Store).
///
/// A missing backing file is deliberately absent from this list: it is treated as an empty
/// store when loading.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing file exists but its content could not be decoded into a mapping.
    #[error("store at {} is corrupt", path.display())]
    StoreCorrupt {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The backing file exists but could not be read.
    #[error("failed to read store at {}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The tree could not be encoded by the codec.
    #[error("failed to encode store content")]
    Encode {
        #[source]
        source: CodecError,
    },

    /// Writing the encoded tree to the backing file failed.
    ///
    /// The in-memory mutation that triggered the flush is kept and the store stays dirty.
    #[error("failed to write store to {}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("key {key:?} not found")]
    KeyNotFound { key: String },

    #[error("value not found in array")]
    ValueNotFound,

    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A child container was requested but the value found there is of another type.
    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
}

impl Error {
    pub(crate) fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Returns true if this error was raised while persisting the tree.
    ///
    /// Such errors leave the in-memory mutation in place; the store remains dirty and the next
    /// successful flush persists it.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::WriteFailure { .. } | Self::Encode { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use crate::codec::JsonCodec;
use serde::Deserialize;

/// Knobs controlling how a [`Store`](crate::Store) persists itself.
///
/// Deserializable with defaults for every field, so it can be embedded in an application's own
/// configuration file:
///
/// ```
/// # use selfstore::StoreOptions;
/// let options: StoreOptions = serde_json::from_str(r#"{ "pretty": true }"#).unwrap();
/// assert!(options.pretty);
/// assert!(options.flush_on_drop);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreOptions {
    /// Write indented JSON instead of a single line.
    pub pretty: bool,
    /// Create missing parent directories of the backing file when flushing.
    pub create_dirs: bool,
    /// Flush a store that was mutated since its last flush when it is dropped. A store that was
    /// only read is never written on drop. Errors are logged, not returned.
    pub flush_on_drop: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            create_dirs: true,
            flush_on_drop: true,
        }
    }
}

impl StoreOptions {
    /// The JSON codec matching these options.
    pub fn json_codec(&self) -> JsonCodec {
        if self.pretty {
            JsonCodec::pretty()
        } else {
            JsonCodec::compact()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        let options: StoreOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, StoreOptions::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<StoreOptions>(r#"{ "encrypt": true }"#).is_err());
    }

    #[test]
    fn codec_follows_pretty_flag() {
        let options = StoreOptions {
            pretty: true,
            ..StoreOptions::default()
        };
        assert_eq!(options.json_codec(), JsonCodec::pretty());
        assert_eq!(StoreOptions::default().json_codec(), JsonCodec::compact());
    }
}
